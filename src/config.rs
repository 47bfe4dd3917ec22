//! Runtime settings.
//!
//! Read from the JSON file named by `QUIZ_SHOOTER_CONFIG` when it is set;
//! every field is optional and falls back to its default.  Gameplay
//! tunables are not settings, they live as constants next to the code that
//! uses them.

use std::path::PathBuf;

use serde::Deserialize;

use crate::entities::Bounds;
use crate::error::{GameError, Result};

pub const CONFIG_ENV: &str = "QUIZ_SHOOTER_CONFIG";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Playfield size in world units.
    pub playfield_width: f32,
    pub playfield_height: f32,
    /// Target frame period of the terminal loop.
    pub frame_ms: u64,
    /// How many leaderboard rows to fetch for ranking.
    pub leaderboard_limit: usize,
    /// Question bank + leaderboard store.
    pub data_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Settings {
            playfield_width: 800.0,
            playfield_height: 600.0,
            frame_ms: 33,
            leaderboard_limit: 500,
            data_file: PathBuf::from(home).join(".quiz_shooter.json"),
        }
    }
}

impl Settings {
    /// Settings from `QUIZ_SHOOTER_CONFIG`, or the defaults if it is unset.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Settings::from_file(path),
            Err(_) => Ok(Settings::default()),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let text = std::fs::read_to_string(path.into())?;
        Settings::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.playfield_width < 200.0 || self.playfield_height < 200.0 {
            return Err(GameError::Config(format!(
                "playfield {}x{} is smaller than 200x200",
                self.playfield_width, self.playfield_height
            )));
        }
        if self.frame_ms == 0 {
            return Err(GameError::Config("frame_ms must be positive".to_string()));
        }
        if self.leaderboard_limit == 0 {
            return Err(GameError::Config(
                "leaderboard_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            width: self.playfield_width,
            height: self.playfield_height,
        }
    }
}
