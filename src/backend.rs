//! Persistence collaborator: the question bank and the leaderboard.
//!
//! The simulation only ever talks to the [`Backend`] trait.  Two stores
//! implement it: a JSON file under the player's home directory and an
//! in-memory store for tests.  [`Offline`] fails every call and is what the
//! game runs against when no store could be opened.

use std::path::{Path, PathBuf};

use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

pub const OPTION_COUNT: usize = 4;
/// Leading characters of a student id that name the class.
pub const CLASS_PREFIX_LEN: usize = 3;
pub const STUDENT_ID_LEN: usize = 5;

// ── Records ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub answer: usize,
}

impl Question {
    pub fn new(question: &str, options: [&str; OPTION_COUNT], answer: usize) -> Self {
        Question {
            question: question.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.options.len() != OPTION_COUNT {
            return Err(GameError::InvalidQuestion(format!(
                "{:?} has {} options, expected {}",
                self.question,
                self.options.len(),
                OPTION_COUNT
            )));
        }
        if self.answer >= self.options.len() {
            return Err(GameError::InvalidQuestion(format!(
                "{:?} answer index {} out of range",
                self.question, self.answer
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub student_id: String,
    pub score: u32,
    pub level: u32,
    /// Store revision of the last change; earlier wins ties.
    pub updated_at: u64,
}

/// A player's placing on the fetched leaderboard, both 1-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ranks {
    pub overall: Option<usize>,
    pub class: Option<usize>,
}

/// Student ids are exactly five ASCII digits.
pub fn validate_student_id(id: &str) -> bool {
    id.len() == STUDENT_ID_LEN && id.bytes().all(|b| b.is_ascii_digit())
}

/// Overall rank is the position in `entries` (already in leaderboard
/// order).  Class rank re-orders the entries sharing the id's class prefix
/// by score, then level, highest first.
pub fn rank_of(entries: &[LeaderboardEntry], student_id: &str) -> Ranks {
    let overall = entries
        .iter()
        .position(|e| e.student_id == student_id)
        .map(|i| i + 1);

    let prefix: String = student_id.chars().take(CLASS_PREFIX_LEN).collect();
    let mut class: Vec<&LeaderboardEntry> = entries
        .iter()
        .filter(|e| e.student_id.starts_with(&prefix))
        .collect();
    class.sort_by(|a, b| b.score.cmp(&a.score).then(b.level.cmp(&a.level)));
    let class = class
        .iter()
        .position(|e| e.student_id == student_id)
        .map(|i| i + 1);

    Ranks { overall, class }
}

// ── Collaborator interface ───────────────────────────────────────────────────

pub trait Backend: Send + Sync {
    fn fetch_questions(&self) -> Result<Vec<Question>>;

    /// Record a finished game.  Only a better score replaces an existing
    /// entry for the same student.
    fn submit_score(&self, student_id: &str, score: u32, level: u32) -> Result<LeaderboardEntry>;

    /// Best entries, score descending, ties by earliest update.
    fn fetch_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>>;

    /// Remove one student's entry; `false` if there was none.
    fn delete_entry(&self, student_id: &str) -> Result<bool>;

    fn clear_leaderboard(&self) -> Result<()>;
}

// ── Store ────────────────────────────────────────────────────────────────────

/// The persisted document shared by both store implementations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub revision: u64,
}

impl Store {
    /// A store holding the built-in question bank.
    pub fn seeded() -> Self {
        Store {
            questions: default_questions(),
            ..Store::default()
        }
    }

    fn valid_questions(&self) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| match q.validate() {
                Ok(()) => true,
                Err(e) => {
                    debug!("skipping question: {}", e);
                    false
                }
            })
            .cloned()
            .collect()
    }

    pub fn submit(&mut self, student_id: &str, score: u32, level: u32) -> LeaderboardEntry {
        self.revision += 1;
        let revision = self.revision;
        match self.leaderboard.iter_mut().find(|e| e.student_id == student_id) {
            Some(existing) => {
                if score > existing.score {
                    existing.score = score;
                    existing.level = level;
                    existing.updated_at = revision;
                }
                existing.clone()
            }
            None => {
                let entry = LeaderboardEntry {
                    student_id: student_id.to_string(),
                    score,
                    level,
                    updated_at: revision,
                };
                self.leaderboard.push(entry.clone());
                entry
            }
        }
    }

    pub fn top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut entries = self.leaderboard.clone();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.updated_at.cmp(&b.updated_at)));
        entries.truncate(limit);
        entries
    }

    pub fn delete(&mut self, student_id: &str) -> bool {
        let before = self.leaderboard.len();
        self.leaderboard.retain(|e| e.student_id != student_id);
        self.leaderboard.len() != before
    }
}

/// Math questions the store is seeded with when its bank is empty.
pub fn default_questions() -> Vec<Question> {
    vec![
        Question::new("7 × 8 = ?", ["54", "56", "64", "48"], 1),
        Question::new("144 ÷ 12 = ?", ["11", "14", "12", "13"], 2),
        Question::new("3/4 + 1/8 = ?", ["7/8", "4/12", "1", "5/8"], 0),
        Question::new("Which is prime?", ["21", "27", "33", "29"], 3),
        Question::new("15% of 200 = ?", ["20", "30", "15", "35"], 1),
        Question::new("2³ + 3² = ?", ["13", "15", "17", "12"], 2),
        Question::new("Area of a 6 × 9 rectangle?", ["54", "30", "45", "63"], 0),
        Question::new("0.25 as a fraction?", ["1/5", "2/5", "1/3", "1/4"], 3),
        Question::new("Solve: x + 17 = 42", ["25", "35", "59", "24"], 0),
        Question::new("Angles of a triangle sum to?", ["90°", "360°", "180°", "270°"], 2),
    ]
}

// ── In-memory store ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
}

impl MemoryBackend {
    pub fn new(store: Store) -> Self {
        MemoryBackend {
            store: Mutex::new(store),
        }
    }
}

impl Backend for MemoryBackend {
    fn fetch_questions(&self) -> Result<Vec<Question>> {
        Ok(self.store.lock().valid_questions())
    }

    fn submit_score(&self, student_id: &str, score: u32, level: u32) -> Result<LeaderboardEntry> {
        Ok(self.store.lock().submit(student_id, score, level))
    }

    fn fetch_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        Ok(self.store.lock().top(limit))
    }

    fn delete_entry(&self, student_id: &str) -> Result<bool> {
        Ok(self.store.lock().delete(student_id))
    }

    fn clear_leaderboard(&self) -> Result<()> {
        self.store.lock().leaderboard.clear();
        Ok(())
    }
}

// ── JSON file store ──────────────────────────────────────────────────────────

/// A [`Store`] kept in one JSON file.  Every call re-reads the file, so
/// several game processes can share it; the mutex serialises this process.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    /// Open (or create) the store at `path`, seeding the question bank if
    /// it is empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let backend = FileBackend {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        };
        {
            let _guard = backend.lock.lock();
            let mut store = backend.load()?;
            if store.questions.is_empty() {
                store.questions = default_questions();
                backend.save(&store)?;
                info!(
                    "seeded {} default questions into {}",
                    store.questions.len(),
                    backend.path.display()
                );
            }
        }
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Store> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Store::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Store::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, store: &Store) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(store)?)?;
        Ok(())
    }

    fn update<T>(&self, f: impl FnOnce(&mut Store) -> T) -> Result<T> {
        let _guard = self.lock.lock();
        let mut store = self.load()?;
        let out = f(&mut store);
        self.save(&store)?;
        Ok(out)
    }
}

impl Backend for FileBackend {
    fn fetch_questions(&self) -> Result<Vec<Question>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.valid_questions())
    }

    fn submit_score(&self, student_id: &str, score: u32, level: u32) -> Result<LeaderboardEntry> {
        self.update(|store| store.submit(student_id, score, level))
    }

    fn fetch_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.top(limit))
    }

    fn delete_entry(&self, student_id: &str) -> Result<bool> {
        self.update(|store| store.delete(student_id))
    }

    fn clear_leaderboard(&self) -> Result<()> {
        self.update(|store| store.leaderboard.clear())
    }
}

// ── Unavailable store ────────────────────────────────────────────────────────

/// Fails every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl Offline {
    fn unavailable<T>() -> Result<T> {
        Err(GameError::Backend("backend unavailable".to_string()))
    }
}

impl Backend for Offline {
    fn fetch_questions(&self) -> Result<Vec<Question>> {
        Offline::unavailable()
    }

    fn submit_score(&self, _: &str, _: u32, _: u32) -> Result<LeaderboardEntry> {
        Offline::unavailable()
    }

    fn fetch_leaderboard(&self, _: usize) -> Result<Vec<LeaderboardEntry>> {
        Offline::unavailable()
    }

    fn delete_entry(&self, _: &str) -> Result<bool> {
        Offline::unavailable()
    }

    fn clear_leaderboard(&self) -> Result<()> {
        Offline::unavailable()
    }
}
