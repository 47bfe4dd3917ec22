//! Fire-and-forget backend requests.
//!
//! Each request runs on its own short-lived thread and reports back through
//! a channel.  The game loop drains the channel once per frame with
//! [`RemoteClient::poll`], so results are applied between ticks and never
//! race the simulation.  Failures are logged and replaced by safe defaults.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::backend::{rank_of, Backend, LeaderboardEntry, Question, Ranks};

/// The leaderboard as seen right after a game ended.
#[derive(Clone, Debug, PartialEq)]
pub struct Standings {
    pub entries: Vec<LeaderboardEntry>,
    pub ranks: Ranks,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RemoteEvent {
    /// Fetched question bank; empty if the fetch failed.
    Questions(Vec<Question>),
    /// Leaderboard after submitting; `None` means show the local result only.
    Standings(Option<Standings>),
}

pub struct RemoteClient {
    backend: Arc<dyn Backend>,
    tx: mpsc::Sender<RemoteEvent>,
    rx: mpsc::Receiver<RemoteEvent>,
}

impl RemoteClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (tx, rx) = mpsc::channel();
        RemoteClient { backend, tx, rx }
    }

    pub fn request_questions(&self) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let questions = match backend.fetch_questions() {
                Ok(qs) => {
                    info!("loaded {} questions", qs.len());
                    qs
                }
                Err(e) => {
                    error!("failed to load questions: {}", e);
                    Vec::new()
                }
            };
            // Receiver gone means the game is shutting down.
            let _ = tx.send(RemoteEvent::Questions(questions));
        });
    }

    /// Submit the final score, then fetch the leaderboard and rank the
    /// player on it.  A failed submit is logged and the fetch still runs.
    pub fn submit_and_rank(&self, student_id: &str, score: u32, level: u32, limit: usize) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let student_id = student_id.to_string();
        thread::spawn(move || {
            match backend.submit_score(&student_id, score, level) {
                Ok(entry) => info!(
                    "score submitted for {}: best {} (level {})",
                    entry.student_id, entry.score, entry.level
                ),
                Err(e) => error!("failed to submit score: {}", e),
            }
            let standings = match backend.fetch_leaderboard(limit) {
                Ok(entries) => {
                    let ranks = rank_of(&entries, &student_id);
                    Some(Standings { entries, ranks })
                }
                Err(e) => {
                    warn!("failed to load leaderboard: {}", e);
                    None
                }
            };
            let _ = tx.send(RemoteEvent::Standings(standings));
        });
    }

    /// Everything that finished since the last poll.  Never blocks.
    pub fn poll(&self) -> Vec<RemoteEvent> {
        self.rx.try_iter().collect()
    }

    /// Block for the next result, up to `timeout`.
    pub fn wait(&self, timeout: Duration) -> Option<RemoteEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Block until a submission's standings arrive, skipping any other
    /// result that lands first.  `None` once `timeout` has passed;
    /// `Some(None)` when the leaderboard could not be reached.
    pub fn wait_for_standings(&self, timeout: Duration) -> Option<Option<Standings>> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.checked_duration_since(Instant::now())?;
            match self.rx.recv_timeout(left) {
                Ok(RemoteEvent::Standings(standings)) => return Some(standings),
                Ok(RemoteEvent::Questions(qs)) => {
                    debug!("dropping {} questions while waiting for standings", qs.len());
                }
                Err(_) => return None,
            }
        }
    }
}
