//! Error types for the question bank, leaderboard and settings

/// Error type for everything outside the simulation itself
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    /// IO error from the data or settings file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in the data or settings file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid settings value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A question that cannot be asked (wrong option count, answer out of range)
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    /// The backend refused or could not complete a request
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for backend and settings operations
pub type Result<T> = std::result::Result<T, GameError>;
