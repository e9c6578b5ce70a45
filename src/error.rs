use thiserror::Error;

/// Errors raised by session setup and the quiz flows built on top of it
#[derive(Debug, Error, PartialEq)]
pub enum QuizError {
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error("cannot take {requested} elements from a sequence of {available}")]
    InsufficientElements { requested: usize, available: usize },

    #[error("session has not terminated yet")]
    SessionNotTerminated,

    #[error("there are no wrong answers to retry")]
    NoWrongAnswers,

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Problems found while loading or validating a word list
#[derive(Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("word list not found: {0}")]
    Missing(String),

    #[error("unable to parse word list: {0}")]
    Parse(String),

    #[error("duplicate english word in pool: {0}")]
    DuplicateEnglish(String),

    #[error("options for '{english}' must contain '{turkish}' exactly once")]
    BadOptions { english: String, turkish: String },

    #[error("word list is empty")]
    Empty,
}

/// Persistence failures from a result recorder
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Failure reported by a notification collaborator (audio, ads)
#[derive(Debug, Error)]
#[error("{sink}: {message}")]
pub struct NotifyError {
    pub sink: &'static str,
    pub message: String,
}

impl NotifyError {
    pub fn new(sink: &'static str, message: impl Into<String>) -> Self {
        Self {
            sink,
            message: message.into(),
        }
    }
}
