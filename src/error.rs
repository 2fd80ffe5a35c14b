use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Invalid trade: {0}")]
    Validation(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No trades to export")]
    NoTrades,

    #[error("No trades to analyze")]
    NothingToAnalyze,

    #[error("Not signed in. Run `login` first or use --demo for offline mode")]
    NotSignedIn,
}

pub type JournalResult<T> = Result<T, JournalError>;

impl From<rusqlite::Error> for JournalError {
    fn from(err: rusqlite::Error) -> Self {
        JournalError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        JournalError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for JournalError {
    fn from(err: csv::Error) -> Self {
        JournalError::Csv(err.to_string())
    }
}
