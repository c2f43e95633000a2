use std::result::Result as StdResult;

use thiserror::Error;
use uuid::Uuid;

/// Error type shared by the recurrence engine, the editing sessions and the ledger stores.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("A currency is required to change the amount of entry {entry}")]
    CurrencyRequired { entry: Uuid },
    #[error("Entry #{index} ({entry}) cannot be edited: {reason}")]
    BatchValidation {
        index: usize,
        entry: Uuid,
        reason: String,
    },
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(Uuid),
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = StdResult<T, EngineError>;

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}
