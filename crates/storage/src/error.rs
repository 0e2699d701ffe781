#![forbid(unsafe_code)]

use it_core::RecordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("record file: {0}")]
    Csv(#[from] csv::Error),
    #[error("workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("invalid record: {0}")]
    Record(#[from] RecordError),
    #[error("record file not found")]
    NotFound,
    #[error("unknown record")]
    UnknownRecord,
    #[error("record ordinal {ordinal} out of range ({count} records for this register number)")]
    OrdinalOutOfRange { ordinal: usize, count: usize },
    #[error("corrupt store: {0}")]
    Corrupt(String),
    #[error("account already exists")]
    AccountExists,
    #[error("unknown account")]
    UnknownAccount,
    #[error("password hash: {0}")]
    PasswordHash(String),
}

impl StoreError {
    /// Whether the error means the addressed thing does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::UnknownRecord
                | Self::UnknownAccount
                | Self::OrdinalOutOfRange { .. }
        )
    }
}
