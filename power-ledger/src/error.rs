use std::path::PathBuf;

use ledger_client::{db::StorageError, domain::ValidationError};

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("no data: {0}")]
    NoData(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    /// `NoData` is an expected outcome of a report query, not a fault.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::NoData(_))
    }
}
