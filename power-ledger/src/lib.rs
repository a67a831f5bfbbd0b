pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod observability;
pub mod reports;

pub use error::LedgerError;
pub use ledger::{ImportSummary, PowerLedger};
