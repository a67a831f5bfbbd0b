mod batch;
mod electrical;
mod power_entry;
mod reporting_month;
mod scope;

pub use batch::{template_rows, EntryBatch, EntryRow};
pub use electrical::{amps_from_kw_volts, kw_from_amps_volts, volts_from_kw_amps};
pub use power_entry::{parse_reading, PowerEntry, TaggedEntry};
pub use reporting_month::{days_in_year, is_leap_year, ReportingMonth};
pub use scope::{DatacenterFilter, ALL_DATACENTERS};

/// Rejected user input. Nothing is mutated when one of these is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("datacenter is required")]
    MissingDatacenter,
    #[error("supplier is required")]
    MissingSupplier,
    #[error("at least one row is required")]
    EmptyBatch,
    #[error("invalid month token '{0}', expected Mon-YY")]
    MonthToken(String),
    #[error("invalid month '{0}', expected YYYY-MM")]
    YearMonth(String),
    #[error("year {0} is outside the supported range 2000..=2099")]
    YearOutOfRange(i32),
}
