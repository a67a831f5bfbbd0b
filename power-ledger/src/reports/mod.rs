//! Energy reports derived from averaged kW readings.
//!
//! Energy for a period is `average kW × 24 h × days`, rounded half away from
//! zero to two decimals.

mod monthly;
mod yearly;

pub use monthly::{
    generate_monthly_report, DatacenterUsage, MonthlyReport, MonthlyRow, MonthlySummary,
};
pub use yearly::{generate_yearly_report, MonthBreakdown, YearlyReport, YearlySummary};

use serde::Serialize;

use ledger_client::{
    db::EntryStore,
    domain::{DatacenterFilter, PowerEntry, TaggedEntry},
};

const HOURS_PER_DAY: f64 = 24.0;

/// Which entries a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFilter {
    pub datacenter: DatacenterFilter,
    /// Narrow to a single supplier when set.
    pub supplier: Option<String>,
}

impl ReportFilter {
    pub fn new(datacenter: DatacenterFilter) -> Self {
        Self {
            datacenter,
            supplier: None,
        }
    }

    pub fn with_supplier(mut self, supplier: &str) -> Self {
        let supplier = supplier.trim();
        self.supplier = (!supplier.is_empty()).then(|| supplier.to_string());
        self
    }

    fn select<'a>(
        &self,
        store: &'a EntryStore,
        mut keep: impl FnMut(&PowerEntry) -> bool,
    ) -> Vec<TaggedEntry<'a>> {
        store
            .select(&self.datacenter)
            .into_iter()
            .filter(|t| {
                keep(t.entry)
                    && self
                        .supplier
                        .as_deref()
                        .map_or(true, |s| t.entry.supplier == s)
            })
            .collect()
    }

    fn describe(&self) -> String {
        let scope = match &self.datacenter {
            DatacenterFilter::All => "all datacenters".to_string(),
            DatacenterFilter::Named(name) => format!("datacenter '{name}'"),
        };
        match &self.supplier {
            Some(supplier) => format!("{scope}, supplier '{supplier}'"),
            None => scope,
        }
    }
}

impl From<&str> for ReportFilter {
    fn from(datacenter: &str) -> Self {
        Self::new(DatacenterFilter::from(datacenter))
    }
}

fn energy_kwh(avg_kw: f64, days: u8) -> f64 {
    avg_kw * HOURS_PER_DAY * f64::from(days)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
