use std::{collections::BTreeSet, fmt};

use serde::Serialize;

use ledger_client::{
    db::EntryStore,
    domain::{days_in_year, ReportingMonth},
};

use super::{energy_kwh, round2, ReportFilter};
use crate::error::LedgerError;

/// One calendar month of a yearly report. kW readings are pooled across every
/// selected datacenter and circuit before conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBreakdown {
    pub month: ReportingMonth,
    pub entry_count: usize,
    pub datacenters: BTreeSet<String>,
    pub avg_primary_kw: f64,
    pub avg_redundant_kw: f64,
    pub days_in_month: u8,
    pub primary_kwh: f64,
    pub redundant_kwh: f64,
    pub total_kwh: f64,
    pub avg_daily_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySummary {
    pub total_primary_kwh: f64,
    pub total_redundant_kwh: f64,
    pub total_kwh: f64,
    pub avg_monthly_kwh: f64,
    pub avg_daily_kwh: f64,
    pub days_in_year: u16,
    pub months_present: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyReport {
    pub year: i32,
    pub filter: ReportFilter,
    /// Months with data only, in calendar order.
    pub months: Vec<MonthBreakdown>,
    pub summary: YearlySummary,
}

#[derive(Default)]
struct MonthAccumulator<'a> {
    month: Option<ReportingMonth>,
    primary_kw: f64,
    redundant_kw: f64,
    count: usize,
    datacenters: BTreeSet<&'a str>,
}

/// Month-by-month energy usage for `year`.
///
/// Returns `LedgerError::NoData` when nothing matches.
pub fn generate_yearly_report(
    store: &EntryStore,
    filter: &ReportFilter,
    year: i32,
) -> Result<YearlyReport, LedgerError> {
    let year = ReportingMonth::check_year(year)?;
    let selected = filter.select(store, |e| e.date.year() == year);
    if selected.is_empty() {
        return Err(LedgerError::NoData(format!(
            "no readings for {} in {year}",
            filter.describe()
        )));
    }

    // Indexed by calendar month, so iteration order is Jan..Dec.
    let mut buckets: [MonthAccumulator<'_>; 12] = Default::default();
    for tagged in &selected {
        let e = tagged.entry;
        let bucket = &mut buckets[e.date.month() as usize - 1];
        bucket.month = Some(e.date);
        bucket.primary_kw += e.primary_kw;
        bucket.redundant_kw += e.redundant_kw;
        bucket.count += 1;
        bucket.datacenters.insert(tagged.datacenter);
    }

    let months: Vec<MonthBreakdown> = buckets
        .into_iter()
        .filter_map(|acc| {
            let month = acc.month?;
            let n = acc.count as f64;
            let avg_primary_kw = acc.primary_kw / n;
            let avg_redundant_kw = acc.redundant_kw / n;
            let days = month.days_in_month();
            let primary_kwh = energy_kwh(avg_primary_kw, days);
            let redundant_kwh = energy_kwh(avg_redundant_kw, days);
            let total_kwh = primary_kwh + redundant_kwh;

            Some(MonthBreakdown {
                month,
                entry_count: acc.count,
                datacenters: acc.datacenters.into_iter().map(str::to_string).collect(),
                avg_primary_kw,
                avg_redundant_kw,
                days_in_month: days,
                primary_kwh: round2(primary_kwh),
                redundant_kwh: round2(redundant_kwh),
                total_kwh: round2(total_kwh),
                avg_daily_kwh: round2(total_kwh / f64::from(days)),
            })
        })
        .collect();

    let total_primary_kwh = round2(months.iter().map(|m| m.primary_kwh).sum());
    let total_redundant_kwh = round2(months.iter().map(|m| m.redundant_kwh).sum());
    let total_kwh = round2(months.iter().map(|m| m.total_kwh).sum());
    let year_days = days_in_year(year);
    let summary = YearlySummary {
        total_primary_kwh,
        total_redundant_kwh,
        total_kwh,
        avg_monthly_kwh: round2(total_kwh / months.len() as f64),
        avg_daily_kwh: round2(total_kwh / f64::from(year_days)),
        days_in_year: year_days,
        months_present: months.len(),
    };

    tracing::debug!(year, months = months.len(), total_kwh, "yearly report generated");

    Ok(YearlyReport {
        year,
        filter: filter.clone(),
        months,
        summary,
    })
}

impl fmt::Display for YearlyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Yearly report for {} ({})", self.year, self.filter.describe())?;
        writeln!(
            f,
            "{:<10} {:<24} {:>12} {:>12} {:>14} {:>14}",
            "Month", "Datacenters", "Total kWh", "Primary kWh", "Redundant kWh", "Daily Avg kWh"
        )?;
        for m in &self.months {
            let datacenters: Vec<&str> = m.datacenters.iter().map(String::as_str).collect();
            writeln!(
                f,
                "{:<10} {:<24} {:>12.2} {:>12.2} {:>14.2} {:>14.2}",
                format!("{} {}", m.month.abbreviation(), self.year),
                datacenters.join(", "),
                m.total_kwh,
                m.primary_kwh,
                m.redundant_kwh,
                m.avg_daily_kwh
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Total Yearly Usage: {:.2} kWh", self.summary.total_kwh)?;
        writeln!(f, "Average Monthly Usage: {:.2} kWh", self.summary.avg_monthly_kwh)?;
        writeln!(f, "Average Daily Usage: {:.2} kWh", self.summary.avg_daily_kwh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_client::domain::{PowerEntry, ValidationError};
    use time::Month;

    fn entry(date: &str, primary_kw: f64, redundant_kw: f64) -> PowerEntry {
        PowerEntry {
            supplier: "Acme".to_string(),
            primary_kw,
            redundant_kw,
            ..PowerEntry::blank(date.parse().unwrap())
        }
    }

    #[test]
    fn averages_same_month_entries_and_skips_empty_months() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", 10.0, 0.0)).unwrap();
        store.add_entry("DC1", entry("Jan-24", 20.0, 0.0)).unwrap();
        store.add_entry("DC1", entry("Mar-24", 1.0, 0.0)).unwrap();

        let report = generate_yearly_report(&store, &ReportFilter::from("DC1"), 2024).unwrap();

        assert_eq!(report.months.len(), 2);
        let jan = &report.months[0];
        assert_eq!(jan.month.month(), Month::January);
        assert_eq!(jan.entry_count, 2);
        assert_eq!(jan.avg_primary_kw, 15.0);
        assert_eq!(jan.primary_kwh, 15.0 * 24.0 * 31.0);
        assert!(report.months.iter().all(|m| m.month.month() != Month::February));
    }

    #[test]
    fn months_sorted_in_calendar_order() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Dec-24", 1.0, 0.0)).unwrap();
        store.add_entry("DC1", entry("Apr-24", 1.0, 0.0)).unwrap();
        store.add_entry("DC1", entry("Jan-24", 1.0, 0.0)).unwrap();

        let report = generate_yearly_report(&store, &ReportFilter::from("DC1"), 2024).unwrap();
        let order: Vec<&str> = report.months.iter().map(|m| m.month.abbreviation()).collect();
        assert_eq!(order, ["Jan", "Apr", "Dec"]);
    }

    #[test]
    fn pools_datacenters_under_all_scope() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jun-23", 2.0, 1.0)).unwrap();
        store.add_entry("DC2", entry("Jun-23", 4.0, 3.0)).unwrap();
        store.add_entry("DC2", entry("Jun-24", 100.0, 0.0)).unwrap();

        let report = generate_yearly_report(&store, &ReportFilter::from("all"), 2023).unwrap();
        assert_eq!(report.months.len(), 1);
        let jun = &report.months[0];
        assert_eq!(jun.avg_primary_kw, 3.0);
        assert_eq!(jun.avg_redundant_kw, 2.0);
        assert_eq!(jun.total_kwh, 5.0 * 24.0 * 30.0);
        assert_eq!(jun.avg_daily_kwh, 120.0);
        assert_eq!(jun.datacenters.iter().collect::<Vec<_>>(), ["DC1", "DC2"]);
    }

    #[test]
    fn summary_uses_leap_year_length() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", 1.0, 0.0)).unwrap();
        store.add_entry("DC1", entry("Feb-24", 1.0, 1.0)).unwrap();

        let report = generate_yearly_report(&store, &ReportFilter::from("DC1"), 2024).unwrap();
        let s = &report.summary;
        assert_eq!(s.total_primary_kwh, 744.0 + 696.0);
        assert_eq!(s.total_redundant_kwh, 696.0);
        assert_eq!(s.total_kwh, 2136.0);
        assert_eq!(s.months_present, 2);
        assert_eq!(s.avg_monthly_kwh, 1068.0);
        assert_eq!(s.days_in_year, 366);
        assert_eq!(s.avg_daily_kwh, round2(2136.0 / 366.0));
    }

    #[test]
    fn missing_year_is_no_data() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", 1.0, 0.0)).unwrap();

        let err = generate_yearly_report(&store, &ReportFilter::from("DC1"), 2025).unwrap_err();
        assert!(err.is_informational());
    }

    #[test]
    fn unsupported_year_is_a_validation_error() {
        let err = generate_yearly_report(&EntryStore::new(), &ReportFilter::from("all"), 1924)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::YearOutOfRange(1924))
        ));
    }

    #[test]
    fn renders_summary_text() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", 1.0, 0.0)).unwrap();

        let text = generate_yearly_report(&store, &ReportFilter::from("DC1"), 2024)
            .unwrap()
            .to_string();
        assert!(text.contains("Jan 2024"));
        assert!(text.contains("Total Yearly Usage: 744.00 kWh"));
    }

    #[test]
    fn serializes_months_and_summary() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", 10.0, 0.0)).unwrap();

        let report = generate_yearly_report(&store, &ReportFilter::from("all"), 2024).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["year"], 2024);
        assert_eq!(value["filter"]["datacenter"], "all");
        assert_eq!(value["months"][0]["month"], "Jan-24");
        assert_eq!(value["months"][0]["datacenters"][0], "DC1");
        assert_eq!(value["summary"]["daysInYear"], 366);
    }
}
