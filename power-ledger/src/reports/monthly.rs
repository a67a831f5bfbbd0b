use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use ledger_client::{db::EntryStore, domain::ReportingMonth};

use super::{energy_kwh, round2, ReportFilter};
use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRow {
    pub datacenter: String,
    pub date: ReportingMonth,
    pub supplier: String,
    pub cabinet_rack: String,
    pub circuit: String,
    pub primary_kw: f64,
    pub redundant_kw: f64,
    pub primary_kwh: f64,
    pub redundant_kwh: f64,
    pub total_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub total_usage_kwh: f64,
    pub avg_daily_kwh: f64,
    pub circuit_count: usize,
}

/// Per-datacenter totals for the comparison breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterUsage {
    pub datacenter: String,
    pub total_kwh: f64,
    pub primary_kwh: f64,
    pub redundant_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub month: ReportingMonth,
    pub filter: ReportFilter,
    pub days_in_month: u8,
    pub rows: Vec<MonthlyRow>,
    pub summary: MonthlySummary,
    pub by_datacenter: Vec<DatacenterUsage>,
}

/// Energy usage for every entry recorded against `month`.
///
/// Returns `LedgerError::NoData` when nothing matches.
pub fn generate_monthly_report(
    store: &EntryStore,
    filter: &ReportFilter,
    month: ReportingMonth,
) -> Result<MonthlyReport, LedgerError> {
    let selected = filter.select(store, |e| e.date == month);
    if selected.is_empty() {
        return Err(LedgerError::NoData(format!(
            "no readings for {} in {month}",
            filter.describe()
        )));
    }

    let days = month.days_in_month();
    let rows: Vec<MonthlyRow> = selected
        .iter()
        .map(|tagged| {
            let e = tagged.entry;
            let primary_kwh = energy_kwh(e.primary_kw, days);
            let redundant_kwh = energy_kwh(e.redundant_kw, days);
            MonthlyRow {
                datacenter: tagged.datacenter.to_string(),
                date: e.date,
                supplier: e.supplier.clone(),
                cabinet_rack: e.cabinet_rack.clone(),
                circuit: e.circuit.clone(),
                primary_kw: e.primary_kw,
                redundant_kw: e.redundant_kw,
                primary_kwh: round2(primary_kwh),
                redundant_kwh: round2(redundant_kwh),
                total_kwh: round2(primary_kwh + redundant_kwh),
            }
        })
        .collect();

    let total_usage_kwh = round2(rows.iter().map(|r| r.total_kwh).sum());
    let summary = MonthlySummary {
        total_usage_kwh,
        avg_daily_kwh: round2(total_usage_kwh / f64::from(days)),
        circuit_count: rows.len(),
    };

    let mut groups: BTreeMap<&str, DatacenterUsage> = BTreeMap::new();
    for row in &rows {
        let group = groups
            .entry(row.datacenter.as_str())
            .or_insert_with(|| DatacenterUsage {
                datacenter: row.datacenter.clone(),
                total_kwh: 0.0,
                primary_kwh: 0.0,
                redundant_kwh: 0.0,
            });
        group.total_kwh += row.total_kwh;
        group.primary_kwh += row.primary_kwh;
        group.redundant_kwh += row.redundant_kwh;
    }
    let by_datacenter = groups
        .into_values()
        .map(|g| DatacenterUsage {
            total_kwh: round2(g.total_kwh),
            primary_kwh: round2(g.primary_kwh),
            redundant_kwh: round2(g.redundant_kwh),
            ..g
        })
        .collect();

    tracing::debug!(
        %month,
        rows = rows.len(),
        total_kwh = total_usage_kwh,
        "monthly report generated"
    );

    Ok(MonthlyReport {
        month,
        filter: filter.clone(),
        days_in_month: days,
        rows,
        summary,
        by_datacenter,
    })
}

impl fmt::Display for MonthlyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Monthly report for {} ({})", self.month, self.filter.describe())?;
        writeln!(
            f,
            "{:<8} {:<16} {:<16} {:<14} {:<12} {:>12} {:>12} {:>14}",
            "Date",
            "Datacenter",
            "Supplier",
            "Cabinet/Rack",
            "Circuit",
            "Total kWh",
            "Primary kWh",
            "Redundant kWh"
        )?;
        for r in &self.rows {
            writeln!(
                f,
                "{:<8} {:<16} {:<16} {:<14} {:<12} {:>12.2} {:>12.2} {:>14.2}",
                r.date.to_string(),
                r.datacenter,
                r.supplier,
                r.cabinet_rack,
                r.circuit,
                r.total_kwh,
                r.primary_kwh,
                r.redundant_kwh
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Total Usage: {:.2} kWh", self.summary.total_usage_kwh)?;
        writeln!(f, "Average Daily Usage: {:.2} kWh", self.summary.avg_daily_kwh)?;
        writeln!(f, "Number of Circuits: {}", self.summary.circuit_count)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<16} {:>12} {:>12} {:>14}",
            "Datacenter", "Total kWh", "Primary kWh", "Redundant kWh"
        )?;
        for g in &self.by_datacenter {
            writeln!(
                f,
                "{:<16} {:>12.2} {:>12.2} {:>14.2}",
                g.datacenter, g.total_kwh, g.primary_kwh, g.redundant_kwh
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_client::domain::PowerEntry;

    fn entry(date: &str, supplier: &str, primary_kw: f64, redundant_kw: f64) -> PowerEntry {
        PowerEntry {
            supplier: supplier.to_string(),
            cabinet_rack: "R1".to_string(),
            circuit: "C1".to_string(),
            primary_kw,
            redundant_kw,
            ..PowerEntry::blank(date.parse().unwrap())
        }
    }

    fn month(raw: &str) -> ReportingMonth {
        ReportingMonth::parse_year_month(raw).unwrap()
    }

    #[test]
    fn converts_kw_to_kwh_for_single_entry() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", "Acme", 10.0, 5.0)).unwrap();

        let report =
            generate_monthly_report(&store, &ReportFilter::from("DC1"), month("2024-01")).unwrap();

        assert_eq!(report.days_in_month, 31);
        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.primary_kwh, 7440.0);
        assert_eq!(row.redundant_kwh, 3720.0);
        assert_eq!(row.total_kwh, 11160.0);
        assert_eq!(report.summary.total_usage_kwh, 11160.0);
        assert_eq!(report.summary.avg_daily_kwh, 360.0);
        assert_eq!(report.summary.circuit_count, 1);
    }

    #[test]
    fn matches_only_the_exact_month() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", "Acme", 1.0, 0.0)).unwrap();
        store.add_entry("DC1", entry("Jan-25", "Acme", 1.0, 0.0)).unwrap();
        store.add_entry("DC1", entry("Feb-24", "Acme", 1.0, 0.0)).unwrap();

        let report =
            generate_monthly_report(&store, &ReportFilter::from("DC1"), month("2024-01")).unwrap();
        assert_eq!(report.summary.circuit_count, 1);
    }

    #[test]
    fn leap_february_uses_29_days() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Feb-24", "Acme", 1.0, 1.0)).unwrap();

        let report =
            generate_monthly_report(&store, &ReportFilter::from("DC1"), month("2024-02")).unwrap();
        assert_eq!(report.days_in_month, 29);
        assert_eq!(report.rows[0].total_kwh, 1392.0);
    }

    #[test]
    fn all_scope_groups_by_datacenter_without_mixing_tags() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", "Acme", 1.0, 0.5)).unwrap();
        store.add_entry("DC1", entry("Jan-24", "Volt", 2.0, 0.0)).unwrap();
        store.add_entry("DC2", entry("Jan-24", "Acme", 4.0, 1.0)).unwrap();

        let report =
            generate_monthly_report(&store, &ReportFilter::from("all"), month("2024-01")).unwrap();

        let tags: Vec<(&str, &str)> = report
            .rows
            .iter()
            .map(|r| (r.datacenter.as_str(), r.supplier.as_str()))
            .collect();
        assert_eq!(tags, [("DC1", "Acme"), ("DC1", "Volt"), ("DC2", "Acme")]);

        assert_eq!(report.by_datacenter.len(), 2);
        let dc1 = &report.by_datacenter[0];
        assert_eq!(dc1.datacenter, "DC1");
        assert_eq!(dc1.primary_kwh, 2232.0);
        assert_eq!(dc1.redundant_kwh, 372.0);
        assert_eq!(dc1.total_kwh, 2604.0);
        let dc2 = &report.by_datacenter[1];
        assert_eq!(dc2.datacenter, "DC2");
        assert_eq!(dc2.total_kwh, 3720.0);

        assert_eq!(report.summary.total_usage_kwh, 6324.0);
    }

    #[test]
    fn supplier_filter_narrows_rows() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", "Acme", 1.0, 0.0)).unwrap();
        store.add_entry("DC1", entry("Jan-24", "Volt", 2.0, 0.0)).unwrap();

        let filter = ReportFilter::from("all").with_supplier("Volt");
        let report = generate_monthly_report(&store, &filter, month("2024-01")).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].supplier, "Volt");
    }

    #[test]
    fn empty_selection_is_no_data() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", "Acme", 1.0, 0.0)).unwrap();

        let err = generate_monthly_report(&store, &ReportFilter::from("DC2"), month("2024-01"))
            .unwrap_err();
        assert!(err.is_informational());

        let err = generate_monthly_report(&store, &ReportFilter::from("DC1"), month("2024-03"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoData(_)));
    }

    #[test]
    fn renders_summary_text() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", "Acme", 10.0, 5.0)).unwrap();

        let text = generate_monthly_report(&store, &ReportFilter::from("DC1"), month("2024-01"))
            .unwrap()
            .to_string();
        assert!(text.contains("Monthly report for Jan-24"));
        assert!(text.contains("Total Usage: 11160.00 kWh"));
        assert!(text.contains("Number of Circuits: 1"));
    }

    #[test]
    fn serializes_for_the_ui_layer() {
        let mut store = EntryStore::new();
        store.add_entry("DC1", entry("Jan-24", "Acme", 10.0, 5.0)).unwrap();

        let report =
            generate_monthly_report(&store, &ReportFilter::from("DC1"), month("2024-01")).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["month"], "Jan-24");
        assert_eq!(value["filter"]["datacenter"], "DC1");
        assert_eq!(value["daysInMonth"], 31);
        assert_eq!(value["summary"]["totalUsageKwh"], 11160.0);
        assert_eq!(value["rows"][0]["cabinetRack"], "R1");
        assert_eq!(value["byDatacenter"][0]["datacenter"], "DC1");
    }
}
