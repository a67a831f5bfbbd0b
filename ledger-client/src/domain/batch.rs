use super::{power_entry::sanitize_reading, PowerEntry, ReportingMonth, ValidationError};

/// One row of the data-entry form, before the shared datacenter/supplier is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRow {
    pub date: ReportingMonth,
    pub cabinet_rack: String,
    pub circuit: String,
    pub primary_kw: f64,
    pub primary_a: f64,
    pub redundant_kw: f64,
    pub redundant_a: f64,
    pub notes: String,
}

impl EntryRow {
    pub fn blank(date: ReportingMonth) -> Self {
        Self {
            date,
            cabinet_rack: String::new(),
            circuit: String::new(),
            primary_kw: 0.0,
            primary_a: 0.0,
            redundant_kw: 0.0,
            redundant_a: 0.0,
            notes: String::new(),
        }
    }
}

/// A set of form rows saved together for one datacenter and supplier.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryBatch {
    pub datacenter: String,
    pub supplier: String,
    pub rows: Vec<EntryRow>,
}

impl EntryBatch {
    /// Validate the batch and turn every row into a `PowerEntry` stamped with
    /// the batch supplier.
    pub fn into_entries(self) -> Result<(String, Vec<PowerEntry>), ValidationError> {
        let datacenter = self.datacenter.trim().to_string();
        if datacenter.is_empty() {
            return Err(ValidationError::MissingDatacenter);
        }
        let supplier = self.supplier.trim().to_string();
        if supplier.is_empty() {
            return Err(ValidationError::MissingSupplier);
        }
        if self.rows.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }

        let entries = self
            .rows
            .into_iter()
            .map(|row| PowerEntry {
                date: row.date,
                supplier: supplier.clone(),
                cabinet_rack: row.cabinet_rack.trim().to_string(),
                circuit: row.circuit.trim().to_string(),
                primary_kw: sanitize_reading(row.primary_kw),
                primary_a: sanitize_reading(row.primary_a),
                redundant_kw: sanitize_reading(row.redundant_kw),
                redundant_a: sanitize_reading(row.redundant_a),
                notes: row.notes,
            })
            .collect();

        Ok((datacenter, entries))
    }
}

/// Blank rows for `month_count` consecutive months starting at `start_month`
/// (`YYYY-MM`), repeated `rack_count` times per month.
pub fn template_rows(
    start_month: &str,
    month_count: usize,
    rack_count: usize,
) -> Result<Vec<EntryRow>, ValidationError> {
    let start = ReportingMonth::parse_year_month(start_month)?;
    let racks = rack_count.max(1);

    Ok(ReportingMonth::series(start, month_count)
        .into_iter()
        .flat_map(|month| std::iter::repeat_with(move || EntryRow::blank(month)).take(racks))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str) -> EntryRow {
        EntryRow {
            cabinet_rack: " R1 ".to_string(),
            circuit: "C1".to_string(),
            primary_kw: 4.0,
            redundant_kw: -1.0,
            ..EntryRow::blank(date.parse().unwrap())
        }
    }

    #[test]
    fn batch_stamps_supplier_on_every_row() {
        let batch = EntryBatch {
            datacenter: " DC1 ".to_string(),
            supplier: "Acme".to_string(),
            rows: vec![row("Jan-24"), row("Feb-24")],
        };

        let (dc, entries) = batch.into_entries().unwrap();
        assert_eq!(dc, "DC1");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.supplier == "Acme"));
        assert_eq!(entries[0].cabinet_rack, "R1");
        assert_eq!(entries[1].redundant_kw, 0.0);
    }

    #[test]
    fn batch_requires_datacenter_supplier_and_rows() {
        let base = EntryBatch {
            datacenter: "DC1".to_string(),
            supplier: "Acme".to_string(),
            rows: vec![row("Jan-24")],
        };

        let no_dc = EntryBatch { datacenter: "  ".to_string(), ..base.clone() };
        assert_eq!(no_dc.into_entries(), Err(ValidationError::MissingDatacenter));

        let no_supplier = EntryBatch { supplier: String::new(), ..base.clone() };
        assert_eq!(no_supplier.into_entries(), Err(ValidationError::MissingSupplier));

        let no_rows = EntryBatch { rows: Vec::new(), ..base };
        assert_eq!(no_rows.into_entries(), Err(ValidationError::EmptyBatch));
    }

    #[test]
    fn template_rows_repeat_per_rack() {
        let rows = template_rows("2024-12", 2, 3).unwrap();
        let dates: Vec<String> = rows.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, ["Dec-24", "Dec-24", "Dec-24", "Jan-25", "Jan-25", "Jan-25"]);
    }

    #[test]
    fn template_rows_clamp_rack_count() {
        assert_eq!(template_rows("2024-01", 3, 0).unwrap().len(), 3);
    }

    #[test]
    fn template_rows_reject_bad_start_month() {
        assert!(matches!(
            template_rows("next month", 1, 1),
            Err(ValidationError::YearMonth(_))
        ));
    }
}
