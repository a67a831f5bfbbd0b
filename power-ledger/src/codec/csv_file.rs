use csv::{ReaderBuilder, StringRecord};
use ledger_client::{
    db::{DecodedStore, EntryStore},
    domain::{parse_reading, DatacenterFilter, PowerEntry, ReportingMonth},
};

/// Fixed column order for CSV export and import.
pub const CSV_HEADER: [&str; 10] = [
    "Datacenter",
    "Date",
    "Supplier",
    "Cabinet/Rack",
    "Circuit",
    "Primary kW",
    "Primary A",
    "Redundant kW",
    "Redundant A",
    "Notes",
];

fn needs_quotes(s: &str) -> bool {
    s.contains([',', '"', '\n', '\r'])
}

fn push_quoted(out: &mut String, value: &str) {
    out.push('"');
    out.push_str(&value.replace('"', "\"\""));
    out.push('"');
}

fn push_field(out: &mut String, value: &str) {
    if needs_quotes(value) {
        push_quoted(out, value);
    } else {
        out.push_str(value);
    }
    out.push(',');
}

fn push_number(out: &mut String, value: f64) {
    out.push_str(&value.to_string());
    out.push(',');
}

fn write_row(out: &mut String, datacenter: &str, e: &PowerEntry) {
    push_field(out, datacenter);
    push_field(out, &e.date.to_string());
    push_field(out, &e.supplier);
    push_field(out, &e.cabinet_rack);
    push_field(out, &e.circuit);
    push_number(out, e.primary_kw);
    push_number(out, e.primary_a);
    push_number(out, e.redundant_kw);
    push_number(out, e.redundant_a);
    // Notes are always quoted.
    push_quoted(out, &e.notes);
    out.push('\n');
}

/// Render the selected part of the store as header + one row per entry.
pub fn export_csv(store: &EntryStore, filter: &DatacenterFilter) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');
    for (datacenter, entries) in store.scoped(filter).iter() {
        for entry in entries {
            write_row(&mut out, datacenter, entry);
        }
    }
    out
}

fn strip_wrapping_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

fn record_to_entry(record: &StringRecord) -> Result<(String, PowerEntry), String> {
    if record.len() < CSV_HEADER.len() {
        return Err(format!(
            "expected {} fields, found {}",
            CSV_HEADER.len(),
            record.len()
        ));
    }
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let datacenter = field(0).trim();
    if datacenter.is_empty() {
        return Err("missing datacenter".to_string());
    }
    let date = ReportingMonth::parse_token(field(1)).map_err(|e| e.to_string())?;

    let entry = PowerEntry {
        date,
        supplier: field(2).to_string(),
        cabinet_rack: field(3).to_string(),
        circuit: field(4).to_string(),
        primary_kw: parse_reading(field(5)),
        primary_a: parse_reading(field(6)),
        redundant_kw: parse_reading(field(7)),
        redundant_a: parse_reading(field(8)),
        notes: strip_wrapping_quotes(field(9)).to_string(),
    };
    Ok((datacenter.to_string(), entry))
}

/// Read one physical line as a record. Quote state never crosses a line.
fn read_line(line: &str) -> Result<Option<StringRecord>, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    Ok(rdr.read_record(&mut record)?.then_some(record))
}

/// Decode a CSV import into a standalone store.
///
/// The first line is always treated as the header and every other non-blank
/// line is parsed on its own. Rows that are short, lack a datacenter or carry
/// an unparseable date are skipped and counted; they never fail the import.
/// Numeric fields that do not parse become `0`. Text fields keep their
/// whitespace.
pub fn decode_csv(text: &str) -> DecodedStore {
    let mut decoded = DecodedStore::default();
    for (idx, raw) in text.split('\n').enumerate().skip(1) {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            continue;
        }

        let added = read_line(line)
            .map_err(|e| e.to_string())
            .and_then(|record| record.ok_or_else(|| "empty record".to_string()))
            .and_then(|record| record_to_entry(&record))
            .and_then(|(datacenter, entry)| {
                decoded
                    .store
                    .add_entry(&datacenter, entry)
                    .map_err(|e| e.to_string())
            });
        if let Err(reason) = added {
            tracing::debug!(line = idx + 1, %reason, "skipping csv row");
            decoded.skipped += 1;
        }
    }

    if decoded.skipped > 0 {
        metrics::counter!("csv_import_rows_skipped_total").increment(decoded.skipped as u64);
    }
    decoded
}
