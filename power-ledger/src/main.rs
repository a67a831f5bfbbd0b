use anyhow::{bail, Context, Result};
use ledger_client::{
    db::FileStorage,
    domain::{parse_reading, template_rows, DatacenterFilter, EntryBatch, EntryRow, ReportingMonth},
};
use power_ledger::{
    codec::{DataFormat, ImportMode},
    config::AppConfig,
    observability,
    reports::ReportFilter,
    LedgerError, PowerLedger,
};
use std::{env, fmt::Display, fs, path::Path};

const USAGE: &str = "usage: power-ledger <command> [args]

commands:
  add <datacenter> <supplier> <month> <cabinet> <circuit> <primary_kw> <primary_a> <redundant_kw> <redundant_a> [notes]
  add-series <datacenter> <supplier> <start YYYY-MM> <months> <cabinet> <circuit> <primary_kw> <primary_a> <redundant_kw> <redundant_a> [notes]
  monthly <datacenter|all> <YYYY-MM> [supplier]
  yearly <datacenter|all> <YYYY> [supplier]
  metadata
  export <json|csv> <datacenter|all> [output_dir]
  import <file.json|file.csv> [--replace]";

type Ledger = PowerLedger<FileStorage>;

/// Accepts either a `Mon-YY` token or `YYYY-MM`.
fn parse_month(raw: &str) -> Result<ReportingMonth, LedgerError> {
    ReportingMonth::parse_token(raw)
        .or_else(|_| ReportingMonth::parse_year_month(raw))
        .map_err(LedgerError::from)
}

struct Readings<'a> {
    cabinet: &'a str,
    circuit: &'a str,
    values: [f64; 4],
    notes: &'a str,
}

impl<'a> Readings<'a> {
    /// `<cabinet> <circuit> <primary_kw> <primary_a> <redundant_kw> <redundant_a> [notes]`
    fn parse(args: &'a [String]) -> Result<Self> {
        if args.len() < 6 {
            bail!(USAGE);
        }
        Ok(Self {
            cabinet: &args[0],
            circuit: &args[1],
            values: [
                parse_reading(&args[2]),
                parse_reading(&args[3]),
                parse_reading(&args[4]),
                parse_reading(&args[5]),
            ],
            notes: args.get(6).map(String::as_str).unwrap_or(""),
        })
    }

    fn to_row(&self, date: ReportingMonth) -> EntryRow {
        let [primary_kw, primary_a, redundant_kw, redundant_a] = self.values;
        EntryRow {
            cabinet_rack: self.cabinet.to_string(),
            circuit: self.circuit.to_string(),
            primary_kw,
            primary_a,
            redundant_kw,
            redundant_a,
            notes: self.notes.to_string(),
            ..EntryRow::blank(date)
        }
    }
}

fn print_report<T: Display>(title: &str, result: Result<T, LedgerError>) -> Result<()> {
    match result {
        Ok(report) => {
            println!("{title}\n");
            print!("{report}");
            Ok(())
        }
        Err(e) if e.is_informational() => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn report_filter(datacenter: &str, supplier: Option<&String>) -> ReportFilter {
    let filter = ReportFilter::from(datacenter);
    match supplier {
        Some(s) => filter.with_supplier(s),
        None => filter,
    }
}

fn print_metadata(ledger: &Ledger) {
    let index = ledger.metadata();
    let join = |set: &std::collections::BTreeSet<String>| {
        set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    };

    println!("Datacenters: {}", join(&index.datacenters));
    println!("Suppliers:   {}", join(&index.suppliers));
    println!("Cabinets:    {}", join(&index.cabinets));
    println!("Circuits:    {}", join(&index.circuits));
    let years: Vec<String> = index.years.iter().map(i32::to_string).collect();
    println!("Years:       {}", years.join(", "));

    for (supplier, datacenters) in &index.relationships.supplier_datacenters {
        println!("supplier {supplier}: {}", join(datacenters));
    }
    for (datacenter, cabinets) in &index.relationships.datacenter_cabinets {
        println!("datacenter {datacenter}: {}", join(cabinets));
    }
    for (cabinet, circuits) in &index.relationships.cabinet_circuits {
        println!("cabinet {cabinet}: {}", join(circuits));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!(USAGE);
    };

    let cfg = AppConfig::load()?;
    let storage = FileStorage::new(&cfg.storage.dir);
    let mut ledger = PowerLedger::open(storage, cfg.storage.key.clone())?;

    match (command.as_str(), rest) {
        ("add", [datacenter, supplier, month, readings @ ..]) => {
            let date = parse_month(month)?;
            let row = Readings::parse(readings)?.to_row(date);
            ledger.add_batch(EntryBatch {
                datacenter: datacenter.clone(),
                supplier: supplier.clone(),
                rows: vec![row],
            })?;
            println!("saved 1 entry for {datacenter}");
        }
        ("add-series", [datacenter, supplier, start, months, readings @ ..]) => {
            let months: usize = months
                .parse()
                .with_context(|| format!("invalid month count '{months}'"))?;
            let readings = Readings::parse(readings)?;
            let rows = template_rows(start, months, 1)?
                .into_iter()
                .map(|row| readings.to_row(row.date))
                .collect();
            let saved = ledger.add_batch(EntryBatch {
                datacenter: datacenter.clone(),
                supplier: supplier.clone(),
                rows,
            })?;
            println!("saved {saved} entries for {datacenter}");
        }
        ("monthly", [datacenter, month, supplier @ ..]) => {
            let month = ReportingMonth::parse_year_month(month).map_err(LedgerError::from)?;
            let filter = report_filter(datacenter, supplier.first());
            print_report(&cfg.report.title, ledger.monthly_report(&filter, month))?;
        }
        ("yearly", [datacenter, year, supplier @ ..]) => {
            let year: i32 = year
                .parse()
                .with_context(|| format!("invalid year '{year}'"))?;
            let filter = report_filter(datacenter, supplier.first());
            print_report(&cfg.report.title, ledger.yearly_report(&filter, year))?;
        }
        ("metadata", []) => print_metadata(&ledger),
        ("export", [format, datacenter, out_dir @ ..]) => {
            let format: DataFormat = format.parse()?;
            let filter = DatacenterFilter::from(datacenter.as_str());
            let content = ledger.export(format, &filter, cfg.export.pretty_json)?;
            match out_dir.first() {
                Some(dir) => {
                    let path = Path::new(dir).join(cfg.export_file_name(format));
                    fs::write(&path, content)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), %format, "export written");
                    println!("exported to {}", path.display());
                }
                None => print!("{content}"),
            }
        }
        ("import", [file, flags @ ..]) => {
            let mode = match flags {
                [] => ImportMode::Merge,
                [flag] if flag == "--replace" => ImportMode::Replace,
                _ => bail!(USAGE),
            };
            let summary = ledger.import_file(Path::new(file), mode).await?;
            println!(
                "imported {} entries into {} datacenter(s), skipped {} row(s)",
                summary.entries_imported,
                summary.datacenters.len(),
                summary.rows_skipped
            );
            if summary.repeated {
                println!(
                    "warning: this file was already merged, its entries are now counted twice"
                );
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
