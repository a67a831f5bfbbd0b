use anyhow::{bail, Result};
use ledger_client::db::FileStorage;
use power_ledger::{codec::ImportMode, config::AppConfig, observability, PowerLedger};
use std::{env, path::Path};

/// Merge a batch of JSON/CSV exports into the persisted power data.
///
/// Every file is attempted; a file that fails to import is logged and the run
/// exits with an error once all files have been tried.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let files: Vec<String> = env::args().skip(1).collect();
    if files.is_empty() {
        bail!("usage: import_power_data <file.json|file.csv>...");
    }

    // POWER_LEDGER_CONFIG can point at a different storage directory.
    let cfg = AppConfig::load()?;
    let storage = FileStorage::new(&cfg.storage.dir);
    let mut ledger = PowerLedger::open(storage, cfg.storage.key.clone())?;

    let mut failed = 0usize;
    for file in &files {
        match ledger.import_file(Path::new(file), ImportMode::Merge).await {
            Ok(summary) => tracing::info!(
                file = %file,
                format = %summary.format,
                entries = summary.entries_imported,
                skipped = summary.rows_skipped,
                repeated = summary.repeated,
                "file imported"
            ),
            Err(e) => {
                tracing::error!(file = %file, error = %e, "file import failed");
                failed += 1;
            }
        }
    }

    tracing::info!(
        files = files.len(),
        failed,
        entries = ledger.store().len(),
        "import run finished"
    );
    if failed > 0 {
        bail!("{failed} of {} file(s) failed to import", files.len());
    }
    Ok(())
}
