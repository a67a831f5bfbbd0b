use std::{collections::HashSet, path::Path};

use ledger_client::{
    db::{EntryStore, KeyValueStore, StorageError},
    domain::{DatacenterFilter, EntryBatch, PowerEntry, ReportingMonth, TaggedEntry},
};
use once_cell::unsync::OnceCell;

use crate::{
    codec::{self, csv_file, json_file, DataFormat, ImportMode},
    error::LedgerError,
    metadata::{self, MetadataIndex},
    reports::{self, MonthlyReport, ReportFilter, YearlyReport},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub format: DataFormat,
    pub mode: ImportMode,
    pub entries_imported: usize,
    pub rows_skipped: usize,
    pub datacenters: Vec<String>,
    /// The same content was already merged earlier in this session.
    pub repeated: bool,
}

/// One session over the power data: the in-memory store, its write-through
/// persistence and the lazily rebuilt metadata index.
///
/// Every mutation clears the cached index and then persists the whole store.
/// A failed write is reported but the in-memory change is kept.
pub struct PowerLedger<S> {
    store: EntryStore,
    storage: S,
    storage_key: String,
    index: OnceCell<MetadataIndex>,
    imported: HashSet<blake3::Hash>,
}

impl<S: KeyValueStore> PowerLedger<S> {
    /// Load the store persisted under `storage_key`. Missing or unreadable
    /// data starts an empty session.
    pub fn open(storage: S, storage_key: impl Into<String>) -> Result<Self, LedgerError> {
        let storage_key = storage_key.into();
        let store = match storage.get(&storage_key)? {
            None => {
                tracing::info!(key = %storage_key, "no stored power data, starting empty");
                EntryStore::new()
            }
            Some(doc) => match EntryStore::decode_json(&doc) {
                Ok(decoded) => {
                    tracing::info!(
                        key = %storage_key,
                        entries = decoded.store.len(),
                        skipped = decoded.skipped,
                        "power data loaded"
                    );
                    decoded.store
                }
                Err(e) => {
                    tracing::warn!(
                        key = %storage_key,
                        error = %e,
                        "stored power data is unreadable, starting empty"
                    );
                    EntryStore::new()
                }
            },
        };

        Ok(Self {
            store,
            storage,
            storage_key,
            index: OnceCell::new(),
            imported: HashSet::new(),
        })
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn entries(&self, datacenter: &str) -> &[PowerEntry] {
        self.store.entries(datacenter)
    }

    pub fn select(&self, filter: &DatacenterFilter) -> Vec<TaggedEntry<'_>> {
        self.store.select(filter)
    }

    /// The metadata index for the current store, rebuilt on first use after a mutation.
    pub fn metadata(&self) -> &MetadataIndex {
        self.index.get_or_init(|| metadata::reindex(&self.store))
    }

    pub fn add_entry(&mut self, datacenter: &str, entry: PowerEntry) -> Result<(), LedgerError> {
        self.store.add_entry(datacenter, entry)?;
        metrics::counter!("ledger_entries_added_total").increment(1);
        self.commit()
    }

    /// Save a set of form rows. Nothing is stored unless the whole batch validates.
    pub fn add_batch(&mut self, batch: EntryBatch) -> Result<usize, LedgerError> {
        let (datacenter, entries) = batch.into_entries()?;
        let count = entries.len();
        for entry in entries {
            self.store.add_entry(&datacenter, entry)?;
        }
        metrics::counter!("ledger_entries_added_total").increment(count as u64);
        tracing::info!(%datacenter, count, "entries saved");
        self.commit()?;
        Ok(count)
    }

    pub fn monthly_report(
        &self,
        filter: &ReportFilter,
        month: ReportingMonth,
    ) -> Result<MonthlyReport, LedgerError> {
        reports::generate_monthly_report(&self.store, filter, month)
    }

    pub fn yearly_report(
        &self,
        filter: &ReportFilter,
        year: i32,
    ) -> Result<YearlyReport, LedgerError> {
        reports::generate_yearly_report(&self.store, filter, year)
    }

    pub fn export(
        &self,
        format: DataFormat,
        filter: &DatacenterFilter,
        pretty_json: bool,
    ) -> Result<String, LedgerError> {
        match format {
            DataFormat::Json => json_file::export_json(&self.store, filter, pretty_json),
            DataFormat::Csv => Ok(csv_file::export_csv(&self.store, filter)),
        }
    }

    /// Import file contents. An unparseable JSON document aborts before the
    /// store is touched; merged data is never deduplicated.
    pub fn import(
        &mut self,
        text: &str,
        format: DataFormat,
        mode: ImportMode,
    ) -> Result<ImportSummary, LedgerError> {
        let decoded = codec::decode(text, format)?;

        let first_time = self.imported.insert(blake3::hash(text.as_bytes()));
        let repeated = !first_time && mode == ImportMode::Merge;
        if repeated {
            tracing::warn!(
                %format,
                "identical content was already merged this session, its entries are now counted twice"
            );
        }

        let summary = ImportSummary {
            format,
            mode,
            entries_imported: decoded.store.len(),
            rows_skipped: decoded.skipped,
            datacenters: decoded.store.datacenter_names().map(str::to_string).collect(),
            repeated,
        };

        match mode {
            ImportMode::Merge => {
                self.store.merge_in(decoded.store);
            }
            ImportMode::Replace => self.store.replace_all(decoded.store),
        }
        tracing::info!(
            %format,
            ?mode,
            entries = summary.entries_imported,
            skipped = summary.rows_skipped,
            "import applied"
        );

        self.commit()?;
        Ok(summary)
    }

    /// Read an import file asynchronously, picking the format from its extension.
    pub async fn import_file(
        &mut self,
        path: &Path,
        mode: ImportMode,
    ) -> Result<ImportSummary, LedgerError> {
        let format = DataFormat::from_path(path)?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LedgerError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.import(&text, format, mode)
    }

    /// Write the whole store under the storage key.
    pub fn persist(&mut self) -> Result<(), LedgerError> {
        let doc = self.store.to_json(false).map_err(StorageError::from)?;
        if let Err(e) = self.storage.set(&self.storage_key, doc) {
            metrics::counter!("ledger_storage_write_failures_total").increment(1);
            tracing::warn!(
                key = %self.storage_key,
                error = %e,
                "failed to persist power data, keeping in-memory copy"
            );
            return Err(e.into());
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), LedgerError> {
        self.index.take();
        self.persist()
    }
}
