use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{DatacenterFilter, PowerEntry, TaggedEntry, ValidationError};

/// All recorded readings, partitioned by datacenter name.
///
/// Each datacenter keeps its entries in insertion order. Entries are never
/// edited or removed individually; the only bulk removal is `replace_all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EntryStore {
    datacenters: BTreeMap<String, Vec<PowerEntry>>,
}

/// Result of leniently decoding a store document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedStore {
    pub store: EntryStore,
    /// Datacenter values or entries that could not be decoded and were dropped.
    pub skipped: usize,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` to `datacenter`, creating the datacenter if needed.
    pub fn add_entry(
        &mut self,
        datacenter: &str,
        entry: PowerEntry,
    ) -> Result<(), ValidationError> {
        let datacenter = datacenter.trim();
        if datacenter.is_empty() {
            return Err(ValidationError::MissingDatacenter);
        }
        self.datacenters
            .entry(datacenter.to_string())
            .or_default()
            .push(entry);
        Ok(())
    }

    /// Entries for one datacenter; empty when the datacenter is unknown.
    pub fn entries(&self, datacenter: &str) -> &[PowerEntry] {
        self.datacenters
            .get(datacenter)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entries selected by `filter`, each tagged with its datacenter.
    pub fn select(&self, filter: &DatacenterFilter) -> Vec<TaggedEntry<'_>> {
        self.iter()
            .filter(|(dc, _)| filter.matches(dc))
            .flat_map(|(datacenter, entries)| {
                entries.iter().map(move |entry| TaggedEntry { datacenter, entry })
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PowerEntry])> {
        self.datacenters
            .iter()
            .map(|(dc, entries)| (dc.as_str(), entries.as_slice()))
    }

    pub fn datacenter_names(&self) -> impl Iterator<Item = &str> {
        self.datacenters.keys().map(String::as_str)
    }

    pub fn contains_datacenter(&self, datacenter: &str) -> bool {
        self.datacenters.contains_key(datacenter)
    }

    /// Total number of entries across all datacenters.
    pub fn len(&self) -> usize {
        self.datacenters.values().map(Vec::len).sum()
    }

    /// No entries anywhere, even if some datacenters are known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn replace_all(&mut self, store: EntryStore) {
        *self = store;
    }

    /// Append every incoming datacenter's entries after the existing ones.
    ///
    /// No deduplication happens: merging the same data twice stores it twice.
    /// Returns the number of entries appended.
    pub fn merge_in(&mut self, store: EntryStore) -> usize {
        let mut appended = 0;
        for (datacenter, entries) in store.datacenters {
            appended += entries.len();
            self.datacenters.entry(datacenter).or_default().extend(entries);
        }
        appended
    }

    /// A copy restricted to `filter`. A named datacenter that does not exist
    /// yields that name with no entries.
    pub fn scoped(&self, filter: &DatacenterFilter) -> EntryStore {
        match filter {
            DatacenterFilter::All => self.clone(),
            DatacenterFilter::Named(name) => {
                let mut datacenters = BTreeMap::new();
                datacenters.insert(name.clone(), self.entries(name).to_vec());
                EntryStore { datacenters }
            }
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Decode a `{ datacenter: [entry, ...] }` document.
    ///
    /// Only a document that is not a JSON object is an error. A datacenter whose
    /// value is not an array is kept with no entries, and entries that fail to
    /// decode are dropped; both are counted in `skipped`.
    pub fn decode_json(text: &str) -> Result<DecodedStore, serde_json::Error> {
        let raw: BTreeMap<String, Value> = serde_json::from_str(text)?;

        let mut decoded = DecodedStore::default();
        for (datacenter, value) in raw {
            let entries = decoded.store.datacenters.entry(datacenter.clone()).or_default();
            let Value::Array(items) = value else {
                tracing::warn!(
                    %datacenter,
                    "datacenter value is not a list of entries; skipping it"
                );
                decoded.skipped += 1;
                continue;
            };

            for item in items {
                match serde_json::from_value::<PowerEntry>(item) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => {
                        tracing::warn!(%datacenter, error = %e, "dropping malformed power entry");
                        decoded.skipped += 1;
                    }
                }
            }
        }

        if decoded.skipped > 0 {
            metrics::counter!("store_malformed_values_total").increment(decoded.skipped as u64);
        }
        Ok(decoded)
    }
}
