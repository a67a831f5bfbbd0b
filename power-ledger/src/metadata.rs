//! Derived lookup sets that drive the dependent selection lists.
//!
//! The index is always recomputed from a store snapshot; nothing patches it
//! incrementally.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use ledger_client::db::EntryStore;

/// A cabinet scoped to its datacenter. Displays as `datacenter:cabinet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CabinetKey {
    pub datacenter: String,
    pub cabinet: String,
}

impl CabinetKey {
    pub fn new(datacenter: &str, cabinet: &str) -> Self {
        Self {
            datacenter: datacenter.to_string(),
            cabinet: cabinet.to_string(),
        }
    }
}

impl fmt::Display for CabinetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.datacenter, self.cabinet)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipMap {
    /// supplier -> datacenters it appears in
    pub supplier_datacenters: BTreeMap<String, BTreeSet<String>>,
    /// datacenter -> cabinets recorded in it
    pub datacenter_cabinets: BTreeMap<String, BTreeSet<String>>,
    /// datacenter:cabinet -> circuits recorded in it
    pub cabinet_circuits: BTreeMap<CabinetKey, BTreeSet<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataIndex {
    pub suppliers: BTreeSet<String>,
    pub datacenters: BTreeSet<String>,
    pub cabinets: BTreeSet<String>,
    pub circuits: BTreeSet<String>,
    /// Calendar years with at least one reading.
    pub years: BTreeSet<i32>,
    pub relationships: RelationshipMap,
}

fn names(set: Option<&BTreeSet<String>>) -> impl Iterator<Item = &str> {
    set.into_iter().flatten().map(String::as_str)
}

impl MetadataIndex {
    pub fn datacenters_for_supplier(&self, supplier: &str) -> impl Iterator<Item = &str> {
        names(self.relationships.supplier_datacenters.get(supplier))
    }

    pub fn cabinets_in(&self, datacenter: &str) -> impl Iterator<Item = &str> {
        names(self.relationships.datacenter_cabinets.get(datacenter))
    }

    pub fn circuits_in(&self, datacenter: &str, cabinet: &str) -> impl Iterator<Item = &str> {
        names(
            self.relationships
                .cabinet_circuits
                .get(&CabinetKey::new(datacenter, cabinet)),
        )
    }
}

/// Build the index from the current store contents.
///
/// Empty supplier, cabinet or circuit values contribute nothing. Circuits are
/// only attributed to a cabinet when the entry names one.
pub fn reindex(store: &EntryStore) -> MetadataIndex {
    let mut index = MetadataIndex::default();

    for (datacenter, entries) in store.iter() {
        index.datacenters.insert(datacenter.to_string());

        for entry in entries {
            index.years.insert(entry.date.year());

            if !entry.supplier.is_empty() {
                index.suppliers.insert(entry.supplier.clone());
                index
                    .relationships
                    .supplier_datacenters
                    .entry(entry.supplier.clone())
                    .or_default()
                    .insert(datacenter.to_string());
            }

            if !entry.cabinet_rack.is_empty() {
                index.cabinets.insert(entry.cabinet_rack.clone());
                index
                    .relationships
                    .datacenter_cabinets
                    .entry(datacenter.to_string())
                    .or_default()
                    .insert(entry.cabinet_rack.clone());
            }

            if !entry.circuit.is_empty() {
                index.circuits.insert(entry.circuit.clone());
                if !entry.cabinet_rack.is_empty() {
                    index
                        .relationships
                        .cabinet_circuits
                        .entry(CabinetKey::new(datacenter, &entry.cabinet_rack))
                        .or_default()
                        .insert(entry.circuit.clone());
                }
            }
        }
    }

    tracing::debug!(
        datacenters = index.datacenters.len(),
        suppliers = index.suppliers.len(),
        cabinets = index.cabinets.len(),
        circuits = index.circuits.len(),
        "metadata index rebuilt"
    );
    index
}
