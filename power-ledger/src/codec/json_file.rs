use ledger_client::{
    db::{DecodedStore, EntryStore},
    domain::DatacenterFilter,
};

use crate::error::LedgerError;

/// Serialize the selected part of the store as a `{ datacenter: [entry] }` document.
pub fn export_json(
    store: &EntryStore,
    filter: &DatacenterFilter,
    pretty: bool,
) -> Result<String, LedgerError> {
    store
        .scoped(filter)
        .to_json(pretty)
        .map_err(|e| LedgerError::MalformedInput(format!("failed to encode json export: {e}")))
}

/// Decode a JSON import. A document that is not a JSON object aborts the
/// whole import; malformed values inside it are dropped and counted.
pub fn decode_json(text: &str) -> Result<DecodedStore, LedgerError> {
    EntryStore::decode_json(text).map_err(|e| {
        metrics::counter!("json_import_rejected_total").increment(1);
        LedgerError::MalformedInput(format!("invalid json document: {e}"))
    })
}
