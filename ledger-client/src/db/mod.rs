pub mod entry_store;
pub mod kv_storage;

pub use entry_store::{DecodedStore, EntryStore};
pub use kv_storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};
