/*
[INPUT]:  Storage backends and the connection store
[OUTPUT]: Persistence module exports
[POS]:    State layer - module root
[UPDATE]: When adding persistence components
*/

pub mod persisted;
pub mod storage;

pub use persisted::{ConnectionStore, LAST_CONNECTED_WALLET_KEY};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
