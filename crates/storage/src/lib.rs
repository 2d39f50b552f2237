pub mod atomic;
pub mod error;
pub mod file;
pub mod memory;

pub use atomic::write_json_atomically;
pub use error::{StorageError, StorageResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Key/value port standing in for a browser-profile store.
///
/// Values are opaque strings; callers own their encoding. Implementations must
/// make every `set`/`remove` visible to the next `get` on the same store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}
