//! Storage layer for atomic file operations.

mod atomic_json;
mod config_storage;
mod secret_storage;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
pub use config_storage::ConfigStorage;
pub use secret_storage::{SecretStorage, SecretStorageError};
