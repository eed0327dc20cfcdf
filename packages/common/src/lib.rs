pub mod config;
pub mod retry;
pub mod storage;

pub use config::{RetryConfig, StorageAppConfig, StorageBackend};
