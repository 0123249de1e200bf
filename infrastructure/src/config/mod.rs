//! Configuration loading.

mod file_config;
mod loader;

pub use file_config::{FileConfig, FileOllamaConfig, FileStorageConfig, FileTelemetryConfig};
pub use loader::ConfigLoader;
