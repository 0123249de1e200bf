//! Infrastructure layer for braid
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the Ollama HTTP gateway, the SQLite conversation
//! store, the sysinfo telemetry probe, the model-preference file and
//! configuration file loading.

pub mod config;
pub mod ollama;
pub mod preferences;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig, FileOllamaConfig, FileStorageConfig, FileTelemetryConfig};
pub use ollama::{error::OllamaError, gateway::OllamaGateway};
pub use preferences::FilePreferences;
pub use store::sqlite::SqliteStore;
pub use telemetry::SysinfoProbe;
