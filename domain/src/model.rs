//! Inference model metadata

use serde::{Deserialize, Serialize};

/// A model installed on the inference backend (Value Object)
///
/// Read-only snapshot refreshed on demand; the client persists nothing
/// about models except the remembered selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Unique model name, e.g. `llama3:8b`.
    pub name: String,
    /// On-disk size in bytes.
    pub size: u64,
    /// Content digest reported by the backend.
    pub digest: String,
    /// Last-modified timestamp as reported by the backend.
    pub modified_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_deserializes_from_backend_json() {
        let json = r#"{
            "name": "llama3:8b",
            "size": 4661224676,
            "digest": "sha256:abc123",
            "modified_at": "2024-05-01T10:00:00Z"
        }"#;
        let model: ModelDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(model.name, "llama3:8b");
        assert_eq!(model.size, 4661224676);
    }
}
