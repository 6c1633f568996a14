//! Error types for the compose model

/// Errors while loading, storing or addressing a compose document
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Document text is not valid YAML (or does not fit the document shape)
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Document text is not valid JSON (or does not fit the document shape)
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Resource kind name not recognized
    #[error("unknown resource kind: '{0}' (expected volume, network, config or secret)")]
    UnknownResourceKind(String),
}
