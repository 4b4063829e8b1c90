use std::path::PathBuf;

/// Errors raised while turning configuration into a working counter.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The JSON binding attribute could not be decoded.
    #[error("malformed options: {0}")]
    MalformedOptions(#[from] serde_json::Error),
    /// The `target` option did not resolve to a control in the document.
    #[error("missing target control")]
    MissingTarget,
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
