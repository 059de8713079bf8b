//! Error types for uvmake-core.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors. Every variant is fatal to the configuration pass.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, with the path that caused it.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed contributor file; includes file path and line context from serde_yaml.
    #[error("failed to parse contributor file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A directory in the configuration tree has no `uvmake.yaml`.
    #[error("contributor file not found at {path}")]
    ContributorNotFound { path: PathBuf },

    /// The same subdirectory was listed twice in the configuration tree.
    #[error("subdirectory {path} was already added to the configuration tree")]
    DuplicateSubdirectory { path: PathBuf },

    /// Both manifest modes were requested at once.
    #[error(
        "both a managed manifest ({managed}) and an unmanaged manifest ({unmanaged}) were given; choose one"
    )]
    ConflictingManifests { managed: PathBuf, unmanaged: PathBuf },

    /// A required initialization setting was not provided.
    #[error("missing required setting `{0}`")]
    MissingField(&'static str),

    /// A dev-dependency specifier the generated manifest cannot express.
    #[error("unsupported dev dependency specifier '{specifier}': {reason}")]
    UnsupportedSpecifier {
        specifier: String,
        reason: &'static str,
    },

    /// Canonical serialization of the accumulator failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
