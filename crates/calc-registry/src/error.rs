//! Registry error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading registry settings or accessing a shared registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid settings: {message}")]
    Invalid { message: String },

    #[error("registry lock poisoned")]
    Poisoned,
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
