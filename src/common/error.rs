use crate::infrastructure::filesystem::ConfigStoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while wiring the adapter from a configuration file.
///
/// Operations past that point report their own seam errors (`ApiError`,
/// `MirrorFetchError`, `ScmError`) or, for resolution, never fail.
#[derive(Error, Debug)]
pub enum BbsError {
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: ConfigStoreError,
    },

    #[error("Network operation failed: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: reqwest::Error,
    },
}

impl BbsError {
    pub fn config_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: ConfigStoreError,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            path,
            source,
        }
    }

    pub fn network_error_with_source(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::NetworkError {
            message: message.into(),
            source,
        }
    }

    /// Configuration file the error refers to, if known
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::ConfigError { path, .. } => path.as_ref(),
            Self::NetworkError { .. } => None,
        }
    }
}

impl From<ConfigStoreError> for BbsError {
    fn from(error: ConfigStoreError) -> Self {
        let path = match &error {
            ConfigStoreError::ConfigFileNotFound(path) | ConfigStoreError::ReadFailed { path, .. } => {
                Some(PathBuf::from(path))
            }
            _ => None,
        };
        Self::config_error_with_source("Configuration could not be loaded", path, error)
    }
}

impl From<reqwest::Error> for BbsError {
    fn from(error: reqwest::Error) -> Self {
        Self::network_error_with_source("HTTP client could not be created", error)
    }
}
