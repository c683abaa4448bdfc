//! Error types shared by the core and its host collaborators

use std::path::PathBuf;

use thiserror::Error;

use crate::model::DocumentPath;

/// Failures reported by a [`Corpus`](crate::Corpus) implementation.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("document not found: {0}")]
    NotFound(DocumentPath),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: DocumentPath,
        #[source]
        source: std::io::Error,
    },
    #[error("document is not valid UTF-8 text: {0}")]
    NotText(DocumentPath),
    #[error("{0}")]
    Other(String),
}

impl CorpusError {
    pub fn io(path: &DocumentPath, source: std::io::Error) -> Self {
        CorpusError::Io {
            path: path.clone(),
            source,
        }
    }
}

/// Configuration failures.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("backup is enabled but no backup destination is configured")]
    MissingBackupDestination,
}
