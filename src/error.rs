// src/error.rs

use std::{io, path::PathBuf};
use thiserror::Error;

/// Every way a pipeline run can fail. All of them abort the run.
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed JSON payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unexpected input structure: {0}")]
    Structural(String),

    #[error("I/O on {path:?} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reference table has {count} rows for iso3 {iso3:?}")]
    JoinAmbiguity { iso3: String, count: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EtlError {
    pub fn structural(msg: impl Into<String>) -> Self {
        EtlError::Structural(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EtlError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
