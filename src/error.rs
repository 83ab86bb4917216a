// src/error.rs
// =============================================================================
// Error types for the library.
//
// Dead links, redirects and network failures are NOT errors here: they are
// results, reported as diagnostics. Only problems that stop a run before any
// link is checked (bad options, an HTTP client that cannot be built) end up
// in these enums.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the rule options
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read options file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse options file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base URI '{uri}': {source}")]
    InvalidBaseUri {
        uri: String,
        source: url::ParseError,
    },
}

/// Anything that prevents the rule from being set up
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
