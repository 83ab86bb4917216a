// src/config.rs
// =============================================================================
// Options for the no-dead-link rule.
//
// Options can come from a JSON file and from command-line flags. The JSON
// keys follow the usual lint-config spelling:
//
//   {
//     "checkRelative": true,
//     "baseURI": "https://example.com/docs/",
//     "ignore": ["https://example.com/flaky"],
//     "timeoutSecs": 10
//   }
//
// Every key is optional. Missing keys take their default values.
// =============================================================================

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Also check relative URIs (resolved against `base_uri`)
    pub check_relative: bool,

    /// Base used to resolve relative URIs
    #[serde(rename = "baseURI")]
    pub base_uri: Option<String>,

    /// URIs that are never checked (exact match)
    pub ignore: Vec<String>,

    /// Per-request timeout in seconds, no timeout when absent
    pub timeout_secs: Option<u64>,
}

impl Options {
    /// Loads options from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses options from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies overrides on top of these options
    ///
    /// Flags win over file values, except `ignore`, where both lists count.
    pub fn merge(mut self, overrides: Options) -> Self {
        self.check_relative |= overrides.check_relative;
        if overrides.base_uri.is_some() {
            self.base_uri = overrides.base_uri;
        }
        for uri in overrides.ignore {
            if !self.ignore.contains(&uri) {
                self.ignore.push(uri);
            }
        }
        if overrides.timeout_secs.is_some() {
            self.timeout_secs = overrides.timeout_secs;
        }
        self
    }

    /// Parses `base_uri`, which must be an absolute URL
    pub fn parsed_base_uri(&self) -> Result<Option<Url>, ConfigError> {
        self.base_uri
            .as_deref()
            .map(|uri| {
                Url::parse(uri).map_err(|source| ConfigError::InvalidBaseUri {
                    uri: uri.to_string(),
                    source,
                })
            })
            .transpose()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
