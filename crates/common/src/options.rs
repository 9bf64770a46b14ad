//! Parser options
//!
//! Options can be built in code or loaded from a YAML file:
//!
//! ```yaml
//! ignore_non_compliant_errors: true
//! exclude_operations:
//!   - DeleteSecret
//! ```

use crate::{ParserError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings that control a parse call
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Continue on structural contract violations instead of failing
    pub ignore_non_compliant_errors: bool,

    /// Operation ids to leave out of the result
    pub exclude_operations: Vec<String>,
}

impl ParserOptions {
    /// Load options from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ParserError::Config(format!(
                "Failed to read options file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            ParserError::Config(format!(
                "Failed to parse options YAML from {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Parse options from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ParserError::Config(format!("Failed to parse options YAML: {}", e))
        })
    }

    pub fn with_ignore_non_compliant_errors(mut self, ignore: bool) -> Self {
        self.ignore_non_compliant_errors = ignore;
        self
    }

    pub fn with_excluded_operations<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_operations = ids.into_iter().map(Into::into).collect();
        self
    }

    /// True if the operation with this id should be skipped
    pub fn is_excluded(&self, operation_id: &str) -> bool {
        self.exclude_operations.iter().any(|id| id == operation_id)
    }
}
