//! Engine configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Policy knobs for the dispatcher. Every field has a serde default, so a
/// partial config file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Re-check the permission requirement of every ancestor traversed while
    /// resolving a sub-command, not just the target's.
    #[serde(default = "default_fallthrough")]
    pub source_requirement_fallthrough: bool,

    /// Tolerate a value supplied to a presence-only flag instead of
    /// reporting it.
    #[serde(default)]
    pub ignore_unwanted_flag_values: bool,

    /// Flag names that intercept dispatch and show help, for commands that
    /// do not override them.
    #[serde(default = "default_help_flags")]
    pub help_flags: Vec<String>,

    /// Characters of unmatched input shown in lexer error messages.
    #[serde(default = "default_fragment_limit")]
    pub error_fragment_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_requirement_fallthrough: default_fallthrough(),
            ignore_unwanted_flag_values: false,
            help_flags: default_help_flags(),
            error_fragment_limit: default_fragment_limit(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn default_fallthrough() -> bool {
    true
}

fn default_help_flags() -> Vec<String> {
    vec!["help".to_string(), "?".to_string()]
}

fn default_fragment_limit() -> usize {
    crate::tokenizer::token::DEFAULT_FRAGMENT_LIMIT
}
