//! This module defines configuration options for the differentiation engine.
//!
//! It provides the `EngineOptions` struct, which controls when the per-term product-rule
//! expansion is spread across threads and how far the term count may grow before the engine
//! gives up. Options can be built in code or loaded from a TOML file; missing keys fall back to
//! their defaults.

use crate::error::NucrepError;
use serde::Deserialize;
use std::path::Path;

/// Configuration parameters for the differentiation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Minimum number of terms before a differentiation step is expanded in parallel.
    ///
    /// Below this size the work per step is too small for a thread pool to pay off.
    pub parallel_threshold: usize,
    /// Upper bound on the number of terms any differentiation step may produce.
    ///
    /// The term count grows combinatorially with derivative order and atom count. When set,
    /// exceeding the limit aborts with `NucrepError::TermLimitExceeded`.
    pub max_terms: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: 64,
            max_terms: None,
        }
    }
}

impl EngineOptions {
    /// Loads engine options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `NucrepError::IoError` if the file cannot be read, or a
    /// `NucrepError::DeserializationError` if its content is not valid engine configuration.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nucrep::EngineOptions;
    /// use std::path::Path;
    ///
    /// let options = EngineOptions::load_from_file(Path::new("engine.toml")).unwrap();
    /// ```
    pub fn load_from_file(path: &Path) -> Result<Self, NucrepError> {
        let content = std::fs::read_to_string(path).map_err(|io_error| NucrepError::IoError {
            path: path.to_path_buf(),
            source: io_error,
        })?;

        Self::load_from_str(&content)
    }

    /// Parses engine options from a TOML string.
    ///
    /// # Examples
    ///
    /// ```
    /// use nucrep::EngineOptions;
    ///
    /// let options = EngineOptions::load_from_str("max_terms = 100000").unwrap();
    /// assert_eq!(options.max_terms, Some(100000));
    /// assert_eq!(options.parallel_threshold, EngineOptions::default().parallel_threshold);
    /// ```
    pub fn load_from_str(toml_str: &str) -> Result<Self, NucrepError> {
        toml::from_str(toml_str).map_err(NucrepError::from)
    }
}
