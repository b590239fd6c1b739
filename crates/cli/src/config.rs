//! Optional `newton.toml` configuration for the `newton` CLI.
//!
//! # Example
//!
//! ```toml
//! [compile]
//! recover = true
//! max_errors = 20
//!
//! [output]
//! format = "json"
//! ```
//!
//! Command-line flags override the file: `--recover` turns recovery on,
//! and an explicit `--output` wins over `[output] format`.

use std::path::{Path, PathBuf};

use newton_core::CompileOptions;
use serde::{Deserialize, Serialize};

use crate::OutputFormat;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "newton.toml";

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewtonConfig {
    /// `[compile]` section, passed straight to the compiler.
    pub compile: CompileOptions,
    /// `[output]` section.
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Output format used when `--output` is absent.
    pub format: Option<OutputFormat>,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse a config TOML file from `path`.
///
/// Returns a human-readable error string on failure.
pub fn read_config(path: &Path) -> Result<NewtonConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    let config: NewtonConfig = toml::from_str(&content)
        .map_err(|e| format!("could not parse '{}': {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

/// Load the explicit config, else `./newton.toml` if it exists, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<NewtonConfig, String> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                read_config(&fallback)
            } else {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(NewtonConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: NewtonConfig = toml::from_str("").unwrap();
        assert_eq!(config, NewtonConfig::default());
        assert!(!config.compile.recover);
    }

    #[test]
    fn sections_are_read() {
        let config: NewtonConfig = toml::from_str(
            "[compile]\nrecover = true\nmax_errors = 3\n[output]\nformat = \"json\"\n",
        )
        .unwrap();
        assert!(config.compile.recover);
        assert_eq!(config.compile.max_errors, 3);
        assert_eq!(config.output.format, Some(OutputFormat::Json));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = toml::from_str::<NewtonConfig>("[compile]\nrecovr = true\n").unwrap_err();
        assert!(err.to_string().contains("recovr"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/newton.toml"))).unwrap_err();
        assert!(err.starts_with("could not read"));
    }
}
