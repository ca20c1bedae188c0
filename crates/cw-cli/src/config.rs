//! Configuration file handling

use crate::{CliError, Result};
use cw_rewrite::{ContractPolicy, RewriteOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the configuration file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "callsite-wrapper.toml";

/// Settings read from `callsite-wrapper.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// How clang is run
    pub clang: ClangConfig,

    /// Rewrite behavior
    pub rewrite: RewriteConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClangConfig {
    /// Clang executable; looked up in `PATH` when unset
    pub path: Option<PathBuf>,

    /// Arguments appended to every compile command
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// What to do with a call whose annotation is malformed
    pub on_contract_violation: ContractPolicy,

    /// Warn about call sites left alone because their ranges are unusable
    pub report_skipped: bool,
}

impl CliConfig {
    /// Load configuration from `config_path`, or from the first standard location holding a
    /// config file, falling back to defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let candidates = [Some(PathBuf::from(LOCAL_CONFIG)), Self::default_config_path()];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                return Self::load_from_file(&path);
            }
        }

        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("callsite-wrapper").join("config.toml"))
    }

    /// Options for the rewrite pass; `CALLSITE_WRAPPER_REPORT_SKIPPED` turns on skip reporting
    /// as well.
    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            policy: self.rewrite.on_contract_violation,
            report_skipped: self.rewrite.report_skipped || cw_core::config::report_skipped(),
        }
    }
}
