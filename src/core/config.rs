//! Pipeline configuration loaded from a TOML file.
//!
//! Only two keys are mandatory: `output_dir` and `batch_file`. Everything else
//! has a default suitable for a plain `make.contigs` run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::logs::dedup::DedupRule;

/// Default command list handed to mothur when none is configured
pub const DEFAULT_COMMAND: &str = "make.contigs(file={manifest}, processors={processors})";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory for the run log, batch script, and tool output
    pub output_dir: PathBuf,

    /// The batch manifest, one sample per line
    pub batch_file: PathBuf,

    /// When set, every manifest token must name a file in this directory
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub dedup: DedupConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ToolConfig {
    pub executable: String,
    pub timeout_secs: Option<u64>,
    pub processors: u32,
    pub commands: Vec<String>,
    pub log_file: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable: "mothur".to_string(),
            timeout_secs: None,
            processors: 1,
            commands: vec![DEFAULT_COMMAND.to_string()],
            log_file: PathBuf::from("mothur.logfile"),
        }
    }
}

impl ToolConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DedupConfig {
    pub rule: DedupRule,
    pub normalize_whitespace: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            rule: DedupRule::Consecutive,
            normalize_whitespace: true,
        }
    }
}

impl PipelineConfig {
    /// Load a config file, resolving relative paths against its directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, `ConfigError::Parse`
    /// for malformed TOML, or `ConfigError::Invalid` if a value is out of range.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse and check a config from TOML text. Paths are left as written.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` or `ConfigError::Invalid`.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output_dir must not be empty".into()));
        }
        if self.batch_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("batch_file must not be empty".into()));
        }
        if self.tool.executable.trim().is_empty() {
            return Err(ConfigError::Invalid("tool.executable must not be empty".into()));
        }
        if self.tool.commands.iter().all(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "tool.commands must contain at least one command".into(),
            ));
        }
        if self.tool.processors == 0 {
            return Err(ConfigError::Invalid("tool.processors must be at least 1".into()));
        }
        if self.tool.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("tool.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.output_dir = resolve(&self.output_dir);
        self.batch_file = resolve(&self.batch_file);
        self.input_dir = self.input_dir.as_deref().map(resolve);
    }

    /// Path of the raw tool log
    #[must_use]
    pub fn tool_log_path(&self) -> PathBuf {
        self.output_dir.join(&self.tool.log_file)
    }

    /// Path of this program's own run log
    #[must_use]
    pub fn run_log_path(&self) -> PathBuf {
        self.output_dir.join("amplicon-qc.log")
    }
}
