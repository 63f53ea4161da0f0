/// Run configuration for the trip analysis pipeline.
///
/// Values are layered: compiled defaults, then an optional TOML file, then
/// environment overrides (a `.env` file in the working directory is honored
/// through `dotenv`). The base directory default is a relative placeholder;
/// real runs are expected to point it at their dataset folder.

use crate::logging::LogLevel;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder dataset folder used when nothing else is configured.
pub const DEFAULT_BASE_DIR: &str = "./data";

/// Name of the output folder created under the base directory.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "outputs";

pub const DEFAULT_ALPHA: f64 = 0.05;

pub const ENV_CONFIG_PATH: &str = "ZUBER_CONFIG";
pub const ENV_BASE_DIR: &str = "ZUBER_BASE_DIR";
pub const ENV_ALPHA: &str = "ZUBER_ALPHA";
pub const ENV_LOG_FILE: &str = "ZUBER_LOG_FILE";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
}

/// On-disk shape of the TOML config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    alpha: Option<f64>,
    remove_nonpositive: Option<bool>,
    strict: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
    report_format: Option<ReportFormat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Folder searched for the three input CSVs.
    pub base_dir: PathBuf,
    /// Folder receiving chart images; `<base_dir>/outputs` when unset.
    pub output_dir: Option<PathBuf>,
    /// Significance level of the weather/duration test.
    pub alpha: f64,
    /// Drop trips with `duration_seconds <= 0` before testing.
    pub remove_nonpositive: bool,
    /// Fail on the first malformed required cell instead of dropping the row.
    pub strict: bool,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    pub report_format: ReportFormat,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            output_dir: None,
            alpha: DEFAULT_ALPHA,
            remove_nonpositive: true,
            strict: false,
            log_level: LogLevel::Info,
            log_file: None,
            report_format: ReportFormat::Text,
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut config = AnalysisConfig::default();
        if let Some(base_dir) = file.base_dir {
            config.base_dir = base_dir;
        }
        if file.output_dir.is_some() {
            config.output_dir = file.output_dir;
        }
        if let Some(alpha) = file.alpha {
            config.alpha = alpha;
        }
        if let Some(flag) = file.remove_nonpositive {
            config.remove_nonpositive = flag;
        }
        if let Some(flag) = file.strict {
            config.strict = flag;
        }
        if let Some(level) = file.log_level {
            config.log_level = LogLevel::parse(&level)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown log_level '{}'", level)))?;
        }
        if file.log_file.is_some() {
            config.log_file = file.log_file;
        }
        if let Some(format) = file.report_format {
            config.report_format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Build the run configuration.
    ///
    /// `cli_path` takes precedence over `ZUBER_CONFIG`; with neither, the
    /// defaults are used. Environment overrides are applied last.
    pub fn load(cli_path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file_path = cli_path
            .map(Path::to_path_buf)
            .or_else(|| env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from));

        let mut config = match file_path {
            Some(path) => Self::from_file(&path)?,
            None => AnalysisConfig::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment-style overrides through a lookup function, so tests
    /// can supply a map instead of mutating the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_dir) = lookup(ENV_BASE_DIR) {
            self.base_dir = PathBuf::from(base_dir);
        }
        if let Some(alpha) = lookup(ENV_ALPHA) {
            self.alpha = alpha
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{} is not a number: '{}'", ENV_ALPHA, alpha)))?;
        }
        if let Some(log_file) = lookup(ENV_LOG_FILE) {
            self.log_file = Some(log_file);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "alpha must lie strictly between 0 and 1, got {}",
                self.alpha
            )));
        }
        Ok(())
    }

    /// Folder the charts are written to.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join(DEFAULT_OUTPUT_SUBDIR))
    }
}
