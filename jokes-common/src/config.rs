//! Configuration loading and path resolution
//!
//! The bootstrap configuration lives in a single TOML file. Every field has a
//! compiled default, so a missing or partial file never prevents startup.
//!
//! Resolution priority for both the config file and the submission root:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file (submission root only)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "JOKES_CONFIG";

/// Environment variable naming the submission storage root
pub const SUBMISSION_ROOT_ENV_VAR: &str = "JOKES_SUBMISSION_ROOT";

/// Bootstrap configuration loaded from TOML file
///
/// Cannot change while the service is running; restart to pick up edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Root directory for stored submissions (optional)
    #[serde(default)]
    pub submission_root: Option<PathBuf>,

    /// Take the requester address from `X-Forwarded-For` when set
    #[serde(default)]
    pub trust_proxy: bool,

    /// Upper bound for request bodies in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub languages: LanguageConfig,

    #[serde(default)]
    pub jokes: JokeConfig,

    #[serde(default)]
    pub submissions: SubmissionLimits,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            submission_root: None,
            trust_proxy: false,
            max_body_bytes: default_max_body_bytes(),
            logging: LoggingConfig::default(),
            languages: LanguageConfig::default(),
            jokes: JokeConfig::default(),
            submissions: SubmissionLimits::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Languages the service accepts submissions in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Used when a submission has no `lang` and for unparseable requests
    #[serde(default = "default_language")]
    pub default: String,

    #[serde(default = "default_supported_languages")]
    pub supported: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: default_language(),
            supported: default_supported_languages(),
        }
    }
}

/// Joke schema settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JokeConfig {
    /// Schema revision submissions must declare in `formatVersion`
    #[serde(default = "default_format_version")]
    pub format_version: u32,

    /// Canonical category names
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Alias → canonical category
    #[serde(default = "default_category_aliases")]
    pub category_aliases: BTreeMap<String, String>,
}

impl Default for JokeConfig {
    fn default() -> Self {
        Self {
            format_version: default_format_version(),
            categories: default_categories(),
            category_aliases: default_category_aliases(),
        }
    }
}

/// Submission admission limits and character rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionLimits {
    /// Allocation attempts per fingerprint and millisecond; also the rate limit
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Rate-limit window reported to clients, in minutes
    #[serde(default = "default_time_frame_minutes")]
    pub time_frame_minutes: u32,

    /// Regex matching characters that may not appear in a submission
    #[serde(default = "default_invalid_char_pattern")]
    pub invalid_char_pattern: String,

    /// Regex matching fingerprint characters to replace
    #[serde(default = "default_fingerprint_pattern")]
    pub fingerprint_pattern: String,

    #[serde(default = "default_fingerprint_replacement")]
    pub fingerprint_replacement: String,
}

impl Default for SubmissionLimits {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            time_frame_minutes: default_time_frame_minutes(),
            invalid_char_pattern: default_invalid_char_pattern(),
            fingerprint_pattern: default_fingerprint_pattern(),
            fingerprint_replacement: default_fingerprint_replacement(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:8076".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_supported_languages() -> Vec<String> {
    ["en", "de", "cs", "es", "fr", "pt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_format_version() -> u32 {
    3
}

fn default_categories() -> Vec<String> {
    ["Misc", "Programming", "Dark", "Pun", "Spooky", "Christmas"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_category_aliases() -> BTreeMap<String, String> {
    [
        ("Miscellaneous", "Misc"),
        ("Coding", "Programming"),
        ("Development", "Programming"),
        ("Halloween", "Spooky"),
    ]
    .iter()
    .map(|(alias, target)| (alias.to_string(), target.to_string()))
    .collect()
}

fn default_max_attempts() -> u32 {
    120
}

fn default_time_frame_minutes() -> u32 {
    1
}

fn default_invalid_char_pattern() -> String {
    r"[\x{0}-\x{8}\x{B}\x{C}\x{E}-\x{1F}\x{7F}-\x{9F}\x{2400}-\x{2421}]".to_string()
}

fn default_fingerprint_pattern() -> String {
    "[^A-Za-z0-9]".to_string()
}

fn default_fingerprint_replacement() -> String {
    "_".to_string()
}

/// Locates and loads the TOML bootstrap file
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Config file path: CLI argument → `JOKES_CONFIG` → platform config dir
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        dirs::config_dir().map(|d| d.join("jokes").join("config.toml"))
    }

    /// Load the configuration
    ///
    /// A missing file yields defaults. A file that exists but cannot be read
    /// or parsed is an error. Returns the file actually read, if any, so the
    /// caller can report it once logging is up.
    pub fn load(&self) -> Result<(TomlConfig, Option<PathBuf>)> {
        match self.config_path() {
            Some(path) if path.exists() => {
                let config = load_toml_config(&path)?;
                Ok((config, Some(path)))
            }
            _ => Ok((TomlConfig::default(), None)),
        }
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = toml::from_str::<TomlConfig>(&content)?;
    Ok(config)
}

/// Submission root: CLI argument → `JOKES_SUBMISSION_ROOT` → TOML → default
pub fn resolve_submission_root(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(SUBMISSION_ROOT_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.submission_root {
        return path.clone();
    }

    default_submission_root()
}

/// OS-dependent default submission root
pub fn default_submission_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("jokes").join("submissions"))
        .unwrap_or_else(|| PathBuf::from("./data/submissions"))
}
