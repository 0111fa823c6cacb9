//! Runtime configuration for the submission pipeline
//!
//! Compiled once at startup from the TOML bootstrap config and shared
//! read-only through an `Arc`.

use jokes_common::config::TomlConfig;
use jokes_common::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Sanitized fingerprints are cut to this many characters
pub const FINGERPRINT_MAX_LEN: usize = 8;

/// Immutable settings read by every pipeline stage
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    /// Directory holding one sub-directory per language
    pub submission_root: PathBuf,
    /// Lowercase default language code
    pub default_language: String,
    /// Lowercase language codes submissions may declare
    pub supported_languages: Vec<String>,
    pub format_version: u32,
    pub categories: Vec<String>,
    pub category_aliases: BTreeMap<String, String>,
    /// Identity allocation attempts before the requester counts as rate limited
    pub max_attempts: u32,
    pub time_frame_minutes: u32,
    pub invalid_chars: Regex,
    pub fingerprint_pattern: Regex,
    pub fingerprint_replacement: String,
}

impl SubmissionConfig {
    /// Build the runtime config, compiling and checking every rule
    pub fn from_toml(config: &TomlConfig, submission_root: PathBuf) -> Result<Self> {
        let limits = &config.submissions;

        if limits.max_attempts == 0 {
            return Err(Error::Config(
                "submissions.max_attempts must be at least 1".to_string(),
            ));
        }

        let supported_languages: Vec<String> = config
            .languages
            .supported
            .iter()
            .map(|lang| lang.to_lowercase())
            .collect();
        let default_language = config.languages.default.to_lowercase();
        if !supported_languages.contains(&default_language) {
            return Err(Error::Config(format!(
                "Default language '{}' is not in languages.supported",
                default_language
            )));
        }

        for (alias, target) in &config.jokes.category_aliases {
            if !config.jokes.categories.contains(target) {
                return Err(Error::Config(format!(
                    "Category alias '{}' points to unknown category '{}'",
                    alias, target
                )));
            }
        }

        let invalid_chars = compile("submissions.invalid_char_pattern", &limits.invalid_char_pattern)?;
        let fingerprint_pattern = compile("submissions.fingerprint_pattern", &limits.fingerprint_pattern)?;

        Ok(Self {
            submission_root,
            default_language,
            supported_languages,
            format_version: config.jokes.format_version,
            categories: config.jokes.categories.clone(),
            category_aliases: config.jokes.category_aliases.clone(),
            max_attempts: limits.max_attempts,
            time_frame_minutes: limits.time_frame_minutes,
            invalid_chars,
            fingerprint_pattern,
            fingerprint_replacement: limits.fingerprint_replacement.clone(),
        })
    }

    /// Canonical category for a name or alias, ignoring case
    pub fn resolve_category(&self, name: &str) -> Option<&str> {
        if let Some(category) = self
            .categories
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
        {
            return Some(category.as_str());
        }

        self.category_aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, target)| target.as_str())
    }

    pub fn is_supported_language(&self, lang: &str) -> bool {
        let lang = lang.to_lowercase();
        self.supported_languages.iter().any(|l| *l == lang)
    }
}

fn compile(key: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("Invalid regex in {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SubmissionConfig {
        SubmissionConfig::from_toml(&TomlConfig::default(), PathBuf::from("/tmp/jokes")).unwrap()
    }

    #[test]
    fn test_resolve_category_canonical_and_alias() {
        let config = config();
        assert_eq!(config.resolve_category("Programming"), Some("Programming"));
        assert_eq!(config.resolve_category("programming"), Some("Programming"));
        assert_eq!(config.resolve_category("Coding"), Some("Programming"));
        assert_eq!(config.resolve_category("halloween"), Some("Spooky"));
        assert_eq!(config.resolve_category("Knock-Knock"), None);
    }

    #[test]
    fn test_language_support_is_case_insensitive() {
        let config = config();
        assert!(config.is_supported_language("EN"));
        assert!(config.is_supported_language("de"));
        assert!(!config.is_supported_language("xx"));
    }

    #[test]
    fn test_default_invalid_char_pattern() {
        let config = config();
        assert!(config.invalid_chars.is_match("\u{7}"));
        assert!(config.invalid_chars.is_match("\u{2400}"));
        assert!(!config.invalid_chars.is_match("plain text\n\twith tabs\r"));
        assert!(!config.invalid_chars.is_match("Käse und Brötchen"));
    }

    #[test]
    fn test_rejects_bad_regex() {
        let mut toml = TomlConfig::default();
        toml.submissions.invalid_char_pattern = "[unclosed".to_string();
        let err = SubmissionConfig::from_toml(&toml, PathBuf::from("/tmp")).unwrap_err();
        assert!(err.to_string().contains("invalid_char_pattern"));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let mut toml = TomlConfig::default();
        toml.submissions.max_attempts = 0;
        assert!(SubmissionConfig::from_toml(&toml, PathBuf::from("/tmp")).is_err());
    }

    #[test]
    fn test_rejects_unsupported_default_language() {
        let mut toml = TomlConfig::default();
        toml.languages.default = "it".to_string();
        assert!(SubmissionConfig::from_toml(&toml, PathBuf::from("/tmp")).is_err());
    }
}
