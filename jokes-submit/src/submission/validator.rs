//! Structural admission checks
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. body parses as a JSON object (errors reported in the default language)
//! 2. object is non-empty
//! 3. no invalid characters
//! 4. `formatVersion` matches the supported version
//! 5. deep schema validation
//!
//! Nothing here logs or mutates the input.

use serde_json::{Map, Value};

use super::error::AdmissionError;
use super::schema::SchemaValidator;
use crate::config::SubmissionConfig;

/// A submission that passed every admission check
#[derive(Debug, Clone)]
pub struct Admitted {
    pub submission: Map<String, Value>,
    /// Lowercase language used for messages and storage
    pub lang: String,
}

/// A failed check together with the language to report it in
#[derive(Debug)]
pub struct ValidationFailure {
    pub error: AdmissionError,
    pub lang: String,
}

pub fn validate(
    raw: &[u8],
    config: &SubmissionConfig,
    schema: &dyn SchemaValidator,
) -> Result<Admitted, ValidationFailure> {
    let fail = |error: AdmissionError, lang: &str| ValidationFailure {
        error,
        lang: lang.to_string(),
    };

    // The requester's language can't be trusted until the body parses
    let submission = parse_object(raw).map_err(|e| fail(e, &config.default_language))?;

    let lang = match submission.get("lang") {
        Some(Value::String(lang)) => lang.to_lowercase(),
        _ => config.default_language.clone(),
    };

    if submission.is_empty() {
        return Err(fail(AdmissionError::EmptyPayload, &lang));
    }

    let invalid = invalid_characters(&submission, config);
    if !invalid.is_empty() {
        return Err(fail(AdmissionError::InvalidCharacters(invalid), &lang));
    }

    let version = submission.get("formatVersion");
    if version.and_then(Value::as_u64) != Some(u64::from(config.format_version)) {
        let received = match version {
            Some(v) => v.to_string(),
            None => "none".to_string(),
        };
        return Err(fail(
            AdmissionError::WrongFormatVersion {
                expected: config.format_version,
                received,
            },
            &lang,
        ));
    }

    let problems = schema.validate(&submission, &lang);
    if !problems.is_empty() {
        return Err(fail(AdmissionError::SchemaViolation(problems), &lang));
    }

    Ok(Admitted { submission, lang })
}

fn parse_object(raw: &[u8]) -> Result<Map<String, Value>, AdmissionError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| AdmissionError::InvalidPayload(format!("body is not valid UTF-8: {}", e)))?;

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AdmissionError::InvalidPayload(
            "body must be a JSON object".to_string(),
        )),
        Err(e) => Err(AdmissionError::InvalidPayload(e.to_string())),
    }
}

/// Offending characters in document order
///
/// Keys and string values are scanned after decoding, so a character written
/// raw and the same character written as a `\u0007` escape are both found.
/// Outside strings a parsed body holds only JSON syntax and whitespace.
fn invalid_characters(submission: &Map<String, Value>, config: &SubmissionConfig) -> Vec<char> {
    let mut found = Vec::new();
    for (key, value) in submission {
        found.extend(matches(key, config));
        collect_decoded(value, config, &mut found);
    }
    found
}

fn collect_decoded(value: &Value, config: &SubmissionConfig, found: &mut Vec<char>) {
    match value {
        Value::String(text) => found.extend(matches(text, config)),
        Value::Array(items) => {
            for item in items {
                collect_decoded(item, config, found);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                found.extend(matches(key, config));
                collect_decoded(child, config, found);
            }
        }
        _ => {}
    }
}

fn matches(text: &str, config: &SubmissionConfig) -> Vec<char> {
    config
        .invalid_chars
        .find_iter(text)
        .filter_map(|m| m.as_str().chars().next())
        .collect()
}
