//! Reduces an admitted submission to its canonical stored form

use serde_json::{Map, Value};

use super::error::AdmissionError;
use super::model::{CanonicalSubmission, Flags, JokeContent};
use crate::config::SubmissionConfig;

/// Whitelist and normalize an admitted submission
///
/// Fails on a `type` other than `single`/`twopart` and on a `lang` outside the
/// supported languages. The language names a storage directory, so it is
/// checked here whatever schema validator ran before. Missing optional fields
/// get defaults.
pub fn sanitize(
    submission: &Map<String, Value>,
    config: &SubmissionConfig,
) -> Result<CanonicalSubmission, AdmissionError> {
    let text = |field: &str| {
        submission
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let content = match submission.get("type").and_then(Value::as_str) {
        Some("single") => JokeContent::Single { joke: text("joke") },
        Some("twopart") => JokeContent::TwoPart {
            setup: text("setup"),
            delivery: text("delivery"),
        },
        other => {
            return Err(AdmissionError::SchemaViolation(vec![format!(
                "\"type\" must be \"single\" or \"twopart\" (got {})",
                other.unwrap_or("nothing")
            )]))
        }
    };

    let category = text("category");
    let category = config
        .resolve_category(&category)
        .map(str::to_string)
        .unwrap_or(category);

    let lang = submission
        .get("lang")
        .and_then(Value::as_str)
        .unwrap_or(config.default_language.as_str())
        .to_lowercase();
    if !config.is_supported_language(&lang) {
        return Err(unsupported_language(&lang, config));
    }

    Ok(CanonicalSubmission {
        format_version: submission
            .get("formatVersion")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok()),
        category,
        content,
        flags: Flags::from_value(submission.get("flags")),
        lang,
        id: submission.get("id").filter(|id| !id.is_null()).cloned(),
        safe: submission
            .get("safe")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

pub(crate) fn unsupported_language(lang: &str, config: &SubmissionConfig) -> AdmissionError {
    AdmissionError::SchemaViolation(vec![format!(
        "\"lang\" must be one of {} (got \"{}\")",
        config.supported_languages.join(", "),
        lang
    )])
}
