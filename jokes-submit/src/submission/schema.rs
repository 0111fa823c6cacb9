//! Field-level schema validation
//!
//! The admission validator only checks structure; this is where the
//! individual joke fields are checked.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::model::FLAG_NAMES;
use crate::config::SubmissionConfig;

/// Deep per-field validation of a decoded submission
pub trait SchemaValidator: Send + Sync {
    /// Every problem found, in field order; empty when the submission is valid
    fn validate(&self, submission: &Map<String, Value>, lang: &str) -> Vec<String>;
}

/// Checks submissions against the configured joke schema
#[derive(Debug, Clone)]
pub struct JokeSchemaValidator {
    config: Arc<SubmissionConfig>,
}

impl JokeSchemaValidator {
    pub fn new(config: Arc<SubmissionConfig>) -> Self {
        Self { config }
    }
}

impl SchemaValidator for JokeSchemaValidator {
    fn validate(&self, submission: &Map<String, Value>, lang: &str) -> Vec<String> {
        let mut problems = Vec::new();

        match submission.get("category").and_then(Value::as_str) {
            Some(category) if self.config.resolve_category(category).is_some() => {}
            Some(category) => problems.push(format!(
                "\"category\" must be one of {} (got \"{}\")",
                self.config.categories.join(", "),
                category
            )),
            None => problems.push("\"category\" is missing or not a string".to_string()),
        }

        match submission.get("type").and_then(Value::as_str) {
            Some("single") => require_text(submission, "joke", &mut problems),
            Some("twopart") => {
                require_text(submission, "setup", &mut problems);
                require_text(submission, "delivery", &mut problems);
            }
            Some(other) => problems.push(format!(
                "\"type\" must be \"single\" or \"twopart\" (got \"{}\")",
                other
            )),
            None => problems.push("\"type\" is missing or not a string".to_string()),
        }

        match submission.get("flags").and_then(Value::as_object) {
            Some(flags) => {
                for name in FLAG_NAMES {
                    if !flags.get(name).is_some_and(Value::is_boolean) {
                        problems.push(format!("\"flags.{}\" is missing or not a boolean", name));
                    }
                }
            }
            None => problems.push("\"flags\" is missing or not an object".to_string()),
        }

        match submission.get("lang") {
            None => {}
            Some(Value::String(_)) if self.config.is_supported_language(lang) => {}
            Some(Value::String(_)) => problems.push(format!(
                "\"lang\" must be one of {} (got \"{}\")",
                self.config.supported_languages.join(", "),
                lang
            )),
            Some(_) => problems.push("\"lang\" must be a string".to_string()),
        }

        if let Some(safe) = submission.get("safe") {
            if !safe.is_boolean() {
                problems.push("\"safe\" must be a boolean".to_string());
            }
        }

        if let Some(id) = submission.get("id") {
            if !id.is_u64() {
                problems.push("\"id\" must be a non-negative integer".to_string());
            }
        }

        problems
    }
}

fn require_text(submission: &Map<String, Value>, field: &str, problems: &mut Vec<String>) {
    match submission.get(field).and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => {}
        Some(_) => problems.push(format!("\"{}\" must not be empty", field)),
        None => problems.push(format!("\"{}\" is missing or not a string", field)),
    }
}
