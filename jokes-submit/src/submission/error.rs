//! Admission error taxonomy
//!
//! Each error carries a stable numeric code (independent of HTTP status) and
//! maps to exactly one HTTP status.

use axum::http::StatusCode;
use thiserror::Error;

use crate::i18n::{MessageKey, Translator};

/// Stored artifact could not be written, or another internal failure
pub const CODE_STORAGE_FAILURE: u16 = 100;
/// Identity allocation attempts exhausted
pub const CODE_RATE_LIMITED: u16 = 101;
/// Payload, format version or schema problem
pub const CODE_INVALID_SUBMISSION: u16 = 105;
/// Disallowed characters in the payload
pub const CODE_INVALID_CHARACTERS: u16 = 109;

/// Why a submission was not admitted
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Body is not UTF-8 or not a JSON object
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// JSON object without any fields
    #[error("Empty payload")]
    EmptyPayload,

    #[error("Invalid characters: {}", format_codepoints(.0))]
    InvalidCharacters(Vec<char>),

    #[error("Wrong format version: expected {expected}, got {received}")]
    WrongFormatVersion { expected: u32, received: String },

    /// Field-level problems reported by the schema validator
    #[error("Schema violation: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Rate limited: {limit} submissions per {window_minutes} minute(s)")]
    RateLimited { limit: u32, window_minutes: u32 },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl AdmissionError {
    pub fn code(&self) -> u16 {
        match self {
            AdmissionError::InvalidPayload(_)
            | AdmissionError::EmptyPayload
            | AdmissionError::WrongFormatVersion { .. }
            | AdmissionError::SchemaViolation(_) => CODE_INVALID_SUBMISSION,
            AdmissionError::InvalidCharacters(_) => CODE_INVALID_CHARACTERS,
            AdmissionError::RateLimited { .. } => CODE_RATE_LIMITED,
            AdmissionError::Storage(_) => CODE_STORAGE_FAILURE,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AdmissionError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AdmissionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message in `lang`
    pub fn localized(&self, lang: &str, translator: &dyn Translator) -> String {
        let (key, args) = match self {
            AdmissionError::InvalidPayload(detail) => {
                (MessageKey::InvalidJson, vec![detail.clone()])
            }
            AdmissionError::EmptyPayload => (MessageKey::RequestBodyInvalid, vec![]),
            AdmissionError::InvalidCharacters(chars) => {
                (MessageKey::InvalidChars, vec![format_codepoints(chars)])
            }
            AdmissionError::WrongFormatVersion { expected, received } => (
                MessageKey::WrongFormatVersion,
                vec![expected.to_string(), received.clone()],
            ),
            AdmissionError::SchemaViolation(problems) => {
                (MessageKey::SubmissionFormatInvalid, vec![problems.join("\n")])
            }
            AdmissionError::RateLimited {
                limit,
                window_minutes,
            } => (
                MessageKey::RateLimited,
                vec![limit.to_string(), window_minutes.to_string()],
            ),
            AdmissionError::Storage(err) => (MessageKey::SavingFailed, vec![err.to_string()]),
        };
        translator.translate(lang, key, &args)
    }
}

/// `0x7, 0x1b` style list of codepoints
pub fn format_codepoints(chars: &[char]) -> String {
    chars
        .iter()
        .map(|c| format!("0x{:x}", *c as u32))
        .collect::<Vec<_>>()
        .join(", ")
}
