//! Response payloads and their encoding
//!
//! Every request ends in exactly one [`AdmissionResult`]. It is encoded in
//! the caller's output format and handed to the transport as an
//! [`EncodedResponse`].

use axum::http::StatusCode;
use jokes_common::OutputFormat;
use serde::Serialize;
use std::path::PathBuf;
use tracing::error;

use super::error::{AdmissionError, CODE_STORAGE_FAILURE};
use super::model::CanonicalSubmission;
use crate::i18n::Translator;

/// Success body for accepted submissions and dry runs
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    pub error: bool,
    pub message: String,
    /// Absent for dry runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<CanonicalSubmission>,
    pub timestamp: i64,
}

/// Terminal failure of a request
#[derive(Debug, Clone)]
pub struct Rejection {
    pub code: u16,
    pub status: StatusCode,
    /// Localized message
    pub message: String,
    pub lang: String,
    pub timestamp: i64,
}

impl Rejection {
    pub fn new(error: &AdmissionError, lang: &str, translator: &dyn Translator) -> Self {
        Self {
            code: error.code(),
            status: error.status(),
            message: error.localized(lang, translator),
            lang: lang.to_string(),
            timestamp: jokes_common::time::now_millis(),
        }
    }

    fn body(&self) -> ErrorResponse<'_> {
        ErrorResponse {
            error: true,
            internal_error: self.status.is_server_error(),
            code: self.code,
            message: &self.message,
            timestamp: self.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse<'a> {
    error: bool,
    internal_error: bool,
    code: u16,
    message: &'a str,
    timestamp: i64,
}

/// Outcome of one submission request
#[derive(Debug, Clone)]
pub enum AdmissionResult {
    /// Persisted at `artifact_path`
    Accepted {
        artifact_path: PathBuf,
        response: SubmissionResponse,
    },
    /// Passed every check, nothing was stored
    DryRun { response: SubmissionResponse },
    Rejected(Rejection),
}

impl AdmissionResult {
    pub fn status(&self) -> StatusCode {
        match self {
            AdmissionResult::Accepted { .. } | AdmissionResult::DryRun { .. } => {
                StatusCode::CREATED
            }
            AdmissionResult::Rejected(rejection) => rejection.status,
        }
    }

    /// Serialize in `format`
    ///
    /// An encoder failure turns into a plain JSON internal error.
    pub fn encode(&self, format: OutputFormat) -> EncodedResponse {
        let encoded = match self {
            AdmissionResult::Accepted { response, .. } | AdmissionResult::DryRun { response } => {
                format.encode(response)
            }
            AdmissionResult::Rejected(rejection) => format.encode(&rejection.body()),
        };

        match encoded {
            Ok(body) => EncodedResponse {
                status: self.status(),
                content_type: format.mime_type(),
                body,
            },
            Err(e) => {
                error!("Failed to encode response as {}: {}", format, e);
                encoding_failure(&e.to_string())
            }
        }
    }
}

/// Plain JSON internal error for a response that could not be encoded
///
/// Uses code 100, the internal failure code shared with storage errors.
fn encoding_failure(detail: &str) -> EncodedResponse {
    let body = serde_json::json!({
        "error": true,
        "internalError": true,
        "code": CODE_STORAGE_FAILURE,
        "message": format!("Failed to encode response: {}", detail),
        "timestamp": jokes_common::time::now_millis(),
    });
    EncodedResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        content_type: OutputFormat::Json.mime_type(),
        body: body.to_string(),
    }
}

/// A response ready for the transport layer
#[derive(Debug, Clone)]
pub struct EncodedResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}
