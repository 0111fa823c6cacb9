//! Submission admission pipeline
//!
//! `validate → sanitize → (dry run? respond) → allocate identity → persist →
//! respond`. Every stage may end the request with a rejection; the first
//! failure wins and nothing after it runs.

pub mod allocator;
pub mod error;
pub mod model;
pub mod response;
pub mod sanitizer;
pub mod schema;
pub mod validator;
pub mod writer;

pub use allocator::{IdentityAllocator, Reservation};
pub use error::AdmissionError;
pub use model::{CanonicalSubmission, Flags, JokeContent};
pub use response::{AdmissionResult, EncodedResponse, Rejection, SubmissionResponse};
pub use schema::{JokeSchemaValidator, SchemaValidator};

use jokes_common::OutputFormat;
use serde_json::{Map, Value};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::SubmissionConfig;
use crate::i18n::{BuiltinTranslations, MessageKey, Translator};
use crate::telemetry::{SubmissionMeter, SubmissionTelemetry, TracingTelemetry};

/// Everything the pipeline needs from one inbound request
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Raw request body
    pub body: Vec<u8>,
    pub format: OutputFormat,
    /// Requester address, used for naming and rate limiting
    pub fingerprint: String,
    /// Request metadata forwarded to telemetry with the stored submission
    pub analytics: Map<String, Value>,
    /// Validate only, never store
    pub dry_run: bool,
}

/// Millisecond timestamp source used for storage identities
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Runs the admission pipeline
#[derive(Clone)]
pub struct SubmissionService {
    config: Arc<SubmissionConfig>,
    schema: Arc<dyn SchemaValidator>,
    translator: Arc<dyn Translator>,
    telemetry: Arc<dyn SubmissionTelemetry>,
    meter: Arc<SubmissionMeter>,
    allocator: IdentityAllocator,
    clock: Clock,
}

impl SubmissionService {
    /// Service with the built-in schema, translations and tracing telemetry
    pub fn new(config: Arc<SubmissionConfig>) -> Self {
        Self {
            schema: Arc::new(JokeSchemaValidator::new(config.clone())),
            translator: Arc::new(BuiltinTranslations::new(config.default_language.clone())),
            telemetry: Arc::new(TracingTelemetry),
            meter: Arc::new(SubmissionMeter::new()),
            allocator: IdentityAllocator::new(config.clone()),
            clock: Arc::new(jokes_common::time::now_millis),
            config,
        }
    }

    pub fn with_schema_validator(mut self, schema: Arc<dyn SchemaValidator>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn SubmissionTelemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn meter(&self) -> &SubmissionMeter {
        &self.meter
    }

    /// Run the pipeline and encode the outcome in the requested format
    pub async fn handle(&self, request: SubmissionRequest) -> EncodedResponse {
        let format = request.format;
        self.admit(request).await.encode(format)
    }

    /// Run the pipeline
    pub async fn admit(&self, request: SubmissionRequest) -> AdmissionResult {
        let admitted = match validator::validate(&request.body, &self.config, self.schema.as_ref()) {
            Ok(admitted) => admitted,
            Err(failure) => {
                debug!("Submission from {} rejected: {}", request.fingerprint, failure.error);
                return self.reject(&failure.error, &failure.lang);
            }
        };
        let lang = admitted.lang.as_str();

        let submission = match sanitizer::sanitize(&admitted.submission, &self.config) {
            Ok(submission) => submission,
            Err(err) => return self.reject(&err, lang),
        };

        if request.dry_run {
            let submitted_version = submission
                .format_version
                .map(|v| v.to_string())
                .unwrap_or_default();
            let message = self.translator.translate(
                lang,
                MessageKey::DryRunSuccessful,
                &[self.config.format_version.to_string(), submitted_version],
            );
            return AdmissionResult::DryRun {
                response: SubmissionResponse {
                    error: false,
                    message,
                    submission: None,
                    timestamp: jokes_common::time::now_millis(),
                },
            };
        }

        // Detached so a dropped request can't strand an empty reservation
        let stored = tokio::spawn(store(
            self.allocator.clone(),
            request.fingerprint.clone(),
            submission.clone(),
            (self.clock)(),
        ))
        .await
        .unwrap_or_else(|e| {
            Err(AdmissionError::Storage(io::Error::new(
                io::ErrorKind::Other,
                e.to_string(),
            )))
        });

        let (artifact_path, timestamp) = match stored {
            Ok(stored) => stored,
            Err(err) => {
                if matches!(err, AdmissionError::RateLimited { .. }) {
                    warn!("Rate limited submissions from {}", request.fingerprint);
                    self.meter.record_rate_limited();
                    self.telemetry
                        .rate_limited(&request.fingerprint, &request.analytics);
                }
                return self.reject(&err, lang);
            }
        };

        info!("Saved submission to {}", artifact_path.display());
        self.meter.record_submission();

        let mut record = request.analytics;
        record.insert(
            "submission".to_string(),
            serde_json::to_value(&submission).unwrap_or(Value::Null),
        );
        self.telemetry.submission(&request.fingerprint, &record);

        AdmissionResult::Accepted {
            artifact_path,
            response: SubmissionResponse {
                error: false,
                message: self
                    .translator
                    .translate(lang, MessageKey::SubmissionSaved, &[]),
                submission: Some(submission),
                timestamp,
            },
        }
    }

    fn reject(&self, error: &AdmissionError, lang: &str) -> AdmissionResult {
        AdmissionResult::Rejected(Rejection::new(error, lang, self.translator.as_ref()))
    }
}

/// Reserve an identity and write the submission into it
async fn store(
    allocator: IdentityAllocator,
    fingerprint: String,
    submission: CanonicalSubmission,
    timestamp_millis: i64,
) -> Result<(PathBuf, i64), AdmissionError> {
    let reservation = allocator
        .reserve(&fingerprint, &submission.lang, timestamp_millis)
        .await
        .map_err(|err| {
            if matches!(err, AdmissionError::Storage(_)) {
                error!("Could not allocate submission file: {}", err);
            }
            err
        })?;
    let artifact_path = reservation.path().to_path_buf();

    match writer::persist(reservation, &submission).await {
        Ok(timestamp) => Ok((artifact_path, timestamp)),
        Err(err) => {
            error!("Could not write {}: {}", artifact_path.display(), err);
            Err(err)
        }
    }
}
