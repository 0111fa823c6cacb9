//! Collision-free storage identities for submissions
//!
//! An identity is `(fingerprint, counter, timestamp)` and maps to
//! `<root>/<lang>/submission_<fingerprint>_<counter>_<timestamp>.json`.
//! Each attempt creates the file exclusively, so two requests can never end
//! up with the same path. Running out of attempts means the requester is
//! submitting faster than the rate limit allows.

use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};

use super::error::AdmissionError;
use super::sanitizer::unsupported_language;
use crate::config::{SubmissionConfig, FINGERPRINT_MAX_LEN};

/// An exclusively created, still empty artifact file
#[derive(Debug)]
pub struct Reservation {
    path: PathBuf,
    counter: u32,
    file: File,
}

impl Reservation {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub(crate) fn into_parts(self) -> (PathBuf, File) {
        (self.path, self.file)
    }
}

#[derive(Debug, Clone)]
pub struct IdentityAllocator {
    config: Arc<SubmissionConfig>,
}

impl IdentityAllocator {
    pub fn new(config: Arc<SubmissionConfig>) -> Self {
        Self { config }
    }

    /// Reserve the first free path for this requester and millisecond
    ///
    /// `lang` must be one of the supported languages; anything else is
    /// rejected before touching the filesystem.
    pub async fn reserve(
        &self,
        fingerprint: &str,
        lang: &str,
        timestamp_millis: i64,
    ) -> Result<Reservation, AdmissionError> {
        let config = &self.config;
        if !config.is_supported_language(lang) {
            return Err(unsupported_language(lang, config));
        }

        let fingerprint = sanitize_fingerprint(
            fingerprint,
            &config.fingerprint_pattern,
            &config.fingerprint_replacement,
        );

        fs::create_dir_all(config.submission_root.join(lang)).await?;

        for counter in 0..config.max_attempts {
            let path = submission_path(
                &config.submission_root,
                lang,
                &fingerprint,
                counter,
                timestamp_millis,
            );

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => {
                    return Ok(Reservation {
                        path,
                        counter,
                        file,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(AdmissionError::Storage(e)),
            }
        }

        Err(AdmissionError::RateLimited {
            limit: config.max_attempts,
            window_minutes: config.time_frame_minutes,
        })
    }
}

/// Replace every match of `pattern`, then keep at most eight characters
pub fn sanitize_fingerprint(fingerprint: &str, pattern: &Regex, replacement: &str) -> String {
    pattern
        .replace_all(fingerprint, regex::NoExpand(replacement))
        .chars()
        .take(FINGERPRINT_MAX_LEN)
        .collect()
}

pub fn submission_path(
    root: &Path,
    lang: &str,
    fingerprint: &str,
    counter: u32,
    timestamp_millis: i64,
) -> PathBuf {
    root.join(lang).join(format!(
        "submission_{}_{}_{}.json",
        fingerprint, counter, timestamp_millis
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jokes_common::config::TomlConfig;
    use tempfile::TempDir;

    fn allocator(root: &Path, max_attempts: u32) -> IdentityAllocator {
        let mut toml = TomlConfig::default();
        toml.submissions.max_attempts = max_attempts;
        toml.submissions.time_frame_minutes = 5;
        let config = SubmissionConfig::from_toml(&toml, root.to_path_buf()).unwrap();
        IdentityAllocator::new(Arc::new(config))
    }

    #[test]
    fn test_sanitize_fingerprint() {
        let pattern = Regex::new("[^A-Za-z0-9]").unwrap();
        assert_eq!(sanitize_fingerprint("1.2.3.4", &pattern, "_"), "1_2_3_4");
        assert_eq!(sanitize_fingerprint("192.168.100.200", &pattern, "_"), "192_168_");
        assert_eq!(sanitize_fingerprint("2001:db8::1", &pattern, "_"), "2001_db8");
        // Replacement is literal, `$` has no special meaning
        assert_eq!(sanitize_fingerprint("a.b", &pattern, "$0"), "a$0b");
    }

    #[test]
    fn test_submission_path_layout() {
        let path = submission_path(Path::new("/data"), "en", "1_2_3_4", 0, 1_700_000_000_000);
        assert_eq!(
            path,
            PathBuf::from("/data/en/submission_1_2_3_4_0_1700000000000.json")
        );
    }

    #[tokio::test]
    async fn test_sequential_reservations_get_distinct_counters() {
        let temp_dir = TempDir::new().unwrap();
        let allocator = allocator(temp_dir.path(), 3);

        let first = allocator.reserve("1.2.3.4", "en", 1000).await.unwrap();
        let second = allocator.reserve("1.2.3.4", "en", 1000).await.unwrap();

        assert_eq!(first.counter(), 0);
        assert_eq!(second.counter(), 1);
        assert_eq!(
            first.path(),
            temp_dir.path().join("en/submission_1_2_3_4_0_1000.json")
        );
        assert_eq!(
            second.path(),
            temp_dir.path().join("en/submission_1_2_3_4_1_1000.json")
        );
    }

    #[tokio::test]
    async fn test_existing_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let allocator = allocator(temp_dir.path(), 3);

        std::fs::create_dir_all(temp_dir.path().join("de")).unwrap();
        let taken = temp_dir.path().join("de/submission_1_2_3_4_0_5.json");
        std::fs::write(&taken, "{}").unwrap();

        let reservation = allocator.reserve("1.2.3.4", "de", 5).await.unwrap();
        assert_eq!(reservation.counter(), 1);
        // The existing artifact is untouched
        assert_eq!(std::fs::read_to_string(&taken).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_exhausted_attempts_are_rate_limited() {
        let temp_dir = TempDir::new().unwrap();
        let allocator = allocator(temp_dir.path(), 3);

        for _ in 0..3 {
            allocator.reserve("1.2.3.4", "en", 7).await.unwrap();
        }

        let err = allocator.reserve("1.2.3.4", "en", 7).await.unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::RateLimited {
                limit: 3,
                window_minutes: 5
            }
        ));
        assert_eq!(err.code(), 101);
    }

    #[tokio::test]
    async fn test_other_fingerprints_and_timestamps_do_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let allocator = allocator(temp_dir.path(), 1);

        allocator.reserve("1.2.3.4", "en", 7).await.unwrap();
        assert_eq!(allocator.reserve("5.6.7.8", "en", 7).await.unwrap().counter(), 0);
        assert_eq!(allocator.reserve("1.2.3.4", "en", 8).await.unwrap().counter(), 0);
    }

    #[tokio::test]
    async fn test_lang_outside_supported_set_never_reaches_disk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        let allocator = allocator(&root, 3);

        let err = allocator.reserve("1.2.3.4", "../escaped", 7).await.unwrap_err();
        assert_eq!(err.code(), 105);
        assert!(!temp_dir.path().join("escaped").exists());
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_unwritable_root_is_a_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let file_as_root = temp_dir.path().join("not-a-directory");
        std::fs::write(&file_as_root, "").unwrap();

        let allocator = allocator(&file_as_root, 3);
        let err = allocator.reserve("1.2.3.4", "en", 7).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Storage(_)));
    }
}
