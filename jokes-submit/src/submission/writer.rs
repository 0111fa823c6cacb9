//! Writes canonical submissions into their reserved files

use jokes_common::format::to_json_pretty;
use std::io;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::allocator::Reservation;
use super::error::AdmissionError;
use super::model::CanonicalSubmission;

/// Persist a submission and return the response timestamp
///
/// On failure the empty reservation is removed so no partial artifact is left
/// behind. There is no retry; the client may resubmit.
pub async fn persist(
    reservation: Reservation,
    submission: &CanonicalSubmission,
) -> Result<i64, AdmissionError> {
    let (path, mut file) = reservation.into_parts();

    match write_all(&mut file, submission).await {
        Ok(()) => Ok(jokes_common::time::now_millis()),
        Err(e) => {
            drop(file);
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!(
                    "Failed to remove incomplete submission {}: {}",
                    path.display(),
                    cleanup
                );
            }
            Err(AdmissionError::Storage(e))
        }
    }
}

async fn write_all(file: &mut tokio::fs::File, submission: &CanonicalSubmission) -> io::Result<()> {
    let body = to_json_pretty(submission)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    file.write_all(body.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
