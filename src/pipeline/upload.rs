//! Uploaded image payload and the one await point that produces it.

use std::path::Path;
use std::time::Duration;

use super::analysis::AnalysisError;
use super::cancel::CancellationFlag;

/// Raw image bytes as received from the caller.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original file name; also the usual jitter seed.
    pub file_name: String,
    /// Size the caller declared (e.g. from file metadata or a form field).
    pub declared_size: u64,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Wrap in-memory bytes; the declared size is the byte length.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            declared_size: bytes.len() as u64,
            bytes,
        }
    }

    /// Effective size: the larger of what was declared and what was received.
    pub fn size(&self) -> u64 {
        self.declared_size.max(self.bytes.len() as u64)
    }
}

/// Read an image file under a timeout.
///
/// The size ceiling is checked against file metadata before the content is
/// read, so oversized files are rejected without loading them.
pub async fn read_upload(
    path: &Path,
    max_bytes: u64,
    timeout: Duration,
    cancel: &CancellationFlag,
) -> Result<ImageUpload, AnalysisError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let read = async {
        let declared_size = tokio::fs::metadata(path).await?.len();
        if declared_size > max_bytes {
            return Err(AnalysisError::FileTooLarge {
                size: declared_size,
                limit: max_bytes,
            });
        }
        let bytes = tokio::fs::read(path).await?;
        Ok::<_, AnalysisError>(ImageUpload {
            file_name,
            declared_size,
            bytes,
        })
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AnalysisError::Cancelled),
        outcome = tokio::time::timeout(timeout, read) => {
            outcome.map_err(|_| AnalysisError::ReadTimeout(timeout))?
        }
    }
}
