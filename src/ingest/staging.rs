//! Staging of uploaded byte streams onto durable local storage.
//!
//! Every upload gets a fresh UUID and lands at `{staging_dir}/{id}_{original_filename}`,
//! so concurrent requests never contend for a path. The returned [`StagedFile`] owns the
//! location: dropping it before [`StagedFile::persist`] removes the file again, which is
//! what runs the compensation path on pipeline failure or request cancellation.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::types::IngestError;

/// A staged upload on local storage, removed on drop unless persisted.
#[derive(Debug)]
pub struct StagedFile {
    id: String,
    path: PathBuf,
    persisted: bool,
}

impl StagedFile {
    /// Opaque identifier generated for this upload.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Location of the staged bytes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the staged file as a durable artifact and return its location.
    pub fn persist(mut self) -> PathBuf {
        self.persisted = true;
        self.path.clone()
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Removed staged file during compensation");
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Failed to remove staged file"
                );
            }
        }
    }
}

/// Write an upload into the staging directory under a unique name.
///
/// The directory is created if missing (idempotent). On any IO failure nothing
/// downstream is invoked and there is nothing to clean up.
pub async fn stage_upload(
    staging_dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<StagedFile, IngestError> {
    tokio::fs::create_dir_all(staging_dir).await?;

    let id = Uuid::new_v4().to_string();
    let path = staging_dir.join(format!("{id}_{file_name}"));
    tokio::fs::write(&path, bytes).await?;

    tracing::info!(file_id = %id, path = %path.display(), "Staged upload");
    Ok(StagedFile {
        id,
        path,
        persisted: false,
    })
}
