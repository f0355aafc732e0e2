use async_trait::async_trait;
use std::path::Path;

/// Result of a best-effort mirror upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// Uploaded; carries the remote file identifier
    Uploaded(String),
    /// Mirroring is not configured or could not be initialized
    Disabled,
    /// This upload failed; later uploads are still attempted
    Failed(String),
}

impl MirrorOutcome {
    pub fn file_id(&self) -> Option<&str> {
        match self {
            MirrorOutcome::Uploaded(id) => Some(id.as_str()),
            MirrorOutcome::Disabled | MirrorOutcome::Failed(_) => None,
        }
    }

    pub fn into_file_id(self) -> Option<String> {
        match self {
            MirrorOutcome::Uploaded(id) => Some(id),
            MirrorOutcome::Disabled | MirrorOutcome::Failed(_) => None,
        }
    }
}

/// Secondary copy of uploaded files in third-party storage.
///
/// Implementations never return errors: every failure is folded into
/// [`MirrorOutcome`].
#[async_trait]
pub trait CloudMirror: Send + Sync {
    async fn upload_file(&self, display_name: &str, local_path: &Path) -> MirrorOutcome;
}

/// Mirror used when no cloud storage is wanted at all.
pub struct NoopMirror;

#[async_trait]
impl CloudMirror for NoopMirror {
    async fn upload_file(&self, _display_name: &str, _local_path: &Path) -> MirrorOutcome {
        MirrorOutcome::Disabled
    }
}
