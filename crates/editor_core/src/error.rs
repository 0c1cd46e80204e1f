use shared::{domain::ActionId, project::ProjectFileError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("command `{label}` failed: {source}")]
    MutatorFailed {
        label: &'static str,
        source: anyhow::Error,
    },
    #[error("command `{label}` would leave action id `{id}` on more than one action")]
    DuplicateActionId { label: &'static str, id: ActionId },
    #[error("index {index} is out of range for {len} actions")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("import rejected: {0}")]
    Import(#[from] ProjectFileError),
    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),
    #[error("segmentation result is stale; the document changed while it was pending")]
    StaleReset,
    #[error("text segmentation failed: {0}")]
    Segmentation(#[source] anyhow::Error),
    #[error("preference storage failed: {0}")]
    Storage(#[source] anyhow::Error),
}

impl EditorError {
    /// Errors that should be shown to the user rather than only logged.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::IndexOutOfRange { .. })
    }
}
