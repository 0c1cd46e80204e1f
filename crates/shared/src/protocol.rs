use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Change notifications an editor instance broadcasts to its render layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EditorEvent {
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
    },
    SelectionChanged {
        container: String,
        selected_ids: Vec<String>,
    },
    DocumentChanged {
        revision: u64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentTextRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentTextResponse {
    pub segments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceReply<T> {
    Ok(T),
    Error(ApiError),
}
