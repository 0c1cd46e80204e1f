use serde::{Deserialize, Serialize};
use shared::domain::LayoutType;

use crate::{history::DEFAULT_HISTORY_CAPACITY, reorder::DEFAULT_GROUP_SIZE, reorder::Grouping};

/// Layout type given to a character dropped onto the timeline while already on stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsequentLayoutMode {
    #[default]
    Move,
    Hide,
}

impl SubsequentLayoutMode {
    pub fn layout_type(self) -> LayoutType {
        match self {
            Self::Move => LayoutType::Move,
            Self::Hide => LayoutType::Hide,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Move => Self::Hide,
            Self::Hide => Self::Move,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub group_size: usize,
    pub history_capacity: usize,
    pub grouping_enabled: bool,
    pub subsequent_layout_mode: SubsequentLayoutMode,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            grouping_enabled: false,
            subsequent_layout_mode: SubsequentLayoutMode::default(),
        }
    }
}

impl EditorConfig {
    pub fn grouping(&self) -> Grouping {
        Grouping {
            enabled: self.grouping_enabled,
            group_size: self.group_size,
        }
    }
}
