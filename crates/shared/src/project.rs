use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    ActionId, CharacterId, CharacterState, InitialState, LayoutPosition, LayoutType,
    MotionAssignment, Speaker,
};

pub const PROJECT_FILE_VERSION: &str = "1.0";

fn default_version() -> String {
    PROJECT_FILE_VERSION.to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The canonical editor document: an ordered timeline of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default = "default_version")]
    pub version: String,
    pub actions: Vec<Action>,
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            actions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Talk(TalkAction),
    Layout(LayoutAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkAction {
    pub id: ActionId,
    pub text: String,
    pub speakers: Vec<Speaker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub motions: Vec<MotionAssignment>,
    /// Keyed by the character id rendered as a string, as in the JSON form.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub character_states: BTreeMap<String, CharacterState>,
}

impl TalkAction {
    pub fn new(id: ActionId, text: impl Into<String>, speakers: Vec<Speaker>) -> Self {
        Self {
            id,
            text: text.into(),
            speakers,
            motions: Vec::new(),
            character_states: BTreeMap::new(),
        }
    }

    pub fn has_speaker(&self, character_id: CharacterId) -> bool {
        self.speakers.iter().any(|s| s.character_id == character_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAction {
    pub id: ActionId,
    pub layout_type: LayoutType,
    pub character_id: CharacterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<LayoutPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<InitialState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(
        rename = "_independentToPosition",
        default,
        skip_serializing_if = "is_false"
    )]
    pub independent_to_position: bool,
}

impl LayoutAction {
    pub fn new(id: ActionId, layout_type: LayoutType, character_id: CharacterId) -> Self {
        Self {
            id,
            layout_type,
            character_id,
            character_name: None,
            costume: None,
            position: None,
            initial_state: None,
            delay: None,
            independent_to_position: false,
        }
    }
}

impl Action {
    pub fn id(&self) -> &ActionId {
        match self {
            Self::Talk(talk) => &talk.id,
            Self::Layout(layout) => &layout.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Talk(_) => "talk",
            Self::Layout(_) => "layout",
        }
    }

    pub fn as_talk(&self) -> Option<&TalkAction> {
        match self {
            Self::Talk(talk) => Some(talk),
            Self::Layout(_) => None,
        }
    }

    pub fn as_talk_mut(&mut self) -> Option<&mut TalkAction> {
        match self {
            Self::Talk(talk) => Some(talk),
            Self::Layout(_) => None,
        }
    }

    pub fn as_layout(&self) -> Option<&LayoutAction> {
        match self {
            Self::Layout(layout) => Some(layout),
            Self::Talk(_) => None,
        }
    }

    pub fn as_layout_mut(&mut self) -> Option<&mut LayoutAction> {
        match self {
            Self::Layout(layout) => Some(layout),
            Self::Talk(_) => None,
        }
    }
}

impl ProjectFile {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            version: default_version(),
            actions,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn position_of(&self, id: &ActionId) -> Option<usize> {
        self.actions.iter().position(|a| a.id() == id)
    }

    pub fn find(&self, id: &ActionId) -> Option<&Action> {
        self.actions.iter().find(|a| a.id() == id)
    }

    pub fn find_mut(&mut self, id: &ActionId) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| a.id() == id)
    }

    pub fn talk_mut(&mut self, id: &ActionId) -> Option<&mut TalkAction> {
        self.find_mut(id).and_then(Action::as_talk_mut)
    }

    pub fn layout_mut(&mut self, id: &ActionId) -> Option<&mut LayoutAction> {
        self.find_mut(id).and_then(Action::as_layout_mut)
    }

    pub fn ids(&self) -> Vec<ActionId> {
        self.actions.iter().map(|a| a.id().clone()).collect()
    }

    /// Copy of the document with render-only data (`characterStates`) removed.
    pub fn export_view(&self) -> ProjectFile {
        let mut exported = self.clone();
        for action in &mut exported.actions {
            if let Action::Talk(talk) = action {
                talk.character_states.clear();
            }
        }
        exported
    }

    pub fn to_export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export_view())
    }

    pub fn duplicate_id(&self) -> Option<&ActionId> {
        let mut seen = HashSet::with_capacity(self.actions.len());
        self.actions
            .iter()
            .map(Action::id)
            .find(|id| !seen.insert(*id))
    }
}

#[derive(Debug, Error)]
pub enum ProjectFileError {
    #[error("project file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("project file has no `actions` list")]
    ActionsNotSequence,
    #[error("action #{index} is not an object")]
    NotAnObject { index: usize },
    #[error("action #{index} has no `type`")]
    MissingType { index: usize },
    #[error("talk action #{index} needs a `text` string and a `speakers` list naming each character once")]
    MalformedTalk { index: usize },
    #[error("layout action #{index} needs a `layoutType` string and a non-null `characterId`")]
    MalformedLayout { index: usize },
    #[error("action #{index} has unrecognized type `{kind}`")]
    UnknownType { index: usize, kind: String },
    #[error("action id `{0}` appears more than once")]
    DuplicateId(ActionId),
}

/// Structural checks an imported document must pass before it is deserialized.
pub fn validate_project_value(value: &Value) -> Result<(), ProjectFileError> {
    let actions = value
        .get("actions")
        .and_then(Value::as_array)
        .ok_or(ProjectFileError::ActionsNotSequence)?;

    for (index, action) in actions.iter().enumerate() {
        let Some(object) = action.as_object() else {
            return Err(ProjectFileError::NotAnObject { index });
        };
        let Some(kind) = object.get("type").and_then(Value::as_str) else {
            return Err(ProjectFileError::MissingType { index });
        };
        match kind {
            "talk" => {
                let text_ok = object.get("text").is_some_and(Value::is_string);
                let Some(speakers) = object.get("speakers").and_then(Value::as_array) else {
                    return Err(ProjectFileError::MalformedTalk { index });
                };
                let mut seen = HashSet::with_capacity(speakers.len());
                let repeated = speakers
                    .iter()
                    .filter_map(|speaker| speaker.get("characterId").and_then(Value::as_i64))
                    .any(|id| !seen.insert(id));
                if !text_ok || repeated {
                    return Err(ProjectFileError::MalformedTalk { index });
                }
            }
            "layout" => {
                let layout_type_ok = object.get("layoutType").is_some_and(Value::is_string);
                let character_ok = object.get("characterId").is_some_and(|id| !id.is_null());
                if !(layout_type_ok && character_ok) {
                    return Err(ProjectFileError::MalformedLayout { index });
                }
            }
            other => {
                return Err(ProjectFileError::UnknownType {
                    index,
                    kind: other.to_string(),
                })
            }
        }
    }

    Ok(())
}

/// Parses an imported project. Either the whole file loads or nothing does.
pub fn parse_project(raw: &str) -> Result<ProjectFile, ProjectFileError> {
    let value: Value = serde_json::from_str(raw)?;
    validate_project_value(&value)?;
    let project: ProjectFile = serde_json::from_value(value)?;
    if let Some(id) = project.duplicate_id() {
        return Err(ProjectFileError::DuplicateId(id.clone()));
    }
    Ok(project)
}

#[cfg(test)]
#[path = "tests/project_tests.rs"]
mod tests;
