use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CharacterId);

/// Opaque, stable identifier of a timeline action.
///
/// Ids are minted once and never recomputed from the action's position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn generate(prefix: &str) -> Self {
        Self(format!("{prefix}-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub character_id: CharacterId,
    pub name: String,
}

impl Speaker {
    pub fn new(character_id: i64, name: impl Into<String>) -> Self {
        Self {
            character_id: CharacterId(character_id),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionAssignment {
    pub character: CharacterId,
    #[serde(default)]
    pub motion: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub delay: f64,
}

impl MotionAssignment {
    pub fn blank(character: CharacterId) -> Self {
        Self {
            character,
            motion: String::new(),
            expression: String::new(),
            delay: 0.0,
        }
    }
}

/// Motion/expression a layout action starts with. Only these two keys exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl InitialState {
    pub fn is_empty(&self) -> bool {
        self.motion.is_none() && self.expression.is_none()
    }
}

/// Render-time motion/expression snapshot for one character on a talk line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterState {
    #[serde(default)]
    pub motion: String,
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePosition {
    pub side: String,
    #[serde(default)]
    pub offset_x: i64,
}

impl StagePosition {
    pub fn new(side: impl Into<String>, offset_x: i64) -> Self {
        Self {
            side: side.into(),
            offset_x,
        }
    }

    pub fn center() -> Self {
        Self::new("center", 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<StagePosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<StagePosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayoutType {
    Appear,
    Move,
    Hide,
    Other(String),
}

impl LayoutType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Appear => "appear",
            Self::Move => "move",
            Self::Hide => "hide",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for LayoutType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "appear" => Self::Appear,
            "move" => Self::Move,
            "hide" => Self::Hide,
            _ => Self::Other(value),
        }
    }
}

impl From<LayoutType> for String {
    fn from(value: LayoutType) -> Self {
        match value {
            LayoutType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
