use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::domain::{CharacterId, Speaker};

/// Known characters: display name to the ids that render as that character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterRoster {
    by_name: BTreeMap<String, Vec<CharacterId>>,
}

impl CharacterRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, ids: impl IntoIterator<Item = i64>) {
        self.by_name
            .insert(name.into(), ids.into_iter().map(CharacterId).collect());
    }

    pub fn with(mut self, name: impl Into<String>, ids: impl IntoIterator<Item = i64>) -> Self {
        self.insert(name, ids);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn primary_id(&self, name: &str) -> Option<CharacterId> {
        self.by_name.get(name).and_then(|ids| ids.first().copied())
    }

    pub fn speaker_for(&self, name: &str) -> Option<Speaker> {
        self.primary_id(name).map(|id| Speaker {
            character_id: id,
            name: name.to_string(),
        })
    }

    /// Reverse lookup; the first name (alphabetically) listing `id` wins.
    pub fn name_for(&self, id: CharacterId) -> Option<&str> {
        self.by_name
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(name, _)| name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
