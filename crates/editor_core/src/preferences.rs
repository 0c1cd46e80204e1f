//! Editor settings persisted in a [`KeyValueStore`] between sessions.

use std::collections::BTreeMap;

use anyhow::Result;
use storage::{get_json, keys, set_json, KeyValueStore};
use tracing::debug;

use crate::{
    config::{EditorConfig, SubsequentLayoutMode},
    layout::{LayoutDefaults, PositionConfig},
    roster::CharacterRoster,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorPreferences {
    pub grouping_enabled: bool,
    pub subsequent_layout_mode: SubsequentLayoutMode,
    pub costume_mapping: BTreeMap<String, String>,
    pub position_config: PositionConfig,
    pub roster: CharacterRoster,
}

impl EditorPreferences {
    /// Missing keys fall back to defaults; a malformed stored value is an error.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let prefs = Self {
            grouping_enabled: get_json(store, keys::CARD_GROUPING)
                .await?
                .unwrap_or_default(),
            subsequent_layout_mode: get_json(store, keys::SUBSEQUENT_LAYOUT_MODE)
                .await?
                .unwrap_or_default(),
            costume_mapping: get_json(store, keys::COSTUME_MAPPING)
                .await?
                .unwrap_or_default(),
            position_config: get_json(store, keys::POSITION_CONFIG)
                .await?
                .unwrap_or_default(),
            roster: get_json(store, keys::CHARACTER_MAPPING)
                .await?
                .unwrap_or_default(),
        };
        debug!(
            grouping = prefs.grouping_enabled,
            characters = prefs.roster.len(),
            "loaded editor preferences"
        );
        Ok(prefs)
    }

    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        set_json(store, keys::CARD_GROUPING, &self.grouping_enabled).await?;
        set_json(store, keys::SUBSEQUENT_LAYOUT_MODE, &self.subsequent_layout_mode).await?;
        set_json(store, keys::COSTUME_MAPPING, &self.costume_mapping).await?;
        set_json(store, keys::POSITION_CONFIG, &self.position_config).await?;
        set_json(store, keys::CHARACTER_MAPPING, &self.roster).await?;
        Ok(())
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            grouping_enabled: self.grouping_enabled,
            subsequent_layout_mode: self.subsequent_layout_mode,
            ..EditorConfig::default()
        }
    }

    pub fn layout_defaults(&self) -> LayoutDefaults {
        LayoutDefaults {
            costumes: self.costume_mapping.clone(),
            positions: self.position_config.clone(),
        }
    }
}

/// Character names pinned to the top of the character list, in pin order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinnedCharacters {
    names: Vec<String>,
}

impl PinnedCharacters {
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let mut pinned = Self::default();
        let stored: Vec<String> = get_json(store, keys::PINNED_CHARACTERS)
            .await?
            .unwrap_or_default();
        for name in stored {
            pinned.pin(name);
        }
        Ok(pinned)
    }

    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        set_json(store, keys::PINNED_CHARACTERS, &self.names).await
    }

    pub fn pin(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.is_pinned(&name) {
            self.names.push(name);
        }
    }

    pub fn unpin(&mut self, name: &str) {
        self.names.retain(|n| n != name);
    }

    /// Returns whether `name` is pinned afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.is_pinned(name) {
            self.unpin(name);
            false
        } else {
            self.pin(name);
            true
        }
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
#[path = "tests/preferences_tests.rs"]
mod tests;
