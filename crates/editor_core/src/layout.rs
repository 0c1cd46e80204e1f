//! Stage layout: who is on stage where, in which costume, at each point of the timeline.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use shared::{
    domain::{ActionId, CharacterId, InitialState, LayoutPosition, LayoutType, StagePosition},
    project::{Action, LayoutAction},
};

use crate::{
    command::{CommitOutcome, ExecuteOptions},
    config::SubsequentLayoutMode,
    error::EditorError,
    Editor,
};

/// Slots handed out in appearance order when automatic positioning is on.
pub const AUTO_POSITIONS: [&str; 3] = ["leftInside", "center", "rightInside"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualPosition {
    pub position: String,
    pub offset: i64,
}

impl Default for ManualPosition {
    fn default() -> Self {
        Self {
            position: "center".to_string(),
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionConfig {
    pub auto_position_mode: bool,
    pub manual_positions: BTreeMap<String, ManualPosition>,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            auto_position_mode: true,
            manual_positions: BTreeMap::new(),
        }
    }
}

impl PositionConfig {
    /// Position for a character dragged in by hand: the manual slot if one is
    /// configured and auto mode is off, otherwise centre stage.
    pub fn default_position(&self, name: &str) -> StagePosition {
        match self.manual_positions.get(name) {
            Some(manual) if !self.auto_position_mode => manual.to_stage(),
            _ => StagePosition::center(),
        }
    }

    /// Position for the `appearance_order`-th character placed by auto layout.
    pub fn auto_layout_position(&self, name: &str, appearance_order: usize) -> StagePosition {
        if self.auto_position_mode {
            StagePosition::new(AUTO_POSITIONS[appearance_order % AUTO_POSITIONS.len()], 0)
        } else {
            self.manual_positions
                .get(name)
                .map(ManualPosition::to_stage)
                .unwrap_or_else(StagePosition::center)
        }
    }
}

impl ManualPosition {
    fn to_stage(&self) -> StagePosition {
        let side = if self.position.is_empty() {
            "center"
        } else {
            self.position.as_str()
        };
        StagePosition::new(side, self.offset)
    }
}

/// Per-character fallbacks used when the timeline says nothing yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDefaults {
    /// Character name to default costume id.
    pub costumes: BTreeMap<String, String>,
    pub positions: PositionConfig,
}

impl LayoutDefaults {
    pub fn costume_for(&self, name: &str) -> String {
        self.costumes.get(name).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterStageState {
    pub on_stage: bool,
    pub last_position: Option<StagePosition>,
    pub last_costume: Option<String>,
}

/// Replays layout actions in `actions[..index]` for the character called `name`.
pub fn character_state_at(actions: &[Action], name: &str, index: usize) -> CharacterStageState {
    let mut state = CharacterStageState::default();
    let end = index.min(actions.len());

    for layout in actions[..end].iter().filter_map(Action::as_layout) {
        if layout.character_name.as_deref() != Some(name) {
            continue;
        }
        match layout.layout_type {
            LayoutType::Appear | LayoutType::Move => {
                state.on_stage = true;
                if let Some(to) = layout.position.as_ref().and_then(|p| p.to.clone()) {
                    state.last_position = Some(to);
                }
                if let Some(costume) = layout.costume.as_ref().filter(|c| !c.is_empty()) {
                    state.last_costume = Some(costume.clone());
                }
            }
            LayoutType::Hide => {
                state.on_stage = false;
                state.last_position = None;
            }
            LayoutType::Other(_) => {}
        }
    }

    state
}

/// Builds the layout action for `name` dropped at `index`, inheriting costume
/// and position from what the timeline has established before that point.
pub fn build_layout_action(
    actions: &[Action],
    character_id: CharacterId,
    name: &str,
    index: usize,
    defaults: &LayoutDefaults,
    subsequent: SubsequentLayoutMode,
) -> LayoutAction {
    let previous = character_state_at(actions, name, index);
    let layout_type = if previous.on_stage {
        subsequent.layout_type()
    } else {
        LayoutType::Appear
    };
    let costume = previous
        .last_costume
        .unwrap_or_else(|| defaults.costume_for(name));
    let from = previous
        .last_position
        .unwrap_or_else(|| defaults.positions.default_position(name));

    let mut action = LayoutAction::new(ActionId::generate("layout"), layout_type, character_id);
    action.character_name = Some(name.to_string());
    action.costume = Some(costume);
    action.position = Some(LayoutPosition {
        from: Some(from.clone()),
        to: Some(from),
    });
    action.initial_state = Some(InitialState::default());
    action
}

/// One edit from a layout card's controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutProperty {
    LayoutType(LayoutType),
    Costume(String),
    /// The card's main side selector.
    Side(String),
    /// The card's main offset input.
    Offset(i64),
    ToSide(String),
    ToOffset(i64),
    IndependentToPosition(bool),
}

impl LayoutProperty {
    pub fn apply(self, action: &mut LayoutAction) {
        match self {
            Self::LayoutType(layout_type) => action.layout_type = layout_type,
            Self::Costume(costume) => action.costume = Some(costume),
            Self::IndependentToPosition(flag) => action.independent_to_position = flag,
            Self::Side(side) => {
                for slot in primary_slots(action) {
                    slot.side = side.clone();
                }
            }
            Self::Offset(offset) => {
                for slot in primary_slots(action) {
                    slot.offset_x = offset;
                }
            }
            Self::ToSide(side) => to_slot(action).side = side,
            Self::ToOffset(offset) => to_slot(action).offset_x = offset,
        }
    }
}

fn to_slot(action: &mut LayoutAction) -> &mut StagePosition {
    action
        .position
        .get_or_insert_with(LayoutPosition::default)
        .to
        .get_or_insert_with(StagePosition::center)
}

/// The slots the main position controls write to. With an independent
/// `to`, only `from`; otherwise `to` for moves and both ends for the rest.
fn primary_slots(action: &mut LayoutAction) -> Vec<&mut StagePosition> {
    let is_move = action.layout_type == LayoutType::Move;
    let independent = action.independent_to_position;
    let LayoutPosition { from, to } = action.position.get_or_insert_with(LayoutPosition::default);
    if independent {
        vec![from.get_or_insert_with(StagePosition::center)]
    } else if is_move {
        vec![to.get_or_insert_with(StagePosition::center)]
    } else {
        vec![
            from.get_or_insert_with(StagePosition::center),
            to.get_or_insert_with(StagePosition::center),
        ]
    }
}

impl Editor {
    pub fn layout_defaults(&self) -> &LayoutDefaults {
        &self.layout_defaults
    }

    pub fn set_layout_defaults(&mut self, defaults: LayoutDefaults) {
        self.layout_defaults = defaults;
    }

    pub fn character_state_at(&self, name: &str, index: usize) -> CharacterStageState {
        character_state_at(&self.state().actions, name, index)
    }

    /// Inserts a layout action for a character at a global index (clamped to the end).
    pub fn insert_layout_action(
        &mut self,
        character_id: CharacterId,
        name: &str,
        index: usize,
    ) -> Result<CommitOutcome, EditorError> {
        let defaults = self.layout_defaults.clone();
        let mode = self.config.subsequent_layout_mode;
        self.executor.execute("insert layout", |draft| {
            let index = index.min(draft.actions.len());
            let action =
                build_layout_action(&draft.actions, character_id, name, index, &defaults, mode);
            draft.actions.insert(index, Action::Layout(action));
            Ok(())
        })
    }

    pub fn clear_all_layouts(&mut self) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "clear layouts",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                draft.actions.retain(|action| action.as_layout().is_none());
                Ok(())
            },
        )
    }

    /// Replaces every layout action with one `appear` per speaker, placed
    /// right before that speaker's first line.
    pub fn apply_auto_layout(&mut self) -> Result<CommitOutcome, EditorError> {
        let defaults = self.layout_defaults.clone();
        self.executor.execute("auto layout", |draft| {
            let talks: Vec<Action> = draft
                .actions
                .drain(..)
                .filter(|action| action.as_layout().is_none())
                .collect();
            let mut appeared: HashSet<String> = HashSet::new();
            let mut rebuilt = Vec::with_capacity(talks.len() * 2);

            for action in talks {
                if let Action::Talk(talk) = &action {
                    for speaker in &talk.speakers {
                        if !appeared.insert(speaker.name.clone()) {
                            continue;
                        }
                        let slot = defaults
                            .positions
                            .auto_layout_position(&speaker.name, appeared.len() - 1);
                        let mut layout = LayoutAction::new(
                            ActionId::generate("layout"),
                            LayoutType::Appear,
                            speaker.character_id,
                        );
                        layout.character_name = Some(speaker.name.clone());
                        layout.costume = Some(defaults.costume_for(&speaker.name));
                        layout.position = Some(LayoutPosition {
                            from: Some(slot.clone()),
                            to: Some(slot),
                        });
                        layout.initial_state = Some(InitialState::default());
                        rebuilt.push(Action::Layout(layout));
                    }
                }
                rebuilt.push(action);
            }

            draft.actions = rebuilt;
            Ok(())
        })
    }

    pub fn update_layout_property(
        &mut self,
        action_id: &ActionId,
        property: LayoutProperty,
    ) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "edit layout",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(layout) = draft.layout_mut(action_id) {
                    property.apply(layout);
                }
                Ok(())
            },
        )
    }

    pub fn set_layout_delay(
        &mut self,
        action_id: &ActionId,
        delay: Option<f64>,
    ) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "set layout delay",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(layout) = draft.layout_mut(action_id) {
                    layout.delay = delay;
                }
                Ok(())
            },
        )
    }

    /// Empties the initial state and drops the delay.
    pub fn clear_layout_state(&mut self, action_id: &ActionId) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "clear layout state",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(layout) = draft.layout_mut(action_id) {
                    layout.initial_state = Some(InitialState::default());
                    layout.delay = None;
                }
                Ok(())
            },
        )
    }
}

#[cfg(test)]
#[path = "tests/layout_tests.rs"]
mod tests;
