//! Per-action sub-document edits: motion assignments and layout initial state.
//!
//! Each helper is exactly one command. A missing action id or an out-of-range
//! motion index is tolerated as a stale UI reference: nothing changes and no
//! history entry is left behind.

use std::collections::HashSet;

use shared::{
    domain::{ActionId, CharacterId, InitialState, LayoutType, MotionAssignment},
    project::{Action, ProjectFile},
};

use crate::{
    command::{CommandExecutor, CommitOutcome, ExecuteOptions},
    error::EditorError,
    roster::CharacterRoster,
};

/// Partial update for a layout action's initial state. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitialStateUpdate {
    pub motion: Option<String>,
    pub expression: Option<String>,
}

impl InitialStateUpdate {
    pub fn motion(motion: impl Into<String>) -> Self {
        Self {
            motion: Some(motion.into()),
            ..Self::default()
        }
    }

    pub fn expression(expression: impl Into<String>) -> Self {
        Self {
            expression: Some(expression.into()),
            ..Self::default()
        }
    }
}

/// Partial update for one motion assignment. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionUpdate {
    pub character: Option<CharacterId>,
    pub motion: Option<String>,
    pub expression: Option<String>,
    pub delay: Option<f64>,
}

impl MotionUpdate {
    fn apply(self, target: &mut MotionAssignment) {
        if let Some(character) = self.character {
            target.character = character;
        }
        if let Some(motion) = self.motion {
            target.motion = motion;
        }
        if let Some(expression) = self.expression {
            target.expression = expression;
        }
        if let Some(delay) = self.delay {
            target.delay = delay;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedCharacter {
    pub id: CharacterId,
    pub name: String,
}

pub struct AssignmentStore<'a> {
    executor: &'a mut CommandExecutor,
}

impl<'a> AssignmentStore<'a> {
    pub fn new(executor: &'a mut CommandExecutor) -> Self {
        Self { executor }
    }

    /// Appends a blank assignment for `character` to a talk action.
    pub fn add_motion_assignment(
        &mut self,
        action_id: &ActionId,
        character: CharacterId,
    ) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "add motion",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(talk) = draft.talk_mut(action_id) {
                    talk.motions.push(MotionAssignment::blank(character));
                }
                Ok(())
            },
        )
    }

    pub fn update_layout_initial_state(
        &mut self,
        action_id: &ActionId,
        update: InitialStateUpdate,
    ) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "update initial state",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(layout) = draft.layout_mut(action_id) {
                    let state = layout.initial_state.get_or_insert_with(InitialState::default);
                    if let Some(motion) = update.motion {
                        state.motion = Some(motion);
                    }
                    if let Some(expression) = update.expression {
                        state.expression = Some(expression);
                    }
                }
                Ok(())
            },
        )
    }

    pub fn update_motion_assignment(
        &mut self,
        action_id: &ActionId,
        index: usize,
        update: MotionUpdate,
    ) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "update motion",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(assignment) = draft
                    .talk_mut(action_id)
                    .and_then(|talk| talk.motions.get_mut(index))
                {
                    update.apply(assignment);
                }
                Ok(())
            },
        )
    }

    pub fn remove_motion_assignment(
        &mut self,
        action_id: &ActionId,
        index: usize,
    ) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "remove motion",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(talk) = draft.talk_mut(action_id) {
                    if index < talk.motions.len() {
                        talk.motions.remove(index);
                    }
                }
                Ok(())
            },
        )
    }

    /// Materialises `{motion: "", expression: ""}` as an edit target, unless
    /// the layout action already carries motion, expression or delay data.
    pub fn ensure_layout_initial_state(
        &mut self,
        action_id: &ActionId,
    ) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "prepare initial state",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(layout) = draft.layout_mut(action_id) {
                    let has_state = layout
                        .initial_state
                        .as_ref()
                        .is_some_and(|state| !state.is_empty());
                    if !has_state && layout.delay.is_none() {
                        layout.initial_state = Some(InitialState {
                            motion: Some(String::new()),
                            expression: Some(String::new()),
                        });
                    }
                }
                Ok(())
            },
        )
    }
}

/// Characters brought on stage by `appear` actions, in first-appearance order,
/// de-duplicated by name. Unnamed actions fall back to the roster.
pub fn staged_characters(project: &ProjectFile, roster: &CharacterRoster) -> Vec<StagedCharacter> {
    let mut seen = HashSet::new();
    let mut staged = Vec::new();

    for layout in project.actions.iter().filter_map(Action::as_layout) {
        if layout.layout_type != LayoutType::Appear {
            continue;
        }
        let name = layout
            .character_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| roster.name_for(layout.character_id));
        let Some(name) = name else {
            continue;
        };
        if seen.insert(name.to_string()) {
            staged.push(StagedCharacter {
                id: layout.character_id,
                name: name.to_string(),
            });
        }
    }

    staged
}

pub fn action_has_expression_data(action: &Action) -> bool {
    match action {
        Action::Talk(talk) => !talk.motions.is_empty(),
        Action::Layout(layout) => {
            layout
                .initial_state
                .as_ref()
                .is_some_and(|state| !state.is_empty())
                || layout.delay.is_some()
        }
    }
}

#[cfg(test)]
#[path = "tests/assignments_tests.rs"]
mod tests;
