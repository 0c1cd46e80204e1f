use std::collections::HashSet;

use shared::domain::{ActionId, CharacterId, Speaker};

use crate::{
    command::{CommitOutcome, ExecuteOptions},
    error::EditorError,
    Editor,
};

impl Editor {
    /// Adds `speaker` to every selected talk action, or to `action_id` when
    /// nothing is selected. A speaker whose character is already present is
    /// not added twice. The selection is consumed and cleared afterwards.
    pub fn update_speaker_assignment(
        &mut self,
        action_id: &ActionId,
        speaker: Speaker,
    ) -> Result<CommitOutcome, EditorError> {
        let targets: Vec<ActionId> = if self.selection.is_empty() {
            vec![action_id.clone()]
        } else {
            self.selection
                .selected_ids()
                .into_iter()
                .map(ActionId::new)
                .collect()
        };

        let outcome = self.executor.execute_with(
            "assign speaker",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                for id in &targets {
                    if let Some(talk) = draft.talk_mut(id) {
                        if !talk.has_speaker(speaker.character_id) {
                            talk.speakers.push(speaker.clone());
                        }
                    }
                }
                Ok(())
            },
        );

        self.selection.clear_and_notify();
        outcome
    }

    pub fn remove_speaker(
        &mut self,
        action_id: &ActionId,
        character_id: CharacterId,
    ) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "remove speaker",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(talk) = draft.talk_mut(action_id) {
                    talk.speakers.retain(|s| s.character_id != character_id);
                }
                Ok(())
            },
        )
    }

    pub fn remove_all_speakers(&mut self, action_id: &ActionId) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "clear speakers",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(talk) = draft.talk_mut(action_id) {
                    talk.speakers.clear();
                }
                Ok(())
            },
        )
    }

    pub fn update_text(
        &mut self,
        action_id: &ActionId,
        text: impl Into<String>,
    ) -> Result<CommitOutcome, EditorError> {
        let text = text.into();
        self.executor.execute_with(
            "edit text",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                if let Some(talk) = draft.talk_mut(action_id) {
                    talk.text = text;
                }
                Ok(())
            },
        )
    }

    /// Speaker names used anywhere on the timeline, first occurrence first.
    pub fn used_speaker_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for talk in self.state().actions.iter().filter_map(|action| action.as_talk()) {
            for speaker in &talk.speakers {
                if !speaker.name.is_empty() && seen.insert(speaker.name.as_str()) {
                    names.push(speaker.name.clone());
                }
            }
        }
        names
    }
}
