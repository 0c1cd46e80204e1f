//! The only write path into the canonical document.
//!
//! Every mutation runs against a private draft. The draft replaces the live
//! document only when the mutator succeeds, and the before/after snapshots are
//! recorded as one reversible command. Snapshots are owned deep copies, so
//! later edits to the live document cannot reach into history.
//!
//! Snapshotting costs O(document) per command. A persistent (structurally
//! shared) action list would keep this contract at lower cost for very large
//! projects.

use shared::{project::ProjectFile, protocol::EditorEvent};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    error::EditorError,
    history::{Command, HistoryManager},
};

struct SnapshotCommand {
    label: &'static str,
    before: ProjectFile,
    after: ProjectFile,
}

impl Command<ProjectFile> for SnapshotCommand {
    fn label(&self) -> &str {
        self.label
    }

    fn execute(&self, target: &mut ProjectFile) {
        *target = self.after.clone();
    }

    fn undo(&self, target: &mut ProjectFile) {
        *target = self.before.clone();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Skip the commit (and the history entry) when the draft equals the current state.
    pub skip_if_unchanged: bool,
}

impl ExecuteOptions {
    pub fn skip_if_unchanged() -> Self {
        Self {
            skip_if_unchanged: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    Unchanged,
}

pub struct CommandExecutor {
    state: ProjectFile,
    history: HistoryManager<ProjectFile>,
    events: broadcast::Sender<EditorEvent>,
    revision: u64,
}

impl CommandExecutor {
    pub fn new(
        state: ProjectFile,
        history_capacity: usize,
        events: broadcast::Sender<EditorEvent>,
    ) -> Self {
        Self {
            state,
            history: HistoryManager::with_events(history_capacity, events.clone()),
            events,
            revision: 0,
        }
    }

    pub fn state(&self) -> &ProjectFile {
        &self.state
    }

    pub fn history(&self) -> &HistoryManager<ProjectFile> {
        &self.history
    }

    /// Bumped on every change to the live document.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn execute<F>(&mut self, label: &'static str, mutator: F) -> Result<CommitOutcome, EditorError>
    where
        F: FnOnce(&mut ProjectFile) -> anyhow::Result<()>,
    {
        self.execute_with(label, ExecuteOptions::default(), mutator)
    }

    pub fn execute_with<F>(
        &mut self,
        label: &'static str,
        options: ExecuteOptions,
        mutator: F,
    ) -> Result<CommitOutcome, EditorError>
    where
        F: FnOnce(&mut ProjectFile) -> anyhow::Result<()>,
    {
        let before = self.state.clone();
        let mut draft = self.state.clone();

        if let Err(source) = mutator(&mut draft) {
            warn!(label, error = %source, "command aborted; document unchanged");
            return Err(EditorError::MutatorFailed { label, source });
        }

        if let Some(id) = draft.duplicate_id() {
            warn!(label, %id, "command would duplicate an action id; document unchanged");
            return Err(EditorError::DuplicateActionId {
                label,
                id: id.clone(),
            });
        }

        if options.skip_if_unchanged && draft == before {
            debug!(label, "command produced no change; skipping history");
            return Ok(CommitOutcome::Unchanged);
        }

        let after = draft.clone();
        self.state = draft;
        self.history.record(Box::new(SnapshotCommand {
            label,
            before,
            after,
        }));
        self.bump_revision();
        Ok(CommitOutcome::Committed)
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.state);
        if undone {
            self.bump_revision();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.state);
        if redone {
            self.bump_revision();
        }
        redone
    }

    /// Swaps in a whole new document (open/import) and forgets history.
    pub fn replace(&mut self, state: ProjectFile) {
        self.state = state;
        self.history.clear();
        self.bump_revision();
    }

    fn bump_revision(&mut self) {
        self.revision += 1;
        let _ = self.events.send(EditorEvent::DocumentChanged {
            revision: self.revision,
        });
    }
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
