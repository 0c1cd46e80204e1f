use shared::{
    domain::{ActionId, CharacterId},
    project::{parse_project, Action, ProjectFile},
    protocol::EditorEvent,
};
use storage::KeyValueStore;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub mod assignments;
pub mod command;
pub mod config;
pub mod error;
pub mod history;
pub mod layout;
pub mod preferences;
pub mod reorder;
pub mod roster;
pub mod segmentation;
pub mod selection;
mod speakers;

pub use assignments::{AssignmentStore, InitialStateUpdate, MotionUpdate, StagedCharacter};
pub use command::{CommandExecutor, CommitOutcome, ExecuteOptions};
pub use config::{EditorConfig, SubsequentLayoutMode};
pub use error::EditorError;
pub use layout::{LayoutDefaults, LayoutProperty, PositionConfig};
pub use preferences::{EditorPreferences, PinnedCharacters};
pub use reorder::{DragEnd, DraggedItem, DropContainer, DropSource, Grouping, MovePlan};
pub use roster::CharacterRoster;
pub use segmentation::{HttpSegmenter, LocalSegmenter, TextSegmenter};
pub use selection::{ClickEvent, Modifiers, SelectionContainer, SelectionManager};

use crate::{
    layout::build_layout_action,
    reorder::{CharacterDropSource, ReorderTranslator},
    segmentation::project_from_segments,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Proof that a reset was requested at a given point of the document's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetTicket {
    generation: u64,
    revision: u64,
}

/// One editing session over one project document.
///
/// Owns the canonical document (through its [`CommandExecutor`]), the undo
/// history, the selection and the index translator. Nothing here is shared
/// between editors.
pub struct Editor {
    executor: CommandExecutor,
    selection: SelectionManager,
    translator: ReorderTranslator,
    roster: CharacterRoster,
    layout_defaults: LayoutDefaults,
    config: EditorConfig,
    events: broadcast::Sender<EditorEvent>,
    state_on_open: Option<ProjectFile>,
    reset_generation: u64,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            executor: CommandExecutor::new(
                ProjectFile::default(),
                config.history_capacity,
                events.clone(),
            ),
            selection: SelectionManager::with_events(events.clone()),
            translator: ReorderTranslator::new(config.grouping()),
            roster: CharacterRoster::default(),
            layout_defaults: LayoutDefaults::default(),
            config,
            events,
            state_on_open: None,
            reset_generation: 0,
        }
    }

    pub fn from_preferences(prefs: &EditorPreferences) -> Self {
        let mut editor = Self::new(prefs.editor_config());
        editor.roster = prefs.roster.clone();
        editor.layout_defaults = prefs.layout_defaults();
        editor
    }

    /// Builds an editor from the preferences persisted in `store`.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self, EditorError> {
        let prefs = EditorPreferences::load(store)
            .await
            .map_err(EditorError::Storage)?;
        Ok(Self::from_preferences(&prefs))
    }

    pub fn preferences(&self) -> EditorPreferences {
        EditorPreferences {
            grouping_enabled: self.config.grouping_enabled,
            subsequent_layout_mode: self.config.subsequent_layout_mode,
            costume_mapping: self.layout_defaults.costumes.clone(),
            position_config: self.layout_defaults.positions.clone(),
            roster: self.roster.clone(),
        }
    }

    pub async fn save_preferences(&self, store: &dyn KeyValueStore) -> Result<(), EditorError> {
        self.preferences()
            .save(store)
            .await
            .map_err(EditorError::Storage)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_grouping_enabled(&mut self, enabled: bool) {
        self.config.grouping_enabled = enabled;
        self.translator.set_grouping(self.config.grouping());
    }

    pub fn set_subsequent_layout_mode(&mut self, mode: SubsequentLayoutMode) {
        self.config.subsequent_layout_mode = mode;
    }

    pub fn roster(&self) -> &CharacterRoster {
        &self.roster
    }

    pub fn set_roster(&mut self, roster: CharacterRoster) {
        self.roster = roster;
    }

    pub fn state(&self) -> &ProjectFile {
        self.executor.state()
    }

    pub fn revision(&self) -> u64 {
        self.executor.revision()
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionManager {
        &mut self.selection
    }

    // Project lifecycle

    /// Replaces the document, forgets history and remembers it as the saved state.
    pub fn open(&mut self, project: ProjectFile) {
        info!(actions = project.len(), "project opened");
        self.state_on_open = Some(project.clone());
        self.executor.replace(project);
    }

    pub fn open_from_segments(&mut self, segments: &[String]) {
        let project = project_from_segments(segments, &self.roster);
        self.open(project);
    }

    /// Loads a project file. A rejected file leaves the current document alone.
    pub fn import_json(&mut self, raw: &str) -> Result<(), EditorError> {
        match parse_project(raw) {
            Ok(project) => {
                self.open(project);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "project import rejected");
                Err(EditorError::Import(err))
            }
        }
    }

    pub fn export_json(&self) -> Result<String, EditorError> {
        Ok(self.state().to_export_json()?)
    }

    pub fn has_changes(&self) -> bool {
        self.state_on_open
            .as_ref()
            .is_some_and(|saved| saved != self.state())
    }

    pub fn mark_saved(&mut self) {
        self.state_on_open = Some(self.state().clone());
    }

    /// Discards everything since the last open or save. Returns `false` when
    /// there is nothing to go back to.
    pub fn revert(&mut self) -> bool {
        let Some(saved) = self.state_on_open.clone() else {
            return false;
        };
        self.executor.replace(saved);
        true
    }

    // Commands and history

    pub fn execute<F>(&mut self, label: &'static str, mutator: F) -> Result<CommitOutcome, EditorError>
    where
        F: FnOnce(&mut ProjectFile) -> anyhow::Result<()>,
    {
        self.executor.execute(label, mutator)
    }

    pub fn undo(&mut self) -> bool {
        self.executor.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.executor.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.executor.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.executor.history().can_redo()
    }

    pub fn assignments(&mut self) -> AssignmentStore<'_> {
        AssignmentStore::new(&mut self.executor)
    }

    pub fn staged_characters(&self) -> Vec<StagedCharacter> {
        assignments::staged_characters(self.state(), &self.roster)
    }

    pub fn delete_action(&mut self, action_id: &ActionId) -> Result<CommitOutcome, EditorError> {
        self.executor.execute_with(
            "delete action",
            ExecuteOptions::skip_if_unchanged(),
            |draft| {
                draft.actions.retain(|action| action.id() != action_id);
                Ok(())
            },
        )
    }

    // Drag and drop

    /// Applies a reorder reported by the drag layer. `Ok(None)` when the drag
    /// ended in another list.
    pub fn handle_drag_end(&mut self, drag: &DragEnd) -> Result<Option<CommitOutcome>, EditorError> {
        let len = self.state().len();
        let Some(plan) = self.translator.plan_move(drag, len)? else {
            return Ok(None);
        };
        self.apply_move(plan).map(Some)
    }

    /// Moves the action at global index `from` so it ends up at `to`.
    pub fn move_action(&mut self, from: usize, to: usize) -> Result<CommitOutcome, EditorError> {
        let len = self.state().len();
        if from >= len {
            error!(from, len, "move source index out of range; move aborted");
            return Err(EditorError::IndexOutOfRange { index: from, len });
        }
        self.apply_move(MovePlan {
            from,
            to: to.min(len - 1),
        })
    }

    fn apply_move(&mut self, plan: MovePlan) -> Result<CommitOutcome, EditorError> {
        debug!(from = plan.from, to = plan.to, "moving action");
        self.executor.execute("move action", |draft| {
            plan.apply(&mut draft.actions);
            Ok(())
        })
    }

    /// Inserts something dragged in from outside the timeline.
    ///
    /// Items `source` rejects, or whose payload cannot be extracted, are
    /// dropped without touching the document (`Ok(None)`). Otherwise `create`
    /// runs as one command with the translated global insertion index.
    pub fn handle_external_drop<D, F>(
        &mut self,
        source: &D,
        container: DropContainer,
        local_index: usize,
        item: &D::Item,
        create: F,
    ) -> Result<Option<CommitOutcome>, EditorError>
    where
        D: DropSource,
        F: FnOnce(D::Payload, usize, &mut ProjectFile) -> anyhow::Result<()>,
    {
        if !source.accepts(item) {
            debug!("dropped item rejected by source");
            return Ok(None);
        }
        let Some(payload) = source.extract(item) else {
            debug!("dropped item carried no usable payload");
            return Ok(None);
        };
        let index = self
            .translator
            .plan_insert(container, local_index, self.state().len());
        self.executor
            .execute("insert action", |draft| create(payload, index, draft))
            .map(Some)
    }

    /// Drops a character card onto the timeline as a layout action.
    pub fn drop_character(
        &mut self,
        container: DropContainer,
        local_index: usize,
        item: &DraggedItem,
    ) -> Result<Option<CommitOutcome>, EditorError> {
        let defaults = self.layout_defaults.clone();
        let mode = self.config.subsequent_layout_mode;
        self.handle_external_drop(
            &CharacterDropSource,
            container,
            local_index,
            item,
            |character, index, draft| {
                let action = build_layout_action(
                    &draft.actions,
                    CharacterId(character.character_id),
                    &character.name,
                    index,
                    &defaults,
                    mode,
                );
                draft.actions.insert(index, Action::Layout(action));
                Ok(())
            },
        )
    }

    // Reset to defaults

    /// Starts a reset. Any ticket issued earlier becomes stale.
    pub fn begin_reset(&mut self) -> ResetTicket {
        self.reset_generation += 1;
        ResetTicket {
            generation: self.reset_generation,
            revision: self.revision(),
        }
    }

    /// Rebuilds the document from freshly segmented text, as one undoable
    /// command, provided nothing changed since `ticket` was issued.
    pub fn finish_reset(
        &mut self,
        ticket: ResetTicket,
        segments: &[String],
    ) -> Result<CommitOutcome, EditorError> {
        if ticket.generation != self.reset_generation || ticket.revision != self.revision() {
            warn!(
                ticket_generation = ticket.generation,
                current_generation = self.reset_generation,
                ticket_revision = ticket.revision,
                current_revision = self.revision(),
                "discarding stale segmentation result"
            );
            return Err(EditorError::StaleReset);
        }
        let rebuilt = project_from_segments(segments, &self.roster);
        self.executor.execute("reset to defaults", |draft| {
            *draft = rebuilt;
            Ok(())
        })
    }

    pub async fn reset_with(
        &mut self,
        segmenter: &dyn TextSegmenter,
        text: &str,
    ) -> Result<CommitOutcome, EditorError> {
        let ticket = self.begin_reset();
        let segments = segmenter
            .segment(text)
            .await
            .map_err(EditorError::Segmentation)?;
        self.finish_reset(ticket, &segments)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
