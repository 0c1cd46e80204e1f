use std::sync::Arc;

use super::*;
use async_trait::async_trait;
use shared::{
    domain::{CharacterState, LayoutType, Speaker},
    project::{LayoutAction, TalkAction},
};

fn talk(id: &str, speakers: Vec<Speaker>) -> Action {
    Action::Talk(TalkAction::new(ActionId::from(id), format!("text {id}"), speakers))
}

fn layout(id: &str) -> Action {
    Action::Layout(LayoutAction::new(
        ActionId::from(id),
        LayoutType::Appear,
        CharacterId(1),
    ))
}

fn ids(editor: &Editor) -> Vec<String> {
    editor
        .state()
        .actions
        .iter()
        .map(|a| a.id().to_string())
        .collect()
}

fn abc() -> Editor {
    let mut editor = Editor::default();
    editor.open(ProjectFile::new(vec![
        talk("A", Vec::new()),
        layout("B"),
        talk("C", Vec::new()),
    ]));
    editor
}

fn drain(rx: &mut broadcast::Receiver<EditorEvent>) -> Vec<EditorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

struct Timeline;

impl SelectionContainer for Timeline {
    fn name(&self) -> &str {
        "timeline"
    }

    fn item_ids(&self, _item_selector: &str) -> Vec<String> {
        ["A", "B", "C"].iter().map(|s| s.to_string()).collect()
    }
}

#[test]
fn move_then_undo_restores_order() {
    let mut editor = abc();
    let original = editor.state().clone();

    editor.move_action(1, 0).expect("move");
    assert_eq!(ids(&editor), vec!["B", "A", "C"]);

    assert!(editor.undo());
    assert_eq!(ids(&editor), vec!["A", "B", "C"]);
    assert_eq!(editor.state(), &original);
}

#[test]
fn out_of_range_move_is_rejected_without_mutation() {
    let mut editor = abc();
    let err = editor.move_action(3, 0).expect_err("bad index");
    assert!(matches!(err, EditorError::IndexOutOfRange { index: 3, len: 3 }));
    assert!(!err.is_user_facing());
    assert_eq!(ids(&editor), vec!["A", "B", "C"]);
    assert!(!editor.can_undo());
}

#[test]
fn drag_end_in_grouped_timeline_uses_global_indices() {
    let mut editor = Editor::default();
    let actions = (0..120).map(|i| talk(&format!("t{i}"), Vec::new())).collect();
    editor.open(ProjectFile::new(actions));
    editor.set_grouping_enabled(true);

    // Group 1 renders two headers before its cards.
    let group = DropContainer::expanded_group(1);
    let outcome = editor
        .handle_drag_end(&DragEnd {
            from: group,
            to: group,
            old_index: 2,
            new_index: 4,
        })
        .expect("move");
    assert_eq!(outcome, Some(CommitOutcome::Committed));
    let order = ids(&editor);
    assert_eq!(&order[49..53], &["t49", "t51", "t52", "t50"]);

    let elsewhere = editor
        .handle_drag_end(&DragEnd {
            from: group,
            to: DropContainer::expanded_group(2),
            old_index: 2,
            new_index: 2,
        })
        .expect("ignored");
    assert_eq!(elsewhere, None);
}

#[test]
fn dropping_characters_creates_layout_actions() {
    let mut editor = abc();
    let ann = DraggedItem::Character {
        character_id: Some(7),
        character_name: Some("Ann".into()),
    };

    editor
        .drop_character(DropContainer::whole_timeline(), 1, &ann)
        .expect("first drop");
    editor
        .drop_character(DropContainer::whole_timeline(), 10, &ann)
        .expect("second drop");

    let dropped: Vec<(usize, LayoutType)> = editor
        .state()
        .actions
        .iter()
        .enumerate()
        .filter_map(|(i, a)| {
            a.as_layout()
                .filter(|l| l.character_name.as_deref() == Some("Ann"))
                .map(|l| (i, l.layout_type.clone()))
        })
        .collect();
    assert_eq!(dropped, vec![(1, LayoutType::Appear), (4, LayoutType::Move)]);

    let rejected = editor
        .drop_character(
            DropContainer::whole_timeline(),
            0,
            &DraggedItem::Other {
                label: "quote".into(),
            },
        )
        .expect("ignored");
    assert_eq!(rejected, None);
    assert_eq!(editor.state().len(), 5);
}

#[test]
fn duplicate_speaker_is_not_inserted() {
    let mut editor = Editor::default();
    editor.open(ProjectFile::new(vec![talk(
        "t1",
        vec![Speaker::new(1, "Ann"), Speaker::new(2, "Bob")],
    )]));
    let before = editor.state().clone();

    let outcome = editor
        .update_speaker_assignment(&ActionId::from("t1"), Speaker::new(1, "Ann"))
        .expect("assign");
    assert_eq!(outcome, CommitOutcome::Unchanged);
    assert_eq!(editor.state(), &before);
}

#[test]
fn speaker_assignment_targets_selection_then_clears_it() {
    let mut editor = abc();
    let mut rx = editor.subscribe();
    editor.selection_mut().attach(Arc::new(Timeline), ".card");
    editor
        .selection_mut()
        .handle_click(&ClickEvent::on("A", Modifiers::default()));
    editor
        .selection_mut()
        .handle_click(&ClickEvent::on("C", Modifiers::shift()));
    assert_eq!(editor.selection().selected_ids().len(), 3);
    drain(&mut rx);

    editor
        .update_speaker_assignment(&ActionId::from("B"), Speaker::new(3, "Cid"))
        .expect("assign");

    for id in ["A", "C"] {
        let talk = editor
            .state()
            .find(&ActionId::from(id))
            .and_then(Action::as_talk)
            .expect("talk");
        assert!(talk.has_speaker(CharacterId(3)));
    }
    assert!(editor.selection().is_empty());
    assert_eq!(editor.used_speaker_names(), vec!["Cid"]);

    let events = drain(&mut rx);
    assert!(events.contains(&EditorEvent::SelectionChanged {
        container: "timeline".into(),
        selected_ids: Vec::new(),
    }));
    assert!(events
        .iter()
        .any(|e| matches!(e, EditorEvent::DocumentChanged { .. })));
}

#[test]
fn speaker_removal_and_text_edits() {
    let mut editor = Editor::default();
    editor.open(ProjectFile::new(vec![talk(
        "t1",
        vec![Speaker::new(1, "Ann"), Speaker::new(2, "Bob")],
    )]));
    let id = ActionId::from("t1");

    editor.remove_speaker(&id, CharacterId(1)).expect("remove");
    editor.update_text(&id, "new words").expect("text");
    let current = editor.state().actions[0].as_talk().expect("talk").clone();
    assert_eq!(current.speakers, vec![Speaker::new(2, "Bob")]);
    assert_eq!(current.text, "new words");

    editor.remove_all_speakers(&id).expect("clear");
    assert!(editor.used_speaker_names().is_empty());
    assert!(editor.undo());
    assert_eq!(editor.used_speaker_names(), vec!["Bob"]);
}

#[test]
fn import_rejects_malformed_file_and_keeps_state() {
    let mut editor = abc();
    editor.move_action(1, 0).expect("move");
    let before = editor.state().clone();
    let raw = r#"{
        "version": "1.0",
        "actions": [
            { "id": "a", "type": "talk", "text": "hi", "speakers": [] },
            { "id": "b", "type": "layout", "layoutType": "appear" }
        ]
    }"#;

    let err = editor.import_json(raw).expect_err("rejected");
    assert!(matches!(
        err,
        EditorError::Import(shared::project::ProjectFileError::MalformedLayout { index: 1 })
    ));
    assert!(err.is_user_facing());
    assert_eq!(editor.state(), &before);
    assert!(editor.can_undo());
}

#[test]
fn import_replaces_state_and_clears_history() {
    let mut editor = abc();
    editor.move_action(1, 0).expect("move");
    let raw = r#"{"version":"1.0","actions":[{"id":"x","type":"talk","text":"hi","speakers":[]}]}"#;

    editor.import_json(raw).expect("import");
    assert_eq!(ids(&editor), vec!["x"]);
    assert!(!editor.can_undo());
    assert!(!editor.has_changes());
}

#[test]
fn export_strips_character_states() {
    let mut editor = abc();
    editor
        .execute("render cache", |draft| {
            if let Some(talk) = draft.talk_mut(&ActionId::from("A")) {
                talk.character_states
                    .insert("1".into(), CharacterState::default());
            }
            Ok(())
        })
        .expect("execute");

    let exported = editor.export_json().expect("export");
    assert!(!exported.contains("characterStates"));
    let value: serde_json::Value = serde_json::from_str(&exported).expect("json");
    assert_eq!(value["actions"].as_array().map(Vec::len), Some(3));
    // The live document keeps its render cache.
    assert!(!editor.state().actions[0]
        .as_talk()
        .expect("talk")
        .character_states
        .is_empty());
}

#[test]
fn change_tracking_save_and_revert() {
    let mut editor = abc();
    assert!(!editor.has_changes());

    editor.move_action(2, 0).expect("move");
    assert!(editor.has_changes());

    editor.mark_saved();
    assert!(!editor.has_changes());

    editor.delete_action(&ActionId::from("A")).expect("delete");
    assert!(editor.has_changes());
    assert!(editor.revert());
    assert!(!editor.has_changes());
    assert_eq!(ids(&editor), vec!["C", "A", "B"]);
    assert!(!editor.can_undo());

    assert!(!Editor::default().revert());
}

#[test]
fn stale_reset_is_discarded() {
    let mut editor = abc();
    editor.set_roster(CharacterRoster::new().with("Ann", [1]));
    let segments = vec!["Ann: hello".to_string(), "plain".to_string()];

    let ticket = editor.begin_reset();
    editor.move_action(1, 0).expect("edit while pending");
    let err = editor.finish_reset(ticket, &segments).expect_err("stale");
    assert!(matches!(err, EditorError::StaleReset));
    assert_eq!(ids(&editor), vec!["B", "A", "C"]);

    let older = editor.begin_reset();
    let newer = editor.begin_reset();
    assert!(matches!(
        editor.finish_reset(older, &segments),
        Err(EditorError::StaleReset)
    ));

    editor.finish_reset(newer, &segments).expect("fresh");
    let talks: Vec<&TalkAction> = editor
        .state()
        .actions
        .iter()
        .filter_map(Action::as_talk)
        .collect();
    assert_eq!(talks.len(), 2);
    assert_eq!(talks[0].speakers, vec![Speaker::new(1, "Ann")]);
    assert_eq!(talks[0].text, "hello");

    // Reset is undoable.
    assert!(editor.undo());
    assert_eq!(ids(&editor), vec!["B", "A", "C"]);
}

struct FailingSegmenter;

#[async_trait]
impl TextSegmenter for FailingSegmenter {
    async fn segment(&self, _text: &str) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("service unavailable")
    }
}

#[tokio::test]
async fn reset_with_segmenter() {
    let mut editor = abc();
    editor
        .reset_with(&LocalSegmenter, "one\n\ntwo\n\nthree\n\nfour")
        .await
        .expect("reset");
    assert_eq!(editor.state().len(), 4);

    let before = editor.state().clone();
    let err = editor
        .reset_with(&FailingSegmenter, "anything")
        .await
        .expect_err("segmentation fails");
    assert!(matches!(err, EditorError::Segmentation(_)));
    assert_eq!(editor.state(), &before);
}

#[test]
fn editors_do_not_share_history_or_selection() {
    let mut first = abc();
    let second = abc();
    first.move_action(0, 2).expect("move");
    first.selection_mut().select_single("A");

    assert!(first.can_undo());
    assert!(!second.can_undo());
    assert!(second.selection().is_empty());
}

#[test]
fn staged_characters_through_editor() {
    let mut editor = Editor::default();
    editor.set_roster(CharacterRoster::new().with("Ann", [1]));
    editor.open(ProjectFile::new(vec![layout("l1"), layout("l2")]));
    let staged = editor.staged_characters();
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].name, "Ann");
}

#[tokio::test]
async fn preferences_persist_through_the_store() {
    let store = storage::MemoryStore::new();
    let mut editor = Editor::default();
    editor.set_grouping_enabled(true);
    editor.set_subsequent_layout_mode(SubsequentLayoutMode::Hide);
    editor.set_roster(CharacterRoster::new().with("Ann", [1]));
    editor.save_preferences(&store).await.expect("save");

    let reopened = Editor::load(&store).await.expect("load");
    assert_eq!(reopened.preferences(), editor.preferences());
    assert!(reopened.config().grouping_enabled);
    assert!(reopened.roster().contains("Ann"));

    store
        .set(storage::keys::SUBSEQUENT_LAYOUT_MODE, serde_json::json!(7))
        .await
        .expect("set");
    let err = Editor::load(&store).await.err().expect("malformed");
    assert!(matches!(err, EditorError::Storage(_)));
}

#[test]
fn external_drop_cannot_introduce_a_repeated_id() {
    let mut editor = abc();
    let ann = DraggedItem::Character {
        character_id: Some(1),
        character_name: Some("Ann".into()),
    };

    let err = editor
        .handle_external_drop(
            &crate::reorder::CharacterDropSource,
            DropContainer::whole_timeline(),
            0,
            &ann,
            |_, index, draft| {
                draft.actions.insert(index, talk("C", Vec::new()));
                Ok(())
            },
        )
        .expect_err("repeated id");
    assert!(matches!(err, EditorError::DuplicateActionId { .. }));
    assert_eq!(ids(&editor), vec!["A", "B", "C"]);
    assert!(!editor.can_undo());
}
