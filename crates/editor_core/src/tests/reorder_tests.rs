use super::*;

#[test]
fn identity_mapping_when_grouping_disabled() {
    let translator = ReorderTranslator::new(Grouping::disabled());
    let len = 500;
    for local in 0..len {
        assert_eq!(
            translator.to_global(DropContainer::whole_timeline(), local, len),
            local
        );
        // Even a container claiming a group is ignored.
        assert_eq!(
            translator.to_global(DropContainer::expanded_group(3), local, len),
            local
        );
    }
}

#[test]
fn grouping_is_inert_for_short_timelines() {
    let translator = ReorderTranslator::new(Grouping::enabled(50));
    assert_eq!(translator.to_global(DropContainer::expanded_group(0), 7, 50), 7);
    assert_eq!(Grouping::enabled(50).group_count(50), 1);
    assert_eq!(Grouping::enabled(50).group_count(101), 3);
}

#[test]
fn grouped_index_adds_offset_and_skips_headers() {
    let translator = ReorderTranslator::new(Grouping::enabled(50));
    let len = 120;

    // Group 0: one header precedes the first card.
    assert_eq!(translator.to_global(DropContainer::expanded_group(0), 1, len), 0);
    // Group 2: three headers precede, so rendered position 3 is the group's first card.
    assert_eq!(translator.to_global(DropContainer::expanded_group(2), 3, len), 100);
    assert_eq!(translator.to_global(DropContainer::expanded_group(2), 10, len), 107);
    // Dropping onto a header clamps to the group's first slot.
    assert_eq!(translator.to_global(DropContainer::expanded_group(1), 0, len), 50);
}

#[test]
fn move_plan_within_one_list() {
    let translator = ReorderTranslator::default();
    let drag = DragEnd {
        from: DropContainer::whole_timeline(),
        to: DropContainer::whole_timeline(),
        old_index: 1,
        new_index: 0,
    };
    let plan = translator.plan_move(&drag, 3).expect("valid").expect("same list");
    assert_eq!(plan, MovePlan { from: 1, to: 0 });

    let mut items = vec!["A", "B", "C"];
    plan.apply(&mut items);
    assert_eq!(items, vec!["B", "A", "C"]);
}

#[test]
fn move_plan_rejects_out_of_range_source() {
    let translator = ReorderTranslator::default();
    let drag = DragEnd {
        from: DropContainer::whole_timeline(),
        to: DropContainer::whole_timeline(),
        old_index: 3,
        new_index: 0,
    };
    let err = translator.plan_move(&drag, 3).expect_err("out of range");
    assert!(matches!(err, EditorError::IndexOutOfRange { index: 3, len: 3 }));
}

#[test]
fn move_plan_clamps_destination() {
    let translator = ReorderTranslator::default();
    let drag = DragEnd {
        from: DropContainer::whole_timeline(),
        to: DropContainer::whole_timeline(),
        old_index: 0,
        new_index: 99,
    };
    let plan = translator.plan_move(&drag, 3).expect("valid").expect("same list");
    assert_eq!(plan.to, 2);

    let mut items = vec!["A", "B", "C"];
    plan.apply(&mut items);
    assert_eq!(items, vec!["B", "C", "A"]);
}

#[test]
fn cross_list_drag_end_is_not_a_move() {
    let translator = ReorderTranslator::new(Grouping::enabled(50));
    let drag = DragEnd {
        from: DropContainer::expanded_group(0),
        to: DropContainer::expanded_group(1),
        old_index: 1,
        new_index: 1,
    };
    assert_eq!(translator.plan_move(&drag, 120).expect("ok"), None);
}

#[test]
fn insert_index_is_clamped_to_length() {
    let translator = ReorderTranslator::new(Grouping::enabled(50));
    assert_eq!(translator.plan_insert(DropContainer::expanded_group(2), 50, 120), 120);
    assert_eq!(translator.plan_insert(DropContainer::whole_timeline(), 2, 3), 2);
    assert_eq!(translator.plan_insert(DropContainer::whole_timeline(), 9, 3), 3);
}

#[test]
fn character_drop_source_requires_id_and_name() {
    let source = CharacterDropSource;
    let good = DraggedItem::Character {
        character_id: Some(5),
        character_name: Some("Ann".into()),
    };
    assert!(source.accepts(&good));
    assert_eq!(
        source.extract(&good),
        Some(CharacterPayload {
            character_id: 5,
            name: "Ann".into()
        })
    );

    let nameless = DraggedItem::Character {
        character_id: Some(5),
        character_name: None,
    };
    assert!(source.accepts(&nameless));
    assert_eq!(source.extract(&nameless), None);

    let zero = DraggedItem::Character {
        character_id: Some(0),
        character_name: Some("Ann".into()),
    };
    assert_eq!(source.extract(&zero), None);

    let other = DraggedItem::Other {
        label: "quote".into(),
    };
    assert!(!source.accepts(&other));
}
