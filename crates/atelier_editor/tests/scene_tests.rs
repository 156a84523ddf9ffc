//! Integration tests for the scene graph: names, structure and documents

use std::cell::Cell;
use std::rc::Rc;

use atelier_core::{EditorConfig, NodeId};
use atelier_editor::*;

fn editor() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    Editor::new(EditorConfig::default())
}

fn add(editor: &mut Editor, name: &str) -> NodeId {
    let node = editor.create_node("Mesh", name);
    editor.add_node(node, None).unwrap();
    node
}

fn name(editor: &Editor, node: NodeId) -> String {
    editor.scene().node(node).unwrap().name().to_string()
}

fn children(editor: &Editor, node: NodeId) -> Vec<NodeId> {
    editor.scene().node(node).unwrap().children().to_vec()
}

fn assert_names_distinct(editor: &Editor) {
    let mut seen = std::collections::HashSet::new();
    for node in editor.scene().iter() {
        assert!(seen.insert(node.name().to_string()), "'{}' is used twice", node.name());
    }
}

#[test]
fn test_duplicate_names_get_suffixes() {
    let mut editor = editor();
    let a = add(&mut editor, "Box");
    let b = add(&mut editor, "Box");
    let c = add(&mut editor, "Box 1");

    assert_eq!(name(&editor, a), "Box");
    assert_eq!(name(&editor, b), "Box 1");
    assert_eq!(name(&editor, c), "Box 2");
}

#[test]
fn test_suffixes_never_go_back() {
    let mut editor = editor();
    add(&mut editor, "Box");
    let b = add(&mut editor, "Box");
    add(&mut editor, "Box");

    editor.remove_node(b).unwrap();
    let d = add(&mut editor, "Box");
    assert_eq!(name(&editor, d), "Box 3");
}

#[test]
fn test_retired_base_keeps_counting() {
    let mut editor = editor();
    let a = add(&mut editor, "Lamp");
    let b = add(&mut editor, "Lamp");
    editor.remove_node(a).unwrap();
    editor.remove_node(b).unwrap();

    let c = add(&mut editor, "Lamp");
    assert_eq!(name(&editor, c), "Lamp 2");
}

#[test]
fn test_camera_name_is_taken() {
    let mut editor = editor();
    let camera = editor.camera();
    let user = add(&mut editor, "Camera");

    assert_eq!(name(&editor, camera), "Camera");
    assert_eq!(name(&editor, user), "Camera 1");
    assert_eq!(editor.select_by_name("Camera 1"), Some(user));

    let other = add(&mut editor, "Lamp");
    editor.set_node_name(other, "Camera").unwrap();
    assert_eq!(name(&editor, other), "Camera 2");
    assert_names_distinct(&editor);
}

#[test]
fn test_names_stay_distinct_through_edits() {
    let mut editor = editor();
    let a = add(&mut editor, "Box");
    let b = add(&mut editor, "Box");
    assert_names_distinct(&editor);

    editor.set_node_name(b, "Camera").unwrap();
    assert_names_distinct(&editor);
    editor.remove_node(a).unwrap();
    let c = add(&mut editor, "Box");
    assert_names_distinct(&editor);

    editor.set_node_name(c, "Box 1").unwrap();
    assert_names_distinct(&editor);

    for _ in 0..3 {
        editor.undo().unwrap();
        assert_names_distinct(&editor);
    }
    for _ in 0..3 {
        editor.redo().unwrap();
        assert_names_distinct(&editor);
    }
    editor.go_to_state(None).unwrap();
    assert_names_distinct(&editor);
}

#[test]
fn test_rename_to_same_name_keeps_it() {
    let mut editor = editor();
    let a = add(&mut editor, "Box");

    editor.set_node_name(a, "Box").unwrap();
    assert_eq!(name(&editor, a), "Box");
    assert_eq!(editor.scene().names().live_count("Box"), 1);

    editor.undo().unwrap();
    assert_eq!(name(&editor, a), "Box");
}

#[test]
fn test_undo_remove_restores_name_and_index() {
    let mut editor = editor();
    let root = editor.scene().root();
    add(&mut editor, "A");
    let b = add(&mut editor, "Box");
    add(&mut editor, "C");
    let before = children(&editor, root);

    editor.remove_node(b).unwrap();
    assert!(!editor.scene().names().is_live("Box"));
    editor.undo().unwrap();

    assert_eq!(children(&editor, root), before);
    assert_eq!(name(&editor, b), "Box");
    assert!(editor.scene().names().is_live("Box"));
}

#[test]
fn test_redo_add_keeps_its_name() {
    let mut editor = editor();
    add(&mut editor, "Box");
    let b = add(&mut editor, "Box");

    editor.undo().unwrap();
    editor.redo().unwrap();
    assert_eq!(name(&editor, b), "Box 1");
}

#[test]
fn test_rename_into_taken_name() {
    let mut editor = editor();
    add(&mut editor, "Box");
    let b = add(&mut editor, "Sphere");

    editor.set_node_name(b, "Box").unwrap();
    assert_eq!(name(&editor, b), "Box 1");

    editor.undo().unwrap();
    assert_eq!(name(&editor, b), "Sphere");
    assert!(!editor.scene().names().is_live("Box 1"));

    editor.redo().unwrap();
    assert_eq!(name(&editor, b), "Box 1");
}

#[test]
fn test_removing_subtree_releases_all_names() {
    let mut editor = editor();
    let parent = add(&mut editor, "Group");
    let child = editor.create_node("Mesh", "Leaf");
    editor.add_node(child, Some(parent)).unwrap();

    editor.remove_node(parent).unwrap();
    assert!(!editor.scene().names().is_live("Group"));
    assert!(!editor.scene().names().is_live("Leaf"));

    editor.undo().unwrap();
    assert!(editor.scene().is_attached(child));
    assert_eq!(name(&editor, child), "Leaf");
}

#[test]
fn test_root_and_camera_removal_and_move_are_inert() {
    let mut editor = editor();
    let root = editor.scene().root();
    let camera = editor.camera();
    let group = add(&mut editor, "Group");
    let before = editor.save_scene().unwrap();

    let changes = Rc::new(Cell::new(0));
    let c = changes.clone();
    editor.signals().scene_graph_changed.add(move |_| c.set(c.get() + 1));
    let removed = Rc::new(Cell::new(0));
    let r = removed.clone();
    editor.signals().object_removed.add(move |_| r.set(r.get() + 1));

    assert_eq!(editor.remove_node(root).unwrap(), None);
    assert_eq!(editor.move_node(root, group, None).unwrap(), None);
    assert_eq!(editor.remove_node(camera).unwrap(), None);
    assert_eq!(editor.move_node(camera, group, None).unwrap(), None);

    // Bypassing the editor guard still leaves the graph alone.
    editor.execute(RemoveNodeCommand::new(root), None).unwrap();
    editor.execute(MoveNodeCommand::new(root, group, None), None).unwrap();
    editor.execute(RemoveNodeCommand::new(camera), None).unwrap();
    editor.execute(MoveNodeCommand::new(camera, group, None), None).unwrap();
    // Queued commands take the same path.
    editor.queue().push(RemoveNodeCommand::new(camera), None);
    assert_eq!(editor.flush_pending(), 1);
    for _ in 0..5 {
        editor.undo().unwrap();
    }

    assert!(editor.scene().is_attached(root));
    assert_eq!(editor.scene().node(camera).unwrap().parent(), Some(root));
    assert_eq!(editor.save_scene().unwrap(), before);
    assert_eq!(changes.get(), 0);
    assert_eq!(removed.get(), 0);
}

#[test]
fn test_move_with_before() {
    let mut editor = editor();
    let group = add(&mut editor, "Group");
    let a = editor.create_node("Mesh", "A");
    editor.add_node(a, Some(group)).unwrap();
    let b = add(&mut editor, "B");

    editor.move_node(b, group, Some(a)).unwrap();
    assert_eq!(children(&editor, group), vec![b, a]);

    editor.undo().unwrap();
    assert_eq!(editor.scene().node(b).unwrap().parent(), Some(editor.scene().root()));
}

#[test]
fn test_move_into_own_subtree_fails() {
    let mut editor = editor();
    let group = add(&mut editor, "Group");
    let child = editor.create_node("Mesh", "Leaf");
    editor.add_node(child, Some(group)).unwrap();

    let result = editor.move_node(group, child, None);
    assert!(matches!(
        result,
        Err(HistoryError::Command(CommandError::InvalidMove { .. }))
    ));
    assert_eq!(editor.history().undos().len(), 2);
}

#[test]
fn test_transform_channels_need_vectors() {
    let mut editor = editor();
    let node = add(&mut editor, "Box");

    let result = editor.set_node_property(node, "rotation", true);
    assert!(matches!(
        result,
        Err(HistoryError::Command(CommandError::InvalidValue { .. }))
    ));
}

#[test]
fn test_selection_follows_removal() {
    let mut editor = editor();
    let group = add(&mut editor, "Group");
    let child = editor.create_node("Mesh", "Leaf");
    editor.add_node(child, Some(group)).unwrap();
    assert_eq!(editor.scene().selected(), Some(child));

    editor.remove_node(group).unwrap();
    assert_eq!(editor.scene().selected(), None);
}

#[test]
fn test_document_json_round_trip() {
    let mut editor = editor();
    let a = add(&mut editor, "Box");
    editor.set_node_property(a, "position", [1.0f32, 2.0, 3.0]).unwrap();
    editor.set_node_property(a, "visible", false).unwrap();

    let json = editor.save_scene().unwrap().to_json().unwrap();
    let document = SceneDocument::from_json(&json).unwrap();

    let mut other = Editor::new(EditorConfig::default());
    other.open_scene(&document, Some("scenes/room.json")).unwrap();

    let node = other.scene().node(a).unwrap();
    assert_eq!(node.name(), "Box");
    assert_eq!(node.transform.position, [1.0, 2.0, 3.0]);
    assert_eq!(node.property("visible"), Some(PropertyValue::Bool(false)));
    assert_eq!(other.scene_uri(), Some("scenes/room.json"));
}

#[test]
fn test_document_with_duplicate_names_is_renamed() {
    let json = r#"{
        "version": 1,
        "root": {
            "id": 1, "name": "Room", "kind": "Scene",
            "children": [
                { "id": 2, "name": "Chair", "kind": "Mesh" },
                { "id": 3, "name": "Chair", "kind": "Mesh" }
            ]
        }
    }"#;
    let document = SceneDocument::from_json(json).unwrap();

    let mut editor = editor();
    editor.open_scene(&document, None).unwrap();
    assert_eq!(name(&editor, NodeId(2)), "Chair");
    assert_eq!(name(&editor, NodeId(3)), "Chair 1");
}

#[test]
fn test_document_with_duplicate_ids_is_rejected() {
    let json = r#"{
        "version": 1,
        "root": {
            "id": 1, "name": "Room", "kind": "Scene",
            "children": [
                { "id": 2, "name": "A", "kind": "Mesh" },
                { "id": 2, "name": "B", "kind": "Mesh" }
            ]
        }
    }"#;
    let document = SceneDocument::from_json(json).unwrap();

    let mut editor = editor();
    let result = editor.open_scene(&document, None);
    assert!(matches!(result, Err(SceneError::DuplicateId(NodeId(2)))));
}

#[test]
fn test_document_with_oversized_suffix_opens() {
    let json = r#"{
        "version": 1,
        "root": {
            "id": 1, "name": "Room", "kind": "Scene",
            "children": [
                { "id": 2, "name": "Box 18446744073709551615", "kind": "Mesh" },
                { "id": 3, "name": "Box 99999999999999999999999", "kind": "Mesh" }
            ]
        }
    }"#;
    let document = SceneDocument::from_json(json).unwrap();

    let mut editor = editor();
    editor.open_scene(&document, None).unwrap();
    assert_eq!(name(&editor, NodeId(2)), "Box 18446744073709551615");
    assert_eq!(name(&editor, NodeId(3)), "Box 99999999999999999999999");

    let copy = add(&mut editor, "Box 18446744073709551615");
    assert_eq!(name(&editor, copy), "Box 18446744073709551615 1");
    let plain = add(&mut editor, "Box");
    assert_eq!(name(&editor, plain), "Box");
    assert_names_distinct(&editor);
}

#[test]
fn test_unknown_document_version() {
    let json = r#"{ "version": 99, "root": { "id": 1, "name": "Room", "kind": "Scene" } }"#;
    assert!(matches!(
        SceneDocument::from_json(json),
        Err(SceneError::UnsupportedVersion { found: 99, .. })
    ));
}
