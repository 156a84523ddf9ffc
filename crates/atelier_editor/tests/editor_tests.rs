//! Integration tests for the editor context: lifecycle, caches and listeners

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use atelier_cache::{CacheControl, FileChange, FileChangeKind, FnLoader, LoadError, ResourceCache, ResourceLoader};
use atelier_core::{EditorConfig, NodeId};
use atelier_editor::*;
use futures_util::future;

fn editor() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    Editor::new(EditorConfig::default())
}

fn add(editor: &mut Editor, name: &str) -> NodeId {
    let node = editor.create_node("Mesh", name);
    editor.add_node(node, None).unwrap();
    node
}

fn count<P: 'static>(signal: &atelier_event::Signal<P>) -> Rc<Cell<usize>> {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    signal.add(move |_| h.set(h.get() + 1));
    hits
}

fn texture_cache(
    disposed: Rc<RefCell<Vec<String>>>,
) -> Rc<ResourceCache<impl ResourceLoader<Resource = Rc<String>>>> {
    let loader = FnLoader::new(|uri: &str| {
        let uri = uri.to_string();
        async move {
            if uri.contains("broken") {
                Err(LoadError::Decode(uri))
            } else {
                Ok(Rc::new(format!("pixels of {uri}")))
            }
        }
    })
    .with_disposer(move |uri: &str, _: &Rc<String>| {
        disposed.borrow_mut().push(uri.to_string());
        Ok(())
    });
    Rc::new(ResourceCache::new("textures", loader))
}

#[test]
fn test_file_change_evicts_registered_caches() {
    let mut editor = editor();
    let disposed = Rc::new(RefCell::new(Vec::new()));
    let textures = texture_cache(disposed.clone());
    editor.register_cache(textures.clone());

    pollster::block_on(textures.get("wood.png")).unwrap();
    pollster::block_on(textures.get("stone.png")).unwrap();

    assert!(editor.notify_file_changed("wood.png"));
    assert!(!textures.contains("wood.png"));
    assert!(textures.contains("stone.png"));
    assert!(disposed.borrow().is_empty(), "eviction does not dispose");
}

#[test]
fn test_own_save_is_ignored_once() {
    let mut editor = editor();
    let changes = count(&editor.signals().file_changed);
    editor.mark_scene_saved("scenes/room.json");

    assert!(!editor.notify_file_changed("scenes/room.json"));
    assert!(editor.notify_file_changed("scenes/room.json"));
    assert_eq!(changes.get(), 2);
}

#[test]
fn test_save_flag_only_matches_scene_uri() {
    let mut editor = editor();
    editor.mark_scene_saved("scenes/room.json");

    assert!(editor.notify_file_changed("textures/wood.png"));
    assert!(!editor.notify_file_changed("scenes/room.json"));
}

#[test]
fn test_forward_watcher_changes() {
    let mut editor = editor();
    let disposed = Rc::new(RefCell::new(Vec::new()));
    let textures = texture_cache(disposed);
    editor.register_cache(textures.clone());
    pollster::block_on(textures.get("textures/wood.png")).unwrap();
    editor.mark_scene_saved("scenes/room.json");

    let changes = vec![
        FileChange {
            path: "scenes/room.json".into(),
            kind: FileChangeKind::Modified,
        },
        FileChange {
            path: "textures/wood.png".into(),
            kind: FileChangeKind::Modified,
        },
    ];

    assert_eq!(editor.forward_file_changes(changes), 1);
    assert!(!textures.contains("textures/wood.png"));
}

#[test]
fn test_clear_caches_disposes() {
    let editor = editor();
    let disposed = Rc::new(RefCell::new(Vec::new()));
    let textures = texture_cache(disposed.clone());
    editor.register_cache(textures.clone());

    pollster::block_on(textures.get("wood.png")).unwrap();
    editor.clear_caches();

    assert!(textures.is_empty());
    assert_eq!(*disposed.borrow(), vec!["wood.png".to_string()]);
}

#[test]
fn test_new_scene_resets_everything() {
    let mut editor = editor();
    let disposed = Rc::new(RefCell::new(Vec::new()));
    let textures = texture_cache(disposed.clone());
    editor.register_cache(textures.clone());
    pollster::block_on(textures.get("wood.png")).unwrap();

    let node = add(&mut editor, "Box");
    assert!(editor.is_modified());

    let scene_sets = count(&editor.signals().scene_set);
    let modifications = count(&editor.signals().scene_modified);
    let selections = Rc::new(RefCell::new(Vec::new()));
    let log = selections.clone();
    editor.signals().object_selected.add(move |change| log.borrow_mut().push(*change));

    editor.load_new_scene();

    assert_eq!(scene_sets.get(), 1);
    assert_eq!(modifications.get(), 0);
    assert!(!editor.is_modified());
    assert!(!editor.history().can_undo());
    assert!(!editor.scene().contains(node));
    assert!(textures.is_empty());
    assert_eq!(
        *selections.borrow(),
        vec![SelectionChange {
            current: None,
            previous: Some(node),
        }]
    );
}

#[test]
fn test_edits_mark_scene_modified() {
    let mut editor = editor();
    let modifications = count(&editor.signals().scene_modified);

    let node = add(&mut editor, "Box");
    editor.mark_scene_saved("scenes/room.json");
    assert!(!editor.is_modified());

    editor.set_node_property(node, "intensity", 2.0).unwrap();
    assert!(editor.is_modified());
    assert!(modifications.get() >= 2);
}

#[test]
fn test_duplicate_selected() {
    let mut editor = editor();
    let group = add(&mut editor, "Group");
    let leaf = editor.create_node("Mesh", "Leaf");
    editor.add_node(leaf, Some(group)).unwrap();
    editor.select(group);

    let copy = editor.duplicate_selected().unwrap().unwrap();
    assert_ne!(copy, group);
    assert_eq!(editor.scene().node(copy).unwrap().name(), "Group 1");

    let copied_leaf = editor.scene().node(copy).unwrap().children()[0];
    assert_ne!(copied_leaf, leaf);
    assert_eq!(editor.scene().node(copied_leaf).unwrap().name(), "Leaf 1");

    editor.undo().unwrap();
    assert!(!editor.scene().is_attached(copy));
}

#[test]
fn test_delete_selected() {
    let mut editor = editor();
    assert!(!editor.delete_selected().unwrap());

    let node = add(&mut editor, "Box");
    assert_eq!(editor.scene().selected(), Some(node));
    assert!(editor.delete_selected().unwrap());
    assert!(!editor.scene().is_attached(node));

    let camera = editor.camera();
    editor.select(camera);
    assert!(!editor.delete_selected().unwrap());
    assert!(editor.scene().is_attached(camera));
}

#[test]
fn test_select_by_name_and_focus() {
    let mut editor = editor();
    let node = add(&mut editor, "Lamp");
    editor.deselect();

    let focused = Rc::new(RefCell::new(Vec::new()));
    let log = focused.clone();
    editor.signals().object_focused.add(move |id| log.borrow_mut().push(*id));

    assert_eq!(editor.select_by_name("Lamp"), Some(node));
    assert_eq!(editor.select_by_name("Nothing"), None);
    assert!(editor.focus_selection());
    assert!(!editor.focus(editor.scene().root()));

    assert_eq!(*focused.borrow(), vec![node]);
}

#[test]
fn test_hierarchy_skips_helpers() {
    let mut editor = editor();
    let group = add(&mut editor, "Group");
    let leaf = editor.create_node("Mesh", "Leaf");
    editor.add_node(leaf, Some(group)).unwrap();

    let tree = editor.node_hierarchy();
    assert_eq!(tree.name, "Untitled");
    assert_eq!(
        tree.children,
        vec![HierarchyNode {
            id: group,
            name: "Group".to_string(),
            children: vec![HierarchyNode {
                id: leaf,
                name: "Leaf".to_string(),
                children: Vec::new(),
            }],
        }]
    );
}

#[test]
fn test_listener_commands_run_after_current_one() {
    let mut editor = editor();
    let queue = editor.queue();
    let order = Rc::new(RefCell::new(Vec::new()));

    // Every new node gets tagged, through the queue.
    let log = order.clone();
    editor.signals().object_added.add(move |node| {
        log.borrow_mut().push(node.name().to_string());
        if node.property("tagged").is_none() {
            queue.push(SetPropertyCommand::new(node.id(), "tagged", true), Some("Tag"));
        }
    });

    let node = add(&mut editor, "Box");

    assert_eq!(*order.borrow(), vec!["Box".to_string()]);
    assert_eq!(
        editor.scene().node(node).unwrap().property("tagged"),
        Some(PropertyValue::Bool(true))
    );
    assert_eq!(editor.history().undo_description(), Some("Tag"));
    assert!(editor.queue().is_empty());
}

#[test]
fn test_failed_queued_command_is_reported() {
    let mut editor = editor();
    let errors = count(&editor.signals().editor_error);
    editor
        .queue()
        .push(SetPropertyCommand::new(NodeId(999), "x", 1.0), None);

    assert_eq!(editor.flush_pending(), 0);
    assert_eq!(errors.get(), 1);
}

#[test]
fn test_source_loader_supersession() {
    let editor = editor();
    let disposed = Rc::new(RefCell::new(Vec::new()));
    let textures = texture_cache(disposed);
    editor.register_cache(textures.clone());
    let sources = SourceLoader::new(textures.clone(), editor.signals().clone());
    let errors = count(&editor.signals().editor_error);

    let node = NodeId(42);
    let stale = sources.load(node, "broken.png");
    let fresh = sources.load(node, "wood.png");
    let (stale, fresh) = pollster::block_on(future::join(stale, fresh));

    assert_eq!(stale, LoadOutcome::Superseded);
    assert_eq!(
        fresh.loaded().map(|t| t.to_string()),
        Some("pixels of wood.png".to_string())
    );
    assert_eq!(errors.get(), 0);
    assert!(textures.is_loaded("wood.png"));
    assert!(!textures.contains("broken.png"));
}

#[test]
fn test_cache_control_list() {
    let editor = editor();
    let disposed = Rc::new(RefCell::new(Vec::new()));
    let textures = texture_cache(disposed.clone());
    let models = texture_cache(disposed);
    editor.register_cache(textures.clone());
    editor.register_cache(models.clone());

    pollster::block_on(textures.get("a.png")).unwrap();
    pollster::block_on(models.get("a.png")).unwrap();
    editor.signals().file_changed.dispatch(&"a.png".to_string());

    assert!(textures.is_empty());
    assert!(CacheControl::is_empty(&*models));
}
