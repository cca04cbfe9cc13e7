//! Integration tests for tracescope
//!
//! These run the full load pipeline (connect, classify, materialize,
//! present) against real trace databases written into temp workspaces, plus
//! the selection/navigation flow against a recording editor host.
//!
//! ```bash
//! cargo test --test integration_tests
//! ```

mod common;

use std::path::Path;
use std::sync::Arc;

use common::recording_host::{Call, RecordingHost};
use common::{RowSpec, TraceDb};
use tracescope::config::Config;
use tracescope::host::LineSpan;
use tracescope::present::{self, TreeEntry};
use tracescope::session::Session;
use tracescope::tree::NodeKind;

async fn session_for(db: &TraceDb) -> Session {
    let config = Config::load(db.root()).unwrap();
    let session = Session::new(config, Arc::new(RecordingHost::new(span(0, 40))));
    session.load_default().await.unwrap();
    session
}

fn span(start: u32, end: u32) -> LineSpan {
    LineSpan { start, end }
}

#[tokio::test]
async fn source_classification_prefers_longest_root() {
    let db = TraceDb::new();
    let nested = db.app_file("vendor");
    db.insert_source(2, "vendor", &nested);
    db.insert(&RowSpec::call("1", None, db.app_file("vendor/gem.rb")));
    db.insert(&RowSpec::call("2", Some("1"), "/elsewhere/lib.rb".to_string()));

    let session = session_for(&db).await;
    let store = session.store();
    assert_eq!(store.find_by_id("1").unwrap().source_name, "vendor");
    assert_eq!(store.find_by_id("2").unwrap().source_name, "other");
}

#[tokio::test]
async fn single_root_call_yields_one_root_without_children() {
    let db = TraceDb::new();
    db.insert(&RowSpec {
        line: "5",
        method: "bar",
        ..RowSpec::call("1", None, db.app_file("foo.rb"))
    });

    let session = session_for(&db).await;
    let view = session.calltree();
    let mut roots = view.roots();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].method, "bar");
    assert!(view.children(&mut roots[0]).is_empty());
}

#[tokio::test]
async fn two_classes_in_one_file_share_a_file_node() {
    let db = TraceDb::new();
    let file = db.app_file("models/pair.rb");
    db.insert(&RowSpec {
        class_name: "Foo",
        defined_class: "Foo",
        method: "foo_call",
        ..RowSpec::call("1", None, file.clone())
    });
    db.insert(&RowSpec {
        class_name: "Bar",
        defined_class: "Bar",
        method: "bar_call",
        line: "20",
        ..RowSpec::call("2", Some("1"), file.clone())
    });

    let session = session_for(&db).await;
    let tree = session.app_tree().read();
    let arena = tree.arena();

    let file_node = tree.node_by_file(Path::new(&file)).unwrap();
    let classes = &arena.get(file_node).children;
    assert_eq!(classes.len(), 2);
    for &class in classes {
        assert!(matches!(arena.get(class).kind, NodeKind::Class));
        assert_eq!(arena.get(class).children.len(), 1);
    }
}

#[tokio::test]
async fn directory_children_are_sorted_alphabetically() {
    let db = TraceDb::new();
    // Inserted b-first so any ordering is the presenter's doing.
    db.insert(&RowSpec {
        class_name: "Bar",
        defined_class: "Bar",
        ..RowSpec::call("1", None, db.app_file("b/bar.rb"))
    });
    db.insert(&RowSpec {
        class_name: "Foo",
        defined_class: "Foo",
        ..RowSpec::call("2", Some("1"), db.app_file("a/foo.rb"))
    });

    let session = session_for(&db).await;
    let tree = session.app_tree().read();
    let arena = tree.arena();

    let top = present::top_level(&tree);
    let dirs = present::children(arena, &top[0]);
    let labels: Vec<String> = dirs
        .iter()
        .map(|entry| present::tree_item(arena, entry).label)
        .collect();
    assert_eq!(labels, vec!["a", "b"]);
}

#[tokio::test]
async fn duplicate_method_names_are_flagged_with_lines() {
    let db = TraceDb::new();
    let file = db.app_file("dup.rb");
    db.insert(&RowSpec {
        method: "run",
        line: "5",
        ..RowSpec::call("1", None, file.clone())
    });
    db.insert(&RowSpec {
        method: "run",
        line: "30",
        ..RowSpec::call("2", Some("1"), file.clone())
    });
    db.insert(&RowSpec {
        method: "only",
        line: "50",
        ..RowSpec::call("3", Some("1"), file.clone())
    });

    let session = session_for(&db).await;
    let tree = session.app_tree().read();
    let arena = tree.arena();

    let file_node = tree.node_by_file(Path::new(&file)).unwrap();
    let class = arena.get(file_node).children[0];
    let labels: Vec<String> = present::children(arena, &TreeEntry::Node(class))
        .iter()
        .map(|entry| present::tree_item(arena, entry).label)
        .collect();
    assert!(labels.contains(&"run (L. 5)".to_string()));
    assert!(labels.contains(&"run (L. 30)".to_string()));
    assert!(labels.contains(&"only".to_string()));
}

#[tokio::test]
async fn block_rows_with_method_names_are_not_double_counted() {
    let db = TraceDb::new();
    let file = db.app_file("blocky.rb");
    db.insert(&RowSpec {
        method: "each",
        line: "5",
        ..RowSpec::call("1", None, file.clone())
    });
    // A block recorded inside `each`; it already carries the method name and
    // must not appear as a second method node.
    db.insert(&RowSpec {
        method: "each",
        block: true,
        line: "6",
        ..RowSpec::call("2", Some("1"), file.clone())
    });
    db.insert(&RowSpec {
        method: "",
        block: true,
        line: "12",
        ..RowSpec::call("3", Some("1"), file.clone())
    });

    let session = session_for(&db).await;
    let tree = session.app_tree().read();
    let arena = tree.arena();

    let file_node = tree.node_by_file(Path::new(&file)).unwrap();
    let class = arena.get(file_node).children[0];
    let labels: Vec<String> = present::children(arena, &TreeEntry::Node(class))
        .iter()
        .map(|entry| present::tree_item(arena, entry).label)
        .collect();
    assert_eq!(labels.len(), 2);
    assert!(labels.contains(&"each".to_string()));
    assert!(labels.contains(&"[block] (L. 12)".to_string()));
}

#[tokio::test]
async fn inherited_methods_are_grouped_under_defining_class() {
    let db = TraceDb::new();
    let file = db.app_file("user.rb");
    db.insert(&RowSpec {
        class_name: "User",
        defined_class: "User",
        method: "save",
        line: "5",
        ..RowSpec::call("1", None, file.clone())
    });
    db.insert(&RowSpec {
        class_name: "User",
        defined_class: "Base",
        method: "validate",
        line: "30",
        ..RowSpec::call("2", Some("1"), file.clone())
    });

    let session = session_for(&db).await;
    let tree = session.app_tree().read();
    let arena = tree.arena();

    let file_node = tree.node_by_file(Path::new(&file)).unwrap();
    let class = arena.get(file_node).children[0];
    let rows = present::children(arena, &TreeEntry::Node(class));
    let labels: Vec<String> = rows
        .iter()
        .map(|entry| present::tree_item(arena, entry).label)
        .collect();
    assert_eq!(labels, vec!["save", "-- Base --", "validate"]);
}

#[tokio::test]
async fn selecting_a_call_node_opens_once_and_reveals_once() {
    let db = TraceDb::new();
    db.insert(&RowSpec {
        line: "200",
        method: "deep",
        ..RowSpec::call("1", None, db.app_file("deep.rb"))
    });

    let config = Config::load(db.root()).unwrap();
    let host = Arc::new(RecordingHost::new(span(0, 40)));
    let session = Session::new(config, host.clone());
    session.load_default().await.unwrap();

    session.coordinator().open_call_node("1").await;

    // Line 200 sits outside the freshly-opened 0..40 span.
    assert_eq!(host.opens(), 1);
    assert_eq!(host.reveals(), 1);
    let path = std::path::PathBuf::from(db.app_file("deep.rb"));
    assert!(host.calls().contains(&Call::Reveal(path.clone(), 200)));
    // The flow also highlighted the selection (single line; no symbols).
    assert!(host.calls().contains(&Call::Highlight(path, vec![200])));
}

#[tokio::test]
async fn cursor_move_during_pending_reveal_does_not_reselect() {
    let db = TraceDb::new();
    db.insert(&RowSpec {
        line: "5",
        method: "bar",
        ..RowSpec::call("1", None, db.app_file("a.rb"))
    });

    let config = Config::load(db.root()).unwrap();
    let host = Arc::new(RecordingHost::new(span(0, 40)));
    let session = Session::new(config, host.clone());
    session.load_default().await.unwrap();

    session.coordinator().open_call_node("1").await;
    let opens_after_click = host.opens();

    // The caret lands on the revealed line, as the editor reports after our
    // own navigation. Because the selection already matches, nothing reopens.
    session
        .coordinator()
        .editor_cursor_moved(Path::new(&db.app_file("a.rb")), 4, true)
        .await;
    assert_eq!(host.opens(), opens_after_click);
    assert_eq!(
        session.selection().current_node().unwrap().id,
        "1".to_string()
    );
}

#[tokio::test]
async fn reloading_a_recording_drops_stale_caches() {
    let db = TraceDb::new();
    db.insert(&RowSpec {
        method: "first",
        ..RowSpec::call("1", None, db.app_file("one.rb"))
    });

    let session = session_for(&db).await;
    assert_eq!(session.calltree().roots()[0].method, "first");

    db.delete_rows();
    db.insert(&RowSpec {
        method: "second",
        ..RowSpec::call("9", None, db.app_file("two.rb"))
    });
    session.load_default().await.unwrap();

    let roots = session.calltree().roots();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].method, "second");
    assert!(session.store().find_by_id("1").is_none());
}

#[tokio::test]
async fn recordings_list_reads_metadata() {
    let db = TraceDb::new();
    db.insert(&RowSpec::call("1", None, db.app_file("foo.rb")));

    let config = Config::load(db.root()).unwrap();
    let session = Session::new(config, Arc::new(RecordingHost::new(span(0, 40))));

    let items = session.recordings().list();
    assert_eq!(items.len(), 1);
    let item = session.recordings().tree_item(&items[0]);
    assert_eq!(item.label, "test run");
    assert!(item.tooltip.contains("\"trigger\": \"test\""));
}
