use crate::constants::{DEFAULT_EDGE_KIND, NODE_KIND_EDITABLE, NODE_KIND_MONITOR};
use crate::messages::{Command, ExportKind, Message};
use crate::models::{
    NodeChange, NodeData, NodeDataPatch, NodeRunState, Position, RunStatus, WorkflowEdge,
    WorkflowNode,
};
use crate::state::WorkflowStore;
use crate::update::update;

fn node(id: &str) -> WorkflowNode {
    WorkflowNode::new(
        id,
        NodeData {
            service: "whatsapp".to_string(),
            label: Some(format!("node {id}")),
            ..Default::default()
        },
    )
}

fn run(state: &mut WorkflowStore, msg: Message) -> Vec<Command> {
    let mut commands = Vec::new();
    update(state, &msg, &mut commands);
    commands
}

#[test]
fn operations_on_an_empty_graph_never_panic() {
    let mut store = WorkflowStore::new();

    store.apply_node_changes(&[NodeChange::Remove {
        id: "ghost".to_string(),
    }]);
    store.apply_edge_changes(&[crate::models::EdgeChange::Remove {
        id: "ghost".to_string(),
    }]);
    store.update_node_data("ghost", &NodeDataPatch::default());
    store.select_node(Some("ghost".to_string()));
    store.set_monitor_mode(true);
    store.set_monitor_mode(false);
    store.clear_run_state();

    assert!(store.nodes.is_empty());
    assert!(store.node_states.is_empty());
}

#[test]
fn set_graph_replaces_wholesale_and_clears_selection() {
    let mut store = WorkflowStore::new();
    store.set_graph(vec![node("old")], vec![]);
    store.select_node(Some("old".to_string()));

    store.set_graph(vec![node("a"), node("b")], vec![WorkflowEdge::new("a", "b")]);

    assert_eq!(store.nodes.len(), 2);
    assert_eq!(store.edges.len(), 1);
    assert!(store.selected_node_id.is_none());
}

#[test]
fn connect_creates_unique_tagged_edges_with_default_handles() {
    let mut store = WorkflowStore::new();
    store.set_graph(vec![node("a"), node("b")], vec![]);

    let first = store.connect("a", None, "b", None);
    let second = store.connect("a", Some("bottom".to_string()), "b", None);

    assert_ne!(first, second);
    assert_eq!(store.edges.len(), 2);
    for edge in &store.edges {
        assert_eq!(edge.kind, DEFAULT_EDGE_KIND);
        assert!(edge.target_handle.is_some());
    }
    assert_eq!(store.edges[0].source_handle.as_deref(), Some("right"));
    assert_eq!(store.edges[1].source_handle.as_deref(), Some("bottom"));
}

#[test]
fn node_changes_preserve_unaffected_entries() {
    let mut store = WorkflowStore::new();
    store.set_graph(vec![node("a"), node("b")], vec![]);
    store.update_node_data(
        "b",
        &NodeDataPatch {
            label: Some("keep me".to_string()),
            ..Default::default()
        },
    );

    store.apply_node_changes(&[NodeChange::Position {
        id: "a".to_string(),
        position: Position { x: 99.0, y: 42.0 },
    }]);

    assert_eq!(store.nodes[0].position.x, 99.0);
    assert_eq!(store.nodes[1].position, Position::default());
    assert_eq!(store.nodes[1].data.label.as_deref(), Some("keep me"));
}

#[test]
fn background_click_clears_selection_and_flags() {
    let mut store = WorkflowStore::new();
    store.set_graph(vec![node("a")], vec![]);

    run(&mut store, Message::SelectNode(Some("a".to_string())));
    assert_eq!(store.selected_node_id.as_deref(), Some("a"));
    assert!(store.nodes[0].selected);

    let commands = run(&mut store, Message::SelectNode(None));
    assert!(store.selected_node_id.is_none());
    assert!(!store.nodes[0].selected);
    // The panel must be told to close.
    assert!(commands
        .iter()
        .any(|c| matches!(c, Command::RefreshConfigPanel)));
}

#[test]
fn removing_the_selected_node_clears_selection() {
    let mut store = WorkflowStore::new();
    store.set_graph(vec![node("a")], vec![]);
    store.select_node(Some("a".to_string()));

    store.apply_node_changes(&[NodeChange::Remove {
        id: "a".to_string(),
    }]);

    assert!(store.nodes.is_empty());
    assert!(store.selected_node_id.is_none());
}

#[test]
fn update_node_data_is_idempotent_through_the_reducer() {
    let mut store = WorkflowStore::new();
    store.set_graph(vec![node("a")], vec![]);

    let patch = NodeDataPatch {
        label: Some("X".to_string()),
        ..Default::default()
    };
    run(
        &mut store,
        Message::UpdateNodeData {
            node_id: "a".to_string(),
            patch: patch.clone(),
        },
    );
    let snapshot = serde_json::to_value(&store.nodes[0].data).unwrap();
    run(
        &mut store,
        Message::UpdateNodeData {
            node_id: "a".to_string(),
            patch,
        },
    );

    assert_eq!(serde_json::to_value(&store.nodes[0].data).unwrap(), snapshot);
    assert_eq!(store.nodes[0].data.label.as_deref(), Some("X"));
}

#[test]
fn debounced_typing_collapses_to_the_final_value() {
    // The debouncer cancels earlier timers, so only the last full snapshot
    // of the form reaches the store. Applying that one write must land the
    // complete final value with no interleaving of partials.
    let mut store = WorkflowStore::new();
    store.set_graph(vec![node("a")], vec![]);

    let final_patch = NodeDataPatch {
        label: Some("abc".to_string()),
        ..Default::default()
    };
    run(
        &mut store,
        Message::UpdateNodeData {
            node_id: "a".to_string(),
            patch: final_patch,
        },
    );

    assert_eq!(store.nodes[0].data.label.as_deref(), Some("abc"));
    assert_eq!(store.nodes[0].data.service, "whatsapp");
}

#[test]
fn monitor_mode_retags_nodes_and_exit_clears_run_state() {
    let mut store = WorkflowStore::new();
    store.set_graph(vec![node("a")], vec![]);
    store.node_states.insert(
        "a".to_string(),
        NodeRunState {
            status: RunStatus::Completed,
            data: None,
            error: None,
        },
    );
    store.current_run_id = Some("r1".to_string());
    store.expanded_results.insert("a".to_string());

    store.set_monitor_mode(true);
    assert_eq!(store.nodes[0].kind, NODE_KIND_MONITOR);
    // Entering monitor mode closes the inspector surface.
    assert!(store.selected_node_id.is_none());

    store.set_monitor_mode(false);
    assert_eq!(store.nodes[0].kind, NODE_KIND_EDITABLE);
    assert!(store.node_states.is_empty());
    assert!(store.current_run_id.is_none());
    assert!(store.expanded_results.is_empty());
}

#[test]
fn generate_flow_sets_and_clears_the_inflight_flag() {
    let mut store = WorkflowStore::new();

    let commands = run(
        &mut store,
        Message::GenerateWorkflow {
            prompt: "  remind debtors over WhatsApp  ".to_string(),
        },
    );
    assert!(store.pending.generating);
    assert!(commands
        .iter()
        .any(|c| matches!(c, Command::GenerateDraft { prompt } if prompt == "remind debtors over WhatsApp")));

    // A second click while in flight is ignored.
    let commands = run(
        &mut store,
        Message::GenerateWorkflow {
            prompt: "again".to_string(),
        },
    );
    assert!(commands.is_empty());

    // Failure clears the flag (the finally-path).
    run(
        &mut store,
        Message::DraftFailed {
            error: "boom".to_string(),
        },
    );
    assert!(!store.pending.generating);
}

#[test]
fn execute_on_an_empty_canvas_is_refused() {
    let mut store = WorkflowStore::new();
    let commands = run(&mut store, Message::ExecuteWorkflow);
    assert!(!store.pending.executing);
    assert!(!commands
        .iter()
        .any(|c| matches!(c, Command::ExecuteWorkflow { .. })));
}

#[test]
fn per_target_download_flags_do_not_block_each_other() {
    let mut store = WorkflowStore::new();

    run(
        &mut store,
        Message::DownloadExport {
            kind: ExportKind::Inventory,
        },
    );
    // Duplicate request for the same report is dropped...
    let commands = run(
        &mut store,
        Message::DownloadExport {
            kind: ExportKind::Inventory,
        },
    );
    assert!(!commands
        .iter()
        .any(|c| matches!(c, Command::DownloadExport { .. })));

    // ...but a different report starts independently.
    let commands = run(
        &mut store,
        Message::DownloadExport {
            kind: ExportKind::AgingDebtors,
        },
    );
    assert!(commands
        .iter()
        .any(|c| matches!(c, Command::DownloadExport { .. })));
    assert_eq!(store.pending.downloading.len(), 2);

    run(
        &mut store,
        Message::ExportFinished {
            kind: ExportKind::Inventory,
            error: Some("network down".to_string()),
        },
    );
    assert_eq!(store.pending.downloading.len(), 1);
}

#[test]
fn blueprint_loaded_lays_out_left_to_right() {
    let mut store = WorkflowStore::new();
    let nodes = vec![node("1"), node("2"), node("3")];
    let edges = vec![WorkflowEdge::new("1", "2"), WorkflowEdge::new("2", "3")];

    run(&mut store, Message::BlueprintLoaded { nodes, edges });

    assert!(!store.pending.generating);
    let x: Vec<f64> = store.nodes.iter().map(|n| n.position.x).collect();
    assert!(x[0] < x[1] && x[1] < x[2]);
}

#[test]
fn zoom_is_clamped() {
    let mut store = WorkflowStore::new();
    run(
        &mut store,
        Message::ZoomCanvas {
            new_zoom: 900.0,
            viewport_x: 0.0,
            viewport_y: 0.0,
        },
    );
    assert!(store.zoom_level <= crate::constants::MAX_ZOOM);
}
