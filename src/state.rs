//! The graph state store and the dispatch loop around it.
//!
//! One [`WorkflowStore`] exists per editor session, explicitly constructed
//! and passed around behind an [`AppContext`] - there is no ambient global
//! instance. Every mutation goes through the operations below (or through
//! `dispatch`, which funnels into them), which is what keeps a debounced
//! config write from racing an incoming drag update for the same node.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::constants::{
    DEFAULT_SOURCE_HANDLE, DEFAULT_TARGET_HANDLE, MAX_ZOOM, MIN_ZOOM, NODE_HEIGHT, NODE_KIND_EDITABLE,
    NODE_KIND_MONITOR, NODE_WIDTH, PORT_RADIUS,
};
use crate::messages::{Command, Message};
use crate::models::{
    ApiWorkflow, ChatMessage, ChatSession, EdgeChange, NodeChange, NodeDataPatch, NodeStates,
    Position, WorkflowEdge, WorkflowNode,
};
use crate::network::realtime::ChannelGuard;
use crate::network::{ApiClient, ChannelRouter, IRealtimeClient};
use crate::scheduling::Debouncer;
use crate::storage::ActiveView;
use crate::update::update;

/// In-flight flags, one per operation+target so unrelated UI never blocks.
#[derive(Default)]
pub struct PendingOps {
    pub generating: bool,
    pub saving: bool,
    pub executing: bool,
    pub loading_workflows: bool,
    pub deleting: HashSet<String>,
    pub downloading: HashSet<String>,
    pub invoice_actions: HashSet<String>,
}

/// An in-progress edge-connection gesture (source port grabbed, cursor
/// tracked in world space until release).
#[derive(Clone, Debug)]
pub struct ConnectDrag {
    pub source_id: String,
    pub cursor: Position,
}

pub struct WorkflowStore {
    // Canonical graph + selection.
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    pub selected_node_id: Option<String>,

    // Run monitoring.
    pub monitor_mode: bool,
    pub node_states: NodeStates,
    pub current_run_id: Option<String>,
    /// The single live run subscription; replaced (never accumulated) by
    /// `install_run`, released by `clear_run_state`.
    run_channel: Option<ChannelGuard>,
    /// Nodes whose result tray is expanded in monitor mode.
    pub expanded_results: HashSet<String>,

    // Canvas interaction state.
    pub dragging: Option<String>,
    pub drag_offset_x: f64,
    pub drag_offset_y: f64,
    pub canvas_panning: bool,
    pub pan_last_x: f64,
    pub pan_last_y: f64,
    pub connect_drag: Option<ConnectDrag>,

    // Viewport transform (view space only; never written into positions).
    pub viewport_x: f64,
    pub viewport_y: f64,
    pub zoom_level: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,

    // Saved workflows sidebar.
    pub workflows: Vec<ApiWorkflow>,
    pub pending: PendingOps,

    // Omni inbox.
    pub inbox_sessions: Vec<ChatSession>,
    pub inbox_messages: Vec<ChatMessage>,
    pub selected_session_id: Option<String>,
    inbox_channel: Option<ChannelGuard>,

    pub active_view: ActiveView,

    dirty: bool,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            selected_node_id: None,
            monitor_mode: false,
            node_states: HashMap::new(),
            current_run_id: None,
            run_channel: None,
            expanded_results: HashSet::new(),
            dragging: None,
            drag_offset_x: 0.0,
            drag_offset_y: 0.0,
            canvas_panning: false,
            pan_last_x: 0.0,
            pan_last_y: 0.0,
            connect_drag: None,
            viewport_x: 0.0,
            viewport_y: 0.0,
            zoom_level: 1.0,
            canvas_width: 800.0,
            canvas_height: 600.0,
            workflows: Vec::new(),
            pending: PendingOps::default(),
            inbox_sessions: Vec::new(),
            inbox_messages: Vec::new(),
            selected_session_id: None,
            inbox_channel: None,
            active_view: ActiveView::Workflows,
            dirty: true,
        }
    }

    // ------------------------------------------------------------------
    // Graph operations
    // ------------------------------------------------------------------

    /// Replaces both collections wholesale. No validation beyond shape:
    /// the renderer tolerates dangling edges on its own.
    pub fn set_graph(&mut self, nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) {
        self.nodes = nodes;
        self.edges = edges;
        self.selected_node_id = None;
        self.retag_nodes();
        self.mark_dirty();
    }

    /// Applies incremental changes from direct interaction. Entries not
    /// named by any change are preserved untouched.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == id) {
                        node.position = *position;
                    }
                }
                NodeChange::Select { id, selected } => {
                    if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == id) {
                        node.selected = *selected;
                    }
                }
                NodeChange::Remove { id } => {
                    self.nodes.retain(|n| &n.id != id);
                    if self.selected_node_id.as_ref() == Some(id) {
                        self.selected_node_id = None;
                    }
                }
            }
        }
        self.mark_dirty();
    }

    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        for change in changes {
            match change {
                EdgeChange::Remove { id } => self.edges.retain(|e| &e.id != id),
            }
        }
        self.mark_dirty();
    }

    /// Appends a new edge with a fresh unique id and the shared edge-type
    /// tag so every connection renders the same way.
    pub fn connect(
        &mut self,
        source: &str,
        source_handle: Option<String>,
        target: &str,
        target_handle: Option<String>,
    ) -> String {
        let mut edge = WorkflowEdge::new(source, target);
        edge.source_handle =
            Some(source_handle.unwrap_or_else(|| DEFAULT_SOURCE_HANDLE.to_string()));
        edge.target_handle =
            Some(target_handle.unwrap_or_else(|| DEFAULT_TARGET_HANDLE.to_string()));
        let id = edge.id.clone();
        self.edges.push(edge);
        self.mark_dirty();
        id
    }

    /// Sets (or clears) the selection. Clearing must close any open
    /// inspector - the dispatch layer refreshes the panel after this.
    pub fn select_node(&mut self, node_id: Option<String>) {
        for node in &mut self.nodes {
            node.selected = node_id.as_deref() == Some(node.id.as_str());
        }
        self.selected_node_id = node_id;
        self.mark_dirty();
    }

    pub fn selected_node(&self) -> Option<&WorkflowNode> {
        let id = self.selected_node_id.as_deref()?;
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Shallow-merges `patch` into the node's `data`; a no-op when the
    /// node is gone (e.g. deleted while a debounced write was pending).
    pub fn update_node_data(&mut self, node_id: &str, patch: &NodeDataPatch) {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == node_id) {
            node.data.merge(patch);
            self.mark_dirty();
        }
    }

    // ------------------------------------------------------------------
    // Run monitoring
    // ------------------------------------------------------------------

    /// Toggles between edit and monitor presentation. Leaving monitor mode
    /// clears the run state so stale statuses never bleed into the next
    /// edit session.
    pub fn set_monitor_mode(&mut self, enabled: bool) {
        self.monitor_mode = enabled;
        if enabled {
            // The inspector is an edit-mode surface.
            self.select_node(None);
        } else {
            self.clear_run_state();
            self.expanded_results.clear();
        }
        self.retag_nodes();
        self.mark_dirty();
    }

    /// Records the active run and takes ownership of its channel guard.
    /// Any previous guard must already be gone - `monitor::start_run`
    /// enforces teardown-before-open.
    pub fn install_run(&mut self, run_id: &str, guard: ChannelGuard) {
        self.current_run_id = Some(run_id.to_string());
        self.run_channel = Some(guard);
        self.node_states.clear();
        self.mark_dirty();
    }

    /// Tears down the active subscription (if any) and resets run state.
    pub fn clear_run_state(&mut self) {
        if let Some(guard) = self.run_channel.take() {
            guard.cancel();
        }
        self.node_states.clear();
        self.current_run_id = None;
        self.mark_dirty();
    }

    /// Replaces the status map wholesale (last write wins; the backend is
    /// the source of truth for ordering). Updates tagged with a different
    /// run id are ignored even if they slip past server-side filtering.
    pub fn apply_run_snapshot(&mut self, run_id: &str, states: NodeStates) {
        if self.current_run_id.as_deref() != Some(run_id) {
            return;
        }
        self.node_states = states;
        self.mark_dirty();
    }

    pub fn has_run_channel(&self) -> bool {
        self.run_channel.is_some()
    }

    pub fn toggle_inspect(&mut self, node_id: &str) {
        if !self.expanded_results.remove(node_id) {
            self.expanded_results.insert(node_id.to_string());
        }
        self.mark_dirty();
    }

    /// Keeps the presentation tag on every node in line with the current
    /// mode (single-writer version of the original's component-side
    /// `setNodes` sweep).
    fn retag_nodes(&mut self) {
        let kind = if self.monitor_mode {
            NODE_KIND_MONITOR
        } else {
            NODE_KIND_EDITABLE
        };
        for node in &mut self.nodes {
            node.kind = kind.to_string();
        }
    }

    // ------------------------------------------------------------------
    // Omni inbox
    // ------------------------------------------------------------------

    /// Swaps the watched session channel; same teardown-before-open rule
    /// as the run monitor.
    pub fn install_inbox_channel(&mut self, guard: ChannelGuard) {
        if let Some(previous) = self.inbox_channel.take() {
            previous.cancel();
        }
        self.inbox_channel = Some(guard);
    }

    pub fn clear_inbox_channel(&mut self) {
        if let Some(guard) = self.inbox_channel.take() {
            guard.cancel();
        }
    }

    // ------------------------------------------------------------------
    // Hit testing (world coordinates)
    // ------------------------------------------------------------------

    pub fn find_node_at(&self, x: f64, y: f64) -> Option<&WorkflowNode> {
        self.nodes.iter().rev().find(|n| {
            x >= n.position.x
                && x <= n.position.x + NODE_WIDTH
                && y >= n.position.y
                && y <= n.position.y + NODE_HEIGHT
        })
    }

    /// The outgoing port sits on the right edge, vertically centered.
    pub fn source_port_at(&self, x: f64, y: f64) -> Option<&WorkflowNode> {
        let grab = PORT_RADIUS * 2.0;
        self.nodes.iter().rev().find(|n| {
            let px = n.position.x + NODE_WIDTH;
            let py = n.position.y + NODE_HEIGHT / 2.0;
            (x - px).abs() <= grab && (y - py).abs() <= grab
        })
    }

    pub fn clamp_zoom(&mut self) {
        self.zoom_level = self.zoom_level.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    // ------------------------------------------------------------------
    // Redraw bookkeeping
    // ------------------------------------------------------------------

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Consumed once per animation frame by the canvas loop.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

pub type StoreHandle = Rc<RefCell<WorkflowStore>>;

/// Everything a component needs, cloned into its event closures: the store
/// handle, the realtime channel router, the REST client and the shared
/// config-panel debouncer.
#[derive(Clone)]
pub struct AppContext {
    pub store: StoreHandle,
    pub router: Rc<RefCell<ChannelRouter>>,
    pub api: Rc<ApiClient>,
    pub panel_debounce: Rc<RefCell<Debouncer>>,
}

impl AppContext {
    pub fn new(transport: Rc<RefCell<dyn IRealtimeClient>>) -> Self {
        Self {
            store: Rc::new(RefCell::new(WorkflowStore::new())),
            router: Rc::new(RefCell::new(ChannelRouter::new(transport))),
            api: Rc::new(ApiClient::new()),
            panel_debounce: Rc::new(RefCell::new(Debouncer::new(
                crate::constants::CONFIG_DEBOUNCE_MS,
            ))),
        }
    }
}

/// Runs a message (and everything it chains) through the reducer, then
/// executes the requested side effects. Messages queue breadth-first so a
/// command's follow-up never observes a half-applied parent.
pub fn dispatch(ctx: &AppContext, msg: Message) {
    let mut queue = VecDeque::new();
    queue.push_back(msg);

    while let Some(msg) = queue.pop_front() {
        let mut commands = Vec::new();
        {
            let mut store = ctx.store.borrow_mut();
            update(&mut store, &msg, &mut commands);
        }
        for command in commands {
            execute(ctx, command, &mut queue);
        }
    }
}

fn execute(ctx: &AppContext, command: Command, queue: &mut VecDeque<Message>) {
    use wasm_bindgen_futures::spawn_local;

    match command {
        Command::SendMessage(msg) => queue.push_back(msg),
        Command::NoOp => {}

        Command::RefreshSidebar => crate::components::sidebar::refresh(ctx),
        Command::RefreshConfigPanel => crate::components::config_panel::refresh(ctx),
        Command::RefreshInbox => crate::components::inbox::refresh(ctx),
        Command::RefreshTabs => crate::views::render_active_view(ctx),
        Command::PersistView => {
            if let Err(e) = crate::storage::save_view(&ctx.store.borrow()) {
                crate::warn_log!("Failed to persist view state: {:?}", e);
            }
        }

        Command::GenerateDraft { prompt } => {
            let ctx = ctx.clone();
            spawn_local(async move {
                let user_id = crate::network::current_user_id();
                match ctx.api.generate_draft(&prompt, &user_id).await {
                    Ok(draft) => dispatch(
                        &ctx,
                        Message::DraftReady {
                            workflow_id: draft.workflow_id,
                        },
                    ),
                    Err(e) => dispatch(
                        &ctx,
                        Message::DraftFailed {
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::FetchBlueprint { workflow_id } => {
            let ctx = ctx.clone();
            spawn_local(async move {
                match ctx.api.fetch_blueprint(&workflow_id).await {
                    Ok(row) => dispatch(
                        &ctx,
                        Message::BlueprintLoaded {
                            nodes: row.nodes,
                            edges: row.edges,
                        },
                    ),
                    Err(e) => dispatch(
                        &ctx,
                        Message::DraftFailed {
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::SaveWorkflow { name, blueprint } => {
            let ctx = ctx.clone();
            spawn_local(async move {
                let user_id = crate::network::current_user_id();
                match ctx.api.save_workflow(&user_id, &name, &blueprint).await {
                    Ok(()) => dispatch(&ctx, Message::WorkflowSaved { name }),
                    Err(e) => dispatch(
                        &ctx,
                        Message::SaveFailed {
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::FetchWorkflows => {
            let ctx = ctx.clone();
            spawn_local(async move {
                let user_id = crate::network::current_user_id();
                match ctx.api.list_workflows(&user_id).await {
                    Ok(list) => dispatch(&ctx, Message::WorkflowsLoaded(list.workflows)),
                    Err(e) => dispatch(
                        &ctx,
                        Message::LoadWorkflowsFailed {
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::DeleteWorkflow { workflow_id } => {
            let ctx = ctx.clone();
            spawn_local(async move {
                let user_id = crate::network::current_user_id();
                match ctx.api.delete_workflow(&workflow_id, &user_id).await {
                    Ok(()) => dispatch(&ctx, Message::WorkflowDeleted { workflow_id }),
                    Err(e) => dispatch(
                        &ctx,
                        Message::DeleteWorkflowFailed {
                            workflow_id,
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::ExecuteWorkflow { blueprint } => {
            let ctx = ctx.clone();
            spawn_local(async move {
                let payload = serde_json::json!({});
                match ctx.api.execute_workflow(&blueprint, &payload).await {
                    Ok(resp) => dispatch(&ctx, Message::RunStarted { run_id: resp.run_id }),
                    Err(e) => dispatch(
                        &ctx,
                        Message::ExecuteFailed {
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::FetchInboxSessions => {
            let ctx = ctx.clone();
            spawn_local(async move {
                match ctx.api.fetch_inbox_sessions().await {
                    Ok(sessions) => dispatch(&ctx, Message::InboxSessionsLoaded(sessions)),
                    Err(e) => dispatch(
                        &ctx,
                        Message::InboxLoadFailed {
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::FetchInboxMessages { session_id } => {
            let ctx = ctx.clone();
            spawn_local(async move {
                match ctx.api.fetch_session_messages(&session_id).await {
                    Ok(messages) => dispatch(
                        &ctx,
                        Message::InboxMessagesLoaded {
                            session_id,
                            messages,
                        },
                    ),
                    Err(e) => dispatch(
                        &ctx,
                        Message::InboxLoadFailed {
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::ConfirmInvoice { invoice_id } => {
            let ctx = ctx.clone();
            spawn_local(async move {
                match ctx.api.confirm_invoice(&invoice_id).await {
                    Ok(()) => dispatch(&ctx, Message::InvoiceConfirmed { invoice_id }),
                    Err(e) => dispatch(
                        &ctx,
                        Message::InvoiceActionFailed {
                            invoice_id,
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::DeleteInvoice { invoice_id } => {
            let ctx = ctx.clone();
            spawn_local(async move {
                match ctx.api.delete_invoice(&invoice_id).await {
                    Ok(()) => dispatch(&ctx, Message::InvoiceDeleted { invoice_id }),
                    Err(e) => dispatch(
                        &ctx,
                        Message::InvoiceActionFailed {
                            invoice_id,
                            error: describe(&e),
                        },
                    ),
                }
            });
        }
        Command::DownloadExport { kind } => {
            let ctx = ctx.clone();
            spawn_local(async move {
                let result = ctx
                    .api
                    .download_export(&kind.endpoint(), &kind.filename())
                    .await;
                dispatch(
                    &ctx,
                    Message::ExportFinished {
                        kind,
                        error: result.err().map(|e| describe(&e)),
                    },
                );
            });
        }

        Command::StartRunMonitor { run_id } => {
            crate::monitor::start_run(ctx, &run_id);
        }
        Command::WatchInboxSession { session_id } => {
            crate::components::inbox::watch_session(ctx, &session_id);
        }
    }
}

fn describe(e: &wasm_bindgen::JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}
