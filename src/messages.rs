// The events that can occur in the UI, and the side effects the reducer
// may request in response. Components never mutate the store directly;
// they dispatch one of these.

use crate::models::{
    ApiWorkflow, Blueprint, ChatMessage, ChatSession, EdgeChange, NodeChange, NodeDataPatch,
    WorkflowEdge, WorkflowNode,
};
use crate::storage::ActiveView;

#[derive(Debug, Clone)]
pub enum Message {
    // View switching
    ToggleView(ActiveView),

    // Graph store
    SetGraph {
        nodes: Vec<WorkflowNode>,
        edges: Vec<WorkflowEdge>,
    },
    NodesChanged(Vec<NodeChange>),
    EdgesChanged(Vec<EdgeChange>),
    ConnectNodes {
        source: String,
        source_handle: Option<String>,
        target: String,
        target_handle: Option<String>,
    },
    SelectNode(Option<String>),
    UpdateNodeData {
        node_id: String,
        patch: NodeDataPatch,
    },
    ApplyAutoLayout,

    // Canvas gestures. Coordinates are already translated to world space
    // by the canvas component; the viewport itself is view-only state.
    StartNodeDrag {
        node_id: String,
        offset_x: f64,
        offset_y: f64,
    },
    UpdateNodeDrag {
        x: f64,
        y: f64,
    },
    StopNodeDrag,
    StartCanvasPan {
        x: f64,
        y: f64,
    },
    UpdateCanvasPan {
        x: f64,
        y: f64,
    },
    StopCanvasPan,
    ZoomCanvas {
        new_zoom: f64,
        viewport_x: f64,
        viewport_y: f64,
    },
    StartConnectDrag {
        node_id: String,
        x: f64,
        y: f64,
    },
    UpdateConnectDrag {
        x: f64,
        y: f64,
    },
    FinishConnectDrag {
        x: f64,
        y: f64,
    },
    CancelConnectDrag,
    /// Monitor-mode only: expand/collapse a node's result tray.
    ToggleInspect {
        node_id: String,
    },

    // Workflow lifecycle
    GenerateWorkflow {
        prompt: String,
    },
    DraftReady {
        workflow_id: String,
    },
    DraftFailed {
        error: String,
    },
    BlueprintLoaded {
        nodes: Vec<WorkflowNode>,
        edges: Vec<WorkflowEdge>,
    },
    SaveWorkflow {
        name: String,
    },
    WorkflowSaved {
        name: String,
    },
    SaveFailed {
        error: String,
    },
    LoadWorkflows,
    WorkflowsLoaded(Vec<ApiWorkflow>),
    LoadWorkflowsFailed {
        error: String,
    },
    OpenWorkflow {
        workflow_id: String,
    },
    DeleteWorkflow {
        workflow_id: String,
    },
    WorkflowDeleted {
        workflow_id: String,
    },
    DeleteWorkflowFailed {
        workflow_id: String,
        error: String,
    },

    // Live monitoring
    SetMonitorMode(bool),
    ExecuteWorkflow,
    RunStarted {
        run_id: String,
    },
    ExecuteFailed {
        error: String,
    },
    ClearRunState,

    // Omni inbox
    LoadInboxSessions,
    InboxSessionsLoaded(Vec<ChatSession>),
    InboxLoadFailed {
        error: String,
    },
    SelectInboxSession {
        session_id: String,
    },
    InboxMessagesLoaded {
        session_id: String,
        messages: Vec<ChatMessage>,
    },
    /// A row was inserted on the watched session; re-fetch its messages.
    InboxMessageArrived {
        session_id: String,
    },

    // Invoice cards / report exports
    ConfirmInvoice {
        invoice_id: String,
    },
    InvoiceConfirmed {
        invoice_id: String,
    },
    DeleteInvoice {
        invoice_id: String,
    },
    InvoiceDeleted {
        invoice_id: String,
    },
    InvoiceActionFailed {
        invoice_id: String,
        error: String,
    },
    DownloadExport {
        kind: ExportKind,
    },
    ExportFinished {
        kind: ExportKind,
        error: Option<String>,
    },
}

/// Downloadable report targets; each carries its own in-flight flag keyed
/// by [`ExportKind::key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportKind {
    Inventory,
    OverallLedgerPdf,
    OverallLedgerExcel,
    AgingDebtors,
    InvoicePdf(String),
    InvoiceExcel(String),
}

impl ExportKind {
    pub fn endpoint(&self) -> String {
        match self {
            ExportKind::Inventory => "/export/inventory".to_string(),
            ExportKind::OverallLedgerPdf => "/export/overall-ledger".to_string(),
            ExportKind::OverallLedgerExcel => "/export/overall-ledger-excel".to_string(),
            ExportKind::AgingDebtors => "/export/aging-debtors".to_string(),
            ExportKind::InvoicePdf(id) => format!("/export/invoice/{}", id),
            ExportKind::InvoiceExcel(id) => format!("/export/invoice-excel/{}", id),
        }
    }

    pub fn filename(&self) -> String {
        match self {
            ExportKind::Inventory => "inventory.xlsx".to_string(),
            ExportKind::OverallLedgerPdf => "ledger.pdf".to_string(),
            ExportKind::OverallLedgerExcel => "ledger.xlsx".to_string(),
            ExportKind::AgingDebtors => "aging_debtors.xlsx".to_string(),
            ExportKind::InvoicePdf(id) => format!("invoice_{}.pdf", id),
            ExportKind::InvoiceExcel(id) => format!("invoice_{}.xlsx", id),
        }
    }

    pub fn key(&self) -> String {
        self.endpoint()
    }
}

/// Side effects requested by the reducer. Pure state changes happen inside
/// `update`; everything that touches the network, the DOM or a channel is
/// described here and executed by `dispatch`.
pub enum Command {
    /// Chain another message through the dispatch queue.
    SendMessage(Message),

    // Targeted UI refreshes (executed with the AppContext in scope).
    RefreshSidebar,
    RefreshConfigPanel,
    RefreshInbox,
    RefreshTabs,
    PersistView,

    // Network effects.
    GenerateDraft { prompt: String },
    FetchBlueprint { workflow_id: String },
    SaveWorkflow { name: String, blueprint: Blueprint },
    FetchWorkflows,
    DeleteWorkflow { workflow_id: String },
    ExecuteWorkflow { blueprint: Blueprint },
    FetchInboxSessions,
    FetchInboxMessages { session_id: String },
    ConfirmInvoice { invoice_id: String },
    DeleteInvoice { invoice_id: String },
    DownloadExport { kind: ExportKind },

    // Channel effects.
    StartRunMonitor { run_id: String },
    WatchInboxSession { session_id: String },

    /// Represents no side effect.
    NoOp,
}

impl Command {
    pub fn send(msg: Message) -> Self {
        Command::SendMessage(msg)
    }
}
