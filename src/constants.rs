// Shared defaults and visual constants - single source of truth.

// Node kind tags (presentation hints carried on the wire).
pub const NODE_KIND_EDITABLE: &str = "workflowNode";
pub const NODE_KIND_MONITOR: &str = "monitorNode";

// Edge type tag applied by `connect` so every edge renders the same way.
pub const DEFAULT_EDGE_KIND: &str = "smoothstep";

// Default connection anchors for a left-to-right flow.
pub const DEFAULT_SOURCE_HANDLE: &str = "right";
pub const DEFAULT_TARGET_HANDLE: &str = "left";

// Auto-layout footprint and separation. The footprint is a layout-only
// constant; the renderer draws smaller cards inside it.
pub const LAYOUT_NODE_WIDTH: f64 = 260.0;
pub const LAYOUT_NODE_HEIGHT: f64 = 200.0;
pub const LAYOUT_RANK_SEP: f64 = 200.0;
pub const LAYOUT_NODE_SEP: f64 = 120.0;
pub const LAYOUT_MARGIN_X: f64 = 50.0;
pub const LAYOUT_MARGIN_Y: f64 = 50.0;

// Rendered node card size, used for hit-testing and port placement.
pub const NODE_WIDTH: f64 = 200.0;
pub const NODE_HEIGHT: f64 = 96.0;
pub const PORT_RADIUS: f64 = 6.0;

// Config panel auto-save window.
pub const CONFIG_DEBOUNCE_MS: u32 = 300;

// Blueprint name used when executing an unsaved graph.
pub const DEFAULT_WORKFLOW_NAME: &str = "Untitled Workflow";

// Canvas palette (dark theme).
pub const CANVAS_BACKGROUND_COLOR: &str = "#030014";
pub const CANVAS_GRID_COLOR: &str = "#4d4d4d";
pub const CANVAS_GRID_GAP: f64 = 20.0;
pub const EDGE_STROKE_COLOR: &str = "#585858";
pub const EDGE_LABEL_COLOR: &str = "#9ca3af";
pub const NODE_TEXT_PRIMARY: &str = "#e5e7eb";
pub const NODE_TEXT_SECONDARY: &str = "#94a3b8";
pub const NODE_BORDER_SELECTED: &str = "#6366f1";

// Run-status accents (monitor mode).
pub const STATUS_PENDING_BORDER: &str = "#4b5563";
pub const STATUS_PENDING_FILL: &str = "rgba(15, 23, 42, 0.5)";
pub const STATUS_RUNNING_BORDER: &str = "#3b82f6";
pub const STATUS_RUNNING_FILL: &str = "rgba(30, 58, 138, 0.10)";
pub const STATUS_COMPLETED_BORDER: &str = "#22c55e";
pub const STATUS_COMPLETED_FILL: &str = "rgba(20, 83, 45, 0.10)";
pub const STATUS_FAILED_BORDER: &str = "#ef4444";
pub const STATUS_FAILED_FILL: &str = "rgba(127, 29, 29, 0.10)";

// Service accents (edit mode cards).
pub const SERVICE_WHATSAPP_COLOR: &str = "#34d399";
pub const SERVICE_RAZORPAY_COLOR: &str = "#3b82f6";
pub const SERVICE_SHEETS_COLOR: &str = "#22c55e";
pub const SERVICE_GENERIC_COLOR: &str = "#a78bfa";

// Zoom clamp for the hand-rolled viewport.
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;
