use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::constants::{DEFAULT_EDGE_KIND, NODE_KIND_EDITABLE, NODE_KIND_MONITOR};

/// Free-form parameter bag carried by every node (`data.params`).
pub type Params = serde_json::Map<String, Value>;

/// Logical canvas-space coordinates. The viewport transform is layered on
/// top of these at draw time and never written back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

fn default_node_kind() -> String {
    NODE_KIND_EDITABLE.to_string()
}

fn default_edge_kind() -> String {
    DEFAULT_EDGE_KIND.to_string()
}

/// A single step in the workflow graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    /// Rendering variant tag ("workflowNode" / "monitorNode"). Purely a
    /// presentation hint; unknown tags fall back to the editable card.
    #[serde(rename = "type", default = "default_node_kind")]
    pub kind: String,
    #[serde(default)]
    pub data: NodeData,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, data: NodeData) -> Self {
        Self {
            id: id.into(),
            kind: default_node_kind(),
            data,
            position: Position::default(),
            selected: false,
        }
    }

    pub fn is_monitor(&self) -> bool {
        self.kind == NODE_KIND_MONITOR
    }
}

/// Node attributes. `service` discriminates which backend action the node
/// represents; `params` holds the action-specific fields.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Wire-level step tag ("trigger" / "action"), preserved round-trip.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,
    #[serde(default)]
    pub params: Params,
}

impl NodeData {
    /// Display title: service tag first, then label, matching the card
    /// header precedence of the original UI.
    pub fn title(&self) -> &str {
        if !self.service.is_empty() {
            &self.service
        } else {
            self.label.as_deref().unwrap_or("Node")
        }
    }

    pub fn subtitle(&self) -> &str {
        self.task
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or("No task specified")
    }

    /// Shallow-merges `patch` into `self`: every field present in the patch
    /// replaces the corresponding field wholesale (`params` is one field at
    /// this level). Applying the same patch twice is a no-op.
    pub fn merge(&mut self, patch: &NodeDataPatch) {
        if let Some(service) = &patch.service {
            self.service = service.clone();
        }
        if let Some(label) = &patch.label {
            self.label = Some(label.clone());
        }
        if let Some(task) = &patch.task {
            self.task = Some(task.clone());
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(params) = &patch.params {
            self.params = params.clone();
        }
    }
}

/// Partial update produced by the config panel. `None` fields are left
/// untouched by [`NodeData::merge`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeDataPatch {
    pub service: Option<String>,
    pub label: Option<String>,
    pub task: Option<String>,
    pub description: Option<String>,
    pub params: Option<Params>,
}

/// Directed connection between two nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(
        rename = "sourceHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_handle: Option<String>,
    #[serde(
        rename = "targetHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default = "default_edge_kind")]
    pub kind: String,
}

impl WorkflowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: format!("edge-{}", uuid::Uuid::new_v4()),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            label: None,
            kind: default_edge_kind(),
        }
    }
}

/// Incremental node changes originating from canvas gestures. Unaffected
/// entries must be preserved by identity when these are applied.
#[derive(Clone, Debug)]
pub enum NodeChange {
    Position { id: String, position: Position },
    Select { id: String, selected: bool },
    Remove { id: String },
}

#[derive(Clone, Debug)]
pub enum EdgeChange {
    Remove { id: String },
}

// ---------------------------------------------------------------------------
// Run monitoring
// ---------------------------------------------------------------------------

/// Per-node execution status pushed by the backend. Terminal states never
/// transition back for the same run (the backend owns ordering).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Pending,
    #[serde(alias = "processing")]
    Running,
    #[serde(alias = "success")]
    Completed,
    #[serde(alias = "error")]
    Failed,
}

/// Live state of one node during a run, as reported by the change feed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRunState {
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type NodeStates = HashMap<String, NodeRunState>;

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

/// Saved workflow record as returned by `GET /workflows`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiWorkflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorkflowListResponse {
    #[serde(default)]
    pub workflows: Vec<ApiWorkflow>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DraftResponse {
    pub workflow_id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExecuteResponse {
    pub run_id: String,
}

/// Row shape of the managed `workflow_blueprints` table.
#[derive(Clone, Debug, Deserialize)]
pub struct BlueprintRow {
    #[allow(dead_code)]
    pub id: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

/// Node shape sent to `POST /workflow/execute`: positions and presentation
/// tags are stripped, only the executable step survives.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlueprintNode {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    pub data: NodeData,
}

/// The serialized graph exchanged with the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    pub nodes: Vec<BlueprintNode>,
    pub edges: Vec<WorkflowEdge>,
}

impl Blueprint {
    pub fn from_graph(name: &str, nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Self {
        let nodes = nodes
            .iter()
            .map(|n| {
                let mut data = n.data.clone();
                // Task falls back to the label so hand-named nodes stay
                // executable.
                if data.task.is_none() {
                    data.task = data.label.clone();
                }
                BlueprintNode {
                    id: n.id.clone(),
                    step_type: data.step_type.clone().unwrap_or_else(|| "action".to_string()),
                    data,
                }
            })
            .collect();
        Self {
            name: name.to_string(),
            nodes,
            edges: edges.to_vec(),
        }
    }
}

/// Reply of the voice intent parser (`POST /intent-parser`).
#[derive(Clone, Debug, Deserialize)]
pub struct IntentReply {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub analysis: Option<IntentAnalysis>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IntentAnalysis {
    #[serde(default)]
    pub intent_type: String,
    #[serde(default)]
    pub data: Value,
}

/// Omni-inbox session row (managed table read).
#[derive(Clone, Debug, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
}

/// Omni-inbox message row; new rows arrive over the realtime feed.
/// Messages carrying an `invoice_id` render as an actionable invoice card.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Service dispatch
// ---------------------------------------------------------------------------

/// Typed view over `data.service` + `data.params`, used by the config
/// panel to decide which field set to expose. Unknown tags collapse into
/// `Generic`.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceConfig {
    WhatsApp(WhatsAppParams),
    Razorpay(RazorpayParams),
    GoogleSheets(SheetsParams),
    Generic { description: Option<String> },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppParams {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RazorpayParams {
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetsParams {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub row_data: Option<String>,
}

impl ServiceConfig {
    pub const WHATSAPP: &'static str = "whatsapp";
    pub const RAZORPAY: &'static str = "razorpay";
    pub const GOOGLE_SHEETS: &'static str = "google_sheets";

    pub fn from_data(data: &NodeData) -> Self {
        let params = Value::Object(data.params.clone());
        match data.service.as_str() {
            Self::WHATSAPP => {
                ServiceConfig::WhatsApp(serde_json::from_value(params).unwrap_or_default())
            }
            Self::RAZORPAY => {
                ServiceConfig::Razorpay(serde_json::from_value(params).unwrap_or_default())
            }
            Self::GOOGLE_SHEETS => {
                ServiceConfig::GoogleSheets(serde_json::from_value(params).unwrap_or_default())
            }
            _ => ServiceConfig::Generic {
                description: data.description.clone(),
            },
        }
    }

    /// Task choices offered per service, mirroring the backend action
    /// registry.
    pub fn task_options(service: &str) -> &'static [&'static str] {
        match service {
            Self::WHATSAPP => &["send_message", "send_media"],
            Self::RAZORPAY => &["create_payment_link", "create_order", "capture_payment"],
            Self::GOOGLE_SHEETS => &["read_data", "write_data", "append_data"],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_deserializes_with_missing_optionals() {
        let node: WorkflowNode = serde_json::from_value(json!({ "id": "n1" })).unwrap();
        assert_eq!(node.kind, NODE_KIND_EDITABLE);
        assert_eq!(node.position.x, 0.0);
        assert!(!node.selected);
        assert!(node.data.service.is_empty());
    }

    #[test]
    fn run_status_accepts_backend_aliases() {
        let s: RunStatus = serde_json::from_value(json!("processing")).unwrap();
        assert_eq!(s, RunStatus::Running);
        let s: RunStatus = serde_json::from_value(json!("error")).unwrap();
        assert_eq!(s, RunStatus::Failed);
        assert!(serde_json::from_value::<RunStatus>(json!("exploded")).is_err());
    }

    #[test]
    fn merge_is_shallow_and_idempotent() {
        let mut data = NodeData {
            service: ServiceConfig::WHATSAPP.to_string(),
            label: Some("Notify".to_string()),
            task: Some("send_message".to_string()),
            ..Default::default()
        };
        data.params
            .insert("phone".to_string(), json!("+911234567890"));

        let patch = NodeDataPatch {
            label: Some("X".to_string()),
            ..Default::default()
        };
        data.merge(&patch);
        data.merge(&patch);

        assert_eq!(data.label.as_deref(), Some("X"));
        assert_eq!(data.task.as_deref(), Some("send_message"));
        assert_eq!(data.params.get("phone"), Some(&json!("+911234567890")));
    }

    #[test]
    fn blueprint_falls_back_to_label_for_task() {
        let mut node = WorkflowNode::new(
            "n1",
            NodeData {
                service: ServiceConfig::RAZORPAY.to_string(),
                label: Some("Collect payment".to_string()),
                ..Default::default()
            },
        );
        node.position = Position { x: 40.0, y: 80.0 };

        let bp = Blueprint::from_graph("Test", &[node], &[]);
        assert_eq!(bp.nodes[0].step_type, "action");
        assert_eq!(bp.nodes[0].data.task.as_deref(), Some("Collect payment"));
        // Positions are not part of the executable blueprint.
        let v = serde_json::to_value(&bp).unwrap();
        assert!(v["nodes"][0].get("position").is_none());
    }

    #[test]
    fn service_config_dispatches_on_tag() {
        let mut data = NodeData {
            service: ServiceConfig::GOOGLE_SHEETS.to_string(),
            ..Default::default()
        };
        data.params
            .insert("spreadsheet_id".to_string(), json!("sheet-1"));
        data.params.insert("range".to_string(), json!("A1:C10"));

        match ServiceConfig::from_data(&data) {
            ServiceConfig::GoogleSheets(p) => {
                assert_eq!(p.spreadsheet_id.as_deref(), Some("sheet-1"));
                assert_eq!(p.range.as_deref(), Some("A1:C10"));
            }
            other => panic!("expected sheets config, got {other:?}"),
        }

        data.service = "carrier_pigeon".to_string();
        assert!(matches!(
            ServiceConfig::from_data(&data),
            ServiceConfig::Generic { .. }
        ));
    }
}
