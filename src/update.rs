//! The reducer: pure state transitions plus requested side effects.
//!
//! Nothing in here touches the DOM or the network directly; that keeps the
//! whole decision layer runnable under plain `cargo test`.

use crate::constants::DEFAULT_WORKFLOW_NAME;
use crate::layout::{apply_auto_layout, LayoutConfig};
use crate::messages::{Command, Message};
use crate::models::{Blueprint, NodeChange, Position};
use crate::state::{ConnectDrag, WorkflowStore};
use crate::storage::ActiveView;
use crate::toast;

pub fn update(state: &mut WorkflowStore, msg: &Message, commands: &mut Vec<Command>) {
    match msg {
        // ------------------------------------------------------------------
        // View switching
        // ------------------------------------------------------------------
        Message::ToggleView(view) => {
            state.active_view = *view;
            match view {
                ActiveView::Inbox => {
                    if state.inbox_sessions.is_empty() {
                        commands.push(Command::FetchInboxSessions);
                    }
                    // Re-open the live feed for a session that was being
                    // read before the user tabbed away.
                    if let Some(session_id) = state.selected_session_id.clone() {
                        commands.push(Command::FetchInboxMessages {
                            session_id: session_id.clone(),
                        });
                        commands.push(Command::WatchInboxSession { session_id });
                    }
                }
                ActiveView::Workflows => {
                    // A hidden inbox must not keep receiving pushes.
                    state.clear_inbox_channel();
                }
            }
            commands.push(Command::RefreshTabs);
            commands.push(Command::PersistView);
        }

        // ------------------------------------------------------------------
        // Graph store
        // ------------------------------------------------------------------
        Message::SetGraph { nodes, edges } => {
            state.set_graph(nodes.clone(), edges.clone());
            commands.push(Command::RefreshConfigPanel);
        }
        Message::NodesChanged(changes) => {
            let removed_any = changes
                .iter()
                .any(|c| matches!(c, NodeChange::Remove { .. }));
            state.apply_node_changes(changes);
            if removed_any {
                commands.push(Command::RefreshConfigPanel);
            }
        }
        Message::EdgesChanged(changes) => {
            state.apply_edge_changes(changes);
        }
        Message::ConnectNodes {
            source,
            source_handle,
            target,
            target_handle,
        } => {
            state.connect(
                source,
                source_handle.clone(),
                target,
                target_handle.clone(),
            );
        }
        Message::SelectNode(node_id) => {
            state.select_node(node_id.clone());
            commands.push(Command::RefreshConfigPanel);
        }
        Message::UpdateNodeData { node_id, patch } => {
            state.update_node_data(node_id, patch);
        }
        Message::ApplyAutoLayout => {
            let nodes = std::mem::take(&mut state.nodes);
            state.nodes = apply_auto_layout(nodes, &state.edges, &LayoutConfig::default());
            state.mark_dirty();
        }

        // ------------------------------------------------------------------
        // Canvas gestures
        // ------------------------------------------------------------------
        Message::StartNodeDrag {
            node_id,
            offset_x,
            offset_y,
        } => {
            state.dragging = Some(node_id.clone());
            state.drag_offset_x = *offset_x;
            state.drag_offset_y = *offset_y;
        }
        Message::UpdateNodeDrag { x, y } => {
            if let Some(node_id) = state.dragging.clone() {
                state.apply_node_changes(&[NodeChange::Position {
                    id: node_id,
                    position: Position {
                        x: x - state.drag_offset_x,
                        y: y - state.drag_offset_y,
                    },
                }]);
            }
        }
        Message::StopNodeDrag => {
            state.dragging = None;
        }
        Message::StartCanvasPan { x, y } => {
            state.canvas_panning = true;
            state.pan_last_x = *x;
            state.pan_last_y = *y;
        }
        Message::UpdateCanvasPan { x, y } => {
            if state.canvas_panning {
                let dx = x - state.pan_last_x;
                let dy = y - state.pan_last_y;
                let zoom = state.zoom_level;
                state.viewport_x -= dx / zoom;
                state.viewport_y -= dy / zoom;
                state.pan_last_x = *x;
                state.pan_last_y = *y;
                state.mark_dirty();
            }
        }
        Message::StopCanvasPan => {
            state.canvas_panning = false;
            commands.push(Command::PersistView);
        }
        Message::ZoomCanvas {
            new_zoom,
            viewport_x,
            viewport_y,
        } => {
            state.zoom_level = *new_zoom;
            state.clamp_zoom();
            state.viewport_x = *viewport_x;
            state.viewport_y = *viewport_y;
            state.mark_dirty();
            commands.push(Command::PersistView);
        }
        Message::StartConnectDrag { node_id, x, y } => {
            state.connect_drag = Some(ConnectDrag {
                source_id: node_id.clone(),
                cursor: Position { x: *x, y: *y },
            });
            state.mark_dirty();
        }
        Message::UpdateConnectDrag { x, y } => {
            if let Some(drag) = &mut state.connect_drag {
                drag.cursor = Position { x: *x, y: *y };
                state.mark_dirty();
            }
        }
        Message::FinishConnectDrag { x, y } => {
            if let Some(drag) = state.connect_drag.take() {
                let target = state
                    .find_node_at(*x, *y)
                    .map(|n| n.id.clone())
                    .filter(|id| id != &drag.source_id);
                if let Some(target) = target {
                    commands.push(Command::send(Message::ConnectNodes {
                        source: drag.source_id,
                        source_handle: None,
                        target,
                        target_handle: None,
                    }));
                }
                state.mark_dirty();
            }
        }
        Message::CancelConnectDrag => {
            state.connect_drag = None;
            state.mark_dirty();
        }
        Message::ToggleInspect { node_id } => {
            if state.monitor_mode {
                state.toggle_inspect(node_id);
            }
        }

        // ------------------------------------------------------------------
        // Workflow lifecycle
        // ------------------------------------------------------------------
        Message::GenerateWorkflow { prompt } => {
            let prompt = prompt.trim();
            if prompt.is_empty() || state.pending.generating {
                return;
            }
            state.pending.generating = true;
            commands.push(Command::GenerateDraft {
                prompt: prompt.to_string(),
            });
            commands.push(Command::RefreshSidebar);
        }
        Message::DraftReady { workflow_id } => {
            // Still in flight: the blueprint row read completes the draft.
            commands.push(Command::FetchBlueprint {
                workflow_id: workflow_id.clone(),
            });
        }
        Message::BlueprintLoaded { nodes, edges } => {
            state.pending.generating = false;
            let laid_out = apply_auto_layout(nodes.clone(), edges, &LayoutConfig::default());
            state.set_graph(laid_out, edges.clone());
            toast::success("Workflow generated successfully!");
            commands.push(Command::RefreshSidebar);
            commands.push(Command::RefreshConfigPanel);
        }
        Message::DraftFailed { error } => {
            state.pending.generating = false;
            toast::error("Failed to generate workflow. Please try again.");
            crate::warn_log!("Workflow draft failed: {error}");
            commands.push(Command::RefreshSidebar);
        }
        Message::SaveWorkflow { name } => {
            let name = name.trim();
            if name.is_empty() {
                toast::error("Give the workflow a name first");
                return;
            }
            if state.pending.saving {
                return;
            }
            state.pending.saving = true;
            let blueprint = Blueprint::from_graph(name, &state.nodes, &state.edges);
            commands.push(Command::SaveWorkflow {
                name: name.to_string(),
                blueprint,
            });
            commands.push(Command::RefreshSidebar);
        }
        Message::WorkflowSaved { name } => {
            state.pending.saving = false;
            toast::success(&format!("Saved \"{name}\""));
            commands.push(Command::send(Message::LoadWorkflows));
            commands.push(Command::RefreshSidebar);
        }
        Message::SaveFailed { error } => {
            state.pending.saving = false;
            toast::error("Failed to save workflow");
            crate::warn_log!("Workflow save failed: {error}");
            commands.push(Command::RefreshSidebar);
        }
        Message::LoadWorkflows => {
            if state.pending.loading_workflows {
                return;
            }
            state.pending.loading_workflows = true;
            commands.push(Command::FetchWorkflows);
            commands.push(Command::RefreshSidebar);
        }
        Message::WorkflowsLoaded(workflows) => {
            state.pending.loading_workflows = false;
            state.workflows = workflows.clone();
            commands.push(Command::RefreshSidebar);
        }
        Message::LoadWorkflowsFailed { error } => {
            state.pending.loading_workflows = false;
            toast::error("Failed to load saved workflows");
            crate::warn_log!("Workflow list failed: {error}");
            commands.push(Command::RefreshSidebar);
        }
        Message::OpenWorkflow { workflow_id } => {
            let Some(workflow) = state.workflows.iter().find(|w| &w.id == workflow_id) else {
                toast::error("Workflow not found");
                return;
            };
            let nodes = workflow.nodes.clone();
            let edges = workflow.edges.clone();
            // Saved blueprints may come back without coordinates; lay them
            // out rather than stacking everything at the origin.
            let needs_layout = nodes.iter().all(|n| n.position == Position::default());
            let nodes = if needs_layout {
                apply_auto_layout(nodes, &edges, &LayoutConfig::default())
            } else {
                nodes
            };
            if state.monitor_mode {
                state.set_monitor_mode(false);
            }
            state.set_graph(nodes, edges);
            commands.push(Command::RefreshSidebar);
            commands.push(Command::RefreshConfigPanel);
        }
        Message::DeleteWorkflow { workflow_id } => {
            if !state.pending.deleting.insert(workflow_id.clone()) {
                return;
            }
            commands.push(Command::DeleteWorkflow {
                workflow_id: workflow_id.clone(),
            });
            commands.push(Command::RefreshSidebar);
        }
        Message::WorkflowDeleted { workflow_id } => {
            state.pending.deleting.remove(workflow_id);
            state.workflows.retain(|w| &w.id != workflow_id);
            toast::success("Workflow deleted");
            commands.push(Command::RefreshSidebar);
        }
        Message::DeleteWorkflowFailed { workflow_id, error } => {
            state.pending.deleting.remove(workflow_id);
            toast::error("Failed to delete workflow");
            crate::warn_log!("Workflow delete failed: {error}");
            commands.push(Command::RefreshSidebar);
        }

        // ------------------------------------------------------------------
        // Live monitoring
        // ------------------------------------------------------------------
        Message::SetMonitorMode(enabled) => {
            state.set_monitor_mode(*enabled);
            commands.push(Command::RefreshSidebar);
            commands.push(Command::RefreshConfigPanel);
        }
        Message::ExecuteWorkflow => {
            if state.nodes.is_empty() {
                toast::error("Canvas is empty - nothing to execute");
                return;
            }
            if state.pending.executing {
                return;
            }
            state.pending.executing = true;
            let blueprint =
                Blueprint::from_graph(DEFAULT_WORKFLOW_NAME, &state.nodes, &state.edges);
            commands.push(Command::ExecuteWorkflow { blueprint });
            commands.push(Command::RefreshSidebar);
        }
        Message::RunStarted { run_id } => {
            state.pending.executing = false;
            commands.push(Command::StartRunMonitor {
                run_id: run_id.clone(),
            });
            commands.push(Command::RefreshSidebar);
        }
        Message::ExecuteFailed { error } => {
            state.pending.executing = false;
            toast::error("Failed to execute workflow");
            crate::warn_log!("Workflow execute failed: {error}");
            commands.push(Command::RefreshSidebar);
        }
        Message::ClearRunState => {
            state.clear_run_state();
        }

        // ------------------------------------------------------------------
        // Omni inbox
        // ------------------------------------------------------------------
        Message::LoadInboxSessions => {
            commands.push(Command::FetchInboxSessions);
        }
        Message::InboxSessionsLoaded(sessions) => {
            state.inbox_sessions = sessions.clone();
            commands.push(Command::RefreshInbox);
        }
        Message::InboxLoadFailed { error } => {
            toast::error("Failed to load inbox");
            crate::warn_log!("Inbox load failed: {error}");
            commands.push(Command::RefreshInbox);
        }
        Message::SelectInboxSession { session_id } => {
            state.selected_session_id = Some(session_id.clone());
            state.inbox_messages.clear();
            commands.push(Command::FetchInboxMessages {
                session_id: session_id.clone(),
            });
            commands.push(Command::WatchInboxSession {
                session_id: session_id.clone(),
            });
            commands.push(Command::RefreshInbox);
        }
        Message::InboxMessagesLoaded {
            session_id,
            messages,
        } => {
            if state.selected_session_id.as_deref() == Some(session_id.as_str()) {
                state.inbox_messages = messages.clone();
                commands.push(Command::RefreshInbox);
            }
        }
        Message::InboxMessageArrived { session_id } => {
            if state.selected_session_id.as_deref() == Some(session_id.as_str()) {
                commands.push(Command::FetchInboxMessages {
                    session_id: session_id.clone(),
                });
            }
        }

        // ------------------------------------------------------------------
        // Invoice cards / report exports
        // ------------------------------------------------------------------
        Message::ConfirmInvoice { invoice_id } => {
            if !state.pending.invoice_actions.insert(invoice_id.clone()) {
                return;
            }
            commands.push(Command::ConfirmInvoice {
                invoice_id: invoice_id.clone(),
            });
            commands.push(Command::RefreshInbox);
        }
        Message::InvoiceConfirmed { invoice_id } => {
            state.pending.invoice_actions.remove(invoice_id);
            toast::success("Invoice confirmed");
            commands.push(Command::RefreshInbox);
        }
        Message::DeleteInvoice { invoice_id } => {
            if !state.pending.invoice_actions.insert(invoice_id.clone()) {
                return;
            }
            commands.push(Command::DeleteInvoice {
                invoice_id: invoice_id.clone(),
            });
            commands.push(Command::RefreshInbox);
        }
        Message::InvoiceDeleted { invoice_id } => {
            state.pending.invoice_actions.remove(invoice_id);
            toast::success("Invoice deleted");
            commands.push(Command::RefreshInbox);
        }
        Message::InvoiceActionFailed { invoice_id, error } => {
            state.pending.invoice_actions.remove(invoice_id);
            toast::error("Invoice update failed");
            crate::warn_log!("Invoice action failed: {error}");
            commands.push(Command::RefreshInbox);
        }
        Message::DownloadExport { kind } => {
            if !state.pending.downloading.insert(kind.key()) {
                return;
            }
            commands.push(Command::DownloadExport { kind: kind.clone() });
            commands.push(Command::RefreshInbox);
        }
        Message::ExportFinished { kind, error } => {
            state.pending.downloading.remove(&kind.key());
            match error {
                Some(error) => {
                    toast::error("Download failed");
                    crate::warn_log!("Export failed: {error}");
                }
                None => toast::success(&format!("Downloaded {}", kind.filename())),
            }
            commands.push(Command::RefreshInbox);
        }
    }
}
