//! Paints the store's current graph onto the 2D canvas.
//!
//! Rendering is a pure projection of the store snapshot: pan/zoom is a
//! context transform layered over logical positions, and the monitor-mode
//! accent for a node is a pure function of its `NodeRunState`.

use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::shapes;
use crate::constants::*;
use crate::models::{NodeRunState, RunStatus, ServiceConfig, WorkflowNode};
use crate::state::WorkflowStore;

/// Visual accents derived from a node's run state. `pulse` asks the draw
/// loop to animate the border alpha while the step is executing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusStyle {
    pub border: &'static str,
    pub fill: &'static str,
    pub label: &'static str,
    pub pulse: bool,
}

/// Pure mapping from run state to accents: absent entries render as
/// pending, `running` pulses, terminal states keep their accent.
pub fn status_style(state: Option<&NodeRunState>) -> StatusStyle {
    match state.map(|s| s.status).unwrap_or(RunStatus::Pending) {
        RunStatus::Pending => StatusStyle {
            border: STATUS_PENDING_BORDER,
            fill: STATUS_PENDING_FILL,
            label: "Pending",
            pulse: false,
        },
        RunStatus::Running => StatusStyle {
            border: STATUS_RUNNING_BORDER,
            fill: STATUS_RUNNING_FILL,
            label: "Running",
            pulse: true,
        },
        RunStatus::Completed => StatusStyle {
            border: STATUS_COMPLETED_BORDER,
            fill: STATUS_COMPLETED_FILL,
            label: "Done",
            pulse: false,
        },
        RunStatus::Failed => StatusStyle {
            border: STATUS_FAILED_BORDER,
            fill: STATUS_FAILED_FILL,
            label: "Failed",
            pulse: false,
        },
    }
}

pub fn service_color(service: &str) -> &'static str {
    match service {
        ServiceConfig::WHATSAPP => SERVICE_WHATSAPP_COLOR,
        ServiceConfig::RAZORPAY => SERVICE_RAZORPAY_COLOR,
        ServiceConfig::GOOGLE_SHEETS => SERVICE_SHEETS_COLOR,
        _ => SERVICE_GENERIC_COLOR,
    }
}

pub fn draw(store: &WorkflowStore, canvas: &HtmlCanvasElement, context: &CanvasRenderingContext2d) {
    // Background at raw pixel resolution.
    context.save();
    let _ = context.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    context.set_fill_style_str(CANVAS_BACKGROUND_COLOR);
    context.fill_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
    context.restore();

    let window = web_sys::window().expect("no global window exists");
    let dpr = window.device_pixel_ratio();

    context.save();
    let _ = context.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    let _ = context.scale(dpr, dpr);
    let _ = context.scale(store.zoom_level, store.zoom_level);
    let _ = context.translate(-store.viewport_x, -store.viewport_y);

    draw_grid(store, context);
    draw_edges(store, context);
    draw_connect_ghost(store, context);
    for node in &store.nodes {
        draw_node(store, context, node);
    }

    context.restore();
}

fn draw_grid(store: &WorkflowStore, context: &CanvasRenderingContext2d) {
    let view_w = store.canvas_width / store.zoom_level;
    let view_h = store.canvas_height / store.zoom_level;
    let start_x = (store.viewport_x / CANVAS_GRID_GAP).floor() * CANVAS_GRID_GAP;
    let start_y = (store.viewport_y / CANVAS_GRID_GAP).floor() * CANVAS_GRID_GAP;

    context.set_fill_style_str(CANVAS_GRID_COLOR);
    let mut x = start_x;
    while x < store.viewport_x + view_w + CANVAS_GRID_GAP {
        let mut y = start_y;
        while y < store.viewport_y + view_h + CANVAS_GRID_GAP {
            context.fill_rect(x, y, 1.0, 1.0);
            y += CANVAS_GRID_GAP;
        }
        x += CANVAS_GRID_GAP;
    }
}

fn draw_edges(store: &WorkflowStore, context: &CanvasRenderingContext2d) {
    for edge in &store.edges {
        // Dangling endpoints are tolerated: the edge is simply not drawn
        // this frame.
        let source = store.nodes.iter().find(|n| n.id == edge.source);
        let target = store.nodes.iter().find(|n| n.id == edge.target);
        let (Some(source), Some(target)) = (source, target) else {
            continue;
        };

        let (sx, sy) = shapes::anchor_point(source, edge.source_handle.as_deref(), true);
        let (tx, ty) = shapes::anchor_point(target, edge.target_handle.as_deref(), false);
        shapes::draw_edge_path(context, sx, sy, tx, ty, EDGE_STROKE_COLOR, 2.0);
        if let Some(label) = &edge.label {
            shapes::draw_edge_label(context, sx, sy, tx, ty, label, EDGE_LABEL_COLOR);
        }
    }
}

fn draw_connect_ghost(store: &WorkflowStore, context: &CanvasRenderingContext2d) {
    let Some(drag) = &store.connect_drag else {
        return;
    };
    let Some(source) = store.nodes.iter().find(|n| n.id == drag.source_id) else {
        return;
    };
    let (sx, sy) = shapes::anchor_point(source, None, true);
    shapes::draw_edge_path(
        context,
        sx,
        sy,
        drag.cursor.x,
        drag.cursor.y,
        NODE_BORDER_SELECTED,
        1.5,
    );
}

fn draw_node(store: &WorkflowStore, context: &CanvasRenderingContext2d, node: &WorkflowNode) {
    let x = node.position.x;
    let y = node.position.y;

    // The node's own kind tag decides its card variant; the store keeps
    // the tags in sync with the active mode.
    let (border, fill, pulse) = if node.is_monitor() {
        let style = status_style(store.node_states.get(&node.id));
        (style.border, style.fill, style.pulse)
    } else {
        (service_color(&node.data.service), STATUS_PENDING_FILL, false)
    };

    context.save();

    // Card body.
    context.set_shadow_color("rgba(0, 0, 0, 0.35)");
    context.set_shadow_blur(12.0);
    context.set_shadow_offset_y(4.0);
    shapes::rounded_rect_path(context, x, y, NODE_WIDTH, NODE_HEIGHT, 12.0);
    context.set_fill_style_str(fill);
    context.fill();
    context.set_shadow_blur(0.0);
    context.set_shadow_offset_y(0.0);

    // Border; running steps pulse, the selected node gets a ring.
    if pulse {
        let phase = (js_sys::Date::now() / 300.0).sin() * 0.3 + 0.7;
        context.set_global_alpha(phase);
    }
    shapes::rounded_rect_path(context, x, y, NODE_WIDTH, NODE_HEIGHT, 12.0);
    context.set_stroke_style_str(border);
    context.set_line_width(2.0);
    context.stroke();
    context.set_global_alpha(1.0);

    if node.selected && !store.monitor_mode {
        shapes::rounded_rect_path(
            context,
            x - 3.0,
            y - 3.0,
            NODE_WIDTH + 6.0,
            NODE_HEIGHT + 6.0,
            14.0,
        );
        context.set_stroke_style_str(NODE_BORDER_SELECTED);
        context.set_line_width(2.0);
        context.stroke();
    }

    // Header: service/label plus, in monitor mode, the status text.
    context.set_font("600 13px system-ui, -apple-system, sans-serif");
    context.set_text_align("left");
    context.set_text_baseline("top");
    context.set_fill_style_str(NODE_TEXT_PRIMARY);
    let _ = context.fill_text(node.data.title(), x + 14.0, y + 12.0);

    if node.is_monitor() {
        let style = status_style(store.node_states.get(&node.id));
        context.set_font("500 11px system-ui, -apple-system, sans-serif");
        context.set_text_align("right");
        context.set_fill_style_str(style.border);
        let _ = context.fill_text(style.label, x + NODE_WIDTH - 12.0, y + 13.0);
        context.set_text_align("left");
    }

    // Body: task / description.
    context.set_font("11px system-ui, -apple-system, sans-serif");
    context.set_fill_style_str(NODE_TEXT_SECONDARY);
    shapes::draw_wrapped_text(
        context,
        node.data.subtitle(),
        x + 14.0,
        y + 40.0,
        NODE_WIDTH - 28.0,
        14.0,
        3,
    );

    // Ports.
    shapes::draw_port(context, x, y + NODE_HEIGHT / 2.0, CANVAS_BACKGROUND_COLOR);
    shapes::draw_port(
        context,
        x + NODE_WIDTH,
        y + NODE_HEIGHT / 2.0,
        CANVAS_BACKGROUND_COLOR,
    );

    // Expanded inspect tray (monitor mode, after a click).
    if store.monitor_mode && store.expanded_results.contains(&node.id) {
        if let Some(state) = store.node_states.get(&node.id) {
            draw_inspect_tray(context, node, state);
        }
    }

    context.restore();
}

fn draw_inspect_tray(
    context: &CanvasRenderingContext2d,
    node: &WorkflowNode,
    state: &NodeRunState,
) {
    let x = node.position.x;
    let y = node.position.y + NODE_HEIGHT + 8.0;
    let height = 72.0;

    shapes::rounded_rect_path(context, x, y, NODE_WIDTH, height, 8.0);
    context.set_fill_style_str("rgba(2, 6, 23, 0.92)");
    context.fill();
    shapes::rounded_rect_path(context, x, y, NODE_WIDTH, height, 8.0);
    context.set_stroke_style_str(if state.error.is_some() {
        STATUS_FAILED_BORDER
    } else {
        STATUS_PENDING_BORDER
    });
    context.set_line_width(1.0);
    context.stroke();

    let text = if let Some(error) = &state.error {
        error.clone()
    } else if let Some(data) = &state.data {
        serde_json::to_string(data).unwrap_or_else(|_| "<unprintable>".to_string())
    } else {
        "No output recorded".to_string()
    };

    context.set_font("10px ui-monospace, monospace");
    context.set_fill_style_str(if state.error.is_some() {
        STATUS_FAILED_BORDER
    } else {
        NODE_TEXT_SECONDARY
    });
    context.set_text_baseline("top");
    shapes::draw_wrapped_text(context, &text, x + 10.0, y + 10.0, NODE_WIDTH - 20.0, 13.0, 4);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: RunStatus) -> NodeRunState {
        NodeRunState {
            status,
            data: None,
            error: None,
        }
    }

    #[test]
    fn missing_entry_renders_as_pending() {
        let style = status_style(None);
        assert_eq!(style.label, "Pending");
        assert!(!style.pulse);
    }

    #[test]
    fn statuses_map_to_distinct_accents() {
        let pending = status_style(Some(&state(RunStatus::Pending)));
        let running = status_style(Some(&state(RunStatus::Running)));
        let completed = status_style(Some(&state(RunStatus::Completed)));
        let failed = status_style(Some(&state(RunStatus::Failed)));

        assert!(running.pulse);
        assert!(!completed.pulse && !failed.pulse);
        let borders = [pending.border, running.border, completed.border, failed.border];
        for (i, a) in borders.iter().enumerate() {
            for b in &borders[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn rendered_sequence_follows_run_lifecycle() {
        // pending (absent) -> running -> completed, never back to pending.
        let mut seen = Vec::new();
        seen.push(status_style(None).label);
        seen.push(status_style(Some(&state(RunStatus::Running))).label);
        seen.push(status_style(Some(&state(RunStatus::Completed))).label);
        assert_eq!(seen, vec!["Pending", "Running", "Done"]);
    }
}
