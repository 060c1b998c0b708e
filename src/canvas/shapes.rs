//! Low-level drawing primitives for the workflow canvas.

use web_sys::CanvasRenderingContext2d;

use crate::constants::{EDGE_STROKE_COLOR, NODE_HEIGHT, NODE_WIDTH, PORT_RADIUS};
use crate::models::WorkflowNode;

/// Traces a rounded rectangle path without filling or stroking it.
pub fn rounded_rect_path(
    context: &CanvasRenderingContext2d,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    radius: f64,
) {
    context.begin_path();
    context.move_to(x + radius, y);
    context.line_to(x + width - radius, y);
    context.quadratic_curve_to(x + width, y, x + width, y + radius);
    context.line_to(x + width, y + height - radius);
    context.quadratic_curve_to(x + width, y + height, x + width - radius, y + height);
    context.line_to(x + radius, y + height);
    context.quadratic_curve_to(x, y + height, x, y + height - radius);
    context.line_to(x, y + radius);
    context.quadratic_curve_to(x, y, x + radius, y);
    context.close_path();
}

/// World coordinates of a node's connection anchor for a handle tag.
/// Unknown or absent tags fall back to the left/right pair of a
/// left-to-right flow.
pub fn anchor_point(node: &WorkflowNode, handle: Option<&str>, is_source: bool) -> (f64, f64) {
    let x = node.position.x;
    let y = node.position.y;
    match handle {
        Some("top") => (x + NODE_WIDTH / 2.0, y),
        Some("bottom") => (x + NODE_WIDTH / 2.0, y + NODE_HEIGHT),
        Some("left") => (x, y + NODE_HEIGHT / 2.0),
        Some("right") => (x + NODE_WIDTH, y + NODE_HEIGHT / 2.0),
        _ if is_source => (x + NODE_WIDTH, y + NODE_HEIGHT / 2.0),
        _ => (x, y + NODE_HEIGHT / 2.0),
    }
}

/// Strokes a horizontal-flowing cubic Bezier between two anchors.
pub fn draw_edge_path(
    context: &CanvasRenderingContext2d,
    sx: f64,
    sy: f64,
    tx: f64,
    ty: f64,
    color: &str,
    width: f64,
) {
    let bend = ((tx - sx).abs() / 2.0).max(40.0);
    context.begin_path();
    context.move_to(sx, sy);
    context.bezier_curve_to(sx + bend, sy, tx - bend, ty, tx, ty);
    context.set_stroke_style_str(color);
    context.set_line_width(width);
    context.stroke();
}

pub fn draw_edge_label(context: &CanvasRenderingContext2d, sx: f64, sy: f64, tx: f64, ty: f64, label: &str, color: &str) {
    let mx = (sx + tx) / 2.0;
    let my = (sy + ty) / 2.0;
    context.save();
    context.set_font("11px system-ui, -apple-system, sans-serif");
    context.set_text_align("center");
    context.set_text_baseline("middle");
    context.set_fill_style_str(color);
    let _ = context.fill_text(label, mx, my - 8.0);
    context.restore();
}

pub fn draw_port(context: &CanvasRenderingContext2d, x: f64, y: f64, fill: &str) {
    context.begin_path();
    let _ = context.arc(x, y, PORT_RADIUS, 0.0, 2.0 * std::f64::consts::PI);
    context.set_fill_style_str(fill);
    context.fill();
    context.set_stroke_style_str(EDGE_STROKE_COLOR);
    context.set_line_width(1.5);
    context.stroke();
}

/// Word-wrapped text, clipped to `max_lines` with a trailing ellipsis.
pub fn draw_wrapped_text(
    context: &CanvasRenderingContext2d,
    text: &str,
    x: f64,
    y: f64,
    max_width: f64,
    line_height: f64,
    max_lines: usize,
) {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut current_line = String::new();
    let mut current_y = y;
    let mut lines_drawn = 0;

    for word in words {
        let test_line = if current_line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current_line, word)
        };

        let width = context
            .measure_text(&test_line)
            .map(|m| m.width())
            .unwrap_or(0.0);

        if width > max_width && !current_line.is_empty() {
            if lines_drawn + 1 == max_lines {
                let _ = context.fill_text(&format!("{}…", current_line), x, current_y);
                return;
            }
            let _ = context.fill_text(&current_line, x, current_y);
            current_line = word.to_string();
            current_y += line_height;
            lines_drawn += 1;
        } else {
            current_line = test_line;
        }
    }

    if !current_line.is_empty() {
        let _ = context.fill_text(&current_line, x, current_y);
    }
}
