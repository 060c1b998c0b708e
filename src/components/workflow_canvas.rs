//! Canvas component: owns the `<canvas>` element, translates pointer
//! gestures into store messages and runs the redraw loop.
//!
//! Pan/zoom is handled here as a pure view-space transform (pointer-move
//! deltas divided by the current zoom); node positions only change through
//! the drag messages.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Document, HtmlCanvasElement, KeyboardEvent,
    MouseEvent, WheelEvent,
};

use crate::canvas::renderer;
use crate::constants::{MAX_ZOOM, MIN_ZOOM};
use crate::messages::Message;
use crate::models::{EdgeChange, NodeChange};
use crate::state::{dispatch, AppContext};

pub fn setup(ctx: &AppContext, document: &Document) -> Result<(), JsValue> {
    let canvas = document
        .get_element_by_id("workflow-canvas")
        .ok_or_else(|| JsValue::from_str("workflow-canvas element missing"))?
        .dyn_into::<HtmlCanvasElement>()?;

    resize_canvas(ctx, &canvas)?;

    let context = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    setup_mouse_events(ctx, &canvas)?;
    setup_keyboard_events(ctx, document)?;
    setup_resize_handler(ctx, &canvas)?;
    setup_draw_loop(ctx.clone(), canvas, context);

    Ok(())
}

/// Converts pointer offsets to world coordinates under the current
/// viewport transform.
fn to_world(ctx: &AppContext, x: f64, y: f64) -> (f64, f64) {
    let store = ctx.store.borrow();
    (
        x / store.zoom_level + store.viewport_x,
        y / store.zoom_level + store.viewport_y,
    )
}

fn resize_canvas(ctx: &AppContext, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let window = web_sys::window().expect("no global window exists");
    let document = window.document().expect("no document exists");

    if let Some(container) = document.get_element_by_id("canvas-container") {
        let width = container.client_width();
        let height = container.client_height();
        let dpr = window.device_pixel_ratio();

        canvas.set_width((width as f64 * dpr) as u32);
        canvas.set_height((height as f64 * dpr) as u32);
        canvas
            .style()
            .set_property("width", &format!("{}px", width))?;
        canvas
            .style()
            .set_property("height", &format!("{}px", height))?;

        let mut store = ctx.store.borrow_mut();
        store.canvas_width = width as f64;
        store.canvas_height = height as f64;
        store.mark_dirty();
    }
    Ok(())
}

fn setup_resize_handler(ctx: &AppContext, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let ctx = ctx.clone();
    let canvas = canvas.clone();
    let callback = Closure::wrap(Box::new(move || {
        let _ = resize_canvas(&ctx, &canvas);
    }) as Box<dyn FnMut()>);

    web_sys::window()
        .expect("no global window exists")
        .add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

fn setup_mouse_events(ctx: &AppContext, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    // Mouse down: port grab beats node grab beats background pan.
    {
        let ctx = ctx.clone();
        let handler = Closure::wrap(Box::new(move |event: MouseEvent| {
            if event.button() != 0 {
                return;
            }
            let (sx, sy) = (event.offset_x() as f64, event.offset_y() as f64);
            let (wx, wy) = to_world(&ctx, sx, sy);

            let monitor_mode = ctx.store.borrow().monitor_mode;
            if monitor_mode {
                let hit = ctx.store.borrow().find_node_at(wx, wy).map(|n| n.id.clone());
                match hit {
                    Some(node_id) => dispatch(&ctx, Message::ToggleInspect { node_id }),
                    None => dispatch(&ctx, Message::StartCanvasPan { x: sx, y: sy }),
                }
                return;
            }

            let port = ctx
                .store
                .borrow()
                .source_port_at(wx, wy)
                .map(|n| n.id.clone());
            if let Some(node_id) = port {
                dispatch(&ctx, Message::StartConnectDrag { node_id, x: wx, y: wy });
                return;
            }

            let hit = ctx
                .store
                .borrow()
                .find_node_at(wx, wy)
                .map(|n| (n.id.clone(), wx - n.position.x, wy - n.position.y));
            match hit {
                Some((node_id, offset_x, offset_y)) => {
                    dispatch(&ctx, Message::SelectNode(Some(node_id.clone())));
                    dispatch(
                        &ctx,
                        Message::StartNodeDrag {
                            node_id,
                            offset_x,
                            offset_y,
                        },
                    );
                }
                None => {
                    // Background click clears the selection (and closes the
                    // inspector) before panning starts.
                    dispatch(&ctx, Message::SelectNode(None));
                    dispatch(&ctx, Message::StartCanvasPan { x: sx, y: sy });
                }
            }
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mousedown", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    // Mouse move: route by the active gesture.
    {
        let ctx = ctx.clone();
        let handler = Closure::wrap(Box::new(move |event: MouseEvent| {
            let (sx, sy) = (event.offset_x() as f64, event.offset_y() as f64);
            let (wx, wy) = to_world(&ctx, sx, sy);

            let (connecting, dragging, panning) = {
                let store = ctx.store.borrow();
                (
                    store.connect_drag.is_some(),
                    store.dragging.is_some(),
                    store.canvas_panning,
                )
            };

            if connecting {
                dispatch(&ctx, Message::UpdateConnectDrag { x: wx, y: wy });
            } else if dragging {
                dispatch(&ctx, Message::UpdateNodeDrag { x: wx, y: wy });
            } else if panning {
                dispatch(&ctx, Message::UpdateCanvasPan { x: sx, y: sy });
            }
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mousemove", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    // Mouse up ends whichever gesture is live.
    {
        let ctx = ctx.clone();
        let handler = Closure::wrap(Box::new(move |event: MouseEvent| {
            let (wx, wy) = to_world(&ctx, event.offset_x() as f64, event.offset_y() as f64);

            let (connecting, dragging, panning) = {
                let store = ctx.store.borrow();
                (
                    store.connect_drag.is_some(),
                    store.dragging.is_some(),
                    store.canvas_panning,
                )
            };

            if connecting {
                dispatch(&ctx, Message::FinishConnectDrag { x: wx, y: wy });
            }
            if dragging {
                dispatch(&ctx, Message::StopNodeDrag);
            }
            if panning {
                dispatch(&ctx, Message::StopCanvasPan);
            }
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("mouseup", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    // Wheel zoom about the cursor.
    {
        let ctx = ctx.clone();
        let handler = Closure::wrap(Box::new(move |event: WheelEvent| {
            let (sx, sy) = (event.offset_x() as f64, event.offset_y() as f64);
            let (wx, wy) = to_world(&ctx, sx, sy);

            let zoom = ctx.store.borrow().zoom_level;
            let factor = if event.delta_y() > 0.0 { 0.9 } else { 1.1 };
            let new_zoom = (zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

            dispatch(
                &ctx,
                Message::ZoomCanvas {
                    new_zoom,
                    viewport_x: wx - sx / new_zoom,
                    viewport_y: wy - sy / new_zoom,
                },
            );
        }) as Box<dyn FnMut(_)>);
        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        canvas.add_event_listener_with_callback_and_add_event_listener_options(
            "wheel",
            handler.as_ref().unchecked_ref(),
            &options,
        )?;
        handler.forget();
    }

    Ok(())
}

fn setup_keyboard_events(ctx: &AppContext, document: &Document) -> Result<(), JsValue> {
    let ctx = ctx.clone();
    let handler = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        if event.key() != "Delete" && event.key() != "Backspace" {
            return;
        }
        // Ignore while typing in a form field.
        if let Some(target) = event.target() {
            if let Some(el) = target.dyn_ref::<web_sys::Element>() {
                let tag = el.tag_name();
                if tag == "INPUT" || tag == "TEXTAREA" || tag == "SELECT" {
                    return;
                }
            }
        }

        let (selected, incident_edges) = {
            let store = ctx.store.borrow();
            if store.monitor_mode {
                return;
            }
            let Some(id) = store.selected_node_id.clone() else {
                return;
            };
            let edges: Vec<String> = store
                .edges
                .iter()
                .filter(|e| e.source == id || e.target == id)
                .map(|e| e.id.clone())
                .collect();
            (id, edges)
        };

        dispatch(
            &ctx,
            Message::EdgesChanged(
                incident_edges
                    .into_iter()
                    .map(|id| EdgeChange::Remove { id })
                    .collect(),
            ),
        );
        dispatch(
            &ctx,
            Message::NodesChanged(vec![NodeChange::Remove { id: selected }]),
        );
    }) as Box<dyn FnMut(_)>);
    document.add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())?;
    handler.forget();
    Ok(())
}

/// requestAnimationFrame loop: redraws when the store is dirty, and every
/// frame in monitor mode so the running-pulse animates.
fn setup_draw_loop(ctx: AppContext, canvas: HtmlCanvasElement, context: CanvasRenderingContext2d) {
    type LoopClosure = Closure<dyn FnMut()>;
    let f: Rc<RefCell<Option<LoopClosure>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    let window = web_sys::window().expect("no global window exists");
    let window_for_start = window.clone();

    *g.borrow_mut() = Some(Closure::new(move || {
        let should_draw = {
            let mut store = ctx.store.borrow_mut();
            store.take_dirty() || store.monitor_mode
        };
        if should_draw {
            let store = ctx.store.borrow();
            renderer::draw(&store, &canvas, &context);
        }
        let _ = window.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }));

    let _ = window_for_start
        .request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
}
