use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

mod canvas;
mod components;
mod constants;
mod layout;
mod macros;
mod messages;
mod models;
mod monitor;
mod network;
mod scheduling;
mod state;
mod storage;
mod toast;
mod update;
mod views;

#[cfg(test)]
mod tests;

use messages::Message;
use network::realtime::ChannelRouter;
use network::{IRealtimeClient, RealtimeClient};
use state::{dispatch, AppContext};
use storage::ActiveView;

// Main entry point for the WASM application
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Initialize better panic messages
    console_error_panic_hook::set_once();

    let window = web_sys::window().expect("no global `window` exists");
    let document = window.document().expect("should have a document on window");

    // One realtime transport + one store per editor session, wired
    // together explicitly - nothing global.
    let transport: Rc<RefCell<dyn IRealtimeClient>> =
        Rc::new(RefCell::new(RealtimeClient::new_default()));
    let ctx = AppContext::new(transport.clone());

    {
        let router = ctx.router.clone();
        transport
            .borrow_mut()
            .set_on_message(Box::new(move |frame| {
                ChannelRouter::route_incoming(&router, frame);
            }));
    }
    {
        let router = ctx.router.clone();
        transport.borrow_mut().set_on_open(Box::new(move || {
            router.borrow().resubscribe_all();
        }));
    }
    if let Err(e) = transport.borrow_mut().connect() {
        // The builder still works without live updates; runs just won't
        // animate until the feed reconnects.
        warn_log!("Realtime feed unavailable: {:?}", e);
    }

    storage::load_view(&mut ctx.store.borrow_mut());

    views::setup_page(&ctx, &document)?;
    components::workflow_canvas::setup(&ctx, &document)?;
    components::sidebar::refresh(&ctx);
    components::inbox::refresh(&ctx);
    views::render_active_view(&ctx);

    dispatch(&ctx, Message::LoadWorkflows);
    let show_inbox = ctx.store.borrow().active_view == ActiveView::Inbox;
    if show_inbox {
        dispatch(&ctx, Message::LoadInboxSessions);
    }

    Ok(())
}
