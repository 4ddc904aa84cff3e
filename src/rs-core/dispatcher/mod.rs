use crate::{
    bindings::JsEnvironment,
    scheduler::{ControllerEvent, StreamController, TextTrackHooks},
    wasm_bindgen,
};

mod api;
mod event_listeners;

pub use event_listeners::JsTrackDetails;

/// The `TextStreamDispatcher` is the subtitle stream controller's interface exported to
/// the JavaScript-side.
///
/// The JavaScript-side owns the network, timers, the media element and decryption. It
/// forwards what happens to the corresponding event listeners, while the
/// `TextStreamDispatcher` decides which fragment should be loaded next.
#[wasm_bindgen]
pub struct TextStreamDispatcher {
    controller: StreamController<TextTrackHooks>,

    /// Access to the JavaScript functions the controller relies on.
    env: JsEnvironment,
}

impl TextStreamDispatcher {
    fn dispatch(&mut self, event: ControllerEvent) {
        self.controller.handle_event(&mut self.env, event);
    }
}
