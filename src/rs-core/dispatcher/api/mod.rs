use crate::{
    bindings::JsEnvironment,
    scheduler::{ConfigurationError, SchedulerConfiguration, StreamController, TextTrackHooks},
    utils::logger::LoggerLevel,
    wasm_bindgen, Logger,
};

use super::TextStreamDispatcher;

/// Methods exposed to the JavaScript-side.
///
/// Note that these are not the only methods callable by JavaScript. There's
/// also "event_listeners" which, as its name points at, should be called when particular
/// events happen.
#[wasm_bindgen]
impl TextStreamDispatcher {
    /// Create a new `TextStreamDispatcher` with the default configuration.
    ///
    /// Nothing is loaded until a media element is attached and a track with details is
    /// chosen.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        TextStreamDispatcher {
            controller: StreamController::new(TextTrackHooks, SchedulerConfiguration::default()),
            env: JsEnvironment,
        }
    }

    /// Update the maximum level of the logs emitted, for every dispatcher.
    pub fn set_log_level(level: LoggerLevel) {
        Logger::set_logger_level(level);
    }

    /// Amount of buffer, ahead of the current position, we want to build in seconds.
    pub fn set_max_buffer_length(&mut self, value: f64) {
        report(self.controller.set_max_buffer_length(value));
    }

    /// Absolute maximum of the buffer length we want to build, in seconds.
    pub fn set_max_max_buffer_length(&mut self, value: f64) {
        report(self.controller.set_max_max_buffer_length(value));
    }

    pub fn set_max_buffer_hole(&mut self, value: f64) {
        report(self.controller.set_max_buffer_hole(value));
    }

    pub fn set_max_fragment_lookup_tolerance(&mut self, value: f64) {
        report(self.controller.set_max_fragment_lookup_tolerance(value));
    }

    /// Interval, in milliseconds, between two regular checks for fragments to load.
    pub fn set_tick_interval(&mut self, value: f64) {
        report(self.controller.set_tick_interval(&mut self.env, value));
    }

    /// Timeout, in milliseconds, of fragment requests. `undefined` to disable it.
    pub fn set_fragment_request_timeout(&mut self, value: Option<f64>) {
        report(self.controller.set_fragment_request_timeout(value));
    }
}

impl Default for TextStreamDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn report(result: Result<(), ConfigurationError>) {
    if let Err(err) = result {
        Logger::warn(&format!("Dispatcher: Invalid configuration ignored: {err}"));
    }
}
