use wasm_bindgen::prelude::*;

mod bindings;
mod buffer_tracker;
mod decrypter;
pub mod dispatcher;
mod fragment_selector;
mod requester;
mod scheduler;
mod track;
mod utils;

pub use utils::logger::{Logger, LoggerLevel};
