mod environment;
mod js_functions;
#[cfg(test)]
mod mock;

pub(crate) use environment::{Environment, JsEnvironment};
pub use js_functions::*;
#[cfg(test)]
pub(crate) use mock::MockEnvironment;
