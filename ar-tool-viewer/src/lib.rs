//! Tool viewer with optional AR session support.
//!
//! A catalog of tools is shown one at a time. Each selection issues a new
//! remount token; everything asynchronous (model loads, XR capability checks,
//! session acknowledgements) is tagged with the token or check it was issued
//! under and discarded once superseded.

pub mod catalog;
pub mod controls;
pub mod engine;
pub mod errors;
pub mod rpc;

pub use engine::core::app_setup::create_app;
pub use engine::core::plugin::{ToolViewerPlugin, ViewerSet};
