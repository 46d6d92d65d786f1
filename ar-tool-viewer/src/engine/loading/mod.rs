//! Model asset loading for the selected tool.
//!
//! Tracks the per-token load state and adapts Bevy's asset server to the
//! request/outcome events the rest of the viewer consumes.

/// Per-token load state machine and outcome application.
pub mod model_load;

/// Asset server adapter issuing glTF scene loads and polling their state.
///
/// Not installed in headless runs, where outcomes are produced directly.
pub mod asset_requests;
