//! Viewport composition per viewer generation.
//!
//! The composer reduces the selection, load state and session snapshot to a
//! [`composer::SceneDescription`]; the instance systems turn that description
//! into entities, rebuilding the whole viewer when the remount token changes.

/// Pure scene description from selection, load state and session.
pub mod composer;

/// Viewer instance lifecycle keyed by remount token.
pub mod viewer_instance;

/// Screen-space AR overlay with the exit control.
pub mod overlay;

/// Fixed lighting rig spawned into each viewer instance.
pub mod lighting;

/// Scales and centres a spawned model from its mesh bounds.
pub mod model_fit;
