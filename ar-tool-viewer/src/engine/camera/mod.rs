//! Orbit camera controls for the viewer stage.
//!
//! Each viewer instance spawns its own camera, so orbit state resets whenever
//! the remount token changes.

/// Orbit camera component, input handling and transform update.
pub mod orbit_camera;
