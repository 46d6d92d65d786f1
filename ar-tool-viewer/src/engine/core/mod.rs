//! Core application setup and viewer state plumbing.
//!
//! Handles plugin wiring, window configuration and the published view of the
//! viewer's state for both native and WASM targets.

/// Application setup: default plugins, logging and the XR runtime choice.
pub mod app_setup;

/// Runtime configuration resource.
pub mod config;

/// The viewer plugin and its frame phases.
pub mod plugin;

/// State snapshots and change events for observers.
pub mod viewer_state;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
