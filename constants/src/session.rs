/// WebXR mode string for passthrough AR.
pub const IMMERSIVE_AR: &str = "immersive-ar";
/// WebXR mode string for headset VR.
pub const IMMERSIVE_VR: &str = "immersive-vr";

/// Optional WebXR feature that keeps page content visible during an AR session.
pub const DOM_OVERLAY_FEATURE: &str = "dom-overlay";

/// Environment switch enabling the simulated XR runtime on native builds.
pub const SIMULATE_XR_ENV: &str = "AR_TOOL_VIEWER_SIMULATE_XR";

/// Default log filter for the viewer binary.
pub const LOG_FILTER: &str = "info,wgpu=error,naga=warn,ar_tool_viewer=debug";
