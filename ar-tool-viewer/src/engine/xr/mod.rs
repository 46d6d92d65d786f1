//! XR capability detection and AR session lifecycle.
//!
//! The XR runtime is reached only through [`platform::SessionPlatform`]. Its
//! asynchronous answers are queued in a [`platform::PlatformInbox`] and
//! drained once per frame, after selection changes have been applied, so a
//! late acknowledgement can always be checked against the live token.
//!
//! ```text
//! Idle --enter()--> Entering --SessionStarted--> Active --exit()--> Exiting --SessionEnded--> Idle
//!                                                  └──── SessionEnded (platform) ────> Idle
//! ```

use std::fmt;

use constants::session::{DOM_OVERLAY_FEATURE, IMMERSIVE_AR, IMMERSIVE_VR};
use serde::{Deserialize, Serialize};

/// Tri-state platform capability for the configured session mode.
pub mod capability;

/// Runtime abstraction, signal queue and the platform resource.
pub mod platform;

/// Single-session lifecycle manager and its request handling systems.
pub mod session;

/// In-process XR runtime used on native builds and in tests.
pub mod simulated;

/// WebXR runtime backed by `navigator.xr`.
#[cfg(target_arch = "wasm32")]
pub mod web_xr;

/// WebXR session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionMode {
    #[serde(rename = "immersive-ar")]
    ImmersiveAr,
    #[serde(rename = "immersive-vr")]
    ImmersiveVr,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImmersiveAr => IMMERSIVE_AR,
            Self::ImmersiveVr => IMMERSIVE_VR,
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            IMMERSIVE_AR => Some(Self::ImmersiveAr),
            IMMERSIVE_VR => Some(Self::ImmersiveVr),
            _ => None,
        }
    }

    /// Optional features asked for when requesting a session.
    ///
    /// AR sessions want a DOM overlay so the viewer's exit control and status
    /// hint stay on screen over the passthrough view.
    pub fn optional_features(self) -> &'static [&'static str] {
        match self {
            Self::ImmersiveAr => &[DOM_OVERLAY_FEATURE],
            Self::ImmersiveVr => &[],
        }
    }

    /// Whether the session should be given a DOM overlay root.
    pub fn wants_dom_overlay(self) -> bool {
        self.optional_features().contains(&DOM_OVERLAY_FEATURE)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ar_sessions_request_a_dom_overlay() {
        assert_eq!(SessionMode::ImmersiveAr.optional_features(), &["dom-overlay"]);
        assert!(SessionMode::ImmersiveAr.wants_dom_overlay());
        assert!(SessionMode::ImmersiveVr.optional_features().is_empty());
        assert!(!SessionMode::ImmersiveVr.wants_dom_overlay());
    }

    #[test]
    fn mode_strings_round_trip() {
        for mode in [SessionMode::ImmersiveAr, SessionMode::ImmersiveVr] {
            assert_eq!(SessionMode::from_string(mode.as_str()), Some(mode));
        }
        assert_eq!(SessionMode::from_string("inline"), None);
    }
}
