use bevy::prelude::*;
use serde::Serialize;

use crate::engine::xr::SessionMode;
use crate::engine::xr::platform::{CheckId, PlatformSignal, XrPlatform};
use crate::errors::PlatformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArCapability {
    /// No answer yet from the runtime.
    #[default]
    Unknown,
    Supported,
    Unsupported,
}

#[derive(Resource, Debug)]
pub struct CapabilityMonitor {
    mode: SessionMode,
    capability: ArCapability,
    latest_check: CheckId,
    pending: bool,
}

impl Default for CapabilityMonitor {
    fn default() -> Self {
        Self::new(SessionMode::ImmersiveAr)
    }
}

impl CapabilityMonitor {
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            capability: ArCapability::Unknown,
            latest_check: CheckId::default(),
            pending: false,
        }
    }

    /// Start a new query. The capability reads `Unknown` until it resolves and
    /// answers to earlier queries are ignored from now on.
    pub fn begin_check(&mut self) -> CheckId {
        self.latest_check = CheckId(self.latest_check.0 + 1);
        self.pending = true;
        self.capability = ArCapability::Unknown;
        self.latest_check
    }

    /// Apply a runtime answer. Errors resolve to `Unsupported`.
    pub fn resolve(
        &mut self,
        check: CheckId,
        result: Result<bool, PlatformError>,
    ) -> Option<ArCapability> {
        if !self.pending || check != self.latest_check {
            return None;
        }
        self.pending = false;
        self.capability = match result {
            Ok(true) => ArCapability::Supported,
            Ok(false) => ArCapability::Unsupported,
            Err(err) => {
                warn!(mode = %self.mode, "Capability check failed, treating as unsupported: {err}");
                ArCapability::Unsupported
            }
        };
        Some(self.capability)
    }

    pub fn capability(&self) -> ArCapability {
        self.capability
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_checking(&self) -> bool {
        self.pending
    }
}

/// Re-query the runtime on demand.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct CapabilityCheckRequest;

pub fn start_capability_check(
    mut monitor: ResMut<CapabilityMonitor>,
    mut platform: NonSendMut<XrPlatform>,
) {
    issue_check(&mut monitor, &mut platform);
}

pub fn handle_capability_requests(
    mut requests: EventReader<CapabilityCheckRequest>,
    mut monitor: ResMut<CapabilityMonitor>,
    mut platform: NonSendMut<XrPlatform>,
) {
    if requests.read().count() == 0 {
        return;
    }
    issue_check(&mut monitor, &mut platform);
}

fn issue_check(monitor: &mut CapabilityMonitor, platform: &mut XrPlatform) {
    let check = monitor.begin_check();
    debug!(mode = %monitor.mode(), check = check.0, "Querying AR support");
    platform.as_dyn().query_support(monitor.mode(), check);
}

pub fn apply_capability_signals(
    mut signals: EventReader<PlatformSignal>,
    mut monitor: ResMut<CapabilityMonitor>,
) {
    for signal in signals.read() {
        if let PlatformSignal::SupportResolved { check, result } = signal {
            if monitor.resolve(*check, result.clone()).is_none() {
                debug!(check = check.0, "Ignoring superseded capability answer");
            }
        }
    }
}
