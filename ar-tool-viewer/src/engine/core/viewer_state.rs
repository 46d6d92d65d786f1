use bevy::prelude::*;
use serde::Serialize;

use crate::catalog::{ToolCatalog, ToolRecord};
use crate::controls::ControlsSnapshot;
use crate::engine::loading::model_load::{LoadState, ModelLoadState};
use crate::engine::selection::{RemountToken, SelectionController};
use crate::engine::xr::capability::{ArCapability, CapabilityMonitor};
use crate::engine::xr::session::{SessionFailureEvent, SessionManager, SessionStatus};

/// Model load state as reported to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub token: RemountToken,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelStatus {
    fn capture(load: &ModelLoadState) -> Self {
        Self {
            token: load.token(),
            state: load.state().label(),
            error: match load.state() {
                LoadState::Failed(err) => Some(err.to_string()),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatusReport {
    pub status: SessionStatus,
    pub bound_token: Option<RemountToken>,
}

/// Everything observable about the viewer at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerStateSnapshot {
    pub token: RemountToken,
    pub tool: Option<ToolRecord>,
    pub model: ModelStatus,
    pub capability: ArCapability,
    pub session: SessionStatusReport,
    pub controls: ControlsSnapshot,
}

impl ViewerStateSnapshot {
    pub fn capture(
        catalog: Option<&ToolCatalog>,
        controller: &SelectionController,
        load: &ModelLoadState,
        monitor: &CapabilityMonitor,
        session: &SessionManager,
    ) -> Self {
        Self {
            token: controller.live_token(),
            tool: controller.selected_tool().cloned(),
            model: ModelStatus::capture(load),
            capability: monitor.capability(),
            session: SessionStatusReport {
                status: session.status(),
                bound_token: session.bound_token(),
            },
            controls: ControlsSnapshot::capture(catalog, controller, load, monitor, session),
        }
    }
}

/// Observable change in viewer state, published once per frame at most per kind.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub enum ViewerStateEvent {
    SelectionChanged {
        token: RemountToken,
        tool: Option<ToolRecord>,
    },
    ModelStateChanged(ModelStatus),
    CapabilityChanged(ArCapability),
    SessionChanged(SessionStatusReport),
    SessionError {
        message: String,
    },
    ControlsChanged(ControlsSnapshot),
}

/// Last snapshot observers were told about.
#[derive(Resource, Default)]
pub struct PublishedState {
    last: Option<ViewerStateSnapshot>,
}

impl PublishedState {
    pub fn last(&self) -> Option<&ViewerStateSnapshot> {
        self.last.as_ref()
    }
}

/// Diff the current state against the last published one and emit events for
/// each part that moved.
pub fn publish_state_changes(
    catalog: Option<Res<ToolCatalog>>,
    controller: Res<SelectionController>,
    load: Res<ModelLoadState>,
    monitor: Res<CapabilityMonitor>,
    session: Res<SessionManager>,
    mut failures: EventReader<SessionFailureEvent>,
    mut published: ResMut<PublishedState>,
    mut events: EventWriter<ViewerStateEvent>,
) {
    for failure in failures.read() {
        events.write(ViewerStateEvent::SessionError {
            message: failure.failure.to_string(),
        });
    }

    let current =
        ViewerStateSnapshot::capture(catalog.as_deref(), &controller, &load, &monitor, &session);
    let previous = published.last.as_ref();
    if previous == Some(&current) {
        return;
    }

    if previous.is_none_or(|last| last.token != current.token || last.tool != current.tool) {
        debug!(token = %current.token, "Publishing selection");
        events.write(ViewerStateEvent::SelectionChanged {
            token: current.token,
            tool: current.tool.clone(),
        });
    }
    if previous.is_none_or(|last| last.model != current.model) {
        debug!(token = %current.model.token, state = current.model.state, "Model state changed");
        events.write(ViewerStateEvent::ModelStateChanged(current.model.clone()));
    }
    if previous.is_none_or(|last| last.capability != current.capability) {
        info!(capability = ?current.capability, "AR capability changed");
        events.write(ViewerStateEvent::CapabilityChanged(current.capability));
    }
    if previous.is_none_or(|last| last.session != current.session) {
        info!(status = %current.session.status, "AR session status changed");
        events.write(ViewerStateEvent::SessionChanged(current.session));
    }
    if previous.is_none_or(|last| last.controls != current.controls) {
        events.write(ViewerStateEvent::ControlsChanged(current.controls.clone()));
    }

    published.last = Some(current);
}
