use std::fmt;

use bevy::prelude::*;
use serde::Serialize;

use crate::engine::loading::model_load::ModelLoadState;
use crate::engine::selection::{RemountToken, SelectionController};
use crate::engine::xr::SessionMode;
use crate::engine::xr::capability::{ArCapability, CapabilityMonitor};
use crate::engine::xr::platform::{
    PlatformSignal, SessionEndCause, SessionPlatform, SessionTicket, XrPlatform,
};
use crate::errors::{PlatformError, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Entering,
    Active,
    Exiting,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Entering => "entering",
            Self::Active => "active",
            Self::Exiting => "exiting",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the single AR session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArSession {
    pub status: SessionStatus,
    /// Viewer generation the session renders. `None` while idle.
    pub bound_token: Option<RemountToken>,
}

impl ArSession {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Owner of the one AR session.
///
/// At most one non-idle session exists. The only writers are the selection
/// system (forced exit) and the session systems in this module.
#[derive(Resource, Debug)]
pub struct SessionManager {
    mode: SessionMode,
    session: ArSession,
    ticket: Option<SessionTicket>,
    attempts: u64,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionMode::ImmersiveAr)
    }
}

impl SessionManager {
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            session: ArSession::default(),
            ticket: None,
            attempts: 0,
        }
    }

    pub fn session(&self) -> ArSession {
        self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn bound_token(&self) -> Option<RemountToken> {
        self.session.bound_token
    }

    pub fn is_idle(&self) -> bool {
        self.session.status == SessionStatus::Idle
    }

    /// Whether `enter` would be accepted right now. `placeable` tells whether
    /// the live viewer has a model that is loading or loaded.
    pub fn check_entry(
        &self,
        capability: ArCapability,
        placeable: bool,
    ) -> Result<(), SessionError> {
        if capability != ArCapability::Supported {
            return Err(SessionError::UnsupportedMode(self.mode));
        }
        if !self.is_idle() {
            return Err(SessionError::SessionAlreadyActive(self.session.status));
        }
        if !placeable {
            return Err(SessionError::NoModel);
        }
        Ok(())
    }

    /// Request a session bound to `token`.
    pub fn enter(
        &mut self,
        capability: ArCapability,
        token: RemountToken,
        placeable: bool,
        platform: &mut dyn SessionPlatform,
    ) -> Result<SessionTicket, SessionError> {
        self.check_entry(capability, placeable)?;

        self.attempts += 1;
        let ticket = SessionTicket {
            token,
            attempt: self.attempts,
        };
        self.ticket = Some(ticket);
        self.session = ArSession {
            status: SessionStatus::Entering,
            bound_token: Some(token),
        };
        platform.request_session(self.mode, ticket);
        Ok(ticket)
    }

    /// User-initiated exit. Takes effect immediately: the session leaves
    /// `Active` now and reaches `Idle` once the runtime acknowledges. When the
    /// runtime cannot acknowledge, it goes straight to `Idle`.
    pub fn exit(&mut self, platform: &mut dyn SessionPlatform) -> SessionStatus {
        if matches!(
            self.session.status,
            SessionStatus::Entering | SessionStatus::Active
        ) {
            self.session.status = SessionStatus::Exiting;
            if let Some(ticket) = self.ticket {
                if let Err(err) = platform.end_session(ticket) {
                    debug!(token = %ticket.token, "Session end not acknowledged ({err}), returning to idle");
                    self.reset();
                }
            }
        }
        self.session.status
    }

    /// Exit triggered by a tool switch. Always ends in `Idle`; runtime errors
    /// are logged and dropped. Returns whether a session was torn down.
    pub fn force_exit(&mut self, platform: &mut dyn SessionPlatform) -> bool {
        if self.is_idle() {
            return false;
        }
        self.session.status = SessionStatus::Exiting;
        if let Some(ticket) = self.ticket {
            if let Err(err) = platform.end_session(ticket) {
                warn!(token = %ticket.token, "Ignoring runtime error during forced session exit: {err}");
            }
        }
        self.reset();
        true
    }

    /// The runtime opened a session. A session that no longer matches the live
    /// entry attempt is ended again right away.
    pub fn on_session_started(
        &mut self,
        ticket: SessionTicket,
        platform: &mut dyn SessionPlatform,
    ) -> bool {
        if self.session.status == SessionStatus::Entering && self.ticket == Some(ticket) {
            self.session.status = SessionStatus::Active;
            return true;
        }
        if let Err(err) = platform.end_session(ticket) {
            debug!(token = %ticket.token, "Stale session could not be ended: {err}");
        }
        false
    }

    pub fn on_request_failed(&mut self, ticket: SessionTicket) -> bool {
        if self.ticket != Some(ticket) || self.is_idle() {
            return false;
        }
        self.reset();
        true
    }

    /// Handles both acknowledged exits and runtime-initiated terminations.
    pub fn on_session_ended(&mut self, ticket: SessionTicket) -> bool {
        if self.ticket != Some(ticket) || self.is_idle() {
            return false;
        }
        self.reset();
        true
    }

    fn reset(&mut self) {
        self.session = ArSession::default();
        self.ticket = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSource {
    Rpc,
    Keyboard,
    Button,
    Overlay,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ArSessionRequest {
    pub action: SessionAction,
    pub source: RequestSource,
}

/// Why an entry attempt did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFailure {
    Rejected(SessionError),
    Platform(PlatformError),
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(err) => err.fmt(f),
            Self::Platform(err) => err.fmt(f),
        }
    }
}

#[derive(Event, Debug, Clone)]
pub struct SessionFailureEvent {
    pub failure: SessionFailure,
}

pub fn handle_session_requests(
    mut requests: EventReader<ArSessionRequest>,
    mut session: ResMut<SessionManager>,
    monitor: Res<CapabilityMonitor>,
    controller: Res<SelectionController>,
    model_load: Res<ModelLoadState>,
    mut platform: NonSendMut<XrPlatform>,
    mut failures: EventWriter<SessionFailureEvent>,
) {
    for request in requests.read() {
        match request.action {
            SessionAction::Enter => {
                let token = controller.live_token();
                match session.enter(
                    monitor.capability(),
                    token,
                    model_load.is_placeable(token),
                    platform.as_dyn(),
                ) {
                    Ok(ticket) => {
                        info!(
                            token = %ticket.token,
                            attempt = ticket.attempt,
                            source = ?request.source,
                            "AR session requested"
                        );
                    }
                    Err(err) => {
                        match &err {
                            SessionError::UnsupportedMode(_) | SessionError::NoModel => {
                                warn!("{err}")
                            }
                            SessionError::SessionAlreadyActive(_) => error!("{err}"),
                        }
                        failures.write(SessionFailureEvent {
                            failure: SessionFailure::Rejected(err),
                        });
                    }
                }
            }
            SessionAction::Exit => {
                let status = session.exit(platform.as_dyn());
                info!(status = %status, source = ?request.source, "AR session exit requested");
            }
        }
    }
}

pub fn apply_session_signals(
    mut signals: EventReader<PlatformSignal>,
    mut session: ResMut<SessionManager>,
    mut platform: NonSendMut<XrPlatform>,
    mut failures: EventWriter<SessionFailureEvent>,
) {
    for signal in signals.read() {
        match signal {
            PlatformSignal::SessionStarted { ticket } => {
                if session.on_session_started(*ticket, platform.as_dyn()) {
                    info!(token = %ticket.token, "AR session active");
                } else {
                    debug!(token = %ticket.token, attempt = ticket.attempt, "Ended stale AR session");
                }
            }
            PlatformSignal::SessionRequestFailed { ticket, error } => {
                if session.on_request_failed(*ticket) {
                    warn!(token = %ticket.token, "AR session request failed: {error}");
                    failures.write(SessionFailureEvent {
                        failure: SessionFailure::Platform(error.clone()),
                    });
                }
            }
            PlatformSignal::SessionEnded { ticket, cause } => {
                if session.on_session_ended(*ticket) {
                    match cause {
                        SessionEndCause::Requested => info!(token = %ticket.token, "AR session exited"),
                        SessionEndCause::Platform => {
                            info!(token = %ticket.token, "AR session terminated by the platform")
                        }
                    }
                }
            }
            PlatformSignal::SupportResolved { .. } => {}
        }
    }
}
