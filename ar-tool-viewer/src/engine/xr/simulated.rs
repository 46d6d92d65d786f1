use std::sync::{Arc, Mutex};

use crate::engine::xr::SessionMode;
use crate::engine::xr::platform::{
    CheckId, PlatformInbox, PlatformSignal, SessionEndCause, SessionPlatform, SessionTicket,
};
use crate::errors::PlatformError;

/// A call the viewer made into the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    QuerySupport { mode: SessionMode, check: CheckId },
    RequestSession { mode: SessionMode, ticket: SessionTicket },
    EndSession { ticket: SessionTicket },
}

/// Shared record of runtime calls, readable after the platform moved into the app.
#[derive(Clone, Default)]
pub struct PlatformCallLog(Arc<Mutex<Vec<PlatformCall>>>);

impl PlatformCallLog {
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.0.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn session_requests(&self) -> Vec<SessionTicket> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::RequestSession { ticket, .. } => Some(ticket),
                _ => None,
            })
            .collect()
    }

    pub fn end_requests(&self) -> Vec<SessionTicket> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::EndSession { ticket } => Some(ticket),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: PlatformCall) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }
}

/// In-process XR runtime.
///
/// Answers support queries with a fixed value and, unless switched to manual
/// acknowledgement, confirms session requests and ends straight away. In manual
/// mode the caller pushes acknowledgements into the inbox itself.
pub struct SimulatedXrPlatform {
    inbox: PlatformInbox,
    support: Option<bool>,
    auto_acknowledge: bool,
    fail_end: bool,
    log: PlatformCallLog,
}

impl SimulatedXrPlatform {
    pub fn new(inbox: PlatformInbox, support: Option<bool>) -> Self {
        Self {
            inbox,
            support,
            auto_acknowledge: true,
            fail_end: false,
            log: PlatformCallLog::default(),
        }
    }

    pub fn supported(inbox: PlatformInbox) -> Self {
        Self::new(inbox, Some(true))
    }

    pub fn unsupported(inbox: PlatformInbox) -> Self {
        Self::new(inbox, Some(false))
    }

    /// Leave session acknowledgements to the caller.
    pub fn manual(mut self) -> Self {
        self.auto_acknowledge = false;
        self
    }

    /// Make every `end_session` call fail.
    pub fn failing_end(mut self) -> Self {
        self.fail_end = true;
        self
    }

    pub fn call_log(&self) -> PlatformCallLog {
        self.log.clone()
    }
}

impl SessionPlatform for SimulatedXrPlatform {
    fn query_support(&mut self, mode: SessionMode, check: CheckId) {
        self.log.record(PlatformCall::QuerySupport { mode, check });
        if let Some(supported) = self.support {
            self.inbox.push(PlatformSignal::SupportResolved {
                check,
                result: Ok(supported),
            });
        }
    }

    fn request_session(&mut self, mode: SessionMode, ticket: SessionTicket) {
        self.log.record(PlatformCall::RequestSession { mode, ticket });
        if !self.auto_acknowledge {
            return;
        }
        let signal = if self.support == Some(true) {
            PlatformSignal::SessionStarted { ticket }
        } else {
            PlatformSignal::SessionRequestFailed {
                ticket,
                error: PlatformError::RequestRejected(format!("{mode} is not available")),
            }
        };
        self.inbox.push(signal);
    }

    fn end_session(&mut self, ticket: SessionTicket) -> Result<(), PlatformError> {
        self.log.record(PlatformCall::EndSession { ticket });
        if self.fail_end {
            return Err(PlatformError::EndFailed("simulated runtime fault".into()));
        }
        if self.auto_acknowledge {
            self.inbox.push(PlatformSignal::SessionEnded {
                ticket,
                cause: SessionEndCause::Requested,
            });
        }
        Ok(())
    }
}
