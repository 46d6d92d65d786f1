use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::engine::selection::RemountToken;
use crate::engine::xr::SessionMode;
use crate::errors::PlatformError;

/// Identifies one capability query; only the latest may resolve the capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CheckId(pub u64);

/// Identifies one session request: the viewer generation it belongs to plus a
/// per-request attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTicket {
    pub token: RemountToken,
    pub attempt: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndCause {
    /// Acknowledges an `end_session` call made by the viewer.
    Requested,
    /// The runtime ended the session on its own (headset removed, tab hidden).
    Platform,
}

/// Asynchronous answer from the XR runtime.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum PlatformSignal {
    SupportResolved {
        check: CheckId,
        result: Result<bool, PlatformError>,
    },
    SessionStarted {
        ticket: SessionTicket,
    },
    SessionRequestFailed {
        ticket: SessionTicket,
        error: PlatformError,
    },
    SessionEnded {
        ticket: SessionTicket,
        cause: SessionEndCause,
    },
}

/// XR runtime seam. Calls return immediately; answers arrive through the
/// [`PlatformInbox`] the runtime was constructed with.
pub trait SessionPlatform {
    fn query_support(&mut self, mode: SessionMode, check: CheckId);

    fn request_session(&mut self, mode: SessionMode, ticket: SessionTicket);

    /// Ask the runtime to end the session opened for `ticket`. An `Err` means
    /// no acknowledgement will follow.
    fn end_session(&mut self, ticket: SessionTicket) -> Result<(), PlatformError>;
}

/// Thread-safe queue runtime callbacks push into and the frame loop drains.
#[derive(Resource, Clone, Default)]
pub struct PlatformInbox(Arc<Mutex<VecDeque<PlatformSignal>>>);

impl PlatformInbox {
    pub fn push(&self, signal: PlatformSignal) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push_back(signal);
        }
    }

    pub fn drain(&self) -> Vec<PlatformSignal> {
        match self.0.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().map(|queue| queue.is_empty()).unwrap_or(true)
    }
}

/// Non-send resource owning the active runtime. JS-backed runtimes are not `Send`.
pub struct XrPlatform(Box<dyn SessionPlatform>);

impl XrPlatform {
    pub fn new(platform: impl SessionPlatform + 'static) -> Self {
        Self(Box::new(platform))
    }

    pub fn as_dyn(&mut self) -> &mut dyn SessionPlatform {
        self.0.as_mut()
    }
}

/// Install (or replace) the XR runtime, handing it the app's inbox.
pub fn install_xr_platform<P, F>(app: &mut App, make: F)
where
    P: SessionPlatform + 'static,
    F: FnOnce(PlatformInbox) -> P,
{
    let world = app.world_mut();
    if !world.contains_resource::<PlatformInbox>() {
        world.insert_resource(PlatformInbox::default());
    }
    let inbox = world.resource::<PlatformInbox>().clone();
    app.insert_non_send_resource(XrPlatform::new(make(inbox)));
}

pub fn drain_platform_signals(inbox: Res<PlatformInbox>, mut signals: EventWriter<PlatformSignal>) {
    for signal in inbox.drain() {
        signals.write(signal);
    }
}
