use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bevy::log::{debug, warn};
use constants::path::CANVAS_SELECTOR;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Element, Event, XrSession, XrSessionInit, XrSessionMode, XrSystem};

use crate::engine::xr::SessionMode;
use crate::engine::xr::platform::{
    CheckId, PlatformInbox, PlatformSignal, SessionEndCause, SessionPlatform, SessionTicket,
};
use crate::errors::PlatformError;

struct OpenSession {
    ticket: SessionTicket,
    session: XrSession,
    ending: Rc<Cell<bool>>,
    ended: Rc<Cell<bool>>,
    // Kept alive until the `end` event fired.
    _on_end: Closure<dyn FnMut(Event)>,
}

/// WebXR runtime reached through `navigator.xr`.
pub struct WebXrPlatform {
    inbox: PlatformInbox,
    sessions: Rc<RefCell<Vec<OpenSession>>>,
}

impl WebXrPlatform {
    pub fn new(inbox: PlatformInbox) -> Self {
        Self {
            inbox,
            sessions: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn prune_ended(&self) {
        if let Ok(mut sessions) = self.sessions.try_borrow_mut() {
            sessions.retain(|open| !open.ended.get());
        }
    }
}

fn xr_system() -> Option<XrSystem> {
    let navigator = web_sys::window()?.navigator();
    let xr = js_sys::Reflect::get(&navigator, &JsValue::from_str("xr")).ok()?;
    if xr.is_undefined() || xr.is_null() {
        return None;
    }
    Some(xr.unchecked_into::<XrSystem>())
}

fn web_mode(mode: SessionMode) -> XrSessionMode {
    match mode {
        SessionMode::ImmersiveAr => XrSessionMode::ImmersiveAr,
        SessionMode::ImmersiveVr => XrSessionMode::ImmersiveVr,
    }
}

/// Element shown over the passthrough view: the container the canvas is
/// fitted to, so the viewer's overlay stays reachable during the session.
fn overlay_root() -> Option<Element> {
    let document = web_sys::window()?.document()?;
    let canvas = document.query_selector(CANVAS_SELECTOR).ok()??;
    canvas.parent_element()
}

fn set_option(target: &js_sys::Object, key: &str, value: &JsValue) {
    if let Err(err) = js_sys::Reflect::set(target, &JsValue::from_str(key), value) {
        debug!(key, "Could not set session option: {}", describe(&err));
    }
}

fn session_init(mode: SessionMode) -> XrSessionInit {
    let init = XrSessionInit::new();
    let features: js_sys::Array = mode
        .optional_features()
        .iter()
        .map(|feature| JsValue::from_str(feature))
        .collect();
    set_option(&init, "optionalFeatures", &features);

    if mode.wants_dom_overlay() {
        match overlay_root() {
            Some(root) => {
                let overlay = js_sys::Object::new();
                set_option(&overlay, "root", &root);
                set_option(&init, "domOverlay", &overlay);
            }
            None => warn!(
                selector = CANVAS_SELECTOR,
                "No DOM overlay root; the AR session will run without the viewer overlay"
            ),
        }
    }
    init
}

fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

impl SessionPlatform for WebXrPlatform {
    fn query_support(&mut self, mode: SessionMode, check: CheckId) {
        let inbox = self.inbox.clone();
        let Some(xr) = xr_system() else {
            inbox.push(PlatformSignal::SupportResolved {
                check,
                result: Err(PlatformError::Unavailable),
            });
            return;
        };

        let promise = xr.is_session_supported(web_mode(mode));
        spawn_local(async move {
            let result = JsFuture::from(promise)
                .await
                .map(|value| value.as_bool().unwrap_or(false))
                .map_err(|err| PlatformError::RequestRejected(describe(&err)));
            inbox.push(PlatformSignal::SupportResolved { check, result });
        });
    }

    fn request_session(&mut self, mode: SessionMode, ticket: SessionTicket) {
        self.prune_ended();
        let inbox = self.inbox.clone();
        let Some(xr) = xr_system() else {
            inbox.push(PlatformSignal::SessionRequestFailed {
                ticket,
                error: PlatformError::Unavailable,
            });
            return;
        };

        let sessions = self.sessions.clone();
        let promise = xr.request_session_with_options(web_mode(mode), &session_init(mode));
        spawn_local(async move {
            let session = match JsFuture::from(promise).await {
                Ok(value) => value.unchecked_into::<XrSession>(),
                Err(err) => {
                    inbox.push(PlatformSignal::SessionRequestFailed {
                        ticket,
                        error: PlatformError::RequestRejected(describe(&err)),
                    });
                    return;
                }
            };

            let ending = Rc::new(Cell::new(false));
            let ended = Rc::new(Cell::new(false));
            let on_end = {
                let inbox = inbox.clone();
                let ending = ending.clone();
                let ended = ended.clone();
                Closure::wrap(Box::new(move |_event: Event| {
                    ended.set(true);
                    let cause = if ending.get() {
                        SessionEndCause::Requested
                    } else {
                        SessionEndCause::Platform
                    };
                    inbox.push(PlatformSignal::SessionEnded { ticket, cause });
                }) as Box<dyn FnMut(Event)>)
            };
            session.set_onend(Some(on_end.as_ref().unchecked_ref()));

            sessions.borrow_mut().push(OpenSession {
                ticket,
                session,
                ending,
                ended,
                _on_end: on_end,
            });
            inbox.push(PlatformSignal::SessionStarted { ticket });
        });
    }

    fn end_session(&mut self, ticket: SessionTicket) -> Result<(), PlatformError> {
        let sessions = self
            .sessions
            .try_borrow()
            .map_err(|_| PlatformError::EndFailed("session registry busy".into()))?;
        let open = sessions
            .iter()
            .find(|open| open.ticket == ticket && !open.ended.get())
            .ok_or(PlatformError::NoSession)?;

        if !open.ending.replace(true) {
            // Resolution is reported through the session's `end` event.
            let promise = open.session.end();
            spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    debug!(token = %ticket.token, "XRSession.end() rejected: {}", describe(&err));
                }
            });
        }
        Ok(())
    }
}
