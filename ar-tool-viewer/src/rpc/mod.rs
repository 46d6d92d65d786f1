//! JSON-RPC 2.0 bridge for embedding the viewer in a web page.
//!
//! The page talks to the viewer iframe through `postMessage`:
//!
//! ```text
//! Page (parent window)  <──postMessage──>  Viewer (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Validate, dispatch event
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        │ <────────── Notification (no ID) ─────┤
//! ```
//!
//! ## Methods
//!
//! - `get_catalog`: tool list as loaded from the catalog asset
//! - `select_tool {id}`: select by catalog id, numeric or string
//! - `enter_ar`, `exit_ar`: session requests
//! - `check_ar_support`: re-query the XR runtime
//! - `retry_model`: reload a model whose load failed
//! - `get_viewer_state`: full state snapshot
//!
//! ## Notifications
//!
//! `selection_changed`, `model_state_changed`, `ar_capability_changed`,
//! `ar_session_changed`, `ar_session_error`, `controls_changed`.
//!
//! ## Error Handling
//!
//! - `-32600`: Invalid request (malformed JSON, wrong version, nothing to retry)
//! - `-32601`: Method not found
//! - `-32602`: Invalid params (missing or unknown tool id)
//! - `-32603`: Internal error (catalog not loaded, session entry refused)
//!
//! Refused entries carry `data.kind`: `unsupported_mode`,
//! `session_already_active` or `no_model`.

/// Request parsing, dispatch and the postMessage transport.
pub mod web_rpc;
