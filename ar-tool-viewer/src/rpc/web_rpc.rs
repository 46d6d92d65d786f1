use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::{ToolCatalog, ToolId, ToolRecord};
use crate::engine::core::plugin::ViewerSet;
use crate::engine::core::viewer_state::{ViewerStateEvent, ViewerStateSnapshot};
use crate::engine::loading::model_load::{LoadState, ModelLoadState};
use crate::engine::selection::{
    RetryModelRequest, SelectionController, SelectionSource, ToolSelectionEvent,
};
use crate::engine::xr::capability::{CapabilityCheckRequest, CapabilityMonitor};
use crate::engine::xr::session::{
    ArSessionRequest, RequestSource, SessionAction, SessionManager, SessionStatus,
};
use crate::errors::{CatalogError, SessionError};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication with the embedding page.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the frontend without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }

    /// Notifications queued since the last drain.
    pub fn notifications(&self) -> &[RpcNotification] {
        &self.outgoing_notifications
    }

    pub fn responses(&self) -> &[RpcResponse] {
        &self.outgoing_responses
    }

    pub fn drain(&mut self) -> (Vec<RpcNotification>, Vec<RpcResponse>) {
        (
            std::mem::take(&mut self.outgoing_notifications),
            std::mem::take(&mut self.outgoing_responses),
        )
    }
}

/// Plugin establishing the RPC layer for iframe-based deployment.
///
/// Outgoing traffic is only flushed to a parent window on wasm; elsewhere it
/// stays queued on [`WebRpcInterface`] for the caller to inspect.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages)
                    .chain()
                    .in_set(ViewerSet::Input),
            )
            .add_systems(
                Update,
                forward_state_notifications.in_set(ViewerSet::Output),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener).add_systems(
            Update,
            send_outgoing_messages
                .after(forward_state_notifications)
                .in_set(ViewerSet::Output),
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    match window() {
        Some(window) => {
            if let Err(err) = window
                .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            {
                error!("Failed to register message listener: {:?}", err);
            }
        }
        None => error!("Window object not available"),
    }

    // The listener lives as long as the page.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Raw RPC payload received from the frontend.
#[derive(Event, Debug, Clone)]
pub struct IncomingRpcMessage {
    pub content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// A request that passed validation against the current catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCommand {
    GetCatalog,
    SelectTool(ToolRecord),
    EnterAr,
    ExitAr,
    CheckArSupport,
    RetryModel,
    GetViewerState,
}

/// Validate method name and parameters.
pub fn parse_command(
    request: &RpcRequest,
    catalog: Option<&ToolCatalog>,
) -> Result<RpcCommand, RpcError> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(RpcError::invalid_request("Expected jsonrpc \"2.0\""));
    }

    match request.method.as_str() {
        "get_catalog" => Ok(RpcCommand::GetCatalog),
        "select_tool" => {
            #[derive(Deserialize)]
            struct SelectToolParams {
                id: ToolId,
            }

            let params = serde_json::from_value::<SelectToolParams>(request.params.clone())
                .map_err(|_| RpcError::invalid_params("Expected 'id' parameter"))?;
            let catalog =
                catalog.ok_or_else(|| RpcError::internal_error("Tool catalog not loaded yet"))?;
            let tool = catalog
                .resolve(params.id.as_str())
                .map_err(RpcError::from)?;
            Ok(RpcCommand::SelectTool(tool.clone()))
        }
        "enter_ar" => Ok(RpcCommand::EnterAr),
        "exit_ar" => Ok(RpcCommand::ExitAr),
        "check_ar_support" => Ok(RpcCommand::CheckArSupport),
        "retry_model" => Ok(RpcCommand::RetryModel),
        "get_viewer_state" => Ok(RpcCommand::GetViewerState),
        _ => Err(RpcError::method_not_found(&request.method)),
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    catalog: Option<Res<ToolCatalog>>,
    controller: Res<SelectionController>,
    model_load: Res<ModelLoadState>,
    monitor: Res<CapabilityMonitor>,
    session: Res<SessionManager>,
    mut selections: EventWriter<ToolSelectionEvent>,
    mut session_requests: EventWriter<ArSessionRequest>,
    mut checks: EventWriter<CapabilityCheckRequest>,
    mut retries: EventWriter<RetryModelRequest>,
) {
    // Session state only moves in `ViewerSet::Async`, so an entry accepted
    // earlier in this frame is tracked here.
    let mut entry_requested = false;

    for event in events.read() {
        let request = match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => request,
            Err(parse_error) => {
                warn!("Discarding malformed RPC message: {}", parse_error);
                rpc_interface.queue_response(create_error_response(
                    serde_json::Value::Null,
                    RpcError::invalid_request(&parse_error.to_string()),
                ));
                continue;
            }
        };
        debug!(method = %request.method, "RPC request");

        let result = parse_command(&request, catalog.as_deref()).and_then(|command| {
            match command {
                RpcCommand::GetCatalog => Ok(json!({
                    "tools": catalog.as_deref().map(ToolCatalog::tools).unwrap_or_default()
                })),
                RpcCommand::SelectTool(tool) => {
                    let id = tool.id.clone();
                    selections.write(ToolSelectionEvent {
                        tool,
                        source: SelectionSource::Rpc,
                    });
                    Ok(json!({ "success": true, "selected_id": id }))
                }
                RpcCommand::EnterAr => {
                    session
                        .check_entry(
                            monitor.capability(),
                            model_load.is_placeable(controller.live_token()),
                        )
                        .map_err(RpcError::from)?;
                    if entry_requested {
                        return Err(RpcError::from(SessionError::SessionAlreadyActive(
                            SessionStatus::Entering,
                        )));
                    }
                    entry_requested = true;
                    session_requests.write(ArSessionRequest {
                        action: SessionAction::Enter,
                        source: RequestSource::Rpc,
                    });
                    Ok(json!({ "success": true }))
                }
                RpcCommand::ExitAr => {
                    session_requests.write(ArSessionRequest {
                        action: SessionAction::Exit,
                        source: RequestSource::Rpc,
                    });
                    Ok(json!({ "success": true, "status": session.status() }))
                }
                RpcCommand::CheckArSupport => {
                    checks.write(CapabilityCheckRequest);
                    Ok(json!({ "success": true }))
                }
                RpcCommand::RetryModel => {
                    if !matches!(model_load.state(), LoadState::Failed(_)) {
                        return Err(RpcError::invalid_request("No failed model load to retry"));
                    }
                    retries.write(RetryModelRequest);
                    Ok(json!({ "success": true }))
                }
                RpcCommand::GetViewerState => {
                    let snapshot = ViewerStateSnapshot::capture(
                        catalog.as_deref(),
                        &controller,
                        &model_load,
                        &monitor,
                        &session,
                    );
                    serde_json::to_value(snapshot)
                        .map_err(|err| RpcError::internal_error(&err.to_string()))
                }
            }
        });

        // Requests without an id are notifications and get no reply.
        let Some(id) = request.id else {
            if let Err(error) = result {
                debug!(method = %request.method, "RPC notification rejected: {}", error.message);
            }
            continue;
        };

        let response = match result {
            Ok(result_value) => RpcResponse {
                jsonrpc: JSONRPC_VERSION.to_string(),
                result: Some(result_value),
                error: None,
                id: Some(id),
            },
            Err(error) => {
                warn!(method = %request.method, code = error.code, "RPC request failed: {}", error.message);
                create_error_response(id, error)
            }
        };
        rpc_interface.queue_response(response);
    }
}

/// Mirror published state changes to the frontend.
fn forward_state_notifications(
    mut events: EventReader<ViewerStateEvent>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        let (method, params) = match event {
            ViewerStateEvent::SelectionChanged { token, tool } => {
                ("selection_changed", json!({ "token": token, "tool": tool }))
            }
            ViewerStateEvent::ModelStateChanged(status) => ("model_state_changed", json!(status)),
            ViewerStateEvent::CapabilityChanged(capability) => {
                ("ar_capability_changed", json!({ "capability": capability }))
            }
            ViewerStateEvent::SessionChanged(report) => ("ar_session_changed", json!(report)),
            ViewerStateEvent::SessionError { message } => {
                ("ar_session_error", json!({ "message": message }))
            }
            ViewerStateEvent::ControlsChanged(controls) => ("controls_changed", json!(controls)),
        };
        rpc_interface.send_notification(method, params);
    }
}

fn create_error_response(id: serde_json::Value, error: RpcError) -> RpcResponse {
    RpcResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        result: None,
        error: Some(error),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the parent window.
#[cfg(target_arch = "wasm32")]
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    let (notifications, responses) = rpc_interface.drain();

    for notification in &notifications {
        send_message_to_parent(notification);
    }

    for response in &responses {
        send_message_to_parent(response);
    }
}

#[cfg(target_arch = "wasm32")]
fn send_message_to_parent<T: Serialize>(message: &T) {
    match serde_json::to_string(message) {
        Ok(json) => {
            if let Some(window) = window() {
                if let Some(parent) = window.parent().ok().flatten() {
                    if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                        error!("Failed to send message to parent: {:?}", e);
                    }
                } else {
                    warn!("No parent window available for message transmission");
                }
            } else {
                error!("Window object not available");
            }
        }
        Err(e) => {
            error!("Failed to serialize message: {}", e);
        }
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_request(message: &str) -> Self {
        Self {
            code: -32600,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}

impl From<CatalogError> for RpcError {
    fn from(err: CatalogError) -> Self {
        Self::invalid_params(&err.to_string())
    }
}

impl From<SessionError> for RpcError {
    fn from(err: SessionError) -> Self {
        let kind = match err {
            SessionError::UnsupportedMode(_) => "unsupported_mode",
            SessionError::SessionAlreadyActive(_) => "session_already_active",
            SessionError::NoModel => "no_model",
        };
        Self {
            code: -32603,
            message: err.to_string(),
            data: Some(json!({ "kind": kind })),
        }
    }
}
