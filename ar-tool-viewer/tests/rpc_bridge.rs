//! Integration tests for the JSON-RPC bridge against a headless viewer.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Standard in tests

use ar_tool_viewer::ToolViewerPlugin;
use ar_tool_viewer::catalog::{ToolCatalog, ToolRecord};
use ar_tool_viewer::engine::selection::{RemountToken, SelectionController};
use ar_tool_viewer::engine::xr::platform::install_xr_platform;
use ar_tool_viewer::engine::xr::session::{SessionManager, SessionStatus};
use ar_tool_viewer::engine::xr::simulated::SimulatedXrPlatform;
use ar_tool_viewer::rpc::web_rpc::{IncomingRpcMessage, RpcResponse, WebRpcInterface, WebRpcPlugin};
use bevy::prelude::*;
use serde_json::{Value, json};

fn test_app(supported: bool) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(ToolViewerPlugin::headless());
    app.add_plugins(WebRpcPlugin);
    app.insert_resource(ToolCatalog::new(vec![
        ToolRecord::new("1", "Hammer", Some("hammer.glb")),
        ToolRecord::new("2", "Wrench", None),
    ]));
    install_xr_platform(&mut app, |inbox| {
        SimulatedXrPlatform::new(inbox, Some(supported))
    });
    app.update();
    app.world_mut().resource_mut::<WebRpcInterface>().drain();
    app
}

/// Send one request and return the response carrying its id.
fn call(app: &mut App, id: u64, method: &str, params: Value) -> RpcResponse {
    let content = json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": id });
    app.world_mut().send_event(IncomingRpcMessage {
        content: content.to_string(),
    });
    app.update();

    app.world()
        .resource::<WebRpcInterface>()
        .responses()
        .iter()
        .find(|response| response.id == Some(json!(id)))
        .cloned()
        .expect("no response for request")
}

fn notification_methods(app: &App) -> Vec<String> {
    app.world()
        .resource::<WebRpcInterface>()
        .notifications()
        .iter()
        .map(|notification| notification.method.clone())
        .collect()
}

#[test]
fn get_catalog_lists_tools() {
    let mut app = test_app(true);
    let response = call(&mut app, 1, "get_catalog", Value::Null);

    let tools = &response.result.unwrap()["tools"];
    assert_eq!(tools.as_array().map(Vec::len), Some(2));
    assert_eq!(tools[0]["id"], json!("1"));
    assert_eq!(tools[0]["modelPath"], json!("hammer.glb"));
}

#[test]
fn select_tool_applies_in_the_same_frame() {
    let mut app = test_app(true);
    let response = call(&mut app, 7, "select_tool", json!({ "id": 2 }));

    assert!(response.error.is_none());
    let controller = app.world().resource::<SelectionController>();
    assert_eq!(controller.selected_tool().map(|tool| tool.title.as_str()), Some("Wrench"));
    assert!(controller.live_token() > RemountToken::INITIAL);

    let methods = notification_methods(&app);
    assert!(methods.contains(&"selection_changed".to_string()));
    assert!(methods.contains(&"model_state_changed".to_string()));
    assert!(methods.contains(&"controls_changed".to_string()));
}

#[test]
fn unknown_tool_and_method_report_standard_codes() {
    let mut app = test_app(true);

    let unknown_tool = call(&mut app, 1, "select_tool", json!({ "id": 42 }));
    assert_eq!(unknown_tool.error.map(|err| err.code), Some(-32602));

    let unknown_method = call(&mut app, 2, "teleport", Value::Null);
    assert_eq!(unknown_method.error.map(|err| err.code), Some(-32601));
}

#[test]
fn enter_ar_is_refused_without_support() {
    let mut app = test_app(false);
    call(&mut app, 1, "select_tool", json!({ "id": 1 }));

    let response = call(&mut app, 2, "enter_ar", Value::Null);
    let error = response.error.unwrap();
    assert_eq!(error.code, -32603);
    assert_eq!(error.data, Some(json!({ "kind": "unsupported_mode" })));
    assert_eq!(
        app.world().resource::<SessionManager>().status(),
        SessionStatus::Idle
    );
}

#[test]
fn enter_ar_is_refused_without_a_model() {
    let mut app = test_app(true);

    let unselected = call(&mut app, 1, "enter_ar", Value::Null);
    assert_eq!(
        unselected.error.and_then(|err| err.data),
        Some(json!({ "kind": "no_model" }))
    );

    call(&mut app, 2, "select_tool", json!({ "id": 2 }));
    let wrench = call(&mut app, 3, "enter_ar", Value::Null);
    let error = wrench.error.unwrap();
    assert_eq!(error.code, -32603);
    assert_eq!(error.data, Some(json!({ "kind": "no_model" })));

    app.update();
    let session = app.world().resource::<SessionManager>();
    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(session.bound_token(), None);
}

#[test]
fn second_enter_in_the_same_frame_is_refused() {
    let mut app = test_app(true);
    call(&mut app, 1, "select_tool", json!({ "id": 1 }));
    app.world_mut().resource_mut::<WebRpcInterface>().drain();

    for id in [7, 8] {
        let content = json!({ "jsonrpc": "2.0", "method": "enter_ar", "id": id });
        app.world_mut().send_event(IncomingRpcMessage {
            content: content.to_string(),
        });
    }
    app.update();

    let interface = app.world().resource::<WebRpcInterface>();
    let response = |id: u64| {
        interface
            .responses()
            .iter()
            .find(|response| response.id == Some(json!(id)))
            .cloned()
            .expect("no response for request")
    };
    assert_eq!(response(7).result, Some(json!({ "success": true })));
    assert_eq!(
        response(8).error.and_then(|err| err.data),
        Some(json!({ "kind": "session_already_active" }))
    );
    assert!(!notification_methods(&app).contains(&"ar_session_error".to_string()));
    assert_eq!(
        app.world().resource::<SessionManager>().status(),
        SessionStatus::Entering
    );
}

#[test]
fn enter_and_exit_over_rpc() {
    let mut app = test_app(true);
    call(&mut app, 1, "select_tool", json!({ "id": 1 }));

    let response = call(&mut app, 2, "enter_ar", Value::Null);
    assert!(response.error.is_none());
    app.update();
    assert_eq!(
        app.world().resource::<SessionManager>().status(),
        SessionStatus::Active
    );
    assert!(notification_methods(&app).contains(&"ar_session_changed".to_string()));

    call(&mut app, 3, "exit_ar", Value::Null);
    app.update();
    assert_eq!(
        app.world().resource::<SessionManager>().status(),
        SessionStatus::Idle
    );
}

#[test]
fn viewer_state_snapshot() {
    let mut app = test_app(true);
    call(&mut app, 1, "select_tool", json!({ "id": "2" }));

    let state = call(&mut app, 2, "get_viewer_state", Value::Null)
        .result
        .unwrap();
    assert_eq!(state["tool"]["title"], json!("Wrench"));
    assert_eq!(state["model"]["state"], json!("no_asset"));
    assert_eq!(state["capability"], json!("supported"));
    assert_eq!(state["session"]["status"], json!("idle"));
    assert_eq!(state["controls"]["entry"], json!("no_model"));
    assert_eq!(state["controls"]["exit_visible"], json!(false));
}

#[test]
fn retry_without_failure_is_invalid() {
    let mut app = test_app(true);
    call(&mut app, 1, "select_tool", json!({ "id": 1 }));

    let response = call(&mut app, 2, "retry_model", Value::Null);
    assert_eq!(response.error.map(|err| err.code), Some(-32600));
}

#[test]
fn malformed_message_gets_invalid_request() {
    let mut app = test_app(true);
    app.world_mut().send_event(IncomingRpcMessage {
        content: "{ \"jsonrpc\": ".to_string(),
    });
    app.update();

    let responses = app.world().resource::<WebRpcInterface>().responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].error.as_ref().map(|err| err.code), Some(-32600));
}
