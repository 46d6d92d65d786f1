//! Integration tests for the selection / load / session lifecycle.
//!
//! Runs the headless viewer under `MinimalPlugins` with a simulated XR
//! runtime and steps frames explicitly.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Standard in tests

use ar_tool_viewer::ToolViewerPlugin;
use ar_tool_viewer::catalog::{ToolCatalog, ToolRecord};
use ar_tool_viewer::engine::core::viewer_state::ViewerStateEvent;
use ar_tool_viewer::engine::loading::model_load::{
    LoadState, ModelAssetOutcome, ModelLoadRequest, ModelLoadState,
};
use ar_tool_viewer::engine::scene::composer::ViewportContent;
use ar_tool_viewer::engine::scene::viewer_instance::{
    ComposedScene, InstancePart, ModelRoot, PartKind, ViewerInstance,
};
use ar_tool_viewer::engine::selection::{
    RemountToken, RetryModelRequest, SelectionController, SelectionSource, ToolSelectionEvent,
};
use ar_tool_viewer::engine::xr::capability::{ArCapability, CapabilityMonitor};
use ar_tool_viewer::engine::xr::platform::{
    PlatformInbox, PlatformSignal, SessionEndCause, install_xr_platform,
};
use ar_tool_viewer::engine::xr::session::{
    ArSessionRequest, RequestSource, SessionAction, SessionManager, SessionStatus,
};
use ar_tool_viewer::engine::xr::simulated::{PlatformCallLog, SimulatedXrPlatform};
use ar_tool_viewer::errors::{AssetLoadError, SessionError};
use bevy::prelude::*;

fn hammer() -> ToolRecord {
    ToolRecord::new("1", "Hammer", Some("hammer.glb"))
}

fn wrench() -> ToolRecord {
    ToolRecord::new("2", "Wrench", None)
}

/// Headless viewer with the catalog in place and the runtime built by `make`.
fn test_app(make: impl FnOnce(PlatformInbox) -> SimulatedXrPlatform) -> (App, PlatformCallLog) {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(ToolViewerPlugin::headless());
    app.insert_resource(ToolCatalog::new(vec![hammer(), wrench()]));

    let mut log = PlatformCallLog::default();
    install_xr_platform(&mut app, |inbox| {
        let platform = make(inbox);
        log = platform.call_log();
        platform
    });

    // Startup: the capability query goes out and, if answered, resolves.
    app.update();
    (app, log)
}

fn select(app: &mut App, tool: ToolRecord) {
    app.world_mut().send_event(ToolSelectionEvent {
        tool,
        source: SelectionSource::Rpc,
    });
    app.update();
}

fn request_session(app: &mut App, action: SessionAction) {
    app.world_mut().send_event(ArSessionRequest {
        action,
        source: RequestSource::Rpc,
    });
    app.update();
}

fn live_token(app: &App) -> RemountToken {
    app.world().resource::<SelectionController>().live_token()
}

fn session_status(app: &App) -> SessionStatus {
    app.world().resource::<SessionManager>().status()
}

fn load_state(app: &App) -> LoadState {
    app.world().resource::<ModelLoadState>().state().clone()
}

fn push_signal(app: &mut App, signal: PlatformSignal) {
    app.world().resource::<PlatformInbox>().push(signal);
    app.update();
}

fn parts(app: &mut App, kind: PartKind) -> usize {
    app.world_mut()
        .query::<&InstancePart>()
        .iter(app.world())
        .filter(|part| part.kind == kind)
        .count()
}

fn instances(app: &mut App) -> Vec<ViewerInstance> {
    app.world_mut()
        .query::<&ViewerInstance>()
        .iter(app.world())
        .copied()
        .collect()
}

fn load_requests(app: &App) -> Vec<ModelLoadRequest> {
    let events = app.world().resource::<Events<ModelLoadRequest>>();
    events.get_cursor().read(events).cloned().collect()
}

fn state_events(app: &App) -> Vec<ViewerStateEvent> {
    let events = app.world().resource::<Events<ViewerStateEvent>>();
    events.get_cursor().read(events).cloned().collect()
}

#[test]
fn capability_resolves_on_startup() {
    let (app, log) = test_app(SimulatedXrPlatform::supported);
    assert_eq!(
        app.world().resource::<CapabilityMonitor>().capability(),
        ArCapability::Supported
    );
    assert_eq!(log.calls().len(), 1);
}

#[test]
fn catalog_walkthrough() {
    let (mut app, log) = test_app(SimulatedXrPlatform::supported);

    select(&mut app, hammer());
    let hammer_token = live_token(&app);
    assert_eq!(load_state(&app), LoadState::Pending);
    let requests = load_requests(&app);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].token, hammer_token);
    assert_eq!(requests[0].path, "hammer.glb");

    app.world_mut().send_event(ModelAssetOutcome {
        token: hammer_token,
        result: Ok(Handle::default()),
    });
    app.update();
    assert!(matches!(load_state(&app), LoadState::Ready(_)));

    select(&mut app, wrench());
    let wrench_token = live_token(&app);
    assert!(wrench_token > hammer_token);
    assert_eq!(load_state(&app), LoadState::NoAsset);

    // A late answer for the hammer lands after the switch.
    app.world_mut().send_event(ModelAssetOutcome {
        token: hammer_token,
        result: Ok(Handle::default()),
    });
    app.update();
    assert_eq!(load_state(&app), LoadState::NoAsset);
    assert_eq!(app.world().resource::<ModelLoadState>().token(), wrench_token);

    // The wrench has nothing to place.
    request_session(&mut app, SessionAction::Enter);
    assert_eq!(session_status(&app), SessionStatus::Idle);
    assert!(log.session_requests().is_empty());

    select(&mut app, hammer());
    let session_token = live_token(&app);
    app.world_mut().send_event(ModelAssetOutcome {
        token: session_token,
        result: Ok(Handle::default()),
    });
    app.update();

    request_session(&mut app, SessionAction::Enter);
    assert_eq!(session_status(&app), SessionStatus::Entering);
    app.update();
    assert_eq!(session_status(&app), SessionStatus::Active);
    assert_eq!(
        app.world().resource::<SessionManager>().bound_token(),
        Some(session_token)
    );

    request_session(&mut app, SessionAction::Exit);
    assert_eq!(session_status(&app), SessionStatus::Exiting);
    app.update();
    assert_eq!(session_status(&app), SessionStatus::Idle);
    assert_eq!(log.session_requests().len(), 1);
}

#[test]
fn tool_without_model_issues_no_load() {
    let (mut app, _) = test_app(SimulatedXrPlatform::supported);
    select(&mut app, wrench());

    assert!(load_requests(&app).is_empty());
    assert_eq!(load_state(&app), LoadState::NoAsset);
    let scene = app.world().resource::<ComposedScene>();
    assert_eq!(
        scene.description().map(|scene| scene.content.clone()),
        Some(ViewportContent::NotAvailable {
            title: "Wrench".into()
        })
    );
}

#[test]
fn each_selection_mounts_a_fresh_instance() {
    let (mut app, _) = test_app(SimulatedXrPlatform::supported);

    select(&mut app, hammer());
    let first = instances(&mut app);
    assert_eq!(first.len(), 1);

    // Reselecting the same tool still remounts.
    select(&mut app, hammer());
    let second = instances(&mut app);
    assert_eq!(second.len(), 1);
    assert!(second[0].token > first[0].token);
    assert_eq!(second[0].token, live_token(&app));
}

#[test]
fn model_spawns_into_live_instance() {
    let (mut app, _) = test_app(SimulatedXrPlatform::supported);
    select(&mut app, hammer());
    assert_eq!(parts(&mut app, PartKind::Message), 1);

    let token = live_token(&app);
    app.world_mut().send_event(ModelAssetOutcome {
        token,
        result: Ok(Handle::default()),
    });
    app.update();

    let models = app
        .world_mut()
        .query_filtered::<Entity, With<ModelRoot>>()
        .iter(app.world())
        .count();
    assert_eq!(models, 1);
    assert_eq!(parts(&mut app, PartKind::Message), 0);
}

#[test]
fn switching_tools_forces_active_session_out() {
    let (mut app, log) = test_app(|inbox| SimulatedXrPlatform::supported(inbox).manual());
    select(&mut app, hammer());

    request_session(&mut app, SessionAction::Enter);
    let ticket = log.session_requests()[0];
    push_signal(&mut app, PlatformSignal::SessionStarted { ticket });
    assert_eq!(session_status(&app), SessionStatus::Active);
    assert_eq!(parts(&mut app, PartKind::Overlay), 1);

    select(&mut app, wrench());
    assert_eq!(session_status(&app), SessionStatus::Idle);
    assert_eq!(log.end_requests(), vec![ticket]);
    assert_eq!(parts(&mut app, PartKind::Overlay), 0);

    // The runtime's late acknowledgement changes nothing.
    push_signal(
        &mut app,
        PlatformSignal::SessionEnded {
            ticket,
            cause: SessionEndCause::Requested,
        },
    );
    assert_eq!(session_status(&app), SessionStatus::Idle);
}

#[test]
fn late_session_start_after_switch_is_ended() {
    let (mut app, log) = test_app(|inbox| SimulatedXrPlatform::supported(inbox).manual());
    select(&mut app, hammer());
    request_session(&mut app, SessionAction::Enter);
    let ticket = log.session_requests()[0];

    select(&mut app, wrench());
    assert_eq!(session_status(&app), SessionStatus::Idle);

    push_signal(&mut app, PlatformSignal::SessionStarted { ticket });
    assert_eq!(session_status(&app), SessionStatus::Idle);
    assert_eq!(parts(&mut app, PartKind::Overlay), 0);
    assert_eq!(log.end_requests(), vec![ticket, ticket]);
}

#[test]
fn exit_hides_overlay_before_acknowledgement() {
    let (mut app, log) = test_app(|inbox| SimulatedXrPlatform::supported(inbox).manual());
    select(&mut app, hammer());
    request_session(&mut app, SessionAction::Enter);
    let ticket = log.session_requests()[0];
    push_signal(&mut app, PlatformSignal::SessionStarted { ticket });

    request_session(&mut app, SessionAction::Exit);
    assert_eq!(session_status(&app), SessionStatus::Exiting);
    assert_eq!(parts(&mut app, PartKind::Overlay), 0);

    // A second entry while the exit is pending is refused.
    request_session(&mut app, SessionAction::Enter);
    assert_eq!(log.session_requests().len(), 1);

    push_signal(
        &mut app,
        PlatformSignal::SessionEnded {
            ticket,
            cause: SessionEndCause::Requested,
        },
    );
    assert_eq!(session_status(&app), SessionStatus::Idle);
}

#[test]
fn platform_termination_returns_to_idle() {
    let (mut app, log) = test_app(|inbox| SimulatedXrPlatform::supported(inbox).manual());
    select(&mut app, hammer());
    request_session(&mut app, SessionAction::Enter);
    let ticket = log.session_requests()[0];
    push_signal(&mut app, PlatformSignal::SessionStarted { ticket });

    push_signal(
        &mut app,
        PlatformSignal::SessionEnded {
            ticket,
            cause: SessionEndCause::Platform,
        },
    );
    assert_eq!(session_status(&app), SessionStatus::Idle);
    assert!(log.end_requests().is_empty());
}

#[test]
fn unsupported_runtime_refuses_entry() {
    let (mut app, log) = test_app(SimulatedXrPlatform::unsupported);
    select(&mut app, hammer());

    request_session(&mut app, SessionAction::Enter);
    assert_eq!(session_status(&app), SessionStatus::Idle);
    assert!(log.session_requests().is_empty());
    assert!(
        state_events(&app)
            .iter()
            .any(|event| matches!(event, ViewerStateEvent::SessionError { .. }))
    );
}

fn entry_refused_without_model(app: &mut App, log: &PlatformCallLog) {
    request_session(app, SessionAction::Enter);
    assert_eq!(session_status(app), SessionStatus::Idle);
    assert_eq!(app.world().resource::<SessionManager>().bound_token(), None);
    assert!(log.session_requests().is_empty());
    assert!(state_events(app).iter().any(|event| matches!(
        event,
        ViewerStateEvent::SessionError { message } if message == &SessionError::NoModel.to_string()
    )));
}

#[test]
fn entry_needs_a_model_to_place() {
    let (mut app, log) = test_app(SimulatedXrPlatform::supported);

    // Nothing selected yet.
    entry_refused_without_model(&mut app, &log);

    select(&mut app, wrench());
    entry_refused_without_model(&mut app, &log);

    select(&mut app, hammer());
    let token = live_token(&app);
    app.world_mut().send_event(ModelAssetOutcome {
        token,
        result: Err(AssetLoadError {
            path: "hammer.glb".into(),
            reason: "not found".into(),
        }),
    });
    app.update();
    entry_refused_without_model(&mut app, &log);
}

#[test]
fn entry_allowed_while_model_is_pending() {
    let (mut app, log) = test_app(SimulatedXrPlatform::supported);
    select(&mut app, hammer());
    assert_eq!(load_state(&app), LoadState::Pending);

    request_session(&mut app, SessionAction::Enter);
    assert_eq!(session_status(&app), SessionStatus::Entering);
    assert_eq!(log.session_requests().len(), 1);
}

#[test]
fn retry_reloads_under_a_new_token() {
    let (mut app, _) = test_app(SimulatedXrPlatform::supported);
    select(&mut app, hammer());
    let failed_token = live_token(&app);

    app.world_mut().send_event(ModelAssetOutcome {
        token: failed_token,
        result: Err(AssetLoadError {
            path: "hammer.glb".into(),
            reason: "not found".into(),
        }),
    });
    app.update();
    assert!(matches!(load_state(&app), LoadState::Failed(_)));
    assert!(matches!(
        app.world()
            .resource::<ComposedScene>()
            .description()
            .map(|scene| &scene.content),
        Some(ViewportContent::LoadFailed { .. })
    ));

    app.world_mut().send_event(RetryModelRequest);
    app.update();
    assert!(live_token(&app) > failed_token);
    assert_eq!(load_state(&app), LoadState::Pending);
    assert_eq!(load_requests(&app).last().map(|r| r.token), Some(live_token(&app)));
}

#[test]
fn retry_is_ignored_unless_failed() {
    let (mut app, _) = test_app(SimulatedXrPlatform::supported);
    select(&mut app, wrench());
    let token = live_token(&app);

    app.world_mut().send_event(RetryModelRequest);
    app.update();
    assert_eq!(live_token(&app), token);
}
