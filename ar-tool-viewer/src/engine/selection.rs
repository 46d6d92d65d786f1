//! Tool selection and remount token issuance.
//!
//! Every selection, including re-selecting the current tool, opens a new viewer
//! generation identified by a [`RemountToken`]. Async results tagged with an
//! older token are discarded by their consumers.

use std::fmt;

use bevy::prelude::*;
use serde::Serialize;

use crate::catalog::ToolRecord;
use crate::engine::loading::model_load::{LoadState, ModelLoadRequest, ModelLoadState};
use crate::engine::xr::platform::XrPlatform;
use crate::engine::xr::session::SessionManager;

/// Generation tag of one viewer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct RemountToken(u64);

impl RemountToken {
    pub const INITIAL: Self = Self(0);

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RemountToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Immutable snapshot of the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub tool: Option<ToolRecord>,
    pub token: RemountToken,
}

/// Single writer of the selection and the live remount token.
#[derive(Resource, Debug, Default)]
pub struct SelectionController {
    current: Selection,
}

impl SelectionController {
    /// Replace the selected tool and issue a fresh token, strictly greater than
    /// every token issued before.
    pub fn select_tool(&mut self, tool: ToolRecord) -> Selection {
        self.current = Selection {
            tool: Some(tool),
            token: RemountToken(self.current.token.0 + 1),
        };
        self.current.clone()
    }

    pub fn selection(&self) -> &Selection {
        &self.current
    }

    pub fn live_token(&self) -> RemountToken {
        self.current.token
    }

    pub fn is_live(&self, token: RemountToken) -> bool {
        self.current.token == token
    }

    pub fn selected_tool(&self) -> Option<&ToolRecord> {
        self.current.tool.as_ref()
    }
}

/// Where a selection came from, for logs and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Rpc,
    Keyboard,
    Startup,
    Retry,
}

/// Request to select a tool. The id must already be resolved against the catalog.
#[derive(Event, Debug, Clone)]
pub struct ToolSelectionEvent {
    pub tool: ToolRecord,
    pub source: SelectionSource,
}

/// Reload the current tool after a failed model load.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct RetryModelRequest;

/// A retry re-selects the tool, so the reload runs under a fresh token.
/// Ignored unless the live load has failed.
pub fn handle_retry_requests(
    mut requests: EventReader<RetryModelRequest>,
    controller: Res<SelectionController>,
    model_load: Res<ModelLoadState>,
    mut selections: EventWriter<ToolSelectionEvent>,
) {
    if requests.read().count() == 0 {
        return;
    }
    let failed = matches!(model_load.state(), LoadState::Failed(_))
        && controller.is_live(model_load.token());
    match (failed, controller.selected_tool()) {
        (true, Some(tool)) => {
            selections.write(ToolSelectionEvent {
                tool: tool.clone(),
                source: SelectionSource::Retry,
            });
        }
        _ => debug!(state = model_load.state().label(), "Ignoring retry request"),
    }
}

/// Apply selections in arrival order.
///
/// For each one the session bound to the outgoing token is forced out before
/// the incoming token's load starts.
pub fn handle_tool_selection_events(
    mut events: EventReader<ToolSelectionEvent>,
    mut controller: ResMut<SelectionController>,
    mut model_load: ResMut<ModelLoadState>,
    mut session: ResMut<SessionManager>,
    mut platform: NonSendMut<XrPlatform>,
    mut load_requests: EventWriter<ModelLoadRequest>,
) {
    for event in events.read() {
        let previous = controller.live_token();
        let selection = controller.select_tool(event.tool.clone());

        if session.force_exit(platform.as_dyn()) {
            info!(token = %previous, "AR session force-exited by tool switch");
        }

        info!(
            token = %selection.token,
            tool = %event.tool.id,
            source = ?event.source,
            "Tool selected"
        );

        if let LoadState::Pending = model_load.begin_load(&selection) {
            if let Some(path) = event.tool.model_path() {
                load_requests.write(ModelLoadRequest {
                    token: selection.token,
                    path: path.to_owned(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hammer() -> ToolRecord {
        ToolRecord::new("1", "Hammer", Some("hammer.glb"))
    }

    #[test]
    fn starts_without_a_tool() {
        let controller = SelectionController::default();
        assert!(controller.selected_tool().is_none());
        assert_eq!(controller.live_token(), RemountToken::INITIAL);
    }

    #[test]
    fn tokens_strictly_increase_across_selections() {
        let mut controller = SelectionController::default();
        let mut last = controller.live_token();
        for tool in [
            hammer(),
            ToolRecord::new("2", "Wrench", None),
            hammer(),
            hammer(),
        ] {
            let selection = controller.select_tool(tool);
            assert!(selection.token > last);
            last = selection.token;
        }
    }

    #[test]
    fn reselecting_the_same_tool_issues_a_new_token() {
        let mut controller = SelectionController::default();
        let first = controller.select_tool(hammer());
        let second = controller.select_tool(hammer());
        assert_eq!(first.tool, second.tool);
        assert_ne!(first.token, second.token);
        assert!(!controller.is_live(first.token));
        assert!(controller.is_live(second.token));
    }
}
