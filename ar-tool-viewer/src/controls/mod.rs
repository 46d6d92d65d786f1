//! Presentation hooks for whatever surface drives the viewer.
//!
//! [`ControlsSnapshot`] is the single view of what the tool list and the AR
//! buttons should show. Native builds render it as a small Bevy UI panel and
//! accept keyboard shortcuts; web builds publish it over RPC.

use bevy::prelude::*;
use constants::overlay::{
    CONTROLS_MARGIN_PX, ENTER_BUTTON_COLOR, ENTER_BUTTON_DISABLED_COLOR, ENTER_LABEL_AVAILABLE,
    ENTER_LABEL_CHECKING, ENTER_LABEL_NO_MODEL, ENTER_LABEL_UNAVAILABLE,
};
use serde::Serialize;

use crate::catalog::{ToolCatalog, ToolId};
use crate::engine::loading::model_load::ModelLoadState;
use crate::engine::selection::SelectionController;
use crate::engine::xr::capability::{ArCapability, CapabilityMonitor};
use crate::engine::xr::session::{
    ArSessionRequest, RequestSource, SessionAction, SessionManager, SessionStatus,
};

/// Keyboard shortcuts for native builds.
pub mod shortcuts;

/// State of the enter-AR control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryControl {
    #[default]
    Checking,
    Available,
    Unavailable,
    /// AR is supported but the selected tool has nothing to place.
    NoModel,
}

impl EntryControl {
    pub fn new(capability: ArCapability, placeable: bool) -> Self {
        match capability {
            ArCapability::Unknown => Self::Checking,
            ArCapability::Unsupported => Self::Unavailable,
            ArCapability::Supported if placeable => Self::Available,
            ArCapability::Supported => Self::NoModel,
        }
    }

    pub fn current(
        monitor: &CapabilityMonitor,
        controller: &SelectionController,
        model_load: &ModelLoadState,
    ) -> Self {
        Self::new(
            monitor.capability(),
            model_load.is_placeable(controller.live_token()),
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Checking => ENTER_LABEL_CHECKING,
            Self::Available => ENTER_LABEL_AVAILABLE,
            Self::Unavailable => ENTER_LABEL_UNAVAILABLE,
            Self::NoModel => ENTER_LABEL_NO_MODEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolEntry {
    pub id: ToolId,
    pub title: String,
    pub has_model: bool,
}

/// Everything a tool list plus enter/exit buttons need to render.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ControlsSnapshot {
    pub tools: Vec<ToolEntry>,
    pub selected_id: Option<ToolId>,
    pub entry: EntryControl,
    /// The exit control is shown only while a session is active.
    pub exit_visible: bool,
}

impl ControlsSnapshot {
    pub fn capture(
        catalog: Option<&ToolCatalog>,
        controller: &SelectionController,
        model_load: &ModelLoadState,
        monitor: &CapabilityMonitor,
        session: &SessionManager,
    ) -> Self {
        let tools = catalog
            .map(|catalog| {
                catalog
                    .tools()
                    .iter()
                    .map(|tool| ToolEntry {
                        id: tool.id.clone(),
                        title: tool.title.clone(),
                        has_model: tool.model_path().is_some(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            tools,
            selected_id: controller.selected_tool().map(|tool| tool.id.clone()),
            entry: EntryControl::current(monitor, controller, model_load),
            exit_visible: session.status() == SessionStatus::Active,
        }
    }
}

#[derive(Component)]
pub struct EnterArButton;

#[derive(Component)]
pub struct EnterArLabel;

pub fn spawn_controls_panel(mut commands: Commands) {
    commands
        .spawn((
            Name::new("Controls"),
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(CONTROLS_MARGIN_PX),
                left: Val::Px(CONTROLS_MARGIN_PX),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Button,
                    EnterArButton,
                    Node {
                        padding: UiRect::axes(Val::Px(14.0), Val::Px(8.0)),
                        ..default()
                    },
                    BackgroundColor(ENTER_BUTTON_DISABLED_COLOR),
                    BorderRadius::all(Val::Px(6.0)),
                ))
                .with_children(|button| {
                    button.spawn((
                        EnterArLabel,
                        Text::new(EntryControl::Checking.label()),
                        TextColor(Color::WHITE),
                    ));
                });
        });
}

/// Keep the enter button in step with capability, model and session state.
///
/// The button is hidden while a session is in flight so a second entry can
/// not be requested from it, and while the selected tool has no model.
pub fn update_enter_button(
    monitor: Res<CapabilityMonitor>,
    controller: Res<SelectionController>,
    model_load: Res<ModelLoadState>,
    session: Res<SessionManager>,
    mut buttons: Query<(&mut BackgroundColor, &mut Visibility), With<EnterArButton>>,
    mut labels: Query<&mut Text, With<EnterArLabel>>,
) {
    if !monitor.is_changed() && !model_load.is_changed() && !session.is_changed() {
        return;
    }
    let entry = EntryControl::current(&monitor, &controller, &model_load);

    for (mut background, mut visibility) in &mut buttons {
        background.0 = match entry {
            EntryControl::Available => ENTER_BUTTON_COLOR,
            _ => ENTER_BUTTON_DISABLED_COLOR,
        };
        *visibility = if session.is_idle() && entry != EntryControl::NoModel {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
    for mut text in &mut labels {
        text.0 = entry.label().to_string();
    }
}

pub fn enter_button_system(
    buttons: Query<&Interaction, (Changed<Interaction>, With<EnterArButton>)>,
    monitor: Res<CapabilityMonitor>,
    controller: Res<SelectionController>,
    model_load: Res<ModelLoadState>,
    session: Res<SessionManager>,
    mut requests: EventWriter<ArSessionRequest>,
) {
    for interaction in &buttons {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let entry = EntryControl::current(&monitor, &controller, &model_load);
        if entry != EntryControl::Available || !session.is_idle() {
            debug!(entry = ?entry, status = %session.status(), "Enter AR button inactive");
            continue;
        }
        requests.write(ArSessionRequest {
            action: SessionAction::Enter,
            source: RequestSource::Button,
        });
    }
}
