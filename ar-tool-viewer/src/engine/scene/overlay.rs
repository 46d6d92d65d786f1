use bevy::ecs::system::EntityCommands;
use bevy::prelude::*;
use constants::overlay::{
    EXIT_BUTTON_COLOR, EXIT_BUTTON_MARGIN_PX, MESSAGE_COLOR, MESSAGE_FONT_SIZE,
};

use crate::engine::scene::composer::{SessionOverlay, ViewportContent};
use crate::engine::selection::RetryModelRequest;
use crate::engine::xr::session::{ArSessionRequest, RequestSource, SessionAction};

#[derive(Component)]
pub struct ExitArButton;

#[derive(Component)]
pub struct RetryModelButton;

/// Full-viewport AR overlay: status hint plus the exit control.
pub fn spawn_session_overlay(commands: &mut EntityCommands, overlay: &SessionOverlay) {
    commands
        .insert(Node {
            position_type: PositionType::Absolute,
            left: Val::Px(0.0),
            right: Val::Px(0.0),
            top: Val::Px(0.0),
            bottom: Val::Px(0.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new(overlay.hint.clone()),
                TextFont {
                    font_size: MESSAGE_FONT_SIZE,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(EXIT_BUTTON_MARGIN_PX),
                    left: Val::Px(EXIT_BUTTON_MARGIN_PX),
                    ..default()
                },
            ));
            parent
                .spawn((
                    Button,
                    ExitArButton,
                    Node {
                        position_type: PositionType::Absolute,
                        bottom: Val::Px(EXIT_BUTTON_MARGIN_PX),
                        right: Val::Px(EXIT_BUTTON_MARGIN_PX),
                        padding: UiRect::axes(Val::Px(16.0), Val::Px(8.0)),
                        ..default()
                    },
                    BackgroundColor(EXIT_BUTTON_COLOR),
                    BorderRadius::all(Val::Px(6.0)),
                ))
                .with_children(|button| {
                    button.spawn((Text::new(overlay.exit_label.clone()), TextColor(Color::WHITE)));
                });
        });
}

/// Centered status text for every content variant that has one.
pub fn spawn_viewport_message(commands: &mut EntityCommands, content: &ViewportContent) {
    let Some(message) = content.message() else {
        return;
    };
    let retry = matches!(content, ViewportContent::LoadFailed { .. });

    commands
        .insert(Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            row_gap: Val::Px(12.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new(message),
                TextFont {
                    font_size: MESSAGE_FONT_SIZE,
                    ..default()
                },
                TextColor(MESSAGE_COLOR),
            ));
            if retry {
                parent
                    .spawn((
                        Button,
                        RetryModelButton,
                        Node {
                            padding: UiRect::axes(Val::Px(12.0), Val::Px(6.0)),
                            border: UiRect::all(Val::Px(1.0)),
                            ..default()
                        },
                        BorderColor(MESSAGE_COLOR),
                    ))
                    .with_children(|button| {
                        button.spawn((Text::new("Retry"), TextColor(MESSAGE_COLOR)));
                    });
            }
        });
}

pub fn exit_button_system(
    interactions: Query<&Interaction, (Changed<Interaction>, With<ExitArButton>)>,
    mut requests: EventWriter<ArSessionRequest>,
) {
    for interaction in &interactions {
        if *interaction == Interaction::Pressed {
            requests.write(ArSessionRequest {
                action: SessionAction::Exit,
                source: RequestSource::Overlay,
            });
        }
    }
}

pub fn retry_button_system(
    interactions: Query<&Interaction, (Changed<Interaction>, With<RetryModelButton>)>,
    mut requests: EventWriter<RetryModelRequest>,
) {
    for interaction in &interactions {
        if *interaction == Interaction::Pressed {
            requests.write(RetryModelRequest);
        }
    }
}
