use bevy::prelude::*;

use crate::catalog::ToolCatalog;
use crate::engine::selection::{RetryModelRequest, SelectionSource, ToolSelectionEvent};
use crate::engine::xr::capability::CapabilityCheckRequest;
use crate::engine::xr::session::{ArSessionRequest, RequestSource, SessionAction};

const DIGIT_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Catalog position selected by a digit key, if any.
pub fn catalog_index(key: KeyCode) -> Option<usize> {
    DIGIT_KEYS.iter().position(|digit| *digit == key)
}

/// Digits select tools, Enter/Escape drive the session, F5 re-checks support
/// and R retries a failed model.
pub fn keyboard_shortcuts(
    keys: Res<ButtonInput<KeyCode>>,
    catalog: Option<Res<ToolCatalog>>,
    mut selections: EventWriter<ToolSelectionEvent>,
    mut sessions: EventWriter<ArSessionRequest>,
    mut checks: EventWriter<CapabilityCheckRequest>,
    mut retries: EventWriter<RetryModelRequest>,
) {
    for key in keys.get_just_pressed() {
        if let Some(index) = catalog_index(*key) {
            match catalog.as_deref().and_then(|catalog| catalog.nth(index)) {
                Some(tool) => {
                    selections.write(ToolSelectionEvent {
                        tool: tool.clone(),
                        source: SelectionSource::Keyboard,
                    });
                }
                None => debug!(index, "No tool at catalog position"),
            }
            continue;
        }

        match key {
            KeyCode::Enter => {
                sessions.write(ArSessionRequest {
                    action: SessionAction::Enter,
                    source: RequestSource::Keyboard,
                });
            }
            KeyCode::Escape => {
                sessions.write(ArSessionRequest {
                    action: SessionAction::Exit,
                    source: RequestSource::Keyboard,
                });
            }
            KeyCode::F5 => {
                checks.write(CapabilityCheckRequest);
            }
            KeyCode::KeyR => {
                retries.write(RetryModelRequest);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_map_to_zero_based_positions() {
        assert_eq!(catalog_index(KeyCode::Digit1), Some(0));
        assert_eq!(catalog_index(KeyCode::Digit9), Some(8));
        assert_eq!(catalog_index(KeyCode::Digit0), None);
        assert_eq!(catalog_index(KeyCode::KeyA), None);
    }
}
