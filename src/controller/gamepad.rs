use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use serde::{Deserialize, Serialize};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

use super::state::{AxisType, ButtonType, ControllerSnapshot};
use super::{ControllerError, ControllerSource};

// Gamepad selection settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadSettings {
    /// Index into the list of connected gamepads; first one when `None`.
    pub gamepad_index: Option<usize>,
}

#[state]
#[derive(Debug, Clone)]
pub enum ReaderState {
    Initializing,
    Polling,
}

/// Reads an Xbox-layout gamepad through gilrs.
///
/// gilrs updates its cached gamepad state only while events are drained, so
/// every `poll` empties the event queue before sampling axes and buttons.
#[machine]
pub struct GamepadReader<S: ReaderState> {
    gilrs: Gilrs,
    active_gamepad: Option<GamepadId>,
    settings: GamepadSettings,
}

impl<S: ReaderState> GamepadReader<S> {
    pub fn settings(&self) -> &GamepadSettings {
        &self.settings
    }
}

impl GamepadReader<Initializing> {
    pub fn create(settings: Option<GamepadSettings>) -> Result<Self, ControllerError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating gamepad reader with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(ControllerError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, None, settings))
    }

    /// Picks the active gamepad and starts polling. A missing gamepad is not an
    /// error: the reader reports neutral input until one connects.
    pub fn initialize(mut self) -> GamepadReader<Polling> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, reporting neutral input until one appears");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!("  [{}] ID: {}, Name: {}", idx, id, gamepad.name());
            }

            let index = self
                .settings
                .gamepad_index
                .filter(|index| *index < gamepads.len())
                .unwrap_or(0);
            let (id, gamepad) = &gamepads[index];
            info!("Selected gamepad: {} ({})", gamepad.name(), id);
            self.active_gamepad = Some(*id);
        }

        self.transition()
    }
}

impl GamepadReader<Polling> {
    fn drain_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected if self.active_gamepad.is_none() => {
                    info!("Gamepad {} connected, selecting it", id);
                    self.active_gamepad = Some(id);
                }
                EventType::Disconnected if self.active_gamepad == Some(id) => {
                    warn!("Active gamepad {} disconnected", id);
                    self.active_gamepad = None;
                }
                EventType::ButtonPressed(button, _) => {
                    debug!("Button pressed on {}: {:?}", id, button);
                }
                EventType::ButtonReleased(button, _) => {
                    debug!("Button released on {}: {:?}", id, button);
                }
                _ => {}
            }
        }
    }
}

impl ControllerSource for GamepadReader<Polling> {
    fn poll(&mut self) -> Result<ControllerSnapshot, ControllerError> {
        self.drain_events();

        let Some(id) = self.active_gamepad else {
            return Ok(ControllerSnapshot::neutral());
        };
        let Some(gamepad) = self.gilrs.connected_gamepad(id) else {
            warn!("Gamepad {} no longer connected", id);
            self.active_gamepad = None;
            return Ok(ControllerSnapshot::neutral());
        };

        let mut snapshot = ControllerSnapshot::neutral();
        for (axis, gilrs_axis) in AXES {
            let mut value = gamepad.value(gilrs_axis) as f64;
            // gilrs reports stick Y as positive-up
            if matches!(axis, AxisType::LeftY | AxisType::RightY) {
                value = -value;
            }
            snapshot.set_axis(axis, value.clamp(-1.0, 1.0));
        }
        for button in ButtonType::ALL {
            snapshot.set_button(button, gamepad.is_pressed(map_button(button)));
        }

        Ok(snapshot)
    }
}

const AXES: [(AxisType, Axis); 6] = [
    (AxisType::LeftX, Axis::LeftStickX),
    (AxisType::LeftY, Axis::LeftStickY),
    (AxisType::RightX, Axis::RightStickX),
    (AxisType::RightY, Axis::RightStickY),
    (AxisType::LeftTrigger, Axis::LeftZ),
    (AxisType::RightTrigger, Axis::RightZ),
];

// Helper function to map our ButtonType onto the gilrs layout
fn map_button(button: ButtonType) -> Button {
    match button {
        ButtonType::A => Button::South,
        ButtonType::B => Button::East,
        ButtonType::X => Button::West,
        ButtonType::Y => Button::North,
        ButtonType::Back => Button::Select,
        ButtonType::Start => Button::Start,
        ButtonType::LeftBumper => Button::LeftTrigger,
        ButtonType::RightBumper => Button::RightTrigger,
        ButtonType::LeftStick => Button::LeftThumb,
        ButtonType::RightStick => Button::RightThumb,
        ButtonType::DPadUp => Button::DPadUp,
        ButtonType::DPadDown => Button::DPadDown,
        ButtonType::DPadLeft => Button::DPadLeft,
        ButtonType::DPadRight => Button::DPadRight,
        ButtonType::Guide => Button::Mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_buttons_follow_xbox_layout() {
        assert_eq!(map_button(ButtonType::A), Button::South);
        assert_eq!(map_button(ButtonType::Y), Button::North);
        assert_eq!(map_button(ButtonType::Back), Button::Select);
        assert_eq!(map_button(ButtonType::LeftBumper), Button::LeftTrigger);
        assert_eq!(map_button(ButtonType::LeftStick), Button::LeftThumb);
    }
}
