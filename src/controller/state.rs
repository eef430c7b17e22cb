use serde::{Deserialize, Serialize};
use std::fmt;

/// Buttons of an Xbox-layout controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonType {
    A,
    B,
    X,
    Y,
    Back,
    Start,
    LeftBumper,
    RightBumper,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Guide,
}

impl ButtonType {
    pub const ALL: [ButtonType; 15] = [
        ButtonType::A,
        ButtonType::B,
        ButtonType::X,
        ButtonType::Y,
        ButtonType::Back,
        ButtonType::Start,
        ButtonType::LeftBumper,
        ButtonType::RightBumper,
        ButtonType::LeftStick,
        ButtonType::RightStick,
        ButtonType::DPadUp,
        ButtonType::DPadDown,
        ButtonType::DPadLeft,
        ButtonType::DPadRight,
        ButtonType::Guide,
    ];

    fn mask(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for ButtonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Analog axes, reported in HID convention: Y axes are positive when the stick
/// is pushed down/back, triggers run from 0.0 (released) to 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisType {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

/// One tick's worth of controller state.
///
/// Buttons are stored as a bitmask so a snapshot is `Copy` and never allocates
/// inside the control loop.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControllerSnapshot {
    pub left_x: f64,
    pub left_y: f64,
    pub right_x: f64,
    pub right_y: f64,
    pub left_trigger: f64,
    pub right_trigger: f64,
    pressed: u16,
}

impl ControllerSnapshot {
    /// Neutral snapshot: sticks centred, nothing pressed.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Builder helper, mostly for tests and scripted input.
    pub fn with_axis(mut self, axis: AxisType, value: f64) -> Self {
        self.set_axis(axis, value);
        self
    }

    pub fn with_button(mut self, button: ButtonType) -> Self {
        self.set_button(button, true);
        self
    }

    pub fn axis(&self, axis: AxisType) -> f64 {
        match axis {
            AxisType::LeftX => self.left_x,
            AxisType::LeftY => self.left_y,
            AxisType::RightX => self.right_x,
            AxisType::RightY => self.right_y,
            AxisType::LeftTrigger => self.left_trigger,
            AxisType::RightTrigger => self.right_trigger,
        }
    }

    pub fn set_axis(&mut self, axis: AxisType, value: f64) {
        let slot = match axis {
            AxisType::LeftX => &mut self.left_x,
            AxisType::LeftY => &mut self.left_y,
            AxisType::RightX => &mut self.right_x,
            AxisType::RightY => &mut self.right_y,
            AxisType::LeftTrigger => &mut self.left_trigger,
            AxisType::RightTrigger => &mut self.right_trigger,
        };
        *slot = value;
    }

    pub fn is_pressed(&self, button: ButtonType) -> bool {
        self.pressed & button.mask() != 0
    }

    pub fn set_button(&mut self, button: ButtonType, pressed: bool) {
        if pressed {
            self.pressed |= button.mask();
        } else {
            self.pressed &= !button.mask();
        }
    }

    pub fn pressed_buttons(&self) -> impl Iterator<Item = ButtonType> + '_ {
        ButtonType::ALL
            .into_iter()
            .filter(move |button| self.is_pressed(*button))
    }
}
