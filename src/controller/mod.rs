//! Controller collaborator boundary
//!
//! The teleop loop samples the operator's controller exactly once per tick
//! through [`ControllerSource`]. Two sources exist:
//!
//! 1. [`gamepad`] - a physical Xbox-layout gamepad read through gilrs
//! 2. [`scripted`] - a replayed sequence of snapshots for tests and dry runs
//!
//! ```text
//! Gamepad ──► GamepadReader ──► ControllerSnapshot ──► Input Shaper / Dispatcher
//! ```

pub mod gamepad;
pub mod scripted;
pub mod state;

pub use gamepad::{GamepadReader, GamepadSettings};
pub use scripted::ScriptedController;
pub use state::{AxisType, ButtonType, ControllerSnapshot};

/// Errors raised by controller sources.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Failed to initialize controller: {0}")]
    InitializationError(String),

    #[error("Controller disconnected: {0}")]
    Disconnected(String),
}

/// Anything that can be polled for one snapshot of controller state per tick.
pub trait ControllerSource {
    fn poll(&mut self) -> Result<ControllerSnapshot, ControllerError>;
}

impl<T: ControllerSource + ?Sized> ControllerSource for Box<T> {
    fn poll(&mut self) -> Result<ControllerSnapshot, ControllerError> {
        (**self).poll()
    }
}
