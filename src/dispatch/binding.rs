use std::fmt;

use super::condition::Condition;
use crate::drivetrain::SysIdRoutine;

/// When a binding's action runs relative to its condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActivationMode {
    /// Holds the drivetrain every tick the condition is true, released the
    /// first tick it reads false.
    WhileTrue,
    /// Fires once on each false → true transition.
    OnRisingEdge,
    /// Fires once on every transition, either direction.
    OnChange,
}

impl fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationMode::WhileTrue => write!(f, "while-true"),
            ActivationMode::OnRisingEdge => write!(f, "on-true"),
            ActivationMode::OnChange => write!(f, "on-change"),
        }
    }
}

/// Effects a binding can request from the drivetrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RobotAction {
    Brake,
    /// Point the modules along the left stick direction.
    PointWheels,
    SeedFieldCentric,
    SysId(SysIdRoutine),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub condition: Condition,
    pub mode: ActivationMode,
    pub action: RobotAction,
}

impl Binding {
    pub fn new(condition: Condition, mode: ActivationMode, action: RobotAction) -> Self {
        Self {
            condition,
            mode,
            action,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {:?}", self.condition, self.mode, self.action)
    }
}
