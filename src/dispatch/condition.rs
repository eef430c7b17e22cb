use std::fmt;

use super::binding::{ActivationMode, Binding, RobotAction};
use crate::controller::{ButtonType, ControllerSnapshot};

/// Boolean predicate over the buttons of one controller snapshot.
///
/// Atomic conditions test a single button; [`Condition::and`] combines two
/// conditions into one that holds only while both do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    Button(ButtonType),
    And(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn button(button: ButtonType) -> Self {
        Condition::Button(button)
    }

    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn evaluate(&self, snapshot: &ControllerSnapshot) -> bool {
        match self {
            Condition::Button(button) => snapshot.is_pressed(*button),
            Condition::And(left, right) => left.evaluate(snapshot) && right.evaluate(snapshot),
        }
    }

    pub fn while_true(self, action: RobotAction) -> Binding {
        Binding::new(self, ActivationMode::WhileTrue, action)
    }

    pub fn on_true(self, action: RobotAction) -> Binding {
        Binding::new(self, ActivationMode::OnRisingEdge, action)
    }

    pub fn on_change(self, action: RobotAction) -> Binding {
        Binding::new(self, ActivationMode::OnChange, action)
    }
}

impl From<ButtonType> for Condition {
    fn from(button: ButtonType) -> Self {
        Condition::Button(button)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Button(button) => write!(f, "{}", button),
            Condition::And(left, right) => write!(f, "{}+{}", left, right),
        }
    }
}
