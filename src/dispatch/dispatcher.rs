use tracing::{debug, info};

use super::binding::{ActivationMode, Binding, RobotAction};
use crate::controller::ControllerSnapshot;

/// Result of evaluating the binding table for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dispatch {
    /// While-true action holding the drivetrain this tick. `None` means the
    /// default drive command runs.
    pub continuous: Option<RobotAction>,
    /// Edge-triggered actions that fired this tick, in binding order.
    pub fired: Vec<RobotAction>,
}

/// Evaluates a fixed table of bindings once per tick.
///
/// Every condition's previous value starts out `false`, so a button already
/// held on the first tick counts as a fresh press.
///
/// While-true bindings share the drivetrain. The most recently activated one
/// that is still held owns it; releasing it hands the drivetrain back to the
/// next most recent one still held, or to the default drive command.
/// Command-based robot frameworks instead cancel an interrupted command for
/// good, and let a one-shot interrupt a held one; this dispatcher does
/// neither.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    bindings: Vec<Binding>,
    previous: Vec<bool>,
    // indices of held while-true bindings, oldest first
    active: Vec<usize>,
}

impl ActionDispatcher {
    pub fn new(bindings: Vec<Binding>) -> Self {
        info!("Action dispatcher configured with {} bindings", bindings.len());
        for binding in &bindings {
            debug!("  {}", binding);
        }
        let previous = vec![false; bindings.len()];
        Self {
            bindings,
            previous,
            active: Vec::new(),
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Action currently holding the drivetrain, if any.
    pub fn active_action(&self) -> Option<RobotAction> {
        self.active.last().map(|&index| self.bindings[index].action)
    }

    pub fn dispatch(&mut self, snapshot: &ControllerSnapshot) -> Dispatch {
        let mut fired = Vec::new();

        for (index, binding) in self.bindings.iter().enumerate() {
            let now = binding.condition.evaluate(snapshot);
            let before = std::mem::replace(&mut self.previous[index], now);

            match binding.mode {
                ActivationMode::WhileTrue if now && !before => {
                    if let Some(&holder) = self.active.last() {
                        debug!("{} interrupts {}", binding, self.bindings[holder]);
                    }
                    info!("Activated: {}", binding);
                    self.active.push(index);
                }
                ActivationMode::WhileTrue if !now && before => {
                    info!("Released: {}", binding);
                    self.active.retain(|&held| held != index);
                }
                ActivationMode::OnRisingEdge if now && !before => {
                    info!("Fired: {}", binding);
                    fired.push(binding.action);
                }
                ActivationMode::OnChange if now != before => {
                    info!("Fired: {} ({} -> {})", binding, before, now);
                    fired.push(binding.action);
                }
                _ => {}
            }
        }

        Dispatch {
            continuous: self.active_action(),
            fired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ButtonType;
    use crate::dispatch::Condition;

    fn pressed(buttons: &[ButtonType]) -> ControllerSnapshot {
        buttons
            .iter()
            .fold(ControllerSnapshot::neutral(), |snapshot, button| {
                snapshot.with_button(*button)
            })
    }

    #[test]
    fn while_true_releases_on_first_false_tick() {
        let mut dispatcher =
            ActionDispatcher::new(vec![Condition::button(ButtonType::A).while_true(RobotAction::Brake)]);

        assert_eq!(dispatcher.dispatch(&pressed(&[])).continuous, None);
        for _ in 0..3 {
            assert_eq!(
                dispatcher.dispatch(&pressed(&[ButtonType::A])).continuous,
                Some(RobotAction::Brake)
            );
        }
        let released = dispatcher.dispatch(&pressed(&[]));
        assert_eq!(released.continuous, None);
        assert!(released.fired.is_empty());
    }

    #[test]
    fn rising_edge_fires_once_per_press() {
        let mut dispatcher = ActionDispatcher::new(vec![
            Condition::button(ButtonType::LeftBumper).on_true(RobotAction::SeedFieldCentric)
        ]);
        let held = pressed(&[ButtonType::LeftBumper]);

        let fired: Vec<usize> = [held, held, held, pressed(&[]), held]
            .iter()
            .map(|snapshot| dispatcher.dispatch(snapshot).fired.len())
            .collect();
        assert_eq!(fired, vec![1, 0, 0, 0, 1]);
    }

    #[test]
    fn on_change_fires_on_both_edges() {
        let mut dispatcher = ActionDispatcher::new(vec![
            Condition::button(ButtonType::LeftStick).on_change(RobotAction::SeedFieldCentric)
        ]);
        let held = pressed(&[ButtonType::LeftStick]);
        let idle = pressed(&[]);

        let fired: Vec<usize> = [idle, held, held, idle, idle, held]
            .iter()
            .map(|snapshot| dispatcher.dispatch(snapshot).fired.len())
            .collect();
        assert_eq!(fired, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn composite_drops_with_either_button() {
        let routine = RobotAction::Brake;
        let mut dispatcher = ActionDispatcher::new(vec![Condition::button(ButtonType::Back)
            .and(ButtonType::Y.into())
            .while_true(routine)]);

        assert_eq!(dispatcher.dispatch(&pressed(&[ButtonType::Back])).continuous, None);
        assert_eq!(
            dispatcher
                .dispatch(&pressed(&[ButtonType::Back, ButtonType::Y]))
                .continuous,
            Some(routine)
        );
        assert_eq!(dispatcher.dispatch(&pressed(&[ButtonType::Y])).continuous, None);
        assert_eq!(
            dispatcher
                .dispatch(&pressed(&[ButtonType::Back, ButtonType::Y]))
                .continuous,
            Some(routine)
        );
        assert_eq!(dispatcher.dispatch(&pressed(&[ButtonType::Back])).continuous, None);
    }

    #[test]
    fn latest_while_true_wins_and_earlier_resumes() {
        let mut dispatcher = ActionDispatcher::new(vec![
            Condition::button(ButtonType::A).while_true(RobotAction::Brake),
            Condition::button(ButtonType::B).while_true(RobotAction::PointWheels),
        ]);

        assert_eq!(
            dispatcher.dispatch(&pressed(&[ButtonType::A])).continuous,
            Some(RobotAction::Brake)
        );
        assert_eq!(
            dispatcher
                .dispatch(&pressed(&[ButtonType::A, ButtonType::B]))
                .continuous,
            Some(RobotAction::PointWheels)
        );
        assert_eq!(
            dispatcher.dispatch(&pressed(&[ButtonType::A])).continuous,
            Some(RobotAction::Brake)
        );
        assert_eq!(dispatcher.dispatch(&pressed(&[])).continuous, None);
    }

    #[test]
    fn edge_bindings_fire_alongside_held_action() {
        let mut dispatcher = ActionDispatcher::new(vec![
            Condition::button(ButtonType::A).while_true(RobotAction::Brake),
            Condition::button(ButtonType::LeftBumper).on_true(RobotAction::SeedFieldCentric),
        ]);

        dispatcher.dispatch(&pressed(&[ButtonType::A]));
        let both = dispatcher.dispatch(&pressed(&[ButtonType::A, ButtonType::LeftBumper]));
        assert_eq!(both.continuous, Some(RobotAction::Brake));
        assert_eq!(both.fired, vec![RobotAction::SeedFieldCentric]);
    }

    #[test]
    fn button_held_from_first_tick_counts_as_press() {
        let mut dispatcher = ActionDispatcher::new(vec![
            Condition::button(ButtonType::LeftBumper).on_true(RobotAction::SeedFieldCentric)
        ]);
        let first = dispatcher.dispatch(&pressed(&[ButtonType::LeftBumper]));
        assert_eq!(first.fired, vec![RobotAction::SeedFieldCentric]);
    }
}
