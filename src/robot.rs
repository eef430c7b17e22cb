//! Robot container: wires the operator controller, the input shaper, the
//! binding table and the drivetrain together, and runs one control tick.
//!
//! Everything the tick needs is owned here and built once at startup. There is
//! no global default command: the default field-centric drive request is
//! produced inline whenever no while-true binding holds the drivetrain.

use tracing::{debug, info};

use crate::config::TeleopConfig;
use crate::controller::{ButtonType, ControllerError, ControllerSnapshot, ControllerSource};
use crate::dispatch::{ActionDispatcher, Binding, Condition, RobotAction};
use crate::drivetrain::{
    DriveRequest, DriveRequestType, Drivetrain, DrivetrainError, FieldCentric, SysIdDirection,
    SysIdPhase, SysIdRoutine, Telemetry,
};
use crate::shaping::{InputShaper, RampState, SpeedLimits, VelocityCommand};

#[derive(Debug, thiserror::Error)]
pub enum TeleopError {
    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    #[error("Drivetrain error: {0}")]
    Drivetrain(#[from] DrivetrainError),
}

/// What one tick did, for the loop's bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub snapshot: ControllerSnapshot,
    pub request: DriveRequest,
    /// Action holding the drivetrain, `None` while the default drive runs.
    pub held: Option<RobotAction>,
    pub fired: Vec<RobotAction>,
}

/// The operator binding table.
///
/// | Input                 | Mode       | Action                         |
/// |-----------------------|------------|--------------------------------|
/// | A                     | while held | brake                          |
/// | B                     | while held | point wheels along left stick  |
/// | Back + Y              | while held | SysId dynamic forward          |
/// | Back + X              | while held | SysId dynamic reverse          |
/// | Start + Y             | while held | SysId quasistatic forward      |
/// | Start + X             | while held | SysId quasistatic reverse      |
/// | Left bumper           | on press   | reseed field-centric heading   |
/// | Left stick press      | on change  | reseed field-centric heading   |
pub fn configure_bindings() -> Vec<Binding> {
    let sysid = |phase, direction| RobotAction::SysId(SysIdRoutine { phase, direction });
    let chord = |modifier: ButtonType, action: ButtonType| {
        Condition::button(modifier).and(Condition::button(action))
    };

    vec![
        Condition::button(ButtonType::A).while_true(RobotAction::Brake),
        Condition::button(ButtonType::B).while_true(RobotAction::PointWheels),
        chord(ButtonType::Back, ButtonType::Y)
            .while_true(sysid(SysIdPhase::Dynamic, SysIdDirection::Forward)),
        chord(ButtonType::Back, ButtonType::X)
            .while_true(sysid(SysIdPhase::Dynamic, SysIdDirection::Reverse)),
        chord(ButtonType::Start, ButtonType::Y)
            .while_true(sysid(SysIdPhase::Quasistatic, SysIdDirection::Forward)),
        chord(ButtonType::Start, ButtonType::X)
            .while_true(sysid(SysIdPhase::Quasistatic, SysIdDirection::Reverse)),
        Condition::button(ButtonType::LeftBumper).on_true(RobotAction::SeedFieldCentric),
        Condition::button(ButtonType::LeftStick).on_change(RobotAction::SeedFieldCentric),
    ]
}

/// Heading the modules point at while B is held: along the left stick,
/// field-forward when the stick is centred.
pub fn point_direction(snapshot: &ControllerSnapshot) -> f64 {
    let (x, y) = (-snapshot.left_y, -snapshot.left_x);
    if x.hypot(y) < f64::EPSILON {
        0.0
    } else {
        y.atan2(x)
    }
}

pub struct RobotContainer {
    controller: Box<dyn ControllerSource>,
    drivetrain: Box<dyn Drivetrain>,
    shaper: InputShaper,
    ramp: RampState,
    dispatcher: ActionDispatcher,
    limits: SpeedLimits,
    request_deadband: f64,
    drive_request_type: DriveRequestType,
}

impl RobotContainer {
    pub fn new(
        config: &TeleopConfig,
        controller: Box<dyn ControllerSource>,
        mut drivetrain: Box<dyn Drivetrain>,
    ) -> Self {
        let limits = config.drive.limits();
        info!(
            "Building robot container: max speed {:.2} m/s, max angular rate {:.2} rad/s",
            limits.max_speed, limits.max_angular_rate
        );

        drivetrain.register_telemetry(Telemetry::new(limits.max_speed).into_sink());

        Self {
            controller,
            drivetrain,
            shaper: InputShaper::new(config.shaping.clone()),
            ramp: RampState::default(),
            dispatcher: ActionDispatcher::new(configure_bindings()),
            limits,
            request_deadband: config.drive.request_deadband,
            drive_request_type: config.drive.drive_request_type,
        }
    }

    pub fn ramp_state(&self) -> &RampState {
        &self.ramp
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// No autonomous routine is wired up.
    pub fn autonomous_command(&self) -> Option<DriveRequest> {
        info!("No autonomous command configured");
        None
    }

    fn default_request(&self, velocity: VelocityCommand) -> DriveRequest {
        DriveRequest::FieldCentric(FieldCentric {
            velocity,
            deadband: self.limits.max_speed * self.request_deadband,
            rotational_deadband: self.limits.max_angular_rate * self.request_deadband,
            drive_request_type: self.drive_request_type,
        })
    }

    /// Runs an action against the drivetrain. Returns the request it wants
    /// applied this tick, if it is one that drives the modules.
    fn perform(
        &mut self,
        action: RobotAction,
        snapshot: &ControllerSnapshot,
    ) -> Result<Option<DriveRequest>, DrivetrainError> {
        Ok(match action {
            RobotAction::Brake => Some(DriveRequest::Brake),
            RobotAction::PointWheels => Some(DriveRequest::PointWheelsAt {
                module_direction: point_direction(snapshot),
            }),
            RobotAction::SysId(routine) => Some(DriveRequest::SysId(routine)),
            RobotAction::SeedFieldCentric => {
                self.drivetrain.seed_field_centric()?;
                None
            }
        })
    }

    /// One control tick: sample, shape, dispatch, apply.
    pub fn tick(&mut self) -> Result<TickReport, TeleopError> {
        let snapshot = self.controller.poll()?;

        let fractions = self.shaper.update(&snapshot, &mut self.ramp);
        let velocity = VelocityCommand::from_fractions(fractions, &self.limits);
        let dispatch = self.dispatcher.dispatch(&snapshot);

        let mut request = self.default_request(velocity);
        if let Some(action) = dispatch.continuous {
            if let Some(held) = self.perform(action, &snapshot)? {
                request = held;
            }
        }
        for action in &dispatch.fired {
            // one-shot drive requests replace this tick's request only
            if let Some(once) = self.perform(*action, &snapshot)? {
                request = once;
            }
        }

        debug!("Applying {:?}", request);
        self.drivetrain.apply_request(&request)?;

        Ok(TickReport {
            snapshot,
            request,
            held: dispatch.continuous,
            fired: dispatch.fired,
        })
    }

    /// Commands zero velocity, used when the loop shuts down.
    pub fn stop(&mut self) -> Result<(), DrivetrainError> {
        info!("Stopping drivetrain");
        self.ramp = RampState::default();
        let request = self.default_request(VelocityCommand::default());
        self.drivetrain.apply_request(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::AxisType;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn point_direction_follows_left_stick() {
        let forward = ControllerSnapshot::neutral().with_axis(AxisType::LeftY, -1.0);
        let left = ControllerSnapshot::neutral().with_axis(AxisType::LeftX, -1.0);
        let back = ControllerSnapshot::neutral().with_axis(AxisType::LeftY, 1.0);

        assert_eq!(point_direction(&forward), 0.0);
        assert!((point_direction(&left) - FRAC_PI_2).abs() < 1e-12);
        // -pi and pi are the same heading
        assert!((point_direction(&back).abs() - PI).abs() < 1e-12);
        assert_eq!(point_direction(&ControllerSnapshot::neutral()), 0.0);
    }

    #[test]
    fn binding_table_covers_every_operator_input() {
        let bindings = configure_bindings();
        assert_eq!(bindings.len(), 8);

        let sysid = bindings
            .iter()
            .filter(|binding| matches!(binding.action, RobotAction::SysId(_)))
            .count();
        assert_eq!(sysid, 4);
    }
}
