//! Drivetrain collaborator boundary
//!
//! Kinematics, motor control and SysId internals live outside this crate. The
//! teleop loop only hands the drivetrain one [`DriveRequest`] per tick, asks it
//! to reseed its field-centric heading, and registers a telemetry sink once.

pub mod logging;
pub mod telemetry;

pub use logging::LoggingDrivetrain;
pub use telemetry::Telemetry;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shaping::VelocityCommand;

/// Errors reported by a drivetrain implementation. The teleop loop never
/// handles these itself, they are passed up to whoever runs the loop.
#[derive(Debug, thiserror::Error)]
pub enum DrivetrainError {
    #[error("Drive request rejected: {0}")]
    RequestRejected(String),
}

/// How the module drive motors follow a velocity request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveRequestType {
    #[default]
    OpenLoopVoltage,
    /// Closed-loop wheel velocity.
    Velocity,
}

/// Velocity request interpreted against the field frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldCentric {
    pub velocity: VelocityCommand,
    /// Translational speeds with a combined magnitude below this are dropped.
    pub deadband: f64,
    /// Rotational rates below this are dropped.
    pub rotational_deadband: f64,
    pub drive_request_type: DriveRequestType,
}

impl FieldCentric {
    /// Velocity after the request's own deadbands are applied.
    pub fn effective_velocity(&self) -> VelocityCommand {
        let mut velocity = self.velocity;
        if velocity.vx.hypot(velocity.vy) < self.deadband {
            velocity.vx = 0.0;
            velocity.vy = 0.0;
        }
        if velocity.omega.abs() < self.rotational_deadband {
            velocity.omega = 0.0;
        }
        velocity
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SysIdDirection {
    Forward,
    Reverse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SysIdPhase {
    Dynamic,
    Quasistatic,
}

/// One of the four characterization routines. Each should run exactly once
/// per log; nothing here enforces that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SysIdRoutine {
    pub phase: SysIdPhase,
    pub direction: SysIdDirection,
}

impl fmt::Display for SysIdRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sysid-{:?}-{:?}", self.phase, self.direction)
    }
}

/// The single request applied to the drivetrain each tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DriveRequest {
    FieldCentric(FieldCentric),
    /// Modules crossed in an X to resist being pushed.
    Brake,
    /// Modules pointed at a field heading (radians) without driving.
    PointWheelsAt { module_direction: f64 },
    SysId(SysIdRoutine),
}

impl DriveRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            DriveRequest::FieldCentric(_) => "field-centric",
            DriveRequest::Brake => "brake",
            DriveRequest::PointWheelsAt { .. } => "point-wheels",
            DriveRequest::SysId(_) => "sysid",
        }
    }
}

/// Snapshot the drivetrain hands to its telemetry sink.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DrivetrainState {
    /// Field-relative heading in radians.
    pub heading: f64,
    pub speeds: VelocityCommand,
    /// Seconds between the last two state updates.
    pub odometry_period: f64,
}

pub type TelemetrySink = Box<dyn FnMut(&DrivetrainState) + Send>;

pub trait Drivetrain {
    fn apply_request(&mut self, request: &DriveRequest) -> Result<(), DrivetrainError>;

    /// Makes the current heading the field-centric forward direction.
    fn seed_field_centric(&mut self) -> Result<(), DrivetrainError>;

    fn register_telemetry(&mut self, sink: TelemetrySink);
}

impl<T: Drivetrain + ?Sized> Drivetrain for Box<T> {
    fn apply_request(&mut self, request: &DriveRequest) -> Result<(), DrivetrainError> {
        (**self).apply_request(request)
    }

    fn seed_field_centric(&mut self) -> Result<(), DrivetrainError> {
        (**self).seed_field_centric()
    }

    fn register_telemetry(&mut self, sink: TelemetrySink) {
        (**self).register_telemetry(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(vx: f64, vy: f64, omega: f64) -> FieldCentric {
        FieldCentric {
            velocity: VelocityCommand { vx, vy, omega },
            deadband: 0.5,
            rotational_deadband: 0.4,
            drive_request_type: DriveRequestType::OpenLoopVoltage,
        }
    }

    #[test]
    fn translation_deadband_uses_combined_magnitude() {
        let small = request(0.3, 0.3, 0.0).effective_velocity();
        assert_eq!((small.vx, small.vy), (0.0, 0.0));

        let diagonal = request(0.3, 0.45, 0.0).effective_velocity();
        assert_eq!((diagonal.vx, diagonal.vy), (0.3, 0.45));
    }

    #[test]
    fn rotational_deadband_is_independent() {
        let velocity = request(2.0, 0.0, 0.2).effective_velocity();
        assert_eq!(velocity.vx, 2.0);
        assert_eq!(velocity.omega, 0.0);
    }
}
