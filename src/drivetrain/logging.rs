use tracing::{debug, info};

use super::{
    DriveRequest, Drivetrain, DrivetrainError, DrivetrainState, SysIdRoutine, TelemetrySink,
};
use crate::shaping::VelocityCommand;

/// Bench drivetrain: accepts every request, traces it, and integrates a
/// synthetic heading so telemetry has something to report.
///
/// Used for dry runs without robot hardware attached.
pub struct LoggingDrivetrain {
    period: f64,
    state: DrivetrainState,
    last_request: Option<DriveRequest>,
    active_sysid: Option<SysIdRoutine>,
    requests: u64,
    telemetry: Option<TelemetrySink>,
}

impl LoggingDrivetrain {
    /// `period` is the control loop period in seconds.
    pub fn new(period: f64) -> Self {
        Self {
            period,
            state: DrivetrainState {
                odometry_period: period,
                ..Default::default()
            },
            last_request: None,
            active_sysid: None,
            requests: 0,
            telemetry: None,
        }
    }

    pub fn state(&self) -> &DrivetrainState {
        &self.state
    }

    pub fn last_request(&self) -> Option<&DriveRequest> {
        self.last_request.as_ref()
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    fn track_sysid(&mut self, request: &DriveRequest) {
        let next = match request {
            DriveRequest::SysId(routine) => Some(*routine),
            _ => None,
        };
        if next == self.active_sysid {
            return;
        }
        if let Some(finished) = self.active_sysid {
            info!("SysId routine {} stopped", finished);
        }
        if let Some(started) = next {
            info!("SysId routine {} started", started);
        }
        self.active_sysid = next;
    }
}

impl Drivetrain for LoggingDrivetrain {
    fn apply_request(&mut self, request: &DriveRequest) -> Result<(), DrivetrainError> {
        if self.last_request.map(|last| last.kind()) != Some(request.kind()) {
            info!("Drivetrain now applying {} request", request.kind());
        }
        self.track_sysid(request);

        self.state.speeds = match request {
            DriveRequest::FieldCentric(field_centric) => field_centric.effective_velocity(),
            DriveRequest::Brake | DriveRequest::PointWheelsAt { .. } => VelocityCommand::default(),
            // characterization drives in a straight line, no rotation
            DriveRequest::SysId(_) => VelocityCommand::default(),
        };
        self.state.heading += self.state.speeds.omega * self.period;
        debug!("Applied {:?}", request);

        self.last_request = Some(*request);
        self.requests += 1;
        if let Some(sink) = self.telemetry.as_mut() {
            sink(&self.state);
        }
        Ok(())
    }

    fn seed_field_centric(&mut self) -> Result<(), DrivetrainError> {
        info!(
            "Seeding field-centric heading (was {:.3} rad)",
            self.state.heading
        );
        self.state.heading = 0.0;
        Ok(())
    }

    fn register_telemetry(&mut self, sink: TelemetrySink) {
        info!("Telemetry sink registered");
        self.telemetry = Some(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivetrain::{DriveRequestType, FieldCentric};
    use std::sync::{Arc, Mutex};

    #[test]
    fn integrates_heading_and_reseeds() {
        let mut drivetrain = LoggingDrivetrain::new(0.02);
        let spin = DriveRequest::FieldCentric(FieldCentric {
            velocity: VelocityCommand {
                vx: 0.0,
                vy: 0.0,
                omega: 1.0,
            },
            deadband: 0.0,
            rotational_deadband: 0.0,
            drive_request_type: DriveRequestType::OpenLoopVoltage,
        });

        for _ in 0..50 {
            drivetrain.apply_request(&spin).unwrap();
        }
        assert!((drivetrain.state().heading - 1.0).abs() < 1e-9);
        assert_eq!(drivetrain.requests(), 50);

        drivetrain.seed_field_centric().unwrap();
        assert_eq!(drivetrain.state().heading, 0.0);
    }

    #[test]
    fn telemetry_sink_sees_every_request() {
        let seen = Arc::new(Mutex::new(0u32));
        let counter = seen.clone();
        let mut drivetrain = LoggingDrivetrain::new(0.02);
        drivetrain.register_telemetry(Box::new(move |_| *counter.lock().unwrap() += 1));

        drivetrain.apply_request(&DriveRequest::Brake).unwrap();
        drivetrain.apply_request(&DriveRequest::Brake).unwrap();
        assert_eq!(*seen.lock().unwrap(), 2);
        assert_eq!(drivetrain.last_request(), Some(&DriveRequest::Brake));
    }
}
