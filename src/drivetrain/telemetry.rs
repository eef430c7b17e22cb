use chrono::{DateTime, Local};
use tracing::{debug, info};

use super::{DrivetrainState, TelemetrySink};

/// Logs drivetrain state handed back by the drivetrain.
///
/// The teleop layer only constructs this and registers it; the drivetrain
/// decides when to call it.
#[derive(Debug)]
pub struct Telemetry {
    max_speed: f64,
    updates: u64,
    last_summary: DateTime<Local>,
    summary_interval: chrono::Duration,
}

impl Telemetry {
    pub fn new(max_speed: f64) -> Self {
        Self {
            max_speed,
            updates: 0,
            last_summary: Local::now(),
            summary_interval: chrono::Duration::seconds(10),
        }
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn telemeterize(&mut self, state: &DrivetrainState) {
        self.updates += 1;

        let speed = state.speeds.vx.hypot(state.speeds.vy);
        let speed_fraction = if self.max_speed > 0.0 {
            speed / self.max_speed
        } else {
            0.0
        };
        debug!(
            "Drivetrain heading {:.3} rad, speed {:.2} m/s ({:.0}% of max), omega {:.2} rad/s",
            state.heading,
            speed,
            speed_fraction * 100.0,
            state.speeds.omega
        );

        let now = Local::now();
        if now - self.last_summary > self.summary_interval {
            info!(
                "Telemetry: {} updates, last odometry period {:.1} ms",
                self.updates,
                state.odometry_period * 1000.0
            );
            self.last_summary = now;
        }
    }

    /// Boxes this logger into the callback shape drivetrains accept.
    pub fn into_sink(mut self) -> TelemetrySink {
        Box::new(move |state| self.telemeterize(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::VelocityCommand;

    #[test]
    fn counts_every_update() {
        let mut telemetry = Telemetry::new(4.73);
        let state = DrivetrainState {
            heading: 0.5,
            speeds: VelocityCommand {
                vx: 1.0,
                vy: 0.0,
                omega: 0.0,
            },
            odometry_period: 0.02,
        };

        telemetry.telemeterize(&state);
        telemetry.telemeterize(&state);
        assert_eq!(telemetry.updates(), 2);
    }
}
