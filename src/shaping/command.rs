use std::f64::consts::TAU;

/// Shaped fractions in [-1, 1] for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityFractions {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

/// Maximum speeds the fractions are scaled by. Fixed for the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedLimits {
    /// Meters per second at full stick.
    pub max_speed: f64,
    /// Radians per second at full stick.
    pub max_angular_rate: f64,
}

impl SpeedLimits {
    /// Speed at 12 V for the stock swerve modules.
    pub const DEFAULT_MAX_SPEED: f64 = 4.73;
    /// Three quarters of a rotation per second.
    pub const DEFAULT_MAX_ANGULAR_RATE: f64 = 0.75 * TAU;
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            max_speed: Self::DEFAULT_MAX_SPEED,
            max_angular_rate: Self::DEFAULT_MAX_ANGULAR_RATE,
        }
    }
}

/// Field-relative velocity for one tick, in m/s and rad/s.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityCommand {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

impl VelocityCommand {
    pub fn from_fractions(fractions: VelocityFractions, limits: &SpeedLimits) -> Self {
        Self {
            vx: fractions.x * limits.max_speed,
            vy: fractions.y * limits.max_speed,
            omega: fractions.rotation * limits.max_angular_rate,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0 && self.omega == 0.0
    }
}
