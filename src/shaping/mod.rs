//! Input shaping for the three drive axes
//!
//! Turns a raw stick reading into a bounded velocity fraction:
//!
//! ```text
//! raw ──► deadband ──► atan ramp (tick indexed) ──► clamp [-1, 1] ──► × max speed
//! ```
//!
//! The ramp curve is `raw * atan(ticks / divisor) / (normalization * π)`. With
//! the stock divisor of 6 and normalization of 0.4375 the output saturates
//! after roughly 20-25 ticks of holding a stick past the deadband.
//!
//! The shaping function itself is pure: it never advances the tick counter.
//! [`InputShaper::update`] applies the configured [`RampPolicy`] on top of it
//! for the three counters held in [`RampState`].

pub mod command;

pub use command::{SpeedLimits, VelocityCommand, VelocityFractions};

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::num::NonZeroU32;
use tracing::debug;

use crate::controller::{AxisType, ControllerSnapshot};

pub const DEFAULT_DEADBAND: f64 = 0.1;
pub const DEFAULT_RAMP_DIVISOR: u32 = 6;
pub const DEFAULT_NORMALIZATION: f64 = 0.4375;

/// Shapes one axis reading with the stock constants.
///
/// Returns the velocity fraction and the tick state to carry into the next
/// tick: unchanged past the deadband, reset to zero inside it.
pub fn shape(raw: f64, ticks: u32) -> (f64, u32) {
    InputShaper::default().shape(raw, ticks)
}

/// How the deadband test treats the sign of the raw reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadbandMode {
    /// `|raw| < deadband` suppresses the axis.
    #[default]
    Magnitude,
    /// `raw < deadband` on the unnegated reading suppresses the axis. Every
    /// negative deflection is treated as inside the deadband. Kept to reproduce
    /// the behaviour of the robot code this layer replaces.
    Signed,
}

/// How the per-axis tick counters advance between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampPolicy {
    /// Counter increments once per tick while the axis is held past the
    /// deadband, so the ramp actually rises.
    #[default]
    Advance,
    /// Counter is only ever reset, never incremented. The ramp stays at
    /// whatever value the counter starts with, which is zero output.
    Hold,
}

/// Which controller axis feeds a drive axis, and whether it is negated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisBinding {
    pub axis: AxisType,
    pub inverted: bool,
}

impl AxisBinding {
    pub const fn inverted(axis: AxisType) -> Self {
        Self {
            axis,
            inverted: true,
        }
    }
}

/// Drive-axis assignment. Defaults follow the field convention: X forward from
/// the left stick pushed up, Y left from the left stick pushed left, rotation
/// counter-clockwise from the right stick pushed left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisAssignment {
    pub longitudinal: AxisBinding,
    pub lateral: AxisBinding,
    pub rotation: AxisBinding,
}

impl Default for AxisAssignment {
    fn default() -> Self {
        Self {
            longitudinal: AxisBinding::inverted(AxisType::LeftY),
            lateral: AxisBinding::inverted(AxisType::LeftX),
            rotation: AxisBinding::inverted(AxisType::RightX),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingSettings {
    pub deadband: f64,
    pub ramp_divisor: NonZeroU32,
    pub normalization: f64,
    pub deadband_mode: DeadbandMode,
    pub ramp_policy: RampPolicy,
    pub axes: AxisAssignment,
}

impl Default for ShapingSettings {
    fn default() -> Self {
        Self {
            deadband: DEFAULT_DEADBAND,
            ramp_divisor: NonZeroU32::new(DEFAULT_RAMP_DIVISOR).unwrap_or(NonZeroU32::MIN),
            normalization: DEFAULT_NORMALIZATION,
            deadband_mode: DeadbandMode::default(),
            ramp_policy: RampPolicy::default(),
            axes: AxisAssignment::default(),
        }
    }
}

/// Ramp counters for the three drive axes. Session scoped: created with the
/// teleop loop, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RampState {
    pub longitudinal: u32,
    pub lateral: u32,
    pub rotational: u32,
}

#[derive(Clone, Debug, Default)]
pub struct InputShaper {
    settings: ShapingSettings,
}

impl InputShaper {
    pub fn new(settings: ShapingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ShapingSettings {
        &self.settings
    }

    /// Pure shaping of one raw reading against the configured deadband and curve.
    pub fn shape(&self, raw: f64, ticks: u32) -> (f64, u32) {
        self.shape_binding(raw, false, ticks)
    }

    fn shape_binding(&self, raw: f64, inverted: bool, ticks: u32) -> (f64, u32) {
        if self.in_deadband(raw) {
            return (0.0, 0);
        }

        let value = if inverted { -raw } else { raw };
        (self.ramp_fraction(value.clamp(-1.0, 1.0), ticks), ticks)
    }

    fn in_deadband(&self, raw: f64) -> bool {
        // NaN carries no direction; infinities clamp like any other overshoot
        if raw.is_nan() {
            return true;
        }
        match self.settings.deadband_mode {
            DeadbandMode::Magnitude => raw.abs() < self.settings.deadband,
            DeadbandMode::Signed => raw < self.settings.deadband,
        }
    }

    fn ramp_fraction(&self, value: f64, ticks: u32) -> f64 {
        // integer division: the ramp rises in steps of `ramp_divisor` ticks
        let steps = (ticks / self.settings.ramp_divisor.get()) as f64;
        let fraction = value * steps.atan() / (self.settings.normalization * PI);
        fraction.clamp(-1.0, 1.0)
    }

    fn advance(&self, ticks: u32) -> u32 {
        match self.settings.ramp_policy {
            RampPolicy::Advance => ticks.saturating_add(1),
            RampPolicy::Hold => ticks,
        }
    }

    fn update_axis(&self, snapshot: &ControllerSnapshot, binding: AxisBinding, ticks: &mut u32) -> f64 {
        let raw = snapshot.axis(binding.axis);
        let (fraction, carried) = self.shape_binding(raw, binding.inverted, *ticks);
        *ticks = if self.in_deadband(raw) {
            carried
        } else {
            self.advance(carried)
        };
        fraction
    }

    /// Shapes all three drive axes for one tick and advances their counters.
    pub fn update(&self, snapshot: &ControllerSnapshot, ramp: &mut RampState) -> VelocityFractions {
        let axes = self.settings.axes;
        let fractions = VelocityFractions {
            x: self.update_axis(snapshot, axes.longitudinal, &mut ramp.longitudinal),
            y: self.update_axis(snapshot, axes.lateral, &mut ramp.lateral),
            rotation: self.update_axis(snapshot, axes.rotation, &mut ramp.rotational),
        };
        debug!("Shaped {:?} with ramp {:?}", fractions, ramp);
        fractions
    }
}
