//! Teleoperation input shaping and button dispatch for a swerve drivetrain.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod drivetrain;
pub mod robot;
pub mod scheduler;
pub mod shaping;
