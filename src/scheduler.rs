//! Periodic teleop loop with a statum lifecycle
//!
//! ```text
//! Configured ──► Active ──► Deactivating ──► Deactivated
//!                  │  ▲
//!                  └──┘ tick every `tick_period_ms`
//! ```
//!
//! The loop runs on the caller's task. Controller and drivetrain failures end
//! the loop and are returned unchanged; the shutdown path commands zero
//! velocity before the loop is considered stopped.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use statum::{machine, state};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::robot::{RobotContainer, TeleopError, TickReport};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub tick_period_ms: u64,
    /// Seconds between loop statistics reports.
    pub stats_interval_secs: i64,
}

const DEFAULT_STATS_INTERVAL_SECS: i64 = 30;

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_period_ms: 20,
            stats_interval_secs: DEFAULT_STATS_INTERVAL_SECS,
        }
    }
}

impl SchedulerSettings {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Stats window, `None` unless positive and representable.
    pub fn stats_interval(&self) -> Option<chrono::Duration> {
        if self.stats_interval_secs > 0 {
            chrono::Duration::try_seconds(self.stats_interval_secs)
        } else {
            None
        }
    }
}

/// Counters for the periodic stats log.
#[derive(Clone, Debug)]
pub struct LoopStats {
    pub total_ticks: u64,
    pub overruns: u64,
    window_ticks: u64,
    window_held: u64,
    window_fired: u64,
    window_start: DateTime<Local>,
    report_interval: chrono::Duration,
}

impl LoopStats {
    fn new(report_interval: chrono::Duration) -> Self {
        Self {
            total_ticks: 0,
            overruns: 0,
            window_ticks: 0,
            window_held: 0,
            window_fired: 0,
            window_start: Local::now(),
            report_interval,
        }
    }

    fn record(&mut self, report: &TickReport) {
        self.total_ticks += 1;
        self.window_ticks += 1;
        if report.held.is_some() {
            self.window_held += 1;
        }
        self.window_fired += report.fired.len() as u64;
    }

    fn maybe_report(&mut self) {
        let now = Local::now();
        if now - self.window_start <= self.report_interval {
            return;
        }

        let elapsed_seconds = (now - self.window_start).num_seconds().max(1);
        info!(
            "Teleop stats: {} ticks in {} seconds ({:.2} ticks/sec)",
            self.window_ticks,
            elapsed_seconds,
            self.window_ticks as f64 / elapsed_seconds as f64
        );
        info!(
            "{} ticks under a held action, {} one-shot actions, {} overruns so far",
            self.window_held, self.window_fired, self.overruns
        );

        self.window_ticks = 0;
        self.window_held = 0;
        self.window_fired = 0;
        self.window_start = now;
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum LoopState {
    Configured,
    Active,
    Deactivating,
    Deactivated,
}

#[machine]
pub struct TeleopLoop<S: LoopState> {
    container: RobotContainer,
    settings: SchedulerSettings,
    stats: LoopStats,
}

impl<S: LoopState> TeleopLoop<S> {
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn container(&self) -> &RobotContainer {
        &self.container
    }
}

impl TeleopLoop<Configured> {
    pub fn create(container: RobotContainer, settings: SchedulerSettings) -> Self {
        info!(
            "Configuring teleop loop with {}ms tick period",
            settings.tick_period_ms
        );
        let report_interval = settings.stats_interval().unwrap_or_else(|| {
            warn!(
                "Ignoring stats interval of {} s, using {} s",
                settings.stats_interval_secs, DEFAULT_STATS_INTERVAL_SECS
            );
            chrono::Duration::seconds(DEFAULT_STATS_INTERVAL_SECS)
        });
        Self::new(container, settings, LoopStats::new(report_interval))
    }

    pub fn activate(self) -> TeleopLoop<Active> {
        info!("Activating teleop loop");
        self.transition()
    }
}

impl TeleopLoop<Active> {
    /// Runs a single tick and updates the loop statistics.
    pub fn step(&mut self) -> Result<TickReport, TeleopError> {
        let cycle_start = Instant::now();
        let report = self.container.tick()?;
        let cycle = cycle_start.elapsed();

        debug!("Tick completed in {:.2} ms", cycle.as_secs_f64() * 1000.0);
        if cycle > self.settings.tick_period() {
            self.stats.overruns += 1;
            warn!(
                "Tick took {:.2} ms, longer than the {} ms period",
                cycle.as_secs_f64() * 1000.0,
                self.settings.tick_period_ms
            );
        }

        self.stats.record(&report);
        self.stats.maybe_report();
        Ok(report)
    }

    /// Ticks at the configured period until `shutdown` is cancelled.
    pub async fn run_until_shutdown(
        mut self,
        shutdown: CancellationToken,
    ) -> Result<TeleopLoop<Deactivating>, TeleopError> {
        info!("Entering teleop loop");

        let mut interval_timer = tokio::time::interval(self.settings.tick_period());
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested after {} ticks", self.stats.total_ticks);
                    break;
                }

                _ = interval_timer.tick() => {
                    if let Err(e) = self.step() {
                        error!("Teleop tick failed: {}", e);
                        return Err(e);
                    }
                }
            }
        }

        Ok(self.transition())
    }

    pub fn deactivate(self) -> TeleopLoop<Deactivating> {
        info!("Deactivating teleop loop");
        self.transition()
    }
}

impl TeleopLoop<Deactivating> {
    /// Commands zero velocity and stops.
    pub fn shutdown(mut self) -> Result<TeleopLoop<Deactivated>, TeleopError> {
        self.container.stop()?;
        info!(
            "Teleop loop stopped after {} ticks ({} overruns)",
            self.stats.total_ticks, self.stats.overruns
        );
        Ok(self.transition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TeleopConfig;
    use crate::controller::{ControllerSnapshot, ScriptedController};
    use crate::drivetrain::{
        DriveRequest, Drivetrain, DrivetrainError, LoggingDrivetrain, TelemetrySink,
    };

    #[test]
    fn settings_default_to_fifty_hertz() {
        let settings = SchedulerSettings::default();
        assert_eq!(settings.tick_period(), Duration::from_millis(20));
        assert_eq!(settings.stats_interval_secs, 30);
    }

    #[test]
    fn stats_count_held_and_fired_actions() {
        use crate::dispatch::RobotAction;

        let mut stats = LoopStats::new(chrono::Duration::seconds(30));
        let report = TickReport {
            snapshot: ControllerSnapshot::neutral(),
            request: DriveRequest::Brake,
            held: Some(RobotAction::Brake),
            fired: vec![RobotAction::SeedFieldCentric],
        };
        stats.record(&report);
        stats.record(&report);

        assert_eq!(stats.total_ticks, 2);
        assert_eq!(stats.window_held, 2);
        assert_eq!(stats.window_fired, 2);
    }

    fn bench_loop(
        drivetrain: Box<dyn Drivetrain>,
        settings: SchedulerSettings,
    ) -> TeleopLoop<Active> {
        let container = RobotContainer::new(
            &TeleopConfig::default(),
            Box::new(ScriptedController::new([ControllerSnapshot::neutral()])),
            drivetrain,
        );
        TeleopLoop::create(container, settings).activate()
    }

    struct SlowDrivetrain(LoggingDrivetrain);

    impl Drivetrain for SlowDrivetrain {
        fn apply_request(&mut self, request: &DriveRequest) -> Result<(), DrivetrainError> {
            std::thread::sleep(Duration::from_millis(15));
            self.0.apply_request(request)
        }

        fn seed_field_centric(&mut self) -> Result<(), DrivetrainError> {
            self.0.seed_field_centric()
        }

        fn register_telemetry(&mut self, sink: TelemetrySink) {
            self.0.register_telemetry(sink)
        }
    }

    #[test]
    fn stats_interval_must_be_positive_and_representable() {
        let mut settings = SchedulerSettings::default();
        assert_eq!(settings.stats_interval(), Some(chrono::Duration::seconds(30)));

        for bad in [0, -5, i64::MAX] {
            settings.stats_interval_secs = bad;
            assert_eq!(settings.stats_interval(), None, "accepted {}", bad);
        }
    }

    #[tokio::test]
    async fn oversized_stats_interval_falls_back_to_default() {
        let settings = SchedulerSettings {
            stats_interval_secs: i64::MAX,
            ..Default::default()
        };
        let mut teleop = bench_loop(Box::new(LoggingDrivetrain::new(0.02)), settings);

        teleop.step().unwrap();
        teleop.step().unwrap();
        assert_eq!(teleop.stats().total_ticks, 2);
        assert_eq!(
            teleop.stats().report_interval,
            chrono::Duration::seconds(DEFAULT_STATS_INTERVAL_SECS)
        );
    }

    #[tokio::test]
    async fn slow_ticks_count_as_overruns() {
        let settings = SchedulerSettings {
            tick_period_ms: 5,
            ..Default::default()
        };
        let mut teleop = bench_loop(
            Box::new(SlowDrivetrain(LoggingDrivetrain::new(0.005))),
            settings,
        );

        teleop.step().unwrap();
        teleop.step().unwrap();
        assert_eq!(teleop.stats().overruns, 2);
    }
}
