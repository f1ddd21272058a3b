// Periodic motor control loop
//
// Each cycle: snapshot the requested speed, poll the range finder, run the
// obstacle guard, actuate Motor1. A guard trip blocks the loop for the stop
// dwell; commands received meanwhile are picked up on the next cycle.

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::command::CommandChannel;
use crate::config::ControlConfig;
use crate::guard::{GuardDecision, GuardState, ObstacleGuard};
use crate::hal::PwmOutput;
use crate::motor::{Direction, MotorActuator, MotorId, SpeedPercent};
use crate::sensor::{DistanceReading, RangeFinder};

/// What one control cycle saw and did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub requested: SpeedPercent,
    pub reading: DistanceReading,
    pub decision: GuardDecision,
}

pub struct ControlLoop<P: PwmOutput, S, D> {
    actuator: MotorActuator<P>,
    sensor: S,
    commands: CommandChannel,
    guard: ObstacleGuard,
    delay: D,
    config: ControlConfig,
}

impl<P, S, D> ControlLoop<P, S, D>
where
    P: PwmOutput,
    S: RangeFinder,
    D: DelayNs,
{
    pub fn new(
        actuator: MotorActuator<P>,
        sensor: S,
        commands: CommandChannel,
        delay: D,
        config: ControlConfig,
    ) -> Self {
        Self {
            actuator,
            sensor,
            commands,
            guard: ObstacleGuard::new(config.guard),
            delay,
            config,
        }
    }

    pub fn guard_state(&self) -> GuardState {
        self.guard.state()
    }

    /// Run a single cycle without any waiting
    pub fn step(&mut self) -> CycleReport {
        let requested = self.commands.requested_speed();

        let reading = self.sensor.measure();
        match reading {
            DistanceReading::Centimeters(_) => debug!("Distance: {}", reading),
            DistanceReading::NoEcho => warn!("Distance sensor: no echo"),
        }

        let decision = self.guard.update(requested, reading);

        // Only Motor1 is under guard control
        let result = if decision.effective.is_zero() {
            self.actuator.stop(MotorId::Motor1)
        } else {
            self.actuator
                .drive(MotorId::Motor1, Direction::Forward, decision.effective)
        };
        if let Err(e) = result {
            error!("Motor1 actuation failed: {}", e);
        }

        CycleReport {
            requested,
            reading,
            decision,
        }
    }

    fn sleep(&mut self, duration: Duration) {
        self.delay
            .delay_us(duration.as_micros().min(u32::MAX as u128) as u32);
    }

    /// Hold the forced stop for the dwell, then move the guard to Cooldown.
    ///
    /// Returns `false` if shutdown was requested before the dwell completed.
    fn serve_dwell(&mut self, shutdown: &watch::Receiver<bool>) -> bool {
        info!("Obstacle ahead, holding stop for {:?}", self.config.dwell);

        let slice_len = self.config.period.max(Duration::from_millis(1));
        let mut remaining = self.config.dwell;
        while !remaining.is_zero() {
            if *shutdown.borrow() {
                return false;
            }
            let slice = remaining.min(slice_len);
            self.sleep(slice);
            remaining -= slice;
        }

        self.guard.finish_dwell();
        true
    }

    /// Run until `shutdown` reads `true`, then stop both motors
    pub fn run(mut self, shutdown: watch::Receiver<bool>) {
        info!(
            "Control loop started: {}ms period, {}ms stop dwell",
            self.config.period.as_millis(),
            self.config.dwell.as_millis()
        );

        while !*shutdown.borrow() {
            let report = self.step();
            if report.decision.tripped && !self.serve_dwell(&shutdown) {
                break;
            }
            let period = self.config.period;
            self.sleep(period);
        }

        info!("Control loop stopping");
        if let Err(e) = self.actuator.stop_all() {
            error!("Failed to stop motors: {}", e);
        }
    }
}
