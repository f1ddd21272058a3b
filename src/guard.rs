// Obstacle guard: overrides the requested speed with 0 near an obstacle
//
// Running --(travel requested, reading < trip)--> Stopped
// Stopped --(dwell elapsed)--> Cooldown
// Cooldown --(travel requested, reading > clear)--> Running
//
// The trip/clear gap is the hysteresis band. A missing echo never changes state.

use std::fmt;

use tracing::info;

use crate::config::GuardConfig;
use crate::motor::SpeedPercent;
use crate::sensor::DistanceReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardState {
    /// Travel permitted at the requested speed
    #[default]
    Running,
    /// Forced stop, obstacle just detected; dwell pending
    Stopped,
    /// Forced stop, waiting for a clear reading to re-arm
    Cooldown,
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuardState::Running => "running",
            GuardState::Stopped => "stopped",
            GuardState::Cooldown => "cooldown",
        };
        f.write_str(name)
    }
}

/// Outcome of one guard evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardDecision {
    pub effective: SpeedPercent,
    pub state: GuardState,
    /// Entered `Stopped` on this evaluation; the caller owes a dwell
    pub tripped: bool,
}

#[derive(Debug, Clone)]
pub struct ObstacleGuard {
    state: GuardState,
    config: GuardConfig,
}

impl ObstacleGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            state: GuardState::Running,
            config,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    fn transition(&mut self, next: GuardState) {
        info!("Obstacle guard: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Run one cycle of the transition table and compute the effective speed
    pub fn update(&mut self, requested: SpeedPercent, reading: DistanceReading) -> GuardDecision {
        let mut tripped = false;

        if let (false, Some(cm)) = (requested.is_zero(), reading.centimeters()) {
            if cm < self.config.trip_cm && self.state == GuardState::Running {
                self.transition(GuardState::Stopped);
                tripped = true;
            }
            if cm > self.config.clear_cm && self.state == GuardState::Cooldown {
                self.transition(GuardState::Running);
            }
        }

        let effective = match self.state {
            GuardState::Running => requested,
            GuardState::Stopped | GuardState::Cooldown => SpeedPercent::ZERO,
        };

        GuardDecision {
            effective,
            state: self.state,
            tripped,
        }
    }

    /// The stop dwell has been served: Stopped -> Cooldown
    pub fn finish_dwell(&mut self) {
        if self.state == GuardState::Stopped {
            self.transition(GuardState::Cooldown);
        }
    }
}

impl Default for ObstacleGuard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}
