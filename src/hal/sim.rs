// Simulated board: PWM channels and pins backed by shared cells,
// echo pulses derived from a settable obstacle distance.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use tracing::trace;

use super::{EchoInput, PwmOutput};
use crate::config::SOUND_CM_PER_US;

/// Obstacle distance seen by the simulated sensor at startup (cm)
pub const DEFAULT_OBSTACLE_CM: f64 = 200.0;

/// PWM channel whose duty and frequency can be observed from other handles
#[derive(Debug, Clone)]
pub struct SimPwm {
    name: &'static str,
    duty: Arc<AtomicU16>,
    frequency: Arc<AtomicU32>,
}

impl SimPwm {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            duty: Arc::new(AtomicU16::new(0)),
            frequency: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn duty(&self) -> u16 {
        self.duty.load(Ordering::Relaxed)
    }

    pub fn frequency(&self) -> u32 {
        self.frequency.load(Ordering::Relaxed)
    }
}

impl pwm::ErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        trace!("{} duty={}", self.name, duty);
        self.duty.store(duty, Ordering::Relaxed);
        Ok(())
    }
}

impl PwmOutput for SimPwm {
    fn set_frequency(&mut self, hz: u32) -> Result<(), Self::Error> {
        self.frequency.store(hz, Ordering::Relaxed);
        Ok(())
    }
}

/// Output pin (trigger line, status LED)
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    level: Arc<AtomicBool>,
}

impl SimPin {
    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::Relaxed)
    }
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Shared simulated environment in front of the vehicle
#[derive(Debug, Clone)]
pub struct SimWorld {
    obstacle_cm: Arc<Mutex<Option<f64>>>,
}

impl SimWorld {
    pub fn new(obstacle_cm: Option<f64>) -> Self {
        Self {
            obstacle_cm: Arc::new(Mutex::new(obstacle_cm)),
        }
    }

    /// Place an obstacle at `cm`, or clear the path with `None`
    pub fn set_obstacle(&self, cm: Option<f64>) {
        *self.obstacle_cm.lock().unwrap_or_else(|e| e.into_inner()) = cm;
    }

    pub fn obstacle(&self) -> Option<f64> {
        *self.obstacle_cm.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Echo line answering with the round-trip time to the world's obstacle
#[derive(Debug, Clone)]
pub struct SimEcho {
    world: SimWorld,
}

impl SimEcho {
    pub fn new(world: SimWorld) -> Self {
        Self { world }
    }
}

impl EchoInput for SimEcho {
    type Error = Infallible;

    fn high_pulse_width(&mut self, timeout: Duration) -> Result<Option<Duration>, Self::Error> {
        let Some(cm) = self.world.obstacle() else {
            return Ok(None);
        };
        // Inverse of distance = (t / 2) * SOUND_CM_PER_US
        let micros = (cm.max(0.0) / SOUND_CM_PER_US * 2.0).round() as u64;
        let width = Duration::from_micros(micros);
        Ok((width <= timeout).then_some(width))
    }
}

/// Blocking delay on the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// All simulated peripherals of the monorail board
#[derive(Debug, Clone)]
pub struct SimBoard {
    pub motor1_forward: SimPwm,
    pub motor1_reverse: SimPwm,
    pub motor2_forward: SimPwm,
    pub motor2_reverse: SimPwm,
    pub trigger: SimPin,
    pub echo: SimEcho,
    pub status_led: SimPin,
    pub world: SimWorld,
}

impl SimBoard {
    pub fn new() -> Self {
        let world = SimWorld::new(Some(DEFAULT_OBSTACLE_CM));
        Self {
            motor1_forward: SimPwm::new("motor1_forward"),
            motor1_reverse: SimPwm::new("motor1_reverse"),
            motor2_forward: SimPwm::new("motor2_forward"),
            motor2_reverse: SimPwm::new("motor2_reverse"),
            trigger: SimPin::default(),
            echo: SimEcho::new(world.clone()),
            status_led: SimPin::default(),
            world,
        }
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ECHO_TIMEOUT;

    #[test]
    fn test_echo_round_trip_matches_distance() {
        let world = SimWorld::new(Some(34.3));
        let mut echo = SimEcho::new(world);
        let width = echo.high_pulse_width(ECHO_TIMEOUT).unwrap();
        assert_eq!(width, Some(Duration::from_micros(2000)));
    }

    #[test]
    fn test_echo_out_of_range_times_out() {
        let world = SimWorld::new(Some(600.0));
        let mut echo = SimEcho::new(world.clone());
        assert_eq!(echo.high_pulse_width(ECHO_TIMEOUT).unwrap(), None);

        world.set_obstacle(None);
        assert_eq!(echo.high_pulse_width(ECHO_TIMEOUT).unwrap(), None);
    }

    #[test]
    fn test_pwm_handles_share_state() {
        let pwm = SimPwm::new("test");
        let mut writer = pwm.clone();
        writer.set_duty_cycle(1234).unwrap();
        writer.set_frequency(10_000).unwrap();
        assert_eq!(pwm.duty(), 1234);
        assert_eq!(pwm.frequency(), 10_000);
    }
}
