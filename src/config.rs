// Timing, thresholds, network and pin configuration
use std::time::Duration;

// Control loop cadence (20Hz)
pub const LOOP_PERIOD: Duration = Duration::from_millis(50);

// Forced stop after an obstacle trip; the control loop blocks for this long
pub const STOP_DWELL: Duration = Duration::from_secs(2);

// Obstacle guard hysteresis band
pub const TRIP_DISTANCE_CM: f64 = 10.0; // Running -> Stopped below this
pub const CLEAR_DISTANCE_CM: f64 = 30.0; // Cooldown -> Running above this

// HC-SR04 style ranging sensor
pub const TRIGGER_SETTLE_US: u32 = 2;
pub const TRIGGER_PULSE_US: u32 = 10;
pub const ECHO_TIMEOUT: Duration = Duration::from_millis(30); // ~5m max range
pub const SOUND_CM_PER_US: f64 = 0.0343;

// H-bridge PWM carrier
pub const PWM_FREQUENCY_HZ: u32 = 10_000;

// Command listener (the board build served on port 80)
pub const LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const REQUEST_BUFFER_SIZE: usize = 1024;
pub const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(2);

// Pin assignments on the reference board, for a GPIO backend
pub const TRIGGER_PIN: u8 = 27;
pub const ECHO_PIN: u8 = 26;
pub const MOTOR1_FORWARD_PIN: u8 = 3;
pub const MOTOR1_REVERSE_PIN: u8 = 2;
pub const MOTOR2_FORWARD_PIN: u8 = 6;
pub const MOTOR2_REVERSE_PIN: u8 = 7;

/// Thresholds used by the obstacle guard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardConfig {
    pub trip_cm: f64,
    pub clear_cm: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            trip_cm: TRIP_DISTANCE_CM,
            clear_cm: CLEAR_DISTANCE_CM,
        }
    }
}

/// Timing used by the control loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlConfig {
    pub period: Duration,
    pub dwell: Duration,
    pub guard: GuardConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            period: LOOP_PERIOD,
            dwell: STOP_DWELL,
            guard: GuardConfig::default(),
        }
    }
}
