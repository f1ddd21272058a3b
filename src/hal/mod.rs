// Hardware seams for the monorail board
//
// Provides:
// - PWM output channels (embedded-hal SetDutyCycle + carrier frequency)
// - Timed echo pulse input for the ranging sensor
// - A simulated board for running on a workstation

use std::time::Duration;

use embedded_hal::pwm::SetDutyCycle;

pub mod sim;

pub use sim::{SimBoard, SimEcho, SimPin, SimPwm, SimWorld, ThreadDelay};

/// Error types for board I/O
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("PWM channel {channel} write failed: {reason}")]
    Pwm {
        channel: &'static str,
        reason: String,
    },

    #[error("GPIO {pin} write failed: {reason}")]
    Gpio { pin: &'static str, reason: String },

    #[error("Echo input failed: {0}")]
    Echo(String),
}

/// A PWM channel driving one side of an H-bridge
pub trait PwmOutput: SetDutyCycle {
    /// Set the PWM carrier frequency in Hz
    fn set_frequency(&mut self, hz: u32) -> Result<(), Self::Error>;
}

/// Input line carrying the ranging sensor's echo pulse
pub trait EchoInput {
    type Error: core::fmt::Debug;

    /// Wait for a complete high pulse (rising then falling edge) and return its width.
    ///
    /// Returns `Ok(None)` if no complete pulse is seen within `timeout`.
    fn high_pulse_width(&mut self, timeout: Duration) -> Result<Option<Duration>, Self::Error>;
}
