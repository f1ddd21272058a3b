// Motor control module for the monorail drive
//
// Provides:
// - Speed / channel selector types
// - Dual H-bridge actuator over four PWM channels

mod actuator;
pub mod types;

pub use actuator::{HBridge, MotorActuator};
pub use types::{Direction, MotorId, SpeedPercent};
