// Dual H-bridge actuator
//
// Each motor is a forward/reverse PWM pair. Driving a motor writes the idle
// side to zero before the active side, so both sides are never energised.

use tracing::{debug, info, warn};

use super::types::{Direction, MotorId, SpeedPercent};
use crate::hal::{HardwareError, PwmOutput};

/// Forward/reverse PWM pair for one motor
#[derive(Debug)]
pub struct HBridge<P> {
    pub forward: P,
    pub reverse: P,
}

impl<P> HBridge<P> {
    pub fn new(forward: P, reverse: P) -> Self {
        Self { forward, reverse }
    }
}

/// Translates (motor, direction, speed) into PWM duty on a dual H-bridge
pub struct MotorActuator<P: PwmOutput> {
    motor1: HBridge<P>,
    motor2: HBridge<P>,
}

fn channel_name(motor: MotorId, direction: Direction) -> &'static str {
    match (motor, direction) {
        (MotorId::Motor1, Direction::Forward) => "motor1_forward",
        (MotorId::Motor1, Direction::Reverse) => "motor1_reverse",
        (MotorId::Motor2, Direction::Forward) => "motor2_forward",
        (MotorId::Motor2, Direction::Reverse) => "motor2_reverse",
    }
}

fn pwm_error(channel: &'static str, err: impl core::fmt::Debug) -> HardwareError {
    HardwareError::Pwm {
        channel,
        reason: format!("{:?}", err),
    }
}

impl<P: PwmOutput> MotorActuator<P> {
    /// Configure all four channels at `frequency_hz` and leave both motors stopped
    pub fn new(
        motor1: HBridge<P>,
        motor2: HBridge<P>,
        frequency_hz: u32,
    ) -> Result<Self, HardwareError> {
        let mut actuator = Self { motor1, motor2 };

        for motor in MotorId::ALL {
            for direction in [Direction::Forward, Direction::Reverse] {
                actuator
                    .channel_mut(motor, direction)
                    .set_frequency(frequency_hz)
                    .map_err(|e| pwm_error(channel_name(motor, direction), e))?;
            }
        }

        actuator.stop_all()?;
        info!("Motor actuator ready ({} Hz PWM)", frequency_hz);
        Ok(actuator)
    }

    fn bridge_mut(&mut self, motor: MotorId) -> &mut HBridge<P> {
        match motor {
            MotorId::Motor1 => &mut self.motor1,
            MotorId::Motor2 => &mut self.motor2,
        }
    }

    fn channel_mut(&mut self, motor: MotorId, direction: Direction) -> &mut P {
        let bridge = self.bridge_mut(motor);
        match direction {
            Direction::Forward => &mut bridge.forward,
            Direction::Reverse => &mut bridge.reverse,
        }
    }

    /// Drive `motor` in `direction` at `speed`.
    ///
    /// Out-of-range speeds are clamped to [0, 100].
    pub fn drive(
        &mut self,
        motor: MotorId,
        direction: Direction,
        speed: impl Into<SpeedPercent>,
    ) -> Result<(), HardwareError> {
        let speed = speed.into();
        let idle_direction = match direction {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        };

        self.channel_mut(motor, idle_direction)
            .set_duty_cycle(0)
            .map_err(|e| pwm_error(channel_name(motor, idle_direction), e))?;

        let active = self.channel_mut(motor, direction);
        let duty = speed.duty(active.max_duty_cycle());
        active
            .set_duty_cycle(duty)
            .map_err(|e| pwm_error(channel_name(motor, direction), e))?;

        debug!(
            "{:?} {:?} at {} (duty={})",
            motor, direction, speed, duty
        );
        Ok(())
    }

    /// Stop a motor: both channels at zero duty
    pub fn stop(&mut self, motor: MotorId) -> Result<(), HardwareError> {
        self.drive(motor, Direction::Forward, SpeedPercent::ZERO)
    }

    pub fn stop_all(&mut self) -> Result<(), HardwareError> {
        for motor in MotorId::ALL {
            self.stop(motor)?;
        }
        Ok(())
    }
}

impl<P: PwmOutput> Drop for MotorActuator<P> {
    fn drop(&mut self) {
        // Never leave the bridge energised
        if let Err(e) = self.stop_all() {
            warn!("Failed to stop motors on drop: {}", e);
        }
    }
}
