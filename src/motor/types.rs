// Speed and channel selectors for the dual H-bridge

use std::fmt;

/// Motor speed as a percentage of full duty, always within [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpeedPercent(u8);

impl SpeedPercent {
    pub const MAX: u8 = 100;
    pub const ZERO: SpeedPercent = SpeedPercent(0);
    pub const FULL: SpeedPercent = SpeedPercent(Self::MAX);

    /// Clamp any integer into [0, 100]
    pub fn clamped(value: i32) -> Self {
        Self(value.clamp(0, Self::MAX as i32) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert to a duty value at the given PWM resolution.
    ///
    /// `duty = speed * max_duty / 100`, truncating; monotonic in speed and
    /// equal to `max_duty` at 100%.
    pub fn duty(self, max_duty: u16) -> u16 {
        (self.0 as u32 * max_duty as u32 / Self::MAX as u32) as u16
    }
}

impl From<i32> for SpeedPercent {
    fn from(value: i32) -> Self {
        Self::clamped(value)
    }
}

impl From<u8> for SpeedPercent {
    fn from(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }
}

impl fmt::Display for SpeedPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// H-bridge channel pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorId {
    Motor1,
    Motor2,
}

impl MotorId {
    pub const ALL: [MotorId; 2] = [MotorId::Motor1, MotorId::Motor2];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(SpeedPercent::clamped(-5).get(), 0);
        assert_eq!(SpeedPercent::clamped(150).get(), 100);
        assert_eq!(SpeedPercent::clamped(42).get(), 42);
        assert_eq!(SpeedPercent::clamped(i32::MIN).get(), 0);
        assert_eq!(SpeedPercent::clamped(i32::MAX).get(), 100);
        assert_eq!(SpeedPercent::from(200u8).get(), 100);
    }

    #[test]
    fn test_duty_endpoints() {
        assert_eq!(SpeedPercent::ZERO.duty(u16::MAX), 0);
        assert_eq!(SpeedPercent::FULL.duty(u16::MAX), u16::MAX);
        assert_eq!(SpeedPercent::FULL.duty(1000), 1000);
        // 50% of 65535 truncates, matching the board driver's int(speed * 655.35)
        assert_eq!(SpeedPercent::clamped(50).duty(u16::MAX), 32767);
    }

    #[test]
    fn test_duty_monotonic() {
        for max in [u16::MAX, 4095, 1000, 255, 7] {
            let mut previous = 0;
            for v in 0..=100 {
                let duty = SpeedPercent::clamped(v).duty(max);
                assert!(duty >= previous, "duty dropped at {}% (max {})", v, max);
                previous = duty;
            }
            assert_eq!(previous, max);
        }
    }
}
