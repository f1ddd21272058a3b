// Ultrasonic ranging sensor (HC-SR04 style)
//
// Trigger: low 2us, high 10us, low. Echo: high pulse width is the round-trip time.

use std::fmt;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use tracing::warn;

use crate::config::{ECHO_TIMEOUT, SOUND_CM_PER_US, TRIGGER_PULSE_US, TRIGGER_SETTLE_US};
use crate::hal::{EchoInput, HardwareError};

/// Result of one sensor poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceReading {
    /// Distance to the nearest object in centimeters
    Centimeters(f64),
    /// No complete echo within the timeout (nothing in range, or sensor fault)
    NoEcho,
}

impl DistanceReading {
    /// Convert an echo pulse width to a reading
    pub fn from_echo(width: Duration) -> Self {
        let micros = width.as_micros() as f64;
        DistanceReading::Centimeters((micros / 2.0) * SOUND_CM_PER_US)
    }

    pub fn centimeters(self) -> Option<f64> {
        match self {
            DistanceReading::Centimeters(cm) => Some(cm),
            DistanceReading::NoEcho => None,
        }
    }
}

impl fmt::Display for DistanceReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceReading::Centimeters(cm) => write!(f, "{:.2} cm", cm),
            DistanceReading::NoEcho => write!(f, "no echo"),
        }
    }
}

/// Anything the control loop can poll for a distance
pub trait RangeFinder {
    fn measure(&mut self) -> DistanceReading;
}

impl<R: RangeFinder + ?Sized> RangeFinder for &mut R {
    fn measure(&mut self) -> DistanceReading {
        (**self).measure()
    }
}

/// Ranging sensor on a trigger output and an echo input
pub struct DistanceSensor<T, E, D> {
    trigger: T,
    echo: E,
    delay: D,
    timeout: Duration,
}

impl<T, E, D> DistanceSensor<T, E, D>
where
    T: OutputPin,
    E: EchoInput,
    D: DelayNs,
{
    pub fn new(trigger: T, echo: E, delay: D) -> Self {
        Self {
            trigger,
            echo,
            delay,
            timeout: ECHO_TIMEOUT,
        }
    }

    fn pulse_trigger(&mut self) -> Result<(), T::Error> {
        self.trigger.set_low()?;
        self.delay.delay_us(TRIGGER_SETTLE_US);
        self.trigger.set_high()?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low()
    }

    /// Fire one ranging pulse and time the echo, surfacing line faults.
    ///
    /// Pulses longer than the echo timeout count as `NoEcho`.
    pub fn try_measure(&mut self) -> Result<DistanceReading, HardwareError> {
        self.pulse_trigger().map_err(|e| HardwareError::Gpio {
            pin: "trigger",
            reason: format!("{:?}", e),
        })?;

        let width = self
            .echo
            .high_pulse_width(self.timeout)
            .map_err(|e| HardwareError::Echo(format!("{:?}", e)))?;

        Ok(match width {
            Some(width) if width <= self.timeout => DistanceReading::from_echo(width),
            _ => DistanceReading::NoEcho,
        })
    }
}

impl<T, E, D> RangeFinder for DistanceSensor<T, E, D>
where
    T: OutputPin,
    E: EchoInput,
    D: DelayNs,
{
    /// Fire one ranging pulse and time the echo.
    ///
    /// I/O faults on either line are logged and reported as `NoEcho`.
    fn measure(&mut self) -> DistanceReading {
        self.try_measure().unwrap_or_else(|e| {
            warn!("Distance sensor fault: {}", e);
            DistanceReading::NoEcho
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use embedded_hal::digital;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[derive(Default)]
    struct RecordingDelay {
        ns: Vec<u32>,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.ns.push(ns);
        }
    }

    struct ScriptedEcho {
        widths: VecDeque<Option<Duration>>,
        timeouts: Vec<Duration>,
    }

    impl ScriptedEcho {
        fn new(widths: impl IntoIterator<Item = Option<Duration>>) -> Self {
            Self {
                widths: widths.into_iter().collect(),
                timeouts: Vec::new(),
            }
        }
    }

    impl EchoInput for ScriptedEcho {
        type Error = &'static str;

        fn high_pulse_width(&mut self, timeout: Duration) -> Result<Option<Duration>, Self::Error> {
            self.timeouts.push(timeout);
            self.widths.pop_front().ok_or("script exhausted")
        }
    }

    fn trigger_sequence(pulses: usize) -> Vec<PinTransaction> {
        (0..pulses)
            .flat_map(|_| {
                [
                    PinTransaction::set(PinState::Low),
                    PinTransaction::set(PinState::High),
                    PinTransaction::set(PinState::Low),
                ]
            })
            .collect()
    }

    #[test]
    fn test_trigger_pulse_shape() {
        let trigger = PinMock::new(&trigger_sequence(1));
        let echo = ScriptedEcho::new([Some(Duration::from_micros(1000))]);
        let mut sensor = DistanceSensor::new(trigger, echo, RecordingDelay::default());

        sensor.measure();

        assert_eq!(sensor.delay.ns, vec![2_000, 10_000]);
        assert_eq!(sensor.echo.timeouts, vec![Duration::from_millis(30)]);
        sensor.trigger.done();
    }

    #[test]
    fn test_echo_converts_to_centimeters() {
        let trigger = PinMock::new(&trigger_sequence(2));
        let echo = ScriptedEcho::new([
            Some(Duration::from_micros(1000)),
            Some(Duration::from_micros(583)),
        ]);
        let mut sensor = DistanceSensor::new(trigger, echo, RecordingDelay::default());

        assert_eq!(sensor.measure(), DistanceReading::Centimeters(500.0 * 0.0343));
        assert_eq!(sensor.measure(), DistanceReading::Centimeters(291.5 * 0.0343));
        sensor.trigger.done();
    }

    #[test]
    fn test_timeout_and_fault_are_no_echo() {
        let trigger = PinMock::new(&trigger_sequence(3));
        // Third poll finds the script empty, i.e. an input error
        let echo = ScriptedEcho::new([None, None]);
        let mut sensor = DistanceSensor::new(trigger, echo, RecordingDelay::default());

        assert_eq!(sensor.measure(), DistanceReading::NoEcho);
        assert!(matches!(sensor.try_measure(), Ok(DistanceReading::NoEcho)));
        match sensor.try_measure() {
            Err(HardwareError::Echo(reason)) => assert!(reason.contains("script exhausted")),
            other => panic!("expected echo fault, got {:?}", other),
        }
        sensor.trigger.done();
    }

    /// Trigger line whose driver has gone away
    struct DeadPin;

    impl digital::ErrorType for DeadPin {
        type Error = digital::ErrorKind;
    }

    impl OutputPin for DeadPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(digital::ErrorKind::Other)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(digital::ErrorKind::Other)
        }
    }

    #[test]
    fn test_trigger_fault_reported() {
        let echo = ScriptedEcho::new(Vec::new());
        let mut sensor = DistanceSensor::new(DeadPin, echo, RecordingDelay::default());

        match sensor.try_measure() {
            Err(HardwareError::Gpio { pin, .. }) => assert_eq!(pin, "trigger"),
            other => panic!("expected trigger fault, got {:?}", other),
        }
        assert_eq!(sensor.measure(), DistanceReading::NoEcho);
        // Echo never polled after a trigger fault
        assert!(sensor.echo.timeouts.is_empty());
    }

    #[test]
    fn test_pulse_longer_than_timeout_is_no_echo() {
        let trigger = PinMock::new(&trigger_sequence(2));
        let echo = ScriptedEcho::new([
            Some(Duration::from_millis(40)),
            Some(Duration::from_millis(30)),
        ]);
        let mut sensor = DistanceSensor::new(trigger, echo, RecordingDelay::default());

        assert_eq!(sensor.measure(), DistanceReading::NoEcho);
        // Exactly at the bound still counts
        assert_eq!(
            sensor.measure(),
            DistanceReading::Centimeters(15_000.0 * 0.0343)
        );
        sensor.trigger.done();
    }

    #[test]
    fn test_reading_display() {
        assert_eq!(DistanceReading::Centimeters(12.346).to_string(), "12.35 cm");
        assert_eq!(DistanceReading::NoEcho.to_string(), "no echo");
        assert_eq!(DistanceReading::NoEcho.centimeters(), None);
    }
}
