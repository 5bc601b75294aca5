//! Audio level indicator.
//!
//! The duty cycle follows the magnitude of the first sample of each output
//! block, shifted down by `8 - brightness` and capped at 255.

use crate::dsp::helpers::magnitude;

/// Highest brightness setting (no shift).
pub const MAX_BRIGHTNESS: u8 = 8;

/// 8-bit LED level for a sample at `brightness` (0..=8).
pub fn led_level(sample: i16, brightness: u8) -> u8 {
    let shift = MAX_BRIGHTNESS - brightness.min(MAX_BRIGHTNESS);
    (magnitude(sample) >> shift).min(u16::from(u8::MAX)) as u8
}

/// Something that shows the current output level.
pub trait LevelIndicator {
    fn show(&mut self, level: u8);

    fn off(&mut self) {
        self.show(0);
    }
}

/// Indicator for boards without a level LED.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLed;

impl LevelIndicator for NoLed {
    fn show(&mut self, _level: u8) {}
}

#[cfg(feature = "led")]
pub use pwm::LevelLed;

#[cfg(feature = "led")]
mod pwm {
    use embedded_hal::pwm::SetDutyCycle;
    use log::warn;

    use super::LevelIndicator;

    /// Level LED on a PWM channel.
    pub struct LevelLed<P> {
        pwm: P,
    }

    impl<P: SetDutyCycle> LevelLed<P> {
        pub fn new(pwm: P) -> Self {
            LevelLed { pwm }
        }

        pub fn release(self) -> P {
            self.pwm
        }
    }

    impl<P: SetDutyCycle> LevelIndicator for LevelLed<P> {
        fn show(&mut self, level: u8) {
            if let Err(e) = self.pwm.set_duty_cycle_fraction(u16::from(level), u16::from(u8::MAX)) {
                warn!("Level LED update failed: {e:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_scales_with_brightness() {
        assert_eq!(led_level(0, 8), 0);
        assert_eq!(led_level(200, 8), 200);
        assert_eq!(led_level(-200, 8), 200);
        assert_eq!(led_level(1000, 8), 255);
        assert_eq!(led_level(1000, 4), 62);
        assert_eq!(led_level(i16::MIN, 0), 128);
        assert_eq!(led_level(i16::MAX, 0), 127);
        assert_eq!(led_level(300, 20), 255);
    }

    #[cfg(feature = "led")]
    mod pwm {
        use super::super::*;
        use core::convert::Infallible;
        use embedded_hal::pwm::{ErrorType, SetDutyCycle};

        struct MockPwm {
            duty: u16,
        }

        impl ErrorType for MockPwm {
            type Error = Infallible;
        }

        impl SetDutyCycle for MockPwm {
            fn max_duty_cycle(&self) -> u16 {
                1000
            }

            fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
                self.duty = duty;
                Ok(())
            }
        }

        #[test]
        fn duty_follows_level_and_turns_off() {
            let mut led = LevelLed::new(MockPwm { duty: 0 });
            led.show(255);
            led.show(51);
            let pwm = led.release();
            assert_eq!(pwm.duty, 200);

            let mut led = LevelLed::new(pwm);
            led.off();
            assert_eq!(led.release().duty, 0);
        }
    }
}
