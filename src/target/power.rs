//! The target power-switch pin (`spec.md` §6.2): `TARGET POWER {ON|OFF|CYCLE}`.
//! Typically gates a MOSFET or relay on the target's supply rail -- polarity
//! is fixed active-high (pin high energizes the target) since this firmware
//! has no host-exposed way to reconfigure it, matching `spec.md` §6.3
//! ("all configuration is volatile").

use embedded_hal::digital::v2::OutputPin;
use rp2040_hal::gpio::bank0::Gpio11;
use rp2040_hal::gpio::{FunctionSio, Pin, PullDown, SioOutput};

use raiden_glitch::error::Error;

/// How long `TARGET POWER CYCLE` holds the target off before re-energizing.
const CYCLE_OFF_MS: u32 = 250;

pub struct TargetPower {
    pin: Pin<Gpio11, FunctionSio<SioOutput>, PullDown>,
}

impl TargetPower {
    pub fn new(mut pin: Pin<Gpio11, FunctionSio<SioOutput>, PullDown>) -> Self {
        pin.set_low().ok();
        Self { pin }
    }

    pub fn set(&mut self, on: bool) -> Result<(), Error> {
        if on {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
        Ok(())
    }

    pub fn cycle(&mut self, delay: &mut cortex_m::delay::Delay) -> Result<(), Error> {
        self.pin.set_low().ok();
        delay.delay_ms(CYCLE_OFF_MS);
        self.pin.set_high().ok();
        Ok(())
    }
}
