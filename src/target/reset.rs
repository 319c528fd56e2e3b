//! The target reset pin (`spec.md` §6.2): "a target reset pin with
//! configurable polarity and pulse duration." Entering a target's bootloader
//! is host-side orchestration (`spec.md` §1 Out of scope) -- this module
//! only knows how to assert, hold, and release the pin.

use embedded_hal::digital::v2::OutputPin;
use rp2040_hal::gpio::bank0::Gpio10;
use rp2040_hal::gpio::{FunctionSio, Pin, PullDown, SioOutput};

use raiden_glitch::error::Error;

/// Which level asserts reset. Most targets in this tool's niche (LPC/STM32
/// ISP bring-up) use an active-low NRST; `ActiveHigh` covers targets wired
/// through an inverting level shifter.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum ResetPolarity {
    ActiveLow,
    ActiveHigh,
}

pub struct TargetReset {
    pin: Pin<Gpio10, FunctionSio<SioOutput>, PullDown>,
    polarity: ResetPolarity,
    pulse_ms: u32,
}

impl TargetReset {
    pub fn new(
        mut pin: Pin<Gpio10, FunctionSio<SioOutput>, PullDown>,
        polarity: ResetPolarity,
        pulse_ms: u32,
    ) -> Self {
        Self::idle(&mut pin, polarity);
        Self {
            pin,
            polarity,
            pulse_ms,
        }
    }

    fn idle(pin: &mut Pin<Gpio10, FunctionSio<SioOutput>, PullDown>, polarity: ResetPolarity) {
        match polarity {
            ResetPolarity::ActiveLow => pin.set_high().ok(),
            ResetPolarity::ActiveHigh => pin.set_low().ok(),
        };
    }

    fn assert(&mut self) {
        match self.polarity {
            ResetPolarity::ActiveLow => self.pin.set_low().ok(),
            ResetPolarity::ActiveHigh => self.pin.set_high().ok(),
        };
    }

    fn release(&mut self) {
        Self::idle(&mut self.pin, self.polarity);
    }

    /// Assert reset, hold for the configured pulse duration, then release.
    pub fn pulse(&mut self, delay: &mut cortex_m::delay::Delay) -> Result<(), Error> {
        self.assert();
        delay.delay_ms(self.pulse_ms);
        self.release();
        Ok(())
    }
}
