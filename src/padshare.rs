//! Type-level proof of cleared PADS_BANK0 isolation bits for pins observed
//! by more than one block at once (`spec.md` §9 REDESIGN FLAGS: "Pin sharing
//! between a driven PIO output and another PIO's input... model this at the
//! type level as an explicit 'share this pad as input to block X' capability
//! acquired and held by the controller during arm; never clear it
//! implicitly").
//!
//! Neither token owns a [`rp2040_hal::gpio::Pin`] -- the pin's funcsel stays
//! with whichever peripheral actually drives or primarily owns it (the
//! target UART, the trigger PIO block). The token only certifies that
//! `setup::init` cleared the pad's isolation latch so a second block's input
//! sampling also sees the signal.

/// Held by [`crate::glitch::trigger::TriggerUnit`]: certifies the
/// target-UART-RX pad (`spec.md` §4.2.2, §6.4) can be read by the UART
/// byte-match PIO program even while the hardware UART also owns it.
pub struct UartRxPadShare {
    _private: (),
}

impl UartRxPadShare {
    /// # Safety
    /// The caller must have already cleared the isolation bit for the
    /// target-UART-RX pad in `PADS_BANK0` (done once in `setup::init`).
    pub unsafe fn acquire() -> Self {
        Self { _private: () }
    }
}

/// Held by [`crate::glitch::clockgen::ClockGenerator`]: certifies the
/// FireSignal pad (`spec.md` §4.4, §4.5) can be read by the clock
/// generator's `jmp pin` even though the trigger/manual-fire PIO blocks are
/// the ones driving it.
pub struct FireSignalPadShare {
    _private: (),
}

impl FireSignalPadShare {
    /// # Safety
    /// The caller must have already cleared the isolation bit for the
    /// FireSignal pad in `PADS_BANK0` (done once in `setup::init`).
    pub unsafe fn acquire() -> Self {
        Self { _private: () }
    }
}
