//! [`GlitchControl`]: the boundary between the hardware-free command
//! dispatcher in [`crate::command`] and whatever owns the real PIO/GPIO
//! resources. The binary's `glitch::controller::Controller` is the only
//! production implementer; tests use an in-memory mock (see
//! `command::tests`).
//!
//! This is the "single owned controller object" from `spec.md` §9: the
//! dispatcher borrows one `&mut dyn GlitchControl` per command, never a
//! module-global.

use crate::armstate::ArmState;
use crate::clockcfg::ClockConfig;
use crate::error::Error;
use crate::params::{GlitchParameters, TriggerEdge};

/// Static identification data reported by `STATUS` (`spec.md` §6.1).
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct BuildInfo {
    pub chip: &'static str,
    pub firmware: &'static str,
    pub version: &'static str,
}

pub trait GlitchControl {
    fn params(&self) -> GlitchParameters;

    fn set_pause(&mut self, cycles: u32) -> Result<(), Error>;
    fn set_width(&mut self, cycles: u32) -> Result<(), Error>;
    fn set_gap(&mut self, cycles: u32) -> Result<(), Error>;
    fn set_count(&mut self, count: u32) -> Result<(), Error>;

    fn set_trigger_none(&mut self) -> Result<(), Error>;
    fn set_trigger_gpio(&mut self, edge: TriggerEdge) -> Result<(), Error>;
    fn set_trigger_uart(&mut self, byte: u32) -> Result<(), Error>;

    /// `ARM ON`.
    fn arm(&mut self) -> Result<(), Error>;
    /// `ARM OFF`. Idempotent.
    fn disarm(&mut self);
    /// `GLITCH`.
    fn manual_fire(&mut self) -> Result<(), Error>;

    /// Poll for glitch completion; drives the auto-disarm transition
    /// (`spec.md` §4.3). Called once per main-loop iteration, independent of
    /// command dispatch.
    fn tick(&mut self);

    /// The documented collapse point for `ArmState::Fired` (`spec.md` §3).
    fn arm_state(&mut self) -> ArmState;
    fn fired_count(&self) -> u32;

    /// `RESET`: disarm and revert parameters to defaults.
    fn reset(&mut self);

    fn clock_set_frequency(&mut self, hz: u32) -> Result<(), Error>;
    fn clock_enable(&mut self, on: bool) -> Result<(), Error>;
    fn clock_config(&self) -> ClockConfig;

    fn build_info(&self) -> BuildInfo;

    /// Record a pending `REBOOT` / `REBOOT BOOTLOADER`. The actual reset
    /// happens in the main loop, after the response has been flushed to the
    /// host (see `spec.md` §7: "the only abrupt recoveries are disarm...and
    /// the host verb REBOOT").
    fn request_reboot(&mut self, bootloader: bool);
    fn pending_reboot(&self) -> Option<bool>;

    /// Send bytes to the target over the target UART (`spec.md` §6.2).
    fn target_send(&mut self, bytes: &[u8]) -> Result<(), Error>;
    /// Drain buffered bytes received from the target since the last call.
    fn target_recv(&mut self, out: &mut [u8]) -> usize;
    /// Pulse the target reset pin.
    fn target_reset_pulse(&mut self) -> Result<(), Error>;
    /// `TARGET POWER {ON|OFF|CYCLE}`.
    fn target_power(&mut self, on: Option<bool>) -> Result<(), Error>;
}
