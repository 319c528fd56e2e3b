//! [`Controller`]: the production [`GlitchControl`] implementation, owning
//! every PIO state machine, GPIO pin, and target peripheral (`spec.md` §4.3,
//! §5). Assembled once in `main.rs` from the resources `setup::init`
//! produces, then borrowed by the dispatcher once per host line and polled
//! once per main-loop iteration via [`GlitchControl::tick`].

use embedded_hal::digital::v2::OutputPin;
use rp2040_hal::gpio::bank0::Gpio8;
use rp2040_hal::gpio::{FunctionSio, Pin, PullDown, SioOutput};
use rp2040_hal::pac::PIO0;
use rp2040_hal::pio::PIO;

use raiden_glitch::armstate::{ArmLifecycle, ArmState};
use raiden_glitch::clockcfg::ClockConfig;
use raiden_glitch::control::{BuildInfo, GlitchControl};
use raiden_glitch::error::Error;
use raiden_glitch::params::{GlitchParameters, TriggerEdge, TriggerVariant};

use super::clockgen::ClockGenerator;
use super::pulse::PulseEngine;
use super::trigger::TriggerUnit;

use crate::target::power::TargetPower;
use crate::target::reset::TargetReset;
use crate::target::uart::TargetUart;

pub struct Controller {
    pio0: PIO<PIO0>,
    pulse: PulseEngine,
    trigger: TriggerUnit,
    clock: ClockGenerator,
    delay: cortex_m::delay::Delay,

    lifecycle: ArmLifecycle,
    params: GlitchParameters,
    clock_config: ClockConfig,
    pending_reboot: Option<bool>,

    target_uart: TargetUart,
    target_reset: TargetReset,
    target_power: TargetPower,

    armed_signal: Pin<Gpio8, FunctionSio<SioOutput>, PullDown>,
    build_info: BuildInfo,
}

impl Controller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pio0: PIO<PIO0>,
        pulse: PulseEngine,
        trigger: TriggerUnit,
        clock: ClockGenerator,
        delay: cortex_m::delay::Delay,
        target_uart: TargetUart,
        target_reset: TargetReset,
        target_power: TargetPower,
        mut armed_signal: Pin<Gpio8, FunctionSio<SioOutput>, PullDown>,
        build_info: BuildInfo,
    ) -> Self {
        armed_signal.set_low().ok();
        Self {
            pio0,
            pulse,
            trigger,
            clock,
            delay,
            lifecycle: ArmLifecycle::new(),
            params: GlitchParameters::default(),
            clock_config: ClockConfig::default(),
            pending_reboot: None,
            target_uart,
            target_reset,
            target_power,
            armed_signal,
            build_info,
        }
    }

    /// Service the target UART's receive FIFO into its ring buffer. Called
    /// once per main-loop iteration alongside [`GlitchControl::tick`], not
    /// gated on arm state -- target bytes can arrive at any time.
    pub fn service_target_uart(&mut self) {
        self.target_uart.poll_rx();
    }
}

impl GlitchControl for Controller {
    fn params(&self) -> GlitchParameters {
        self.params
    }

    fn set_pause(&mut self, cycles: u32) -> Result<(), Error> {
        self.reject_while_armed()?;
        self.params.set_pause(cycles);
        Ok(())
    }

    fn set_width(&mut self, cycles: u32) -> Result<(), Error> {
        self.reject_while_armed()?;
        self.params.set_width(cycles)
    }

    fn set_gap(&mut self, cycles: u32) -> Result<(), Error> {
        self.reject_while_armed()?;
        self.params.set_gap(cycles);
        Ok(())
    }

    fn set_count(&mut self, count: u32) -> Result<(), Error> {
        self.reject_while_armed()?;
        self.params.set_count(count)
    }

    fn set_trigger_none(&mut self) -> Result<(), Error> {
        self.reject_while_armed()?;
        self.params.trigger_variant = TriggerVariant::None;
        Ok(())
    }

    fn set_trigger_gpio(&mut self, edge: TriggerEdge) -> Result<(), Error> {
        self.reject_while_armed()?;
        self.params.trigger_variant = TriggerVariant::GpioEdge;
        self.params.trigger_edge = edge;
        Ok(())
    }

    fn set_trigger_uart(&mut self, byte: u32) -> Result<(), Error> {
        self.reject_while_armed()?;
        self.params.set_trigger_byte(byte)?;
        self.params.trigger_variant = TriggerVariant::UartByte;
        Ok(())
    }

    /// The 12-step arm sequence (`spec.md` §4.3): load and start the trigger
    /// program (or leave the slot empty for `TriggerVariant::None`), arm the
    /// boost burst if the clock is enabled, then load and start the pulse
    /// engine last so it is the first thing blocked on FIRE-IRQ -- "pulse
    /// engine enabled before trigger engine" (`spec.md` §5).
    fn arm(&mut self) -> Result<(), Error> {
        self.lifecycle.arm()?;
        self.armed_signal.set_high().ok();

        let result = (|| -> Result<(), Error> {
            match self.params.trigger_variant {
                TriggerVariant::None => self.trigger.clear_slot(&mut self.pio0),
                TriggerVariant::GpioEdge => {
                    self.trigger
                        .arm_gpio_edge(&mut self.pio0, self.params.trigger_edge)?;
                }
                TriggerVariant::UartByte => {
                    let baud = self.target_uart.baud();
                    self.trigger
                        .arm_uart_byte(&mut self.pio0, self.params.trigger_byte, baud)?;
                }
            }

            if self.clock_config.enabled {
                self.clock.arm_boost(self.params.count, &self.clock_config)?;
            }

            self.pulse.arm(&self.params);
            Ok(())
        })();

        if result.is_err() {
            self.lifecycle.disarm();
        }
        result
    }

    /// The 6-step disarm sequence (`spec.md` §4.3): cancel the in-flight
    /// trigger wait by tearing down both state machines, then return to
    /// `Disarmed`. Idempotent by construction -- both `PulseEngine::disarm`
    /// and `TriggerUnit::clear_slot` are no-ops when nothing is running.
    fn disarm(&mut self) {
        self.pulse.disarm();
        self.trigger.clear_slot(&mut self.pio0);
        self.lifecycle.disarm();
    }

    /// `GLITCH`: only valid while `Armed` with `TriggerVariant::None`
    /// (`spec.md` §4.2.3). Spawns the manual-fire helper, which raises
    /// FireSignal and FIRE-IRQ directly -- the pulse engine (already blocked
    /// on FIRE-IRQ from `arm`) unblocks exactly as it would for any other
    /// trigger source.
    fn manual_fire(&mut self) -> Result<(), Error> {
        if self.lifecycle.peek_state() != ArmState::Armed {
            return Err(Error::NotArmed);
        }
        if self.params.trigger_variant != TriggerVariant::None {
            return Err(Error::ManualFireRequiresNoTrigger);
        }
        self.trigger.fire_manual(&mut self.pio0, &mut self.delay);
        Ok(())
    }

    /// Auto-disarm on completion (`spec.md` §4.3, §9 "Auto-disarm via
    /// FIFO-empty polling"): `DONE_IRQ` is the authoritative completion
    /// signal the pulse program raises after its pulse loop drains; FIFO
    /// drain alone is checked only as the redundant secondary net, since all
    /// four parameter words are pulled before the pulse loop even starts and
    /// so the FIFO reads empty for the entire pulse train, not just at its
    /// end.
    fn tick(&mut self) {
        if self.lifecycle.peek_state() == ArmState::Armed
            && self.pulse.poll_done_irq()
            && self.pulse.fifo_drained()
        {
            self.lifecycle.mark_fired();
            self.pulse.disarm();
            self.trigger.clear_slot(&mut self.pio0);
        }
    }

    fn arm_state(&mut self) -> ArmState {
        self.lifecycle.state()
    }

    fn fired_count(&self) -> u32 {
        self.lifecycle.fired_count()
    }

    fn reset(&mut self) {
        self.disarm();
        self.params = GlitchParameters::default();
    }

    fn clock_set_frequency(&mut self, hz: u32) -> Result<(), Error> {
        self.clock_config.set_frequency(hz)
    }

    fn clock_enable(&mut self, on: bool) -> Result<(), Error> {
        if on {
            if self.clock_config.frequency_hz == 0 {
                return Err(Error::ClockFrequencyZero);
            }
            self.clock.enable(&self.clock_config)?;
        } else {
            self.clock.disable();
        }
        self.clock_config.enabled = on;
        Ok(())
    }

    fn clock_config(&self) -> ClockConfig {
        self.clock_config
    }

    fn build_info(&self) -> BuildInfo {
        self.build_info
    }

    fn request_reboot(&mut self, bootloader: bool) {
        self.pending_reboot = Some(bootloader);
    }

    fn pending_reboot(&self) -> Option<bool> {
        self.pending_reboot
    }

    fn target_send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.target_uart.send(bytes)
    }

    fn target_recv(&mut self, out: &mut [u8]) -> usize {
        self.target_uart.drain(out)
    }

    fn target_reset_pulse(&mut self) -> Result<(), Error> {
        self.target_reset.pulse(&mut self.delay)
    }

    fn target_power(&mut self, on: Option<bool>) -> Result<(), Error> {
        match on {
            Some(true) => self.target_power.set(true),
            Some(false) => self.target_power.set(false),
            None => self.target_power.cycle(&mut self.delay),
        }
    }
}

impl Controller {
    fn reject_while_armed(&self) -> Result<(), Error> {
        if self.lifecycle.peek_state() != ArmState::Disarmed {
            Err(Error::ParameterWriteWhileArmed)
        } else {
            Ok(())
        }
    }
}
