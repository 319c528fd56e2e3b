//! The host command surface (`spec.md` §6.1): a line-oriented dispatcher that
//! tokenizes, resolves abbreviations, calls into a [`crate::GlitchControl`]
//! implementation, and formats the `OK:`/`ERROR:` or API-mode ack response.
//!
//! Entirely hardware-free -- see `command::tests` for the mock controller
//! this module is exercised against.

pub mod parser;
pub mod verbs;

use core::fmt::Write as _;

use heapless::String;

use crate::control::GlitchControl;
use crate::error::Error;
use crate::params::{cycles_to_us, TriggerEdge};

use parser::{match_prefix, parse_hex_byte, parse_u32};
use verbs::*;

/// Longest response line this firmware emits (`STATUS` is the worst case).
const RESPONSE_CAP: usize = 192;
/// `RESPONSE_CAP` plus room for the receipt/ack bytes and a trailing newline.
const DISPATCH_CAP: usize = RESPONSE_CAP + 4;

struct Handled {
    /// Present for query verbs (`GET`, `STATUS`, `ERROR`, `TARGET RECV`):
    /// their raw payload text, shown even in API mode.
    payload: Option<String<RESPONSE_CAP>>,
}

impl Handled {
    fn ok() -> Self {
        Self { payload: None }
    }

    fn query(payload: String<RESPONSE_CAP>) -> Self {
        Self {
            payload: Some(payload),
        }
    }
}

/// Per-connection dispatcher state: whether the terse "API mode" ack
/// protocol is active, and the last error for the `ERROR` verb.
#[derive(Default)]
pub struct Dispatcher {
    api_mode: bool,
    last_error: Option<Error>,
}

impl Dispatcher {
    pub const fn new() -> Self {
        Self {
            api_mode: false,
            last_error: None,
        }
    }

    pub fn api_mode(&self) -> bool {
        self.api_mode
    }

    /// Handle one complete, CR/LF-terminated host line and return exactly
    /// what should be written back (receipt byte, payload, ack byte, or
    /// `OK:`/`ERROR:` framed text, depending on `api_mode`).
    pub fn dispatch<C: GlitchControl>(&mut self, line: &str, ctrl: &mut C) -> String<DISPATCH_CAP> {
        let mut out = String::new();
        if self.api_mode {
            let _ = out.push('.');
        }

        match self.handle(line.trim(), ctrl) {
            Ok(handled) => {
                self.last_error = None;
                if self.api_mode {
                    if let Some(payload) = handled.payload {
                        let _ = out.push_str(&payload);
                        let _ = out.push('\n');
                    }
                    let _ = out.push('+');
                } else {
                    let _ = out.push_str("OK");
                    if let Some(payload) = handled.payload {
                        let _ = out.push_str(": ");
                        let _ = out.push_str(&payload);
                    }
                    let _ = out.push('\n');
                }
            }
            Err(e) => {
                self.last_error = Some(e);
                if self.api_mode {
                    let _ = out.push('!');
                } else {
                    let _ = out.push_str("ERROR: ");
                    let _ = out.push_str(e.message());
                    let _ = out.push('\n');
                }
            }
        }
        out
    }

    fn handle<C: GlitchControl>(
        &mut self,
        line: &str,
        ctrl: &mut C,
    ) -> Result<Handled, Error> {
        let mut tokens = line.split_whitespace();
        let verb_raw = tokens.next().ok_or(Error::MissingArgument)?;
        let verb = match_prefix(verb_raw, VERBS)?;

        match verb {
            "set" => {
                let field = match_prefix(tokens.next().ok_or(Error::MissingArgument)?, SET_GET_FIELDS)?;
                let value = parse_u32(tokens.next().ok_or(Error::MissingArgument)?)?;
                match field {
                    "pause" => ctrl.set_pause(value)?,
                    "width" => ctrl.set_width(value)?,
                    "gap" => ctrl.set_gap(value)?,
                    "count" => ctrl.set_count(value)?,
                    _ => unreachable!(),
                }
                Ok(Handled::ok())
            }

            "get" => {
                let field = match_prefix(tokens.next().ok_or(Error::MissingArgument)?, SET_GET_FIELDS)?;
                let p = ctrl.params();
                let mut s = String::new();
                match field {
                    "pause" => {
                        let _ = write!(s, "{} cycles ({:.3} us)", p.pause_cycles, cycles_to_us(p.pause_cycles));
                    }
                    "width" => {
                        let _ = write!(s, "{} cycles ({:.3} us)", p.width_cycles, cycles_to_us(p.width_cycles));
                    }
                    "gap" => {
                        let _ = write!(s, "{} cycles ({:.3} us)", p.gap_cycles, cycles_to_us(p.gap_cycles));
                    }
                    "count" => {
                        let _ = write!(s, "{}", p.count);
                    }
                    _ => unreachable!(),
                }
                Ok(Handled::query(s))
            }

            "trigger" => {
                let variant = match_prefix(tokens.next().ok_or(Error::MissingArgument)?, TRIGGER_VARIANTS)?;
                match variant {
                    "none" => ctrl.set_trigger_none()?,
                    "gpio" => {
                        let edge = match_prefix(tokens.next().ok_or(Error::MissingArgument)?, EDGES)?;
                        let edge = if edge == "rising" {
                            TriggerEdge::Rising
                        } else {
                            TriggerEdge::Falling
                        };
                        ctrl.set_trigger_gpio(edge)?;
                    }
                    "uart" => {
                        let byte = parse_hex_byte(tokens.next().ok_or(Error::MissingArgument)?)?;
                        ctrl.set_trigger_uart(byte)?;
                    }
                    _ => unreachable!(),
                }
                Ok(Handled::ok())
            }

            "arm" => {
                let onoff = match_prefix(tokens.next().ok_or(Error::MissingArgument)?, ON_OFF)?;
                if onoff == "on" {
                    ctrl.arm()?;
                } else {
                    ctrl.disarm();
                }
                Ok(Handled::ok())
            }

            "glitch" => {
                ctrl.manual_fire()?;
                Ok(Handled::ok())
            }

            "status" => {
                let info = ctrl.build_info();
                let state = ctrl.arm_state();
                let p = ctrl.params();
                let clk = ctrl.clock_config();
                let mut s = String::new();
                let _ = write!(
                    s,
                    "{} {} state={:?} fired={} pause={} width={} gap={} count={} trigger={:?} clock_hz={} clock_on={}",
                    info.chip,
                    info.version,
                    state,
                    ctrl.fired_count(),
                    p.pause_cycles,
                    p.width_cycles,
                    p.gap_cycles,
                    p.count,
                    p.trigger_variant,
                    clk.frequency_hz,
                    clk.enabled,
                );
                Ok(Handled::query(s))
            }

            "reset" => {
                ctrl.reset();
                Ok(Handled::ok())
            }

            "clock" => {
                let mut freq: Option<u32> = None;
                let mut enable: Option<bool> = None;
                for tok in tokens {
                    if let Ok(hz) = parse_u32(tok) {
                        freq = Some(hz);
                    } else {
                        let onoff = match_prefix(tok, ON_OFF)?;
                        enable = Some(onoff == "on");
                    }
                }
                if freq.is_none() && enable.is_none() {
                    return Err(Error::MissingArgument);
                }
                if let Some(hz) = freq {
                    ctrl.clock_set_frequency(hz)?;
                }
                if let Some(on) = enable {
                    ctrl.clock_enable(on)?;
                }
                Ok(Handled::ok())
            }

            "error" => {
                let message = self.last_error.map(|e| e.message()).unwrap_or(Error::NoPriorError.message());
                let mut s = String::new();
                let _ = s.push_str(message);
                Ok(Handled::query(s))
            }

            "reboot" => {
                let bootloader = match tokens.next() {
                    Some(tok) => {
                        match_prefix(tok, REBOOT_MODES)?;
                        true
                    }
                    None => false,
                };
                ctrl.request_reboot(bootloader);
                Ok(Handled::ok())
            }

            "api" => {
                let onoff = match_prefix(tokens.next().ok_or(Error::MissingArgument)?, ON_OFF)?;
                self.api_mode = onoff == "on";
                Ok(Handled::ok())
            }

            "target" => self.handle_target(tokens, ctrl),

            _ => unreachable!("match_prefix(VERBS) guarantees a known verb"),
        }
    }

    fn handle_target<'a, C: GlitchControl>(
        &mut self,
        mut tokens: impl Iterator<Item = &'a str>,
        ctrl: &mut C,
    ) -> Result<Handled, Error> {
        let sub = match_prefix(tokens.next().ok_or(Error::MissingArgument)?, TARGET_SUBVERBS)?;
        match sub {
            "reset" => {
                ctrl.target_reset_pulse()?;
                Ok(Handled::ok())
            }
            "power" => {
                let mode = match_prefix(tokens.next().ok_or(Error::MissingArgument)?, POWER_MODES)?;
                match mode {
                    "on" => ctrl.target_power(Some(true))?,
                    "off" => ctrl.target_power(Some(false))?,
                    "cycle" => ctrl.target_power(None)?,
                    _ => unreachable!(),
                }
                Ok(Handled::ok())
            }
            "send" => {
                let mut buf = [0u8; 64];
                let mut n = 0;
                for tok in tokens {
                    if n >= buf.len() {
                        break;
                    }
                    buf[n] = parse_hex_byte(tok)? as u8;
                    n += 1;
                }
                ctrl.target_send(&buf[..n])?;
                Ok(Handled::ok())
            }
            "recv" => {
                let mut buf = [0u8; 64];
                let n = ctrl.target_recv(&mut buf);
                let mut s = String::new();
                for b in &buf[..n] {
                    let _ = write!(s, "{:02X}", b);
                }
                Ok(Handled::query(s))
            }
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armstate::{ArmLifecycle, ArmState};
    use crate::clockcfg::ClockConfig;
    use crate::control::{BuildInfo, GlitchControl};
    use crate::params::GlitchParameters;

    /// In-memory stand-in for the hardware controller. Tracks just enough
    /// state to exercise the dispatcher and the documented scenarios.
    #[derive(Default)]
    struct Mock {
        params: GlitchParameters,
        lifecycle: ArmLifecycle,
        clock: ClockConfig,
        reboot: Option<bool>,
        target_rx: heapless::Vec<u8, 64>,
    }

    impl GlitchControl for Mock {
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
            self.params.trigger_variant = crate::params::TriggerVariant::None;
            Ok(())
        }
        fn set_trigger_gpio(&mut self, edge: TriggerEdge) -> Result<(), Error> {
            self.reject_while_armed()?;
            self.params.trigger_variant = crate::params::TriggerVariant::GpioEdge;
            self.params.trigger_edge = edge;
            Ok(())
        }
        fn set_trigger_uart(&mut self, byte: u32) -> Result<(), Error> {
            self.reject_while_armed()?;
            self.params.set_trigger_byte(byte)?;
            self.params.trigger_variant = crate::params::TriggerVariant::UartByte;
            Ok(())
        }
        fn arm(&mut self) -> Result<(), Error> {
            self.lifecycle.arm()
        }
        fn disarm(&mut self) {
            self.lifecycle.disarm();
        }
        fn manual_fire(&mut self) -> Result<(), Error> {
            if self.lifecycle.peek_state() != ArmState::Armed {
                return Err(Error::NotArmed);
            }
            if self.params.trigger_variant != crate::params::TriggerVariant::None {
                return Err(Error::ManualFireRequiresNoTrigger);
            }
            self.lifecycle.mark_fired();
            self.lifecycle.state(); // collapse immediately, matching the real controller
            Ok(())
        }
        fn tick(&mut self) {}
        fn arm_state(&mut self) -> ArmState {
            self.lifecycle.state()
        }
        fn fired_count(&self) -> u32 {
            self.lifecycle.fired_count()
        }
        fn reset(&mut self) {
            self.lifecycle.disarm();
            self.params = GlitchParameters::default();
        }
        fn clock_set_frequency(&mut self, hz: u32) -> Result<(), Error> {
            self.clock.set_frequency(hz)
        }
        fn clock_enable(&mut self, on: bool) -> Result<(), Error> {
            if on && self.clock.frequency_hz == 0 {
                return Err(Error::ClockFrequencyZero);
            }
            self.clock.enabled = on;
            Ok(())
        }
        fn clock_config(&self) -> ClockConfig {
            self.clock
        }
        fn build_info(&self) -> BuildInfo {
            BuildInfo {
                chip: "RP2040",
                firmware: "raiden-glitch",
                version: "test",
            }
        }
        fn request_reboot(&mut self, bootloader: bool) {
            self.reboot = Some(bootloader);
        }
        fn pending_reboot(&self) -> Option<bool> {
            self.reboot
        }
        fn target_send(&mut self, _bytes: &[u8]) -> Result<(), Error> {
            Ok(())
        }
        fn target_recv(&mut self, out: &mut [u8]) -> usize {
            let n = self.target_rx.len().min(out.len());
            out[..n].copy_from_slice(&self.target_rx[..n]);
            n
        }
        fn target_reset_pulse(&mut self) -> Result<(), Error> {
            Ok(())
        }
        fn target_power(&mut self, _on: Option<bool>) -> Result<(), Error> {
            Ok(())
        }
    }

    impl Mock {
        fn reject_while_armed(&self) -> Result<(), Error> {
            if self.lifecycle.peek_state() != ArmState::Disarmed {
                Err(Error::ParameterWriteWhileArmed)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn s1_manual_fire_one_pulse() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        assert_eq!(d.dispatch("SET PAUSE 0", &mut m), "OK\n");
        assert_eq!(d.dispatch("SET WIDTH 150", &mut m), "OK\n");
        assert_eq!(d.dispatch("SET GAP 0", &mut m), "OK\n");
        assert_eq!(d.dispatch("SET COUNT 1", &mut m), "OK\n");
        assert_eq!(d.dispatch("TRIGGER NONE", &mut m), "OK\n");
        assert_eq!(d.dispatch("ARM ON", &mut m), "OK\n");
        assert_eq!(d.dispatch("GLITCH", &mut m), "OK\n");
        assert_eq!(m.fired_count(), 1);
        assert_eq!(m.lifecycle.peek_state(), ArmState::Disarmed);
    }

    #[test]
    fn s6_disarm_before_fire_is_idempotent_and_leaves_counter_unchanged() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        d.dispatch("TRIGGER GPIO RISING", &mut m);
        d.dispatch("ARM ON", &mut m);
        assert_eq!(d.dispatch("ARM OFF", &mut m), "OK\n");
        assert_eq!(d.dispatch("ARM OFF", &mut m), "OK\n"); // idempotent
        assert_eq!(m.fired_count(), 0);
        assert_eq!(m.lifecycle.peek_state(), ArmState::Disarmed);
    }

    #[test]
    fn glitch_without_arm_fails() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        assert_eq!(d.dispatch("GLITCH", &mut m), "ERROR: not armed\n");
    }

    #[test]
    fn double_arm_reports_already_armed() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        d.dispatch("ARM ON", &mut m);
        assert_eq!(d.dispatch("ARM ON", &mut m), "ERROR: already armed\n");
    }

    #[test]
    fn parameter_write_while_armed_is_rejected() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        d.dispatch("ARM ON", &mut m);
        assert_eq!(
            d.dispatch("SET WIDTH 200", &mut m),
            "ERROR: parameters are read-only while armed; disarm first\n"
        );
    }

    #[test]
    fn error_verb_returns_last_error_and_survives_success() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        d.dispatch("GLITCH", &mut m); // fails: not armed
        assert_eq!(d.dispatch("ERROR", &mut m), "OK: not armed\n");
        d.dispatch("SET PAUSE 1", &mut m);
        assert_eq!(d.dispatch("ERROR", &mut m), "OK: not armed\n");
    }

    #[test]
    fn error_verb_with_no_prior_error() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        assert_eq!(d.dispatch("ERROR", &mut m), "OK: no error\n");
    }

    #[test]
    fn api_mode_uses_ack_bytes_but_still_shows_query_payload() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        assert_eq!(d.dispatch("API ON", &mut m), "+");
        assert_eq!(d.dispatch("SET COUNT 4", &mut m), ".+");
        assert_eq!(d.dispatch("GET COUNT", &mut m), ".4\n+");
        assert_eq!(d.dispatch("ARM ON", &mut m), ".+");
        assert_eq!(d.dispatch("GLITCH", &mut m), ".+");
        // Manual fire collapsed back to Disarmed; a second GLITCH has nothing armed.
        assert_eq!(d.dispatch("GLITCH", &mut m), ".!");
    }

    #[test]
    fn ambiguous_abbreviation_is_rejected_with_specific_error() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        // "g" is ambiguous between GET and GLITCH.
        assert_eq!(d.dispatch("G COUNT", &mut m), "ERROR: ambiguous abbreviation\n");
    }

    #[test]
    fn every_verb_prefix_resolves_unambiguously() {
        use verbs::VERBS;
        // Property 9: every accepted prefix matches exactly one verb.
        for &verb in VERBS {
            for len in 1..=verb.len() {
                let prefix = &verb[..len];
                let matches: heapless::Vec<&str, 16> =
                    VERBS.iter().copied().filter(|c| c.starts_with(prefix)).collect();
                if matches.len() == 1 {
                    assert_eq!(match_prefix(prefix, VERBS), Ok(verb));
                }
            }
        }
    }

    #[test]
    fn s4_multi_pulse_parameters_accepted_in_order() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        d.dispatch("SET PAUSE 1500", &mut m);
        d.dispatch("SET WIDTH 150", &mut m);
        d.dispatch("SET GAP 1500", &mut m);
        d.dispatch("SET COUNT 3", &mut m);
        d.dispatch("TRIGGER NONE", &mut m);
        d.dispatch("ARM ON", &mut m);
        d.dispatch("GLITCH", &mut m);
        let p = m.params();
        assert_eq!(p.pulse_fifo_words()[1], 2); // count - 1
        assert_eq!(m.fired_count(), 1);
    }

    #[test]
    fn s5_clock_boost_configuration_round_trips() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        assert_eq!(d.dispatch("CLOCK 12000000 ON", &mut m), "OK\n");
        assert!(m.clock_config().enabled);
        assert_eq!(m.clock_config().frequency_hz, 12_000_000);
    }

    #[test]
    fn clock_on_without_frequency_fails() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        assert_eq!(
            d.dispatch("CLOCK ON", &mut m),
            "ERROR: clock frequency must be nonzero to enable\n"
        );
    }

    #[test]
    fn reset_clears_parameters_and_disarms() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        d.dispatch("SET WIDTH 77", &mut m);
        d.dispatch("ARM ON", &mut m);
        d.dispatch("RESET", &mut m);
        assert_eq!(m.params().width_cycles, GlitchParameters::default().width_cycles);
        assert_eq!(m.lifecycle.peek_state(), ArmState::Disarmed);
    }

    #[test]
    fn reboot_is_deferred_to_the_main_loop() {
        let mut d = Dispatcher::new();
        let mut m = Mock::default();
        assert_eq!(d.dispatch("REBOOT BOOTLOADER", &mut m), "OK\n");
        assert_eq!(m.pending_reboot(), Some(true));
    }
}
