//! The Clock Generator (`spec.md` §4.4): a free-running square-wave PIO
//! program on its own PIO block, toggling at a host-specified frequency and
//! bursting to double frequency for exactly `count` half-periods whenever
//! FireSignal goes high.

use rp2040_hal::gpio::bank0::Gpio9;
use rp2040_hal::gpio::{FunctionPio1, Pin, PullNone};
use rp2040_hal::pac::PIO1;
use rp2040_hal::pio::{
    InstalledProgram, PIOBuilder, PIOExt, PinDir, Running, Rx, StateMachine, Tx,
    UninitStateMachine, PIO, SM0,
};

use raiden_glitch::clockcfg::ClockConfig;
use raiden_glitch::error::Error;
use raiden_glitch::pins::{CLOCK_OUT, FIRE_SIGNAL};

use crate::padshare::FireSignalPadShare;

/// Only checks FireSignal during the low half of the baseline period; a
/// deliberate simplification against the spec's "observes FireSignal"
/// wording, acceptable because a one-half-period boost-entry latency is
/// within the documented residual.
fn program() -> pio::Program<32> {
    pio_proc::pio_asm!(
        "pull block",
        "mov isr, osr",
        "pull block",
        ".wrap_target",
        "reload_low:",
        "mov x, osr",
        "low_wait:",
        "jmp pin, enter_boost",
        "jmp x--, low_wait",
        "reload_high:",
        "mov x, osr",
        "set pins, 1",
        "high_wait:",
        "jmp x--, high_wait",
        "set pins, 0",
        ".wrap",
        "enter_boost:",
        "pull block",
        "mov y, osr",
        "boost_low:",
        "mov x, isr",
        "boost_low_wait:",
        "jmp x--, boost_low_wait",
        "set pins, 1",
        "jmp y--, boost_high",
        "jmp restore_baseline",
        "boost_high:",
        "mov x, isr",
        "set pins, 0",
        "boost_high_wait:",
        "jmp x--, boost_high_wait",
        "jmp y--, boost_low",
        "restore_baseline:",
        "set pins, 0",
        "pull block",
        "jmp reload_low",
    )
    .program
}

/// Owns the clock generator's dedicated PIO1/SM0 resources. Runs
/// continuously once enabled; `enable`/`disable` build and tear it down the
/// same way [`crate::glitch::pulse::PulseEngine`] does for the pulse engine,
/// except the clock generator is not part of the arm/disarm lifecycle --
/// `spec.md` §3: "boost_active is independent of Armed".
pub struct ClockGenerator {
    uninit: Option<UninitStateMachine<(PIO1, SM0)>>,
    installed: Option<InstalledProgram<PIO1>>,
    running: Option<StateMachine<(PIO1, SM0), Running>>,
    tx: Option<Tx<(PIO1, SM0)>>,
    rx: Option<Rx<(PIO1, SM0)>>,
    _out_pin: Pin<Gpio9, FunctionPio1, PullNone>,
    _fire_signal_share: FireSignalPadShare,
}

impl ClockGenerator {
    pub fn new(
        pio: &mut PIO<PIO1>,
        sm: UninitStateMachine<(PIO1, SM0)>,
        out_pin: Pin<Gpio9, FunctionPio1, PullNone>,
        fire_signal_share: FireSignalPadShare,
    ) -> Self {
        let installed = pio.install(&program()).expect("clockgen program fits");
        Self {
            uninit: Some(sm),
            installed: Some(installed),
            running: None,
            tx: None,
            rx: None,
            _out_pin: out_pin,
            _fire_signal_share: fire_signal_share,
        }
    }

    /// Build and start the state machine at `config`'s frequency, with
    /// `jmp_pin` wired to FireSignal so the boost path can be entered from
    /// hardware alone.
    pub fn enable(&mut self, config: &ClockConfig) -> Result<(), Error> {
        let baseline = config.baseline_half_period()?;
        let boost = config.boost_half_period()?;

        let installed = self.installed.take().expect("clockgen program resident");
        let uninit = self.uninit.take().expect("clockgen sm not already running");

        let (mut sm, rx, mut tx) = PIOBuilder::from_program(installed)
            .set_pins(CLOCK_OUT, 1)
            .jmp_pin(FIRE_SIGNAL)
            .clock_divisor_fixed_point(1, 0)
            .build(uninit);
        sm.set_pindirs([(CLOCK_OUT, PinDir::Output)]);

        // Setup preload: boost half-period (stashed in isr for the boost_low/
        // boost_high phases only), then baseline half-period (stays resident
        // in osr, re-read by both the low and high baseline phases -- `mov`
        // doesn't consume it, so one value drives a symmetric baseline wave).
        while !tx.write(boost) {}
        while !tx.write(baseline) {}

        self.running = Some(sm.start());
        self.tx = Some(tx);
        self.rx = Some(rx);
        Ok(())
    }

    /// Arm the boost burst for the next fire by pushing the two words
    /// `spec.md` §4.3 arm step 11 describes: the boosted half-period count,
    /// then the baseline-period restore word.
    pub fn arm_boost(&mut self, count: u32, config: &ClockConfig) -> Result<(), Error> {
        let baseline = config.baseline_half_period()?;
        let Some(tx) = self.tx.as_mut() else {
            return Err(Error::ClockNotConfigured);
        };
        while !tx.write(count) {}
        while !tx.write(baseline) {}
        Ok(())
    }

    pub fn disable(&mut self) {
        let Some(sm) = self.running.take() else {
            return;
        };
        let rx = self.rx.take().expect("rx present while running");
        let tx = self.tx.take().expect("tx present while running");
        let (uninit, installed) = sm.uninit(rx, tx);
        self.uninit = Some(uninit);
        self.installed = Some(installed);
    }

    pub fn is_enabled(&self) -> bool {
        self.running.is_some()
    }
}
