//! The Pulse Engine (`spec.md` §4.1): a single PIO state machine that blocks
//! on FIRE-IRQ, then renders `pause` cycles of idle followed by `count`
//! (high `width`, low `gap`) pulses on the glitch-output pin pair, then
//! halts and raises a completion IRQ.
//!
//! Both output pins are driven by the *same* `set` instruction each phase
//! (`spec.md` §4.1: "both pins transition on the same clock edge with no
//! skew"); [`GLITCH_OUT_INVERTED`](crate::pins::GLITCH_OUT_INVERTED) carries
//! the complement because its pad output-invert override is set once at
//! init, not because the program drives it separately.

use rp2040_hal::gpio::bank0::{Gpio2, Gpio3};
use rp2040_hal::gpio::{FunctionPio0, Pin, PullNone};
use rp2040_hal::pac::PIO0;
use rp2040_hal::pio::{
    InstalledProgram, PIOBuilder, PIOExt, PinDir, Running, Rx, StateMachine, Tx,
    UninitStateMachine, PIO, SM0,
};

use raiden_glitch::params::GlitchParameters;
use raiden_glitch::pins::{GLITCH_OUT_INVERTED, GLITCH_OUT_NORMAL};

/// FIRE-IRQ: the shared PIO interrupt flag a trigger program raises and this
/// program blocks on (`spec.md` §4.5).
pub const FIRE_IRQ: u8 = 0;
/// Completion IRQ: raised by this program after its pulse loop drains,
/// letting the controller avoid inferring completion from FIFO depth alone
/// (`spec.md` §9, "Auto-disarm via FIFO-empty polling").
pub const DONE_IRQ: u8 = 1;

fn program() -> pio::Program<32> {
    pio_proc::pio_asm!(
        "wait 1 irq 0",
        "pull block",
        "mov x, osr",
        "pause_loop:",
        "jmp x--, pause_loop",
        "pull block",
        "mov y, osr",
        "pull block",
        "mov isr, osr",
        "pull block",
        "pulse_loop:",
        "mov x, isr",
        "set pins, 3",
        "high_loop:",
        "jmp x--, high_loop",
        "mov x, osr",
        "set pins, 0",
        "low_loop:",
        "jmp x--, low_loop",
        "jmp y--, pulse_loop",
        "irq 1",
        "halt:",
        "jmp halt",
    )
    .program
}

/// Owns the pulse engine's PIO resources across one arm/disarm cycle.
///
/// Modelled as `Option`-wrapped fields so arm/disarm can move the running
/// state machine out and back in, the same shape this crate's RTIC-derived
/// ancestor used for late-initialised local resources.
pub struct PulseEngine {
    uninit: Option<UninitStateMachine<(PIO0, SM0)>>,
    installed: Option<InstalledProgram<PIO0>>,
    running: Option<StateMachine<(PIO0, SM0), Running>>,
    tx: Option<Tx<(PIO0, SM0)>>,
    rx: Option<Rx<(PIO0, SM0)>>,
    _normal_pin: Pin<Gpio2, FunctionPio0, PullNone>,
    _inverted_pin: Pin<Gpio3, FunctionPio0, PullNone>,
}

impl PulseEngine {
    pub fn new(
        pio: &mut PIO<PIO0>,
        sm: UninitStateMachine<(PIO0, SM0)>,
        normal_pin: Pin<Gpio2, FunctionPio0, PullNone>,
        inverted_pin: Pin<Gpio3, FunctionPio0, PullNone>,
    ) -> Self {
        let installed = pio.install(&program()).expect("pulse program fits");
        Self {
            uninit: Some(sm),
            installed: Some(installed),
            running: None,
            tx: None,
            rx: None,
            _normal_pin: normal_pin,
            _inverted_pin: inverted_pin,
        }
    }

    /// Configure, clear, restart and initialise the state machine, push the
    /// four parameter words, and start it blocked on FIRE-IRQ (`spec.md`
    /// §4.3 arm steps 7-9).
    pub fn arm(&mut self, params: &GlitchParameters) {
        let installed = self.installed.take().expect("pulse program resident");
        let uninit = self.uninit.take().expect("pulse sm not already armed");

        let (mut sm, rx, mut tx) = PIOBuilder::from_program(installed)
            .set_pins(GLITCH_OUT_NORMAL, 2)
            .clock_divisor_fixed_point(1, 0)
            .build(uninit);
        sm.set_pindirs([
            (GLITCH_OUT_NORMAL, PinDir::Output),
            (GLITCH_OUT_INVERTED, PinDir::Output),
        ]);

        for word in params.pulse_fifo_words() {
            while !tx.write(word) {}
        }

        self.running = Some(sm.start());
        self.tx = Some(tx);
        self.rx = Some(rx);
    }

    /// True once the pulse loop has drained its FIFO -- the redundant safety
    /// net alongside [`DONE_IRQ`] that `spec.md` §9 allows keeping. On its
    /// own this is NOT sufficient for completion: the program pulls all four
    /// parameter words before entering `pulse_loop`, so the FIFO reads empty
    /// from the moment the state machine starts, not just once it finishes.
    pub fn fifo_drained(&self) -> bool {
        self.tx.as_ref().map(Tx::is_empty).unwrap_or(true)
    }

    /// Read and clear PIO0's raw IRQ status register for [`DONE_IRQ`],
    /// returning whether it had been raised. `rp2040_hal::pio::PIO` only
    /// surfaces the FIFO/state-machine handles it split out, not the
    /// block-wide IRQ flags `irq 1` latches -- stealing a fresh handle to
    /// the same register block is the same move `protocols::dshot` makes
    /// for a register its own wrapper doesn't expose.
    pub fn poll_done_irq(&self) -> bool {
        let pio0 = unsafe { rp2040_hal::pac::Peripherals::steal() }.PIO0;
        let raised = pio0.irq().read().irq1().bit_is_set();
        if raised {
            pio0.irq().write(|w| w.irq1().bit(true));
        }
        raised
    }

    /// Disable the state machine, clear its FIFOs and reclaim the program so
    /// the next arm can rebuild from a clean `Stopped` state (`spec.md`
    /// §4.3 disarm steps 2-4).
    pub fn disarm(&mut self) {
        let Some(sm) = self.running.take() else {
            return;
        };
        let rx = self.rx.take().expect("rx present while running");
        let tx = self.tx.take().expect("tx present while running");
        let (uninit, installed) = sm.uninit(rx, tx);
        self.uninit = Some(uninit);
        self.installed = Some(installed);
    }
}
