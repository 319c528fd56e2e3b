//! Trigger Sources (`spec.md` §4.2): the three mutually-exclusive PIO
//! programs that can unblock the pulse engine -- GPIO edge, UART byte
//! match, and the no-trigger manual-fire helper -- plus the "program slot"
//! resource that guarantees at most one is resident at a time (`spec.md`
//! §9, "Dynamic PIO program loading").

use rp2040_hal::gpio::bank0::{Gpio4, Gpio7};
use rp2040_hal::gpio::{FunctionPio0, Pin, PullNone, PullUp};
use rp2040_hal::pac::PIO0;
use rp2040_hal::pio::{
    PIOBuilder, PIOExt, PinDir, Running, Rx, StateMachine, Tx, UninitStateMachine, PIO, SM1, SM2,
};

use raiden_glitch::error::Error;
use raiden_glitch::params::TriggerEdge;
use raiden_glitch::pins::{FIRE_SIGNAL, TARGET_UART_RX, TRIGGER_GPIO};
use raiden_glitch::trigger_timing::uart_sample_divider;

use crate::padshare::UartRxPadShare;

/// Consecutive samples the line must hold the opposite-of-requested level
/// before an edge is trusted (`spec.md` §4.2.1). Capped at 31 by the PIO
/// `set` instruction's 5-bit immediate.
const STABILITY_SAMPLES: u8 = 31;

/// Re-samples the line on every pass through the confirmation loop instead
/// of inserting a blind delay, so a transient glitch that appears after
/// part of the window has already elapsed restarts the count rather than
/// being missed (`spec.md` §4.2.1, scenario S2). `jmp pin` tests whichever
/// GPIO `arm_gpio_edge` wires as the JMP_PIN mapping (`TRIGGER_GPIO`, the
/// same dedicated-pin mechanism `clockgen::program` uses for FireSignal).
fn gpio_edge_program(edge: TriggerEdge) -> pio::Program<32> {
    match edge {
        // Opposite = low: restart the count the instant the line goes high,
        // then fire as soon as it does go high once the count has held.
        TriggerEdge::Rising => pio_proc::pio_asm!(
            "restart:",
            "set x, {stable}",
            "confirm:",
            "jmp pin, restart",
            "jmp x--, confirm",
            "wait_edge:",
            "jmp pin, fire",
            "jmp wait_edge",
            "fire:",
            "set pins, 1",
            "irq 0",
            "halt:",
            "jmp halt",
            stable = STABILITY_SAMPLES,
        )
        .program,
        // Opposite = high: restart the count the instant the line goes low,
        // then fire once it does go low having held high for the window.
        TriggerEdge::Falling => pio_proc::pio_asm!(
            "restart:",
            "set x, {stable}",
            "confirm:",
            "jmp pin, stay",
            "jmp restart",
            "stay:",
            "jmp x--, confirm",
            "wait_edge:",
            "jmp pin, wait_edge",
            "fire:",
            "set pins, 1",
            "irq 0",
            "halt:",
            "jmp halt",
            stable = STABILITY_SAMPLES,
        )
        .program,
    }
}

fn uart_byte_match_program() -> pio::Program<32> {
    // Samples the shared target-RX line at 8x oversampling (`spec.md`
    // §4.2.2). The comparison byte is pulled once before the wrap and kept
    // resident in `y`; each received byte is shifted into `isr`, compared,
    // and the match path raises FireSignal and FIRE-IRQ before halting.
    pio_proc::pio_asm!(
        "pull block",
        "mov y, osr",
        ".wrap_target",
        "start:",
        "wait 0 pin 0",
        "set x, 7 [3]",
        "bitloop:",
        "in pins, 1 [6]",
        "jmp x--, bitloop",
        "mov x, isr",
        "mov isr, null",
        "jmp x!=y, start",
        "set pins, 1",
        "irq 0",
        "halt:",
        "jmp halt",
        ".wrap",
    )
    .program
}

fn manual_fire_program() -> pio::Program<32> {
    // The "spare state machine" helper from `spec.md` §4.2.3 / §4.3: raise
    // FireSignal, assert FIRE-IRQ, then sit idle until the controller tears
    // it down.
    pio_proc::pio_asm!("set pins, 1", "irq 0", "halt:", "jmp halt",).program
}

/// Which variant is currently resident in the trigger slot, if any.
enum TriggerSlot {
    None,
    GpioEdge {
        sm: StateMachine<(PIO0, SM1), Running>,
        rx: Rx<(PIO0, SM1)>,
        tx: Tx<(PIO0, SM1)>,
    },
    UartByte {
        sm: StateMachine<(PIO0, SM1), Running>,
        rx: Rx<(PIO0, SM1)>,
        tx: Tx<(PIO0, SM1)>,
    },
}

/// Owns the single shared trigger state machine (SM1) and the spare
/// manual-fire helper (SM2). At most one trigger program occupies SM1 at a
/// time; loading a new variant always unloads the previous one first
/// (`spec.md` §4.3 arm steps 2-4, §5 "never leaves more than one trigger
/// program resident").
pub struct TriggerUnit {
    trigger_uninit: Option<UninitStateMachine<(PIO0, SM1)>>,
    slot: TriggerSlot,
    helper_uninit: Option<UninitStateMachine<(PIO0, SM2)>>,
    helper_running: Option<(
        StateMachine<(PIO0, SM2), Running>,
        Rx<(PIO0, SM2)>,
        Tx<(PIO0, SM2)>,
    )>,
    _trigger_pin: Pin<Gpio4, FunctionPio0, PullUp>,
    _fire_signal_pin: Pin<Gpio7, FunctionPio0, PullNone>,
    _uart_rx_share: UartRxPadShare,
}

impl TriggerUnit {
    pub fn new(
        trigger_sm: UninitStateMachine<(PIO0, SM1)>,
        helper_sm: UninitStateMachine<(PIO0, SM2)>,
        trigger_pin: Pin<Gpio4, FunctionPio0, PullUp>,
        fire_signal_pin: Pin<Gpio7, FunctionPio0, PullNone>,
        uart_rx_share: UartRxPadShare,
    ) -> Self {
        Self {
            trigger_uninit: Some(trigger_sm),
            slot: TriggerSlot::None,
            helper_uninit: Some(helper_sm),
            helper_running: None,
            _trigger_pin: trigger_pin,
            _fire_signal_pin: fire_signal_pin,
            _uart_rx_share: uart_rx_share,
        }
    }

    /// Unload whatever is resident, then load and enable the GPIO edge
    /// trigger for `edge`.
    pub fn arm_gpio_edge(
        &mut self,
        pio: &mut PIO<PIO0>,
        edge: TriggerEdge,
    ) -> Result<(), Error> {
        self.clear_slot(pio);
        let installed = pio
            .install(&gpio_edge_program(edge))
            .map_err(|_| Error::NoRoomForTrigger)?;
        let uninit = self.trigger_uninit.take().expect("trigger slot free");
        let (mut sm, rx, tx) = PIOBuilder::from_program(installed)
            .jmp_pin(TRIGGER_GPIO)
            .set_pins(FIRE_SIGNAL, 1)
            .clock_divisor_fixed_point(1, 0)
            .build(uninit);
        sm.set_pindirs([(FIRE_SIGNAL, PinDir::Output)]);
        self.slot = TriggerSlot::GpioEdge {
            sm: sm.start(),
            rx,
            tx,
        };
        Ok(())
    }

    /// Unload whatever is resident, then load and enable the UART
    /// byte-match trigger for `byte` at `baud` (`spec.md` §4.2.2; baud is
    /// derived from the target UART configuration per the Open Question
    /// resolution in `DESIGN.md`).
    pub fn arm_uart_byte(
        &mut self,
        pio: &mut PIO<PIO0>,
        byte: u8,
        baud: u32,
    ) -> Result<(), Error> {
        self.clear_slot(pio);
        let installed = pio
            .install(&uart_byte_match_program())
            .map_err(|_| Error::NoRoomForTrigger)?;
        let uninit = self.trigger_uninit.take().expect("trigger slot free");
        let divider = uart_sample_divider(baud).max(1);
        let (mut sm, rx, mut tx) = PIOBuilder::from_program(installed)
            .in_pin_base(TARGET_UART_RX)
            .set_pins(FIRE_SIGNAL, 1)
            .clock_divisor_fixed_point(divider as u16, 0)
            .build(uninit);
        sm.set_pindirs([(FIRE_SIGNAL, PinDir::Output)]);
        while !tx.write(u32::from(byte)) {}
        self.slot = TriggerSlot::UartByte {
            sm: sm.start(),
            rx,
            tx,
        };
        Ok(())
    }

    /// Disable and unload any resident trigger program, returning the slot
    /// to empty (`spec.md` §4.3 disarm step 2, arm steps 2-4).
    pub fn clear_slot(&mut self, pio: &mut PIO<PIO0>) {
        match core::mem::replace(&mut self.slot, TriggerSlot::None) {
            TriggerSlot::None => {}
            TriggerSlot::GpioEdge { sm, rx, tx } | TriggerSlot::UartByte { sm, rx, tx } => {
                let (uninit, installed) = sm.uninit(rx, tx);
                pio.uninstall(installed);
                self.trigger_uninit = Some(uninit);
            }
        }
    }

    /// Spawn the manual-fire helper, wait for it to assert FIRE-IRQ, and
    /// tear it back down (`spec.md` §4.3 "Manual fire").
    pub fn fire_manual(&mut self, pio: &mut PIO<PIO0>, delay: &mut cortex_m::delay::Delay) {
        let installed = pio
            .install(&manual_fire_program())
            .expect("manual-fire helper always fits");
        let uninit = self.helper_uninit.take().expect("helper slot free");
        let (mut sm, rx, tx) = PIOBuilder::from_program(installed)
            .set_pins(FIRE_SIGNAL, 1)
            .clock_divisor_fixed_point(1, 0)
            .build(uninit);
        sm.set_pindirs([(FIRE_SIGNAL, PinDir::Output)]);
        self.helper_running = Some((sm.start(), rx, tx));

        delay.delay_us(1);

        if let Some((sm, rx, tx)) = self.helper_running.take() {
            let (uninit, installed) = sm.uninit(rx, tx);
            pio.uninstall(installed);
            self.helper_uninit = Some(uninit);
        }
    }
}
