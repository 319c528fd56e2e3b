//! Hardware bring-up (`spec.md` §2, §6.4): clock configuration, PIO block
//! splitting, pin function assignment (including the pad-isolation clearing
//! from `spec.md` §9, "Pin sharing between a driven PIO output and another
//! PIO's input"), and the USB CDC-ACM bus allocator. Produces a fully wired
//! [`Controller`] and USB resources for `main.rs`.
//!
//! Nothing outside this module touches a PAC register directly -- the
//! "dynamic PIO program loading" and "pin sharing" Design Notes both call
//! for bring-up to be one explicit place, not ad-hoc init calls scattered
//! through the firmware.

use cortex_m::delay::Delay;
use fugit::RateExtU32;
use rp2040_hal::clocks::{init_clocks_and_plls, Clock};
use rp2040_hal::gpio::{FunctionPio0, FunctionPio1, FunctionUart, Pins, PullNone, PullUp};
use rp2040_hal::pac;
use rp2040_hal::pio::PIOExt;
use rp2040_hal::usb::UsbBus;
use rp2040_hal::{Sio, Watchdog};
use usb_device::bus::UsbBusAllocator;

use raiden_glitch::control::BuildInfo;
use raiden_glitch::params::SYS_CLK_HZ;
use raiden_glitch::pins as pinmap;

use crate::glitch::clockgen::ClockGenerator;
use crate::glitch::controller::Controller;
use crate::glitch::pulse::PulseEngine;
use crate::glitch::trigger::TriggerUnit;
use crate::padshare::{FireSignalPadShare, UartRxPadShare};
use crate::target::{ResetPolarity, TargetPower, TargetReset, TargetUart};

/// Baud the target UART (and, implicitly, the UART byte-match trigger)
/// starts at before the host changes anything.
pub const DEFAULT_TARGET_BAUD: u32 = 115_200;

/// How long `TARGET RESET` holds the reset line asserted.
const DEFAULT_RESET_PULSE_MS: u32 = 10;

/// External crystal on the reference carrier board.
const XOSC_FREQ_HZ: u32 = 12_000_000;

/// Everything `main`'s loop needs after bring-up.
pub struct Resources {
    pub controller: Controller,
    pub usb_bus: UsbBusAllocator<UsbBus>,
}

/// Bring up clocks, PIO, pins, and peripherals, and assemble the
/// [`Controller`]. Consumes the PAC/core singletons.
///
/// Panics only on truly unreachable bring-up failures (an XOSC/PLL that
/// never locks, a system clock that misses the documented 150 MHz this
/// entire firmware's cycle counts assume) -- never on user input, which
/// always routes through `Error` (`SPEC_FULL.md` §6).
pub fn init(mut pac: pac::Peripherals, core: pac::CorePeripherals) -> Resources {
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let clocks = init_clocks_and_plls(
        XOSC_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .expect("XOSC/PLL bring-up must succeed; a timing core has no degraded-clock mode");
    assert_eq!(
        clocks.system_clock.freq().to_Hz(),
        SYS_CLK_HZ,
        "every cycle count this firmware reports assumes the documented 150 MHz system clock"
    );

    let sio = Sio::new(pac.SIO);
    let pins = Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let delay = Delay::new(core.SYST, clocks.system_clock.freq().to_Hz());

    // Clear the pad isolation bit for the two pins a second PIO block
    // observes as input while a different block drives them (`spec.md` §5,
    // §9): the target-UART-RX pin (hardware UART + UART byte-match trigger)
    // and the FireSignal pin (trigger/manual-fire programs + clock
    // generator). Acquired once, here, and never again -- the capability
    // tokens in `padshare.rs` exist so nothing downstream can "forget" and
    // re-isolate the pad.
    pac.PADS_BANK0
        .gpio(pinmap::TARGET_UART_RX as usize)
        .modify(|_, w| w.ie().set_bit());
    pac.PADS_BANK0
        .gpio(pinmap::FIRE_SIGNAL as usize)
        .modify(|_, w| w.ie().set_bit());
    let uart_rx_share = unsafe { UartRxPadShare::acquire() };
    let fire_signal_share = unsafe { FireSignalPadShare::acquire() };

    // PIO0: pulse engine (SM0), trigger programs (SM1), manual-fire helper
    // (SM2). SM3 is left unused, available for a future trigger variant.
    let (mut pio0, sm0, sm1, sm2, _sm3) = pac.PIO0.split(&mut pac.RESETS);
    let glitch_normal = pins.gpio2.reconfigure::<FunctionPio0, PullNone>();
    let glitch_inverted = pins.gpio3.reconfigure::<FunctionPio0, PullNone>();
    let trigger_pin = pins.gpio4.reconfigure::<FunctionPio0, PullUp>();
    // FireSignal itself must be claimed for PIO0 too: the trigger/manual-fire
    // programs' `set pins, 1` and the clock generator's `jmp_pin` (a
    // different PIO block) only reach/observe the pad once its funcsel
    // actually routes to PIO0, not just once its isolation bit is cleared.
    let fire_signal_pin = pins.gpio7.reconfigure::<FunctionPio0, PullNone>();
    let pulse = PulseEngine::new(&mut pio0, sm0, glitch_normal, glitch_inverted);
    let trigger = TriggerUnit::new(sm1, sm2, trigger_pin, fire_signal_pin, uart_rx_share);

    // PIO1: clock generator (SM0), entirely separate from the arm/disarm
    // lifecycle (`spec.md` §3: "boost_active is independent of Armed").
    let (mut pio1, clk_sm0, _clk_sm1, _clk_sm2, _clk_sm3) = pac.PIO1.split(&mut pac.RESETS);
    let clock_pin = pins.gpio9.reconfigure::<FunctionPio1, PullNone>();
    let clock = ClockGenerator::new(&mut pio1, clk_sm0, clock_pin, fire_signal_share);

    // Target-facing peripherals (`spec.md` §6.2): independent of the glitch
    // engine's lifecycle, serviced every main-loop iteration regardless of
    // `ArmState`.
    let target_tx = pins.gpio0.reconfigure::<FunctionUart, PullNone>();
    let target_rx = pins.gpio1.reconfigure::<FunctionUart, PullNone>();
    let target_uart = TargetUart::new(
        pac.UART0,
        target_tx,
        target_rx,
        &mut pac.RESETS,
        DEFAULT_TARGET_BAUD,
        clocks.peripheral_clock.freq().to_Hz(),
    )
    .expect("target UART0 is always wired on this board");
    let target_reset = TargetReset::new(
        pins.gpio10.into_push_pull_output(),
        ResetPolarity::ActiveLow,
        DEFAULT_RESET_PULSE_MS,
    );
    let target_power = TargetPower::new(pins.gpio11.into_push_pull_output());

    let armed_signal = pins.gpio8.into_push_pull_output();

    let build_info = BuildInfo {
        chip: "RP2040",
        firmware: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };

    let controller = Controller::new(
        pio0,
        pulse,
        trigger,
        clock,
        delay,
        target_uart,
        target_reset,
        target_power,
        armed_signal,
        build_info,
    );

    let usb_bus = UsbBusAllocator::new(UsbBus::new(
        pac.USBCTRL_REGS,
        pac.USBCTRL_DPRAM,
        clocks.usb_clock,
        true,
        &mut pac.RESETS,
    ));

    Resources {
        controller,
        usb_bus,
    }
}
