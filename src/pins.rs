//! Bit-exact pin layout (`spec.md` §6.4). "External scripts depend on these
//! being stable across firmware versions" -- kept as plain constants, not
//! buried in `setup.rs`, so a host script author (or this crate's own tests)
//! can see the whole assignment in one place.
//!
//! GPIO numbers are RP2040 GPIO indices, not physical pin numbers.

/// Pulse engine output, normal polarity.
pub const GLITCH_OUT_NORMAL: u8 = 2;
/// Pulse engine output, inverted at the pad-level override (`spec.md` §4.1).
pub const GLITCH_OUT_INVERTED: u8 = 3;

/// GPIO edge trigger input. Pulled up internally (`spec.md` §6.4).
pub const TRIGGER_GPIO: u8 = 4;

/// Target UART TX. GPIO0/1 are UART0's native alt-function pins on the
/// RP2040 (GPIO5/6 are UART1 pins and cannot carry `FunctionUart` for
/// `UART0`).
pub const TARGET_UART_TX: u8 = 0;
/// Target UART RX, also snooped by the UART byte-match trigger PIO program.
pub const TARGET_UART_RX: u8 = 1;

/// FireSignal: driven by the resident trigger program or the manual-fire
/// helper, observed by the clock generator.
pub const FIRE_SIGNAL: u8 = 7;
/// ArmedSignal: driven by the CPU, never by a PIO program.
pub const ARMED_SIGNAL: u8 = 8;

/// Clock generator output.
pub const CLOCK_OUT: u8 = 9;

/// Target reset pin.
pub const TARGET_RESET: u8 = 10;
/// Target power-switch pin.
pub const TARGET_POWER: u8 = 11;
