//! Target-facing peripherals (`spec.md` §6.2): the byte-stream UART to the
//! target, the target reset pin, and the target power-switch pin. None of
//! these know anything about the glitch engine -- the re-architecture
//! Design Note in `spec.md` §9 is explicit that "the ISR contains no glitch
//! logic": `TargetUart` only moves bytes in and out of a ring buffer, and
//! the UART byte-match trigger program (`crate::glitch::trigger`) snoops the
//! same physical pin as a fully independent observer via
//! [`crate::padshare::UartRxPadShare`].

pub mod power;
pub mod reset;
pub mod uart;

pub use power::TargetPower;
pub use reset::{ResetPolarity, TargetReset};
pub use uart::TargetUart;
