//! The target-facing UART (`spec.md` §6.2, §4.2.2 pin-sharing caveat): an
//! 8N1 byte stream to the target. Bytes sent via `TARGET SEND` go straight
//! out the hardware TX FIFO; bytes the target sends back are drained into a
//! fixed-capacity ring buffer here and returned by `TARGET RECV`.
//!
//! This module is intentionally inert with respect to glitching: it never
//! inspects received bytes for a trigger condition. That job belongs
//! entirely to the UART byte-match PIO program in `crate::glitch::trigger`,
//! which snoops the same RX pin independently once
//! [`crate::padshare::UartRxPadShare`] proves the pad's isolation bit has
//! been cleared (`spec.md` §9, "Callback/interrupt entanglement...").

use embedded_hal::serial::Read;
use fugit::RateExtU32;
use heapless::Deque;
use rp2040_hal::gpio::bank0::{Gpio0, Gpio1};
use rp2040_hal::gpio::{FunctionUart, Pin, PullNone};
use rp2040_hal::pac::{RESETS, UART0};
use rp2040_hal::uart::{DataBits, Enabled, StopBits, UartConfig, UartPeripheral};

use raiden_glitch::error::Error;

/// Receive ring buffer depth. Generous relative to the short probe replies
/// (ISP sync bytes, command acks) this firmware's host scripts expect --
/// dialect framing lives outside the core (`spec.md` §1).
const RX_CAP: usize = 256;

type Pins = (
    Pin<Gpio0, FunctionUart, PullNone>,
    Pin<Gpio1, FunctionUart, PullNone>,
);

/// Owns the target UART0 peripheral and its receive ring buffer.
pub struct TargetUart {
    uart: UartPeripheral<Enabled, UART0, Pins>,
    rx: Deque<u8, RX_CAP>,
    baud: u32,
}

impl TargetUart {
    /// Bring up UART0 at `baud` (8N1, no flow control). `peripheral_clock_hz`
    /// is the clock the UART's baud-rate divider is computed against --
    /// `clocks.peripheral_clock.freq()` in `setup::init`.
    pub fn new(
        device: UART0,
        tx_pin: Pin<Gpio0, FunctionUart, PullNone>,
        rx_pin: Pin<Gpio1, FunctionUart, PullNone>,
        resets: &mut RESETS,
        baud: u32,
        peripheral_clock_hz: u32,
    ) -> Result<Self, Error> {
        let uart = UartPeripheral::new(device, (tx_pin, rx_pin), resets)
            .enable(
                UartConfig::new(baud.Hz(), DataBits::Eight, None, StopBits::One),
                peripheral_clock_hz.Hz(),
            )
            .map_err(|_| Error::PeripheralUnavailable)?;
        Ok(Self {
            uart,
            rx: Deque::new(),
            baud,
        })
    }

    /// The baud the UART byte-match trigger should sample at (`spec.md` §4.2.2
    /// Open Question, resolved in `DESIGN.md`: derived from this, not a
    /// separate trigger parameter).
    pub fn baud(&self) -> u32 {
        self.baud
    }

    /// Drain whatever the hardware RX FIFO has buffered into the ring
    /// buffer. Called once per main-loop iteration regardless of `ArmState`
    /// (`spec.md` §6.2).
    pub fn poll_rx(&mut self) {
        loop {
            match self.uart.read() {
                Ok(byte) => {
                    if self.rx.push_back(byte).is_err() {
                        self.rx.pop_front();
                        let _ = self.rx.push_back(byte);
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => break,
            }
        }
    }

    /// `TARGET SEND`: write `bytes` to the target, blocking until the
    /// hardware TX FIFO has accepted all of them.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.uart.write_full_blocking(bytes);
        Ok(())
    }

    /// `TARGET RECV`: copy up to `out.len()` buffered bytes into `out`,
    /// oldest first, removing them from the ring buffer. Returns the number
    /// of bytes copied.
    pub fn drain(&mut self, out: &mut [u8]) -> usize {
        let mut n = 0;
        while n < out.len() {
            match self.rx.pop_front() {
                Some(byte) => {
                    out[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }
}
