//! USB CDC-ACM line framing (`spec.md` §6.1): accumulates raw bytes off the
//! USB serial endpoint into CR/LF-terminated lines and hands each complete
//! line to [`raiden_glitch::command::Dispatcher`], writing the response back
//! out the same endpoint.
//!
//! Kept separate from `command::Dispatcher` itself so the dispatcher stays
//! hardware-free and host-testable (`SPEC_FULL.md` §8); this module is the
//! only place that touches `usbd_serial::SerialPort`.

use heapless::String;
use usb_device::class_prelude::UsbBus;
use usbd_serial::SerialPort;

use raiden_glitch::command::Dispatcher;
use raiden_glitch::control::GlitchControl;

/// Longest line this firmware accepts before it's silently discarded
/// (`SET`/`TRIGGER` lines are short; this is generous headroom).
const LINE_CAP: usize = 128;

/// Per-connection line accumulator. One instance per `SerialPort`.
pub struct LineReader {
    buf: String<LINE_CAP>,
}

impl LineReader {
    pub const fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Drain whatever the USB serial endpoint has buffered, split it into
    /// CR/LF-terminated lines, dispatch each complete one, and write the
    /// response(s) back out. Called once per main-loop iteration after
    /// `usb_dev.poll(&mut [serial])` succeeds.
    pub fn service<B: UsbBus, C: GlitchControl>(
        &mut self,
        serial: &mut SerialPort<'_, B>,
        dispatcher: &mut Dispatcher,
        ctrl: &mut C,
    ) {
        let mut raw = [0u8; 64];
        let n = match serial.read(&mut raw) {
            Ok(n) => n,
            Err(_) => return,
        };

        for &byte in &raw[..n] {
            match byte {
                b'\r' | b'\n' => {
                    if !self.buf.is_empty() {
                        let response = dispatcher.dispatch(&self.buf, ctrl);
                        Self::write_all(serial, response.as_bytes());
                        self.buf.clear();
                    }
                }
                _ => {
                    // A line longer than LINE_CAP is a malformed host
                    // session, not a reason to panic; drop the overflow
                    // silently and keep accumulating until the next
                    // terminator resyncs us.
                    let _ = self.buf.push(byte as char);
                }
            }
        }
    }

    fn write_all<B: UsbBus>(serial: &mut SerialPort<'_, B>, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            match serial.write(bytes) {
                Ok(written) if written > 0 => bytes = &bytes[written..],
                _ => break,
            }
        }
    }
}
