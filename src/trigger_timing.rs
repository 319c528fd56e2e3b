//! Pure timing math shared by the trigger PIO programs (`glitch::trigger` in
//! the binary) and by host-run tests: the GPIO stability window (`spec.md`
//! §4.2.1) and the UART byte-match sample-clock divider (§4.2.2).

use crate::params::SYS_CLK_HZ;

/// Length, in PIO instructions, of each of the three NOP chains the GPIO
/// edge trigger runs to confirm the input is stable before arming for the
/// requested edge.
pub const STABILITY_NOP_CHAIN_LEN: u32 = 32;

/// Number of NOP chains run back-to-back (`spec.md` §4.2.1: "three
/// approximately-32-cycle NOP chains").
pub const STABILITY_CHAIN_COUNT: u32 = 3;

/// Total stability window, in cycles, before the GPIO edge trigger accepts a
/// transition. `3 * 32 = 96` cycles, i.e. ~640 ns at 150 MHz -- matches the
/// spec's documented "total ≈639 ns stability window".
pub const fn stability_window_cycles() -> u32 {
    STABILITY_NOP_CHAIN_LEN * STABILITY_CHAIN_COUNT
}

/// Oversampling ratio the UART byte-match trigger uses relative to the
/// target baud rate (`spec.md` §4.2.2).
pub const UART_TRIGGER_OVERSAMPLE: u32 = 8;

/// PIO clock divider (as an integer cycle count per sample) for the UART
/// byte-match trigger: `system_clock / (8 * baud)`.
pub fn uart_sample_divider(baud: u32) -> u32 {
    SYS_CLK_HZ / (UART_TRIGGER_OVERSAMPLE * baud)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stability_window_is_about_640ns() {
        let cycles = stability_window_cycles();
        assert_eq!(cycles, 96);
        let ns = cycles as f32 * 1_000_000_000.0 / SYS_CLK_HZ as f32;
        assert!((ns - 640.0).abs() < 10.0);
    }

    #[test]
    fn uart_divider_matches_eight_times_baud() {
        // S3 uses a conventional ISP baud; pick 115200 as a representative rate.
        let divider = uart_sample_divider(115_200);
        assert_eq!(divider, SYS_CLK_HZ / (8 * 115_200));
    }
}
