//! `GlitchParameters`: the user-writable configuration described in
//! `spec.md` §3, plus the width/gap overhead compensation math from §4.1.

use crate::error::{Error, Field};

/// System clock driving every PIO state machine and every cycle count this
/// firmware reports. One cycle is one tick of this clock (~6.67 ns).
pub const SYS_CLK_HZ: u32 = 150_000_000;

/// Fixed per-iteration instruction overhead of the pulse engine's pulse loop
/// (`spec.md` §4.1, Open Question "Overhead compensation constant"). Measured
/// against the program in `glitch::pulse`: each pulse iteration spends one
/// cycle on the `jmp x--, pulse_low` branch back to the top of the high-phase
/// delay loop and one cycle re-entering the low-phase delay loop, so the
/// requested high/low duration is two PIO cycles longer than the raw operand
/// would produce. Resolved here rather than left as an Open Question because
/// it is a property of the concrete program this crate ships, not of the
/// abstract design.
pub const PULSE_LOOP_OVERHEAD_CYCLES: u32 = 2;

/// Which condition arms the pulse engine.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, defmt::Format)]
pub enum TriggerVariant {
    #[default]
    None,
    GpioEdge,
    UartByte,
}

/// Edge polarity for [`TriggerVariant::GpioEdge`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, defmt::Format)]
pub enum TriggerEdge {
    #[default]
    Rising,
    Falling,
}

/// User-writable glitch configuration. Mutation is only valid while
/// `ArmState == Disarmed` (`spec.md` §3, §5); this type itself doesn't know
/// about `ArmState` -- the caller (`control::GlitchControl` implementations)
/// is responsible for rejecting writes while armed, per the Open Question
/// resolution in `DESIGN.md` ("reject", not "defer").
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct GlitchParameters {
    pub pause_cycles: u32,
    pub width_cycles: u32,
    pub gap_cycles: u32,
    pub count: u32,
    pub trigger_variant: TriggerVariant,
    pub trigger_edge: TriggerEdge,
    pub trigger_byte: u8,
}

impl Default for GlitchParameters {
    fn default() -> Self {
        Self {
            pause_cycles: 0,
            width_cycles: 1,
            gap_cycles: 0,
            count: 1,
            trigger_variant: TriggerVariant::None,
            trigger_edge: TriggerEdge::Rising,
            trigger_byte: 0,
        }
    }
}

impl GlitchParameters {
    pub fn set_pause(&mut self, cycles: u32) {
        self.pause_cycles = cycles;
    }

    pub fn set_width(&mut self, cycles: u32) -> Result<(), Error> {
        if cycles == 0 {
            return Err(Error::out_of_range(Field::Width));
        }
        self.width_cycles = cycles;
        Ok(())
    }

    pub fn set_gap(&mut self, cycles: u32) {
        self.gap_cycles = cycles;
    }

    pub fn set_count(&mut self, count: u32) -> Result<(), Error> {
        if count == 0 {
            return Err(Error::out_of_range(Field::Count));
        }
        self.count = count;
        Ok(())
    }

    pub fn set_trigger_byte(&mut self, byte: u32) -> Result<(), Error> {
        if byte > 0xFF {
            return Err(Error::out_of_range(Field::TriggerByte));
        }
        self.trigger_byte = byte as u8;
        Ok(())
    }

    /// Width value to push into the pulse FIFO, after subtracting the PIO
    /// loop's own overhead. Saturates to zero rather than rejecting -- the
    /// documented behavior from `spec.md` §3 ("saturate to floor... never
    /// below 0").
    pub fn width_adjusted(&self) -> u32 {
        self.width_cycles
            .saturating_sub(PULSE_LOOP_OVERHEAD_CYCLES)
    }

    pub fn gap_adjusted(&self) -> u32 {
        self.gap_cycles.saturating_sub(PULSE_LOOP_OVERHEAD_CYCLES)
    }

    pub fn count_minus_one(&self) -> u32 {
        self.count - 1
    }

    /// The four words loaded into the pulse engine's FIFO on arm, in FIFO
    /// order: `[pause, count - 1, width_adj, gap_adj]` (`spec.md` §3, §4.3).
    pub fn pulse_fifo_words(&self) -> [u32; 4] {
        [
            self.pause_cycles,
            self.count_minus_one(),
            self.width_adjusted(),
            self.gap_adjusted(),
        ]
    }
}

/// Convert a cycle count at [`SYS_CLK_HZ`] to microseconds, for `GET`/`STATUS`
/// replies (`spec.md` §6.1: "report current value with cycle→µs conversion").
pub fn cycles_to_us(cycles: u32) -> f32 {
    cycles as f32 * 1_000_000.0 / SYS_CLK_HZ as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_one_shot_with_no_trigger() {
        let p = GlitchParameters::default();
        assert_eq!(p.count, 1);
        assert_eq!(p.trigger_variant, TriggerVariant::None);
    }

    #[test]
    fn width_zero_is_rejected() {
        let mut p = GlitchParameters::default();
        assert_eq!(p.set_width(0), Err(Error::out_of_range(Field::Width)));
    }

    #[test]
    fn count_zero_is_rejected() {
        let mut p = GlitchParameters::default();
        assert_eq!(p.set_count(0), Err(Error::out_of_range(Field::Count)));
    }

    #[test]
    fn width_and_gap_saturate_to_zero_below_overhead() {
        let mut p = GlitchParameters::default();
        p.set_width(1).unwrap();
        assert_eq!(p.width_adjusted(), 0);
        p.set_gap(1);
        assert_eq!(p.gap_adjusted(), 0);
    }

    #[test]
    fn width_above_overhead_is_compensated() {
        let mut p = GlitchParameters::default();
        p.set_width(150).unwrap();
        assert_eq!(p.width_adjusted(), 150 - PULSE_LOOP_OVERHEAD_CYCLES);
    }

    #[test]
    fn trigger_byte_out_of_range_rejected() {
        let mut p = GlitchParameters::default();
        assert_eq!(
            p.set_trigger_byte(0x100),
            Err(Error::out_of_range(Field::TriggerByte))
        );
        assert!(p.set_trigger_byte(0xFF).is_ok());
    }

    #[test]
    fn fifo_words_match_spec_order() {
        let mut p = GlitchParameters::default();
        p.set_pause(1500);
        p.set_width(150).unwrap();
        p.set_gap(1500);
        p.set_count(3).unwrap();
        assert_eq!(
            p.pulse_fifo_words(),
            [1500, 2, 150 - PULSE_LOOP_OVERHEAD_CYCLES, 1500 - PULSE_LOOP_OVERHEAD_CYCLES]
        );
    }

    #[test]
    fn cycle_to_us_conversion_s1() {
        // S1: 150 cycles at 150 MHz is 1.0 us.
        assert!((cycles_to_us(150) - 1.0).abs() < 1e-6);
    }
}
