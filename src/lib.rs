//! Hardware-independent core of the glitch controller firmware: the parameter
//! model, the arm/disarm state machine's transition rules, clock-generator
//! math, and the command-line dispatcher. None of this module touches a PIO
//! register or a GPIO pin directly — the binary (`src/main.rs`) supplies a
//! concrete [`control::GlitchControl`] implementation that owns the hardware
//! and wires it to the dispatcher in [`command`].
//!
//! Built with `#![no_std]` outside of `cargo test` so the same logic that is
//! unit-tested on the host ships unmodified in the firmware image.
#![cfg_attr(not(test), no_std)]

pub mod armstate;
pub mod clockcfg;
pub mod command;
pub mod control;
pub mod error;
pub mod params;
pub mod pins;
pub mod trigger_timing;

pub use armstate::{ArmLifecycle, ArmState};
pub use clockcfg::ClockConfig;
pub use control::{BuildInfo, GlitchControl};
pub use error::Error;
pub use params::{GlitchParameters, TriggerEdge, TriggerVariant};
