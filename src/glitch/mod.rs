//! Hardware-owning half of the glitch controller (`spec.md` §4). Everything
//! under [`crate`] proper is `no_std`-and-test-friendly bookkeeping; the
//! modules here hold the actual PIO programs and state machines and are only
//! ever built for the firmware target.

pub mod clockgen;
pub mod controller;
pub mod pulse;
pub mod trigger;

pub use controller::Controller;
