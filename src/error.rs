//! Error taxonomy for the host command surface.
//!
//! Every fallible operation reachable from a command line returns
//! `Result<_, Error>`. The core never panics or resets itself in response to
//! bad host input (see `spec.md` §7) -- `Error` is the only abnormal-exit
//! path, and it always surfaces as an `ERROR: …` line or, in API mode, a `!`
//! acknowledgement byte.

/// A single data-carrying error enum, in the style of this crate's PIO-driven
/// protocol modules (e.g. `glitch::trigger`'s own error handling) rather than
/// a `std`-oriented error-derive crate: this is a `no_std` binary, and the
/// flight-controller firmware this repo is descended from reaches for plain
/// enums here too.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum Error {
    /// A numeric argument was out of range for the named field (e.g. WIDTH=0,
    /// a hex byte above 0xFF).
    OutOfRange(Field),
    /// A command verb or argument token was present but didn't match any
    /// candidate, even as a prefix.
    UnknownToken,
    /// A command verb or argument token matched more than one candidate.
    AmbiguousAbbreviation,
    /// A verb that requires an argument didn't get one.
    MissingArgument,
    /// `ARM ON` while already `Armed` or `Fired`.
    AlreadyArmed,
    /// An operation that requires `Armed` was issued while `Disarmed`.
    NotArmed,
    /// `GLITCH` while the trigger variant is not `None`.
    ManualFireRequiresNoTrigger,
    /// A parameter write was attempted while `Armed`.
    ParameterWriteWhileArmed,
    /// The selected trigger program does not fit in PIO instruction memory.
    NoRoomForTrigger,
    /// `CLOCK` was enabled with `frequency_hz == 0`.
    ClockFrequencyZero,
    /// A clock-dependent operation was requested before a frequency was set.
    ClockNotConfigured,
    /// A target-facing peripheral (UART, reset, power) could not be
    /// initialised or is not wired on this board.
    PeripheralUnavailable,
    /// `ERROR` was issued with no prior failing command this session.
    NoPriorError,
}

/// The field a range-checked numeric argument belongs to, used only to build
/// the `ERROR: …` text.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum Field {
    Pause,
    Width,
    Gap,
    Count,
    TriggerByte,
    ClockFrequency,
}

impl Error {
    /// Human-oriented message used to build `ERROR: …` lines and the `ERROR`
    /// verb's retrievable last-error text. Never allocates.
    pub fn message(&self) -> &'static str {
        match self {
            Error::OutOfRange(Field::Pause) => "PAUSE must be a non-negative cycle count",
            Error::OutOfRange(Field::Width) => "WIDTH must be a positive cycle count",
            Error::OutOfRange(Field::Gap) => "GAP must be a non-negative cycle count",
            Error::OutOfRange(Field::Count) => "COUNT must be >= 1",
            Error::OutOfRange(Field::TriggerByte) => "trigger byte must be 00..FF",
            Error::OutOfRange(Field::ClockFrequency) => "frequency must be a positive integer Hz",
            Error::UnknownToken => "unrecognized token",
            Error::AmbiguousAbbreviation => "ambiguous abbreviation",
            Error::MissingArgument => "missing argument",
            Error::AlreadyArmed => "already armed",
            Error::NotArmed => "not armed",
            Error::ManualFireRequiresNoTrigger => {
                "GLITCH requires TRIGGER NONE and an armed state"
            }
            Error::ParameterWriteWhileArmed => "parameters are read-only while armed; disarm first",
            Error::NoRoomForTrigger => "no room for trigger program in PIO instruction memory",
            Error::ClockFrequencyZero => "clock frequency must be nonzero to enable",
            Error::ClockNotConfigured => "clock has not been configured with a frequency",
            Error::PeripheralUnavailable => "target peripheral unavailable",
            Error::NoPriorError => "no error",
        }
    }

    pub(crate) const fn out_of_range(field: Field) -> Self {
        Error::OutOfRange(field)
    }
}
