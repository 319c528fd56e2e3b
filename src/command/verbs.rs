//! Declarative candidate tables for every verb and argument set the command
//! surface accepts (`spec.md` §6.1, Design Note in §9: "Keep the candidate
//! sets per verb, compact, and declarative").

pub const VERBS: &[&str] = &[
    "set", "get", "trigger", "arm", "glitch", "status", "reset", "clock", "error", "reboot",
    "target", "api",
];

pub const SET_GET_FIELDS: &[&str] = &["pause", "width", "gap", "count"];
pub const TRIGGER_VARIANTS: &[&str] = &["none", "gpio", "uart"];
pub const EDGES: &[&str] = &["rising", "falling"];
pub const ON_OFF: &[&str] = &["on", "off"];
pub const REBOOT_MODES: &[&str] = &["bootloader"];
pub const TARGET_SUBVERBS: &[&str] = &["reset", "power", "send", "recv"];
pub const POWER_MODES: &[&str] = &["on", "off", "cycle"];
