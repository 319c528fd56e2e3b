//! Unique-prefix abbreviation matching (`spec.md` §6.1, Design Note in §9:
//! "modelled as sets of candidate tokens with unique-prefix matching").
//!
//! No allocation: candidates are `eq_ignore_ascii_case`-compared byte
//! prefixes, not lowercased copies.

use crate::error::Error;

/// Match `input` as a case-insensitive, unambiguous prefix of exactly one
/// entry in `candidates`. Ties (two or more candidates sharing the prefix)
/// are reported as [`Error::AmbiguousAbbreviation`]; no match is
/// [`Error::UnknownToken`].
pub fn match_prefix(input: &str, candidates: &[&'static str]) -> Result<&'static str, Error> {
    if input.is_empty() {
        return Err(Error::MissingArgument);
    }

    let mut found: Option<&'static str> = None;
    for &candidate in candidates {
        if candidate.len() >= input.len()
            && candidate.as_bytes()[..input.len()].eq_ignore_ascii_case(input.as_bytes())
        {
            if found.is_some() {
                return Err(Error::AmbiguousAbbreviation);
            }
            found = Some(candidate);
        }
    }
    found.ok_or(Error::UnknownToken)
}

/// Parse a decimal unsigned integer argument (`SET PAUSE`, `SET COUNT`, ...).
pub fn parse_u32(input: &str) -> Result<u32, Error> {
    input.parse::<u32>().map_err(|_| Error::UnknownToken)
}

/// Parse a two-digit hex byte argument (`TRIGGER UART <hex_byte>`).
pub fn parse_hex_byte(input: &str) -> Result<u32, Error> {
    u32::from_str_radix(input, 16).map_err(|_| Error::UnknownToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERBS: &[&str] = &["set", "get", "trigger", "arm", "glitch", "status", "reset"];

    #[test]
    fn unique_prefix_matches() {
        assert_eq!(match_prefix("tr", VERBS), Ok("trigger"));
        assert_eq!(match_prefix("ARM", VERBS), Ok("arm"));
        assert_eq!(match_prefix("g", VERBS), Err(Error::AmbiguousAbbreviation)); // get / glitch
        assert_eq!(match_prefix("ge", VERBS), Ok("get"));
        assert_eq!(match_prefix("gl", VERBS), Ok("glitch"));
    }

    #[test]
    fn unknown_token_rejected() {
        assert_eq!(match_prefix("xyz", VERBS), Err(Error::UnknownToken));
    }

    #[test]
    fn empty_token_is_missing_argument() {
        assert_eq!(match_prefix("", VERBS), Err(Error::MissingArgument));
    }

    #[test]
    fn every_candidate_matches_itself_exactly() {
        for &c in VERBS {
            assert_eq!(match_prefix(c, VERBS), Ok(c));
        }
    }

    #[test]
    fn hex_byte_roundtrip() {
        assert_eq!(parse_hex_byte("0D"), Ok(0x0D));
        assert_eq!(parse_hex_byte("ff"), Ok(0xFF));
        assert!(parse_hex_byte("zz").is_err());
    }
}
