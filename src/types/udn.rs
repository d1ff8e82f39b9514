/*!
The Unique Device Name: a stable `uuid:<uuid>` identifier minted once per device and carried
unchanged across restarts, advertisements, and descriptions.
*/

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// A parsed UDN, or the distinct `Invalid` variant for a string that doesn't fit the grammar.
/// Every comparison and hash on `Invalid` fails to match any other `Udn`, including another
/// `Invalid` built from the same source string.
#[derive(Clone, Debug)]
pub enum Udn {
    Valid(Uuid),
    Invalid(String),
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

/// Mint a fresh UDN using a random (v4) UUID.
pub fn new_udn() -> Udn {
    Udn::Valid(Uuid::new_v4())
}

/// Total parse: never fails, returns `Udn::Invalid` for anything that isn't `uuid:<uuid>`.
pub fn parse_udn(s: &str) -> Udn {
    lazy_static! {
        static ref UDN_PATTERN: Regex = Regex::new(r"^uuid:(?P<uuid>[0-9a-fA-F-]{36})$").unwrap();
    }
    match UDN_PATTERN.captures(s) {
        Some(captures) => match Uuid::parse_str(&captures["uuid"]) {
            Ok(uuid) => Udn::Valid(uuid),
            Err(_) => Udn::Invalid(s.to_string()),
        },
        None => Udn::Invalid(s.to_string()),
    }
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for Udn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Udn::Valid(uuid) => write!(f, "uuid:{}", uuid),
            Udn::Invalid(s) => write!(f, "{}", s),
        }
    }
}

impl PartialEq for Udn {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Udn::Valid(a), Udn::Valid(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Udn {}

impl std::hash::Hash for Udn {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // `Invalid` UDNs never compare equal to anything, including each other; giving them a
        // fixed hash bucket only affects collision rate, never correctness.
        match self {
            Udn::Valid(uuid) => uuid.hash(state),
            Udn::Invalid(s) => s.hash(state),
        }
    }
}

impl Udn {
    pub fn is_valid(&self) -> bool {
        matches!(self, Udn::Valid(_))
    }

    /// Convenience alias for [`parse_udn`], so callers working entirely with `Udn` values don't
    /// need a separate import for the one free function in this module.
    pub fn parse(s: &str) -> Udn {
        parse_udn(s)
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_a_valid_udn() {
        let s = "uuid:5d724fc2-5c5e-4760-a123-f04a9136b300";
        let udn = parse_udn(s);
        assert!(udn.is_valid());
        assert_eq!(udn.to_string(), s);
    }

    #[test]
    fn rejects_a_malformed_udn() {
        let udn = parse_udn("not-a-udn");
        assert!(!udn.is_valid());
    }

    #[test]
    fn invalid_udns_never_compare_equal() {
        let a = parse_udn("garbage");
        let b = parse_udn("garbage");
        assert_ne!(a, b);
    }

    #[test]
    fn fresh_udns_are_unique() {
        assert_ne!(new_udn(), new_udn());
    }
}
