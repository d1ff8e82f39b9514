/*!
The GENA `TIMEOUT` header: `Second-<N>` or `Second-infinite`.
*/

use crate::error::{invalid_header_value, MessageFormatError};
use std::fmt::{Display, Formatter};
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Timeout {
    Seconds(u32),
    Infinite,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

const PREFIX: &str = "Second-";
const INFINITE: &str = "infinite";

impl Timeout {
    pub fn seconds(n: u32) -> Self {
        Timeout::Seconds(n)
    }

    pub fn parse(s: &str) -> Result<Self, MessageFormatError> {
        let rest = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| invalid_header_value("TIMEOUT", s))?;
        if rest == INFINITE {
            Ok(Timeout::Infinite)
        } else {
            rest.parse::<u32>()
                .map(Timeout::Seconds)
                .map_err(|_| invalid_header_value("TIMEOUT", s))
        }
    }

    /// Caps a requested timeout to a host's configured maximum, never raising it. Used when a
    /// subscriber asks for `infinite` or a duration longer than the host is willing to grant.
    pub fn clamp(&self, max_seconds: u32) -> Self {
        match self {
            Timeout::Infinite => Timeout::Seconds(max_seconds),
            Timeout::Seconds(n) if *n > max_seconds => Timeout::Seconds(max_seconds),
            other => *other,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Timeout::Seconds(n) => Some(Duration::from_secs(u64::from(*n))),
            Timeout::Infinite => None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for Timeout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeout::Seconds(n) => write!(f, "{}{}", PREFIX, n),
            Timeout::Infinite => write!(f, "{}{}", PREFIX, INFINITE),
        }
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
    fn round_trips_seconds() {
        assert_eq!(Timeout::parse("Second-1800").unwrap().to_string(), "Second-1800");
    }

    #[test]
    fn round_trips_infinite() {
        assert_eq!(Timeout::parse("Second-infinite").unwrap(), Timeout::Infinite);
    }

    #[test]
    fn clamp_never_raises_a_finite_request() {
        assert_eq!(Timeout::Seconds(100).clamp(1800), Timeout::Seconds(100));
        assert_eq!(Timeout::Seconds(9000).clamp(1800), Timeout::Seconds(1800));
        assert_eq!(Timeout::Infinite.clamp(1800), Timeout::Seconds(1800));
    }
}
