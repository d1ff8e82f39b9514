/*!
`Sid`: a GENA subscription identifier, always a freshly minted `uuid:<uuid>` token.
*/

use crate::error::{invalid_header_value, MessageFormatError};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Sid(Uuid);

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Sid {
    /// Mints a new subscription id. Called exactly once per successful SUBSCRIBE.
    pub fn new() -> Self {
        Sid(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, MessageFormatError> {
        let uuid_part = s
            .strip_prefix("uuid:")
            .ok_or_else(|| invalid_header_value("SID", s))?;
        Uuid::parse_str(uuid_part)
            .map(Sid)
            .map_err(|_| invalid_header_value("SID", s))
    }
}

impl Default for Sid {
    fn default() -> Self {
        Sid::new()
    }
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for Sid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "uuid:{}", self.0)
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
    fn round_trips() {
        let sid = Sid::new();
        assert_eq!(Sid::parse(&sid.to_string()).unwrap(), sid);
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(Sid::parse("5d724fc2-5c5e-4760-a123-f04a9136b300").is_err());
    }

    #[test]
    fn fresh_sids_are_unique() {
        assert_ne!(Sid::new(), Sid::new());
    }
}
