/*!
Type primitives shared by every other layer: identifiers (`UDN`, `ResourceType`, `USN`,
`DiscoveryType`), the `SpecVersion`/`ProductTokens` pair used on `SERVER` and `USER-AGENT`
headers, and the small value types (`Timeout`, `Sid`) used by the GENA layer.

Parsers here are total: a malformed string produces an `Invalid` variant rather than an error,
since these values flow through header and XML parsing where callers need to keep going and
report a single message-format error at the outer layer rather than have every primitive parse
fail independently.
*/

use std::fmt::{Display, Formatter};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// The three UDA protocol versions this crate negotiates between.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SpecVersion {
    /// UDA 1.0
    V10,
    /// UDA 1.1
    V11,
    /// UDA 2.0
    V20,
}

// ------------------------------------------------------------------------------------------------
// Public Values
// ------------------------------------------------------------------------------------------------

/// Product token name used for the middle `UPnP/<ver>` token in `SERVER`/`USER-AGENT` headers.
pub const UPNP_STRING: &str = "UPnP";

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Default for SpecVersion {
    fn default() -> Self {
        SpecVersion::V11
    }
}

impl Display for SpecVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SpecVersion::V10 => "1.0",
                SpecVersion::V11 => "1.1",
                SpecVersion::V20 => "2.0",
            }
        )
    }
}

impl SpecVersion {
    /// The `major.minor` pair as used in a description document's `<specVersion>`.
    pub fn major_minor(&self) -> (u8, u8) {
        match self {
            SpecVersion::V10 => (1, 0),
            SpecVersion::V11 => (1, 1),
            SpecVersion::V20 => (2, 0),
        }
    }

    /// Parse a `<specVersion>`'s `major`/`minor` pair, the only form this ever appears in on
    /// the wire (there is no single-string encoding of spec version).
    pub fn from_major_minor(major: u8, minor: u8) -> Option<Self> {
        match (major, minor) {
            (1, 0) => Some(SpecVersion::V10),
            (1, 1) => Some(SpecVersion::V11),
            (2, 0) => Some(SpecVersion::V20),
            _ => None,
        }
    }

    /// Whether a message declaring `other` as its version is acceptable to a party that
    /// implements `self`. Advances in minor version are a compatible superset of earlier minor
    /// versions of the same major version; major version jumps are not guaranteed compatible.
    pub fn accepts(&self, other: &SpecVersion) -> bool {
        let (my_major, my_minor) = self.major_minor();
        let (other_major, other_minor) = other.major_minor();
        my_major == other_major && other_minor <= my_minor
    }
}

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod discovery_type;
pub mod product_tokens;
pub mod resource_type;
pub mod sid;
pub mod timeout;
pub mod udn;
pub mod usn;

pub use discovery_type::DiscoveryType;
pub use product_tokens::ProductTokens;
pub use resource_type::{MatchMode, ResourceKind, ResourceType};
pub use sid::Sid;
pub use timeout::Timeout;
pub use udn::Udn;
pub use usn::Usn;
