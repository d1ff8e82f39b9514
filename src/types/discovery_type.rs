/*!
`DiscoveryType`: the single type for every value that can appear as an SSDP `ST`/`NT` header, or
as the suffix of a `USN`. UDA 1.1 headers use the same four-way grammar in both places (`ssdp:all`,
`upnp:rootdevice`, a bare `uuid:<uuid>`, or a `ResourceType`), so this crate ships one type rather
than splitting it into a search-target type and a separate notification-type.
*/

use crate::error::{invalid_value_for_type, MessageFormatError};
use crate::types::resource_type::ResourceType;
use crate::types::udn::{parse_udn, Udn};
use std::fmt::{Display, Formatter};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum DiscoveryType {
    /// `ssdp:all` — every root device, embedded device, and service.
    All,
    /// `upnp:rootdevice` — root devices only.
    RootDevice,
    /// A bare `uuid:<uuid>` — one specific device, by UDN, regardless of type.
    Device(Udn),
    /// A `ResourceType` — every device or service whose type matches.
    Type(ResourceType),
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

pub const SSDP_ALL: &str = "ssdp:all";
pub const UPNP_ROOTDEVICE: &str = "upnp:rootdevice";

impl DiscoveryType {
    pub fn parse(s: &str) -> Result<Self, MessageFormatError> {
        match s {
            SSDP_ALL => Ok(DiscoveryType::All),
            UPNP_ROOTDEVICE => Ok(DiscoveryType::RootDevice),
            _ if s.starts_with("uuid:") => match parse_udn(s) {
                Udn::Valid(uuid) => Ok(DiscoveryType::Device(Udn::Valid(uuid))),
                Udn::Invalid(_) => Err(invalid_value_for_type("DiscoveryType", s)),
            },
            _ if s.starts_with("urn:") => {
                ResourceType::parse(s).map(DiscoveryType::Type)
            }
            _ => Err(invalid_value_for_type("DiscoveryType", s)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for DiscoveryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryType::All => write!(f, "{}", SSDP_ALL),
            DiscoveryType::RootDevice => write!(f, "{}", UPNP_ROOTDEVICE),
            DiscoveryType::Device(udn) => write!(f, "{}", udn),
            DiscoveryType::Type(resource_type) => write!(f, "{}", resource_type),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::resource_type::ResourceKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_each_variant() {
        for s in [
            SSDP_ALL,
            UPNP_ROOTDEVICE,
            "uuid:5d724fc2-5c5e-4760-a123-f04a9136b300",
            "urn:schemas-upnp-org:device:BinaryLight:1",
        ] {
            assert_eq!(DiscoveryType::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn parses_device_type_variant() {
        let dt = DiscoveryType::parse("urn:schemas-upnp-org:device:BinaryLight:1").unwrap();
        match dt {
            DiscoveryType::Type(rt) => assert_eq!(rt.kind(), ResourceKind::Device),
            _ => panic!("expected Type variant"),
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(DiscoveryType::parse("garbage").is_err());
    }
}
