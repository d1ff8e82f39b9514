/*!
`USN` (Unique Service Name): a `UDN` plus an optional [`DiscoveryType`] discriminator, wire form
`<udn>[::<resource-identifier>]`.
*/

use crate::error::{invalid_value_for_type, MessageFormatError};
use crate::types::discovery_type::DiscoveryType;
use crate::types::udn::{parse_udn, Udn};
use std::fmt::{Display, Formatter};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct Usn {
    udn: Udn,
    resource: Option<DiscoveryType>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Usn {
    pub fn new(udn: Udn) -> Self {
        Usn {
            udn,
            resource: None,
        }
    }

    pub fn new_with(udn: Udn, resource: DiscoveryType) -> Self {
        Usn {
            udn,
            resource: Some(resource),
        }
    }

    pub fn udn(&self) -> &Udn {
        &self.udn
    }

    pub fn resource(&self) -> Option<&DiscoveryType> {
        self.resource.as_ref()
    }

    pub fn parse(s: &str) -> Result<Self, MessageFormatError> {
        match s.split_once("::") {
            Some((udn_str, resource_str)) => {
                let udn = parse_udn(udn_str);
                if !udn.is_valid() {
                    return Err(invalid_value_for_type("USN.udn", udn_str));
                }
                let resource = DiscoveryType::parse(resource_str)?;
                Ok(Usn::new_with(udn, resource))
            }
            None => {
                let udn = parse_udn(s);
                if !udn.is_valid() {
                    return Err(invalid_value_for_type("USN.udn", s));
                }
                Ok(Usn::new(udn))
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for Usn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.resource {
            Some(resource) => write!(f, "{}::{}", self.udn, resource),
            None => write!(f, "{}", self.udn),
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
    fn round_trips_bare_udn() {
        let s = "uuid:5d724fc2-5c5e-4760-a123-f04a9136b300";
        assert_eq!(Usn::parse(s).unwrap().to_string(), s);
    }

    #[test]
    fn round_trips_rootdevice_usn() {
        let s = "uuid:5d724fc2-5c5e-4760-a123-f04a9136b300::upnp:rootdevice";
        assert_eq!(Usn::parse(s).unwrap().to_string(), s);
    }

    #[test]
    fn round_trips_resource_type_usn() {
        let s = "uuid:5d724fc2-5c5e-4760-a123-f04a9136b300::urn:schemas-upnp-org:service:SwitchPower:1";
        assert_eq!(Usn::parse(s).unwrap().to_string(), s);
    }

    #[test]
    fn rejects_invalid_udn_prefix() {
        assert!(Usn::parse("not-a-udn::upnp:rootdevice").is_err());
    }
}
