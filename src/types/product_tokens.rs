/*!
`ProductTokens`: the three-token string carried by both `SERVER` and `USER-AGENT` headers,
`<os>/<os-ver> UPnP/<upnp-ver> <product>/<product-ver>`.
*/

use crate::error::{invalid_value_for_type, MessageFormatError};
use crate::types::SpecVersion;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{Display, Formatter};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductTokens {
    os_name: String,
    os_version: String,
    upnp_version: SpecVersion,
    product_name: String,
    product_version: String,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl ProductTokens {
    pub fn new<S1, S2, S3, S4>(
        os_name: S1,
        os_version: S2,
        upnp_version: SpecVersion,
        product_name: S3,
        product_version: S4,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        ProductTokens {
            os_name: os_name.into(),
            os_version: os_version.into(),
            upnp_version,
            product_name: product_name.into(),
            product_version: product_version.into(),
        }
    }

    pub fn os_name(&self) -> &str {
        &self.os_name
    }

    pub fn os_version(&self) -> &str {
        &self.os_version
    }

    pub fn upnp_version(&self) -> SpecVersion {
        self.upnp_version
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn product_version(&self) -> &str {
        &self.product_version
    }

    /// Parses a `SERVER`/`USER-AGENT` value of the exact three-token form. Rejects anything
    /// whose middle token isn't `UPnP/<major>.<minor>`, per UDA 1.1 §1.1.3.
    pub fn parse(s: &str) -> Result<Self, MessageFormatError> {
        lazy_static! {
            static ref PATTERN: Regex = Regex::new(
                r"^(?P<os_name>\S+)/(?P<os_version>\S+)\s+UPnP/(?P<upnp_major>\d+)\.(?P<upnp_minor>\d+)\s+(?P<product_name>\S+)/(?P<product_version>\S+)$"
            )
            .unwrap();
        }
        let captures = PATTERN
            .captures(s)
            .ok_or_else(|| invalid_value_for_type("ProductTokens", s))?;
        let major: u8 = captures["upnp_major"]
            .parse()
            .map_err(|_| invalid_value_for_type("ProductTokens.upnp_version", s))?;
        let minor: u8 = captures["upnp_minor"]
            .parse()
            .map_err(|_| invalid_value_for_type("ProductTokens.upnp_version", s))?;
        let upnp_version = SpecVersion::from_major_minor(major, minor)
            .ok_or_else(|| invalid_value_for_type("ProductTokens.upnp_version", s))?;
        Ok(ProductTokens {
            os_name: captures["os_name"].to_string(),
            os_version: captures["os_version"].to_string(),
            upnp_version,
            product_name: captures["product_name"].to_string(),
            product_version: captures["product_version"].to_string(),
        })
    }
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for ProductTokens {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} UPnP/{} {}/{}",
            self.os_name, self.os_version, self.upnp_version, self.product_name, self.product_version
        )
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
    fn round_trips_a_server_header() {
        let s = "unix/5.1 UPnP/1.1 MyProduct/1.0";
        let pt = ProductTokens::parse(s).unwrap();
        assert_eq!(pt.upnp_version(), SpecVersion::V11);
        assert_eq!(pt.to_string(), s);
    }

    #[test]
    fn rejects_wrong_upnp_token() {
        assert!(ProductTokens::parse("unix/5.1 DLNADOC/1.50 MyProduct/1.0").is_err());
    }
}
