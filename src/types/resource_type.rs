/*!
`ResourceType`: the five colon-separated field identifier used for device types, service types,
and the `ST`/`NT` headers that name them — `urn:<domain>:device|service:<name>:<ver>`.
*/

use crate::error::{invalid_value_for_type, MessageFormatError};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{Display, Formatter};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Whether a `ResourceType` names a device or a service.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Device,
    Service,
}

/// How two versions of the same type name are compared.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchMode {
    /// Versions must be identical.
    Exact,
    /// The candidate's version may be equal to or greater than the target's (a device
    /// implementing a newer minor version still satisfies a search for an older one).
    Inclusive,
}

/// `urn:<domain>:<device|service>:<name>:<ver>`, or the wire form with the domain's dots
/// rewritten to hyphens. The parsed, canonical domain keeps its original dots; only
/// [`ResourceType::to_string`] performs the hyphen rewrite, matching UDA 1.1's wire grammar.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ResourceType {
    domain: String,
    kind: ResourceKind,
    name: String,
    version: u32,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl ResourceType {
    pub fn new(domain: &str, kind: ResourceKind, name: &str, version: u32) -> Self {
        ResourceType {
            domain: domain.to_string(),
            kind,
            name: name.to_string(),
            version,
        }
    }

    pub fn new_standard(kind: ResourceKind, name: &str, version: u32) -> Self {
        Self::new("schemas-upnp-org", kind, name, version)
    }

    /// Total parse: rejects anything that isn't exactly five colon-separated fields with a
    /// nonnegative integer version, returning a message-format error describing the mismatch
    /// rather than panicking.
    pub fn parse(s: &str) -> Result<Self, MessageFormatError> {
        lazy_static! {
            static ref PATTERN: Regex = Regex::new(
                r"^urn:(?P<domain>[^:]+):(?P<kind>device|service):(?P<name>[^:]+):(?P<version>\d+)$"
            )
            .unwrap();
        }
        match PATTERN.captures(s) {
            Some(captures) => {
                let kind = match &captures["kind"] {
                    "device" => ResourceKind::Device,
                    "service" => ResourceKind::Service,
                    _ => unreachable!(),
                };
                let version: u32 = captures["version"]
                    .parse()
                    .map_err(|_| invalid_value_for_type("ResourceType.version", s))?;
                let domain = &captures["domain"];
                let domain = if domain == "schemas-upnp-org" {
                    domain.to_string()
                } else {
                    domain.replace('-', ".")
                };
                Ok(ResourceType {
                    domain,
                    kind,
                    name: captures["name"].to_string(),
                    version,
                })
            }
            None => Err(invalid_value_for_type("ResourceType", s)),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Standard types live under the `schemas-upnp-org` domain; anything else is vendor-defined.
    pub fn is_standard(&self) -> bool {
        self.domain == "schemas-upnp-org"
    }

    /// Compares `self` against `target` under the given match mode. Domain, kind, and name must
    /// always match exactly; only the version is subject to `mode`.
    pub fn compare(&self, target: &ResourceType, mode: MatchMode) -> bool {
        self.domain == target.domain && self.kind == target.kind && self.name == target.name && match mode {
            MatchMode::Exact => self.version == target.version,
            MatchMode::Inclusive => self.version >= target.version,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "urn:{}:{}:{}:{}",
            self.domain.replace('.', "-"),
            match self.kind {
                ResourceKind::Device => "device",
                ResourceKind::Service => "service",
            },
            self.name,
            self.version
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
    fn round_trips_a_standard_device_type() {
        let s = "urn:schemas-upnp-org:device:BinaryLight:1";
        let rt = ResourceType::parse(s).unwrap();
        assert!(rt.is_standard());
        assert_eq!(rt.to_string(), s);
    }

    #[test]
    fn normalizes_vendor_domain_dots_to_hyphens() {
        let s = "urn:schemas-my-com:service:Foo:2";
        let rt = ResourceType::parse(s).unwrap();
        assert_eq!(rt.domain(), "schemas.my.com");
        assert_eq!(rt.to_string(), s);
    }

    #[test]
    fn rejects_non_numeric_version() {
        assert!(ResourceType::parse("urn:schemas-upnp-org:device:Foo:bar").is_err());
    }

    #[test]
    fn inclusive_match_accepts_newer_or_equal() {
        let target = ResourceType::new_standard(ResourceKind::Device, "Foo", 1);
        let v1 = ResourceType::new_standard(ResourceKind::Device, "Foo", 1);
        let v2 = ResourceType::new_standard(ResourceKind::Device, "Foo", 2);
        let v0 = ResourceType::new_standard(ResourceKind::Device, "Foo", 0);
        assert!(v1.compare(&target, MatchMode::Inclusive));
        assert!(v2.compare(&target, MatchMode::Inclusive));
        assert!(!v0.compare(&target, MatchMode::Inclusive));
    }

    #[test]
    fn exact_match_requires_identical_version() {
        let target = ResourceType::new_standard(ResourceKind::Device, "Foo", 1);
        let v2 = ResourceType::new_standard(ResourceKind::Device, "Foo", 2);
        assert!(!v2.compare(&target, MatchMode::Exact));
    }
}
