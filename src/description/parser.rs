/*!
Parses a device description `<root>` document into a [`crate::model::Device`] tree. Service
entries are stubs at this stage — only `serviceType`/`serviceId`/the three URLs are known; a
second pass (see [`crate::description::scpd`]) fetches each `SCPDURL` and fills in the action and
state tables.
*/

use crate::description::ParseMode;
use crate::error::{invalid_xml_value, missing_required_field, Error};
use crate::model::{Device, Icon, Service};
use crate::types::{ResourceKind, ResourceType, SpecVersion, Udn};
use crate::utils::xml::{read_element_tree, Node};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// A parsed device description: the negotiated spec version, the base URL used to resolve every
/// relative URL in the tree, and the root device itself.
#[derive(Clone, Debug)]
pub struct DeviceDescription {
    pub spec_version: SpecVersion,
    pub url_base: Option<String>,
    pub device: Device,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

pub fn parse_device_description(xml: &str, mode: ParseMode) -> Result<DeviceDescription, Error> {
    let root = read_element_tree(xml).map_err(crate::error::xml_error)?;
    if root.name != "root" {
        return Err(invalid_xml_value("root", &root.name).into());
    }

    let spec_version_node = root
        .child("specVersion")
        .ok_or_else(|| missing_required_field("specVersion"))?;
    let major: u8 = parse_field(spec_version_node, "major")?;
    let minor: u8 = parse_field(spec_version_node, "minor")?;
    if major != 1 || (minor != 0 && minor != 1) {
        return Err(invalid_xml_value("specVersion", format!("{}.{}", major, minor)).into());
    }
    let spec_version = SpecVersion::from_major_minor(major, minor)
        .ok_or_else(|| invalid_xml_value("specVersion", format!("{}.{}", major, minor)))?;

    let device_node = root
        .child("device")
        .ok_or_else(|| missing_required_field("device"))?;
    let device = parse_device(device_node, mode)?;

    Ok(DeviceDescription {
        spec_version,
        url_base: root.child_text("URLBase").map(|s| s.to_string()),
        device,
    })
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn parse_device(node: &Node, mode: ParseMode) -> Result<Device, Error> {
    let device_type = ResourceType::parse(required_text(node, "deviceType")?)
        .map_err(Error::MessageFormat)?;
    if device_type.kind() != ResourceKind::Device {
        return Err(invalid_xml_value("deviceType", device_type.to_string()).into());
    }

    let friendly_name = non_empty(node, "friendlyName")?;
    if friendly_name.len() > 64 {
        warn!("friendlyName exceeds the recommended 64 characters: {}", friendly_name);
    }
    let manufacturer = non_empty(node, "manufacturer")?;
    if manufacturer.len() > 64 {
        warn!("manufacturer exceeds the recommended 64 characters: {}", manufacturer);
    }
    let model_name = non_empty(node, "modelName")?;
    if model_name.len() > 32 {
        warn!("modelName exceeds the recommended 32 characters: {}", model_name);
    }

    let udn = match Udn::parse(required_text(node, "UDN")?) {
        Udn::Valid(uuid) => Udn::Valid(uuid),
        Udn::Invalid(s) => return Err(invalid_xml_value("UDN", s).into()),
    };

    let presentation_url = match node.child("presentationURL") {
        None => None,
        Some(n) if n.text.is_empty() => match mode {
            ParseMode::Strict => return Err(invalid_xml_value("presentationURL", "").into()),
            ParseMode::Loose => None,
        },
        Some(n) => Some(n.text.clone()),
    };

    let icons = node
        .child("iconList")
        .map(|list| {
            list.children_named("icon")
                .map(parse_icon)
                .collect::<Result<Vec<_>, Error>>()
        })
        .transpose()?
        .unwrap_or_default();

    let services = node
        .child("serviceList")
        .map(|list| {
            list.children_named("service")
                .map(parse_service_stub)
                .collect::<Result<Vec<_>, Error>>()
        })
        .transpose()?
        .unwrap_or_default();

    let devices = node
        .child("deviceList")
        .map(|list| {
            list.children_named("device")
                .map(|n| parse_device(n, mode))
                .collect::<Result<Vec<_>, Error>>()
        })
        .transpose()?
        .unwrap_or_default();

    let mut device = Device::new(device_type, udn, friendly_name, manufacturer, model_name);
    device.manufacturer_url = optional(node, "manufacturerURL");
    device.model_description = optional(node, "modelDescription");
    device.model_number = optional(node, "modelNumber");
    device.model_url = optional(node, "modelURL");
    device.serial_number = optional(node, "serialNumber");
    device.upc = optional(node, "UPC");
    device.presentation_url = presentation_url;
    device.icons = icons;
    device.services = services;
    device.devices = devices;
    Ok(device)
}

fn parse_icon(node: &Node) -> Result<Icon, Error> {
    Ok(Icon {
        mime_type: non_empty(node, "mimetype")?,
        width: parse_field(node, "width")?,
        height: parse_field(node, "height")?,
        depth: parse_field(node, "depth")?,
        url: non_empty(node, "url")?,
    })
}

fn parse_service_stub(node: &Node) -> Result<Service, Error> {
    let service_type = ResourceType::parse(required_text(node, "serviceType")?)
        .map_err(Error::MessageFormat)?;
    if service_type.kind() != ResourceKind::Service {
        return Err(invalid_xml_value("serviceType", service_type.to_string()).into());
    }
    Ok(Service::new(
        service_type,
        non_empty(node, "serviceId")?,
        non_empty(node, "SCPDURL")?,
        non_empty(node, "controlURL")?,
        non_empty(node, "eventSubURL")?,
    ))
}

fn required_text<'a>(node: &'a Node, name: &str) -> Result<&'a str, Error> {
    node.child_text(name)
        .ok_or_else(|| Error::MessageFormat(missing_required_field(name)))
}

fn non_empty(node: &Node, name: &str) -> Result<String, Error> {
    let text = required_text(node, name)?;
    if text.is_empty() {
        Err(invalid_xml_value(name, text).into())
    } else {
        Ok(text.to_string())
    }
}

fn optional(node: &Node, name: &str) -> Option<String> {
    node.child_text(name).filter(|s| !s.is_empty()).map(|s| s.to_string())
}

fn parse_field<T: std::str::FromStr>(node: &Node, name: &str) -> Result<T, Error> {
    required_text(node, name)?
        .parse()
        .map_err(|_| invalid_xml_value(name, required_text(node, name).unwrap_or_default()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const AXIS_CAMERA: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
<specVersion><major>1</major><minor>0</minor></specVersion>
<device>
<deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>
<friendlyName>AXIS P3301 - 00408CA45086</friendlyName>
<manufacturer>AXIS</manufacturer>
<manufacturerURL>http://www.axis.com/</manufacturerURL>
<modelName>AXIS P3301</modelName>
<UDN>uuid:12345678-1234-1234-1234-123456789012</UDN>
<serviceList>
<service>
<serviceType>urn:axis-com:service:BasicService:1</serviceType>
<serviceId>urn:axis-com:serviceId:BasicServiceId</serviceId>
<controlURL>/upnp/control/BasicServiceId</controlURL>
<eventSubURL>/upnp/event/BasicServiceId</eventSubURL>
<SCPDURL>/scpd_basic.xml</SCPDURL>
</service>
</serviceList>
<presentationURL>http://10.59.104.28:80/</presentationURL>
</device>
<URLBase>http://10.59.104.28:49152/</URLBase>
</root>"#;

    #[test]
    fn parses_axis_camera_description() {
        let parsed = parse_device_description(AXIS_CAMERA, ParseMode::Strict).unwrap();
        assert_eq!(parsed.device.friendly_name, "AXIS P3301 - 00408CA45086");
        assert_eq!(parsed.device.services.len(), 1);
        assert_eq!(parsed.url_base.as_deref(), Some("http://10.59.104.28:49152/"));
    }

    #[test]
    fn rejects_wrong_major_version() {
        let xml = AXIS_CAMERA.replace("<major>1</major>", "<major>3</major>");
        assert!(parse_device_description(&xml, ParseMode::Strict).is_err());
    }

    #[test]
    fn strict_mode_rejects_empty_presentation_url() {
        let xml = AXIS_CAMERA.replace(
            "<presentationURL>http://10.59.104.28:80/</presentationURL>",
            "<presentationURL></presentationURL>",
        );
        assert!(parse_device_description(&xml, ParseMode::Strict).is_err());
        assert!(parse_device_description(&xml, ParseMode::Loose).is_ok());
    }
}
