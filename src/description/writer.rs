/*!
Serializes a [`crate::model::Device`] tree back into a device description `<root>` document, and
a [`crate::model::Service`]'s action/state tables into an `<scpd>` document — the host side of
description (§4.8 assigns the URLs these documents advertise; this module only renders the XML).
*/

use crate::model::{Action, AllowedValue, Argument, Device, Direction, Icon, Service, StateVariable};
use crate::types::SpecVersion;
use crate::utils::xml::*;
use quick_xml::{Error as XmlError, Writer};
use std::io::Write;

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

pub fn write_device_description<T: Write>(
    device: &Device,
    url_base: &str,
    spec_version: SpecVersion,
    out: T,
) -> Result<(), XmlError> {
    let mut xml = Writer::new(out);
    start(&mut xml)?;

    let root = start_ns_element(&mut xml, X_ELEM_ROOT, "urn:schemas-upnp-org:device-1-0", None)?;
    write_spec_version(&mut xml, spec_version)?;
    text_element(&mut xml, X_ELEM_URL_BASE, url_base.as_bytes())?;
    write_device(&mut xml, device)?;
    root.end(&mut xml)
}

pub fn write_scpd<T: Write>(service: &Service, spec_version: SpecVersion, out: T) -> Result<(), XmlError> {
    let mut xml = Writer::new(out);
    start(&mut xml)?;

    let root = start_ns_element(&mut xml, X_ELEM_SCPD, "urn:schemas-upnp-org:service-1-0", None)?;
    write_spec_version(&mut xml, spec_version)?;

    if !service.actions.is_empty() {
        let list = start_element(&mut xml, X_ELEM_ACTION_LIST)?;
        for action in &service.actions {
            write_action(&mut xml, action)?;
        }
        list.end(&mut xml)?;
    }

    let table = start_element(&mut xml, X_ELEM_STATE_TABLE)?;
    for variable in &service.state_variables {
        write_state_variable(&mut xml, variable)?;
    }
    table.end(&mut xml)?;

    root.end(&mut xml)
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn write_spec_version<T: Write>(writer: &mut Writer<T>, version: SpecVersion) -> Result<(), XmlError> {
    let (major, minor) = version.major_minor();
    let element = start_element(writer, X_ELEM_SPEC_VERSION)?;
    text_element(writer, X_ELEM_MAJOR, major.to_string().as_bytes())?;
    text_element(writer, X_ELEM_MINOR, minor.to_string().as_bytes())?;
    element.end(writer)
}

fn write_device<T: Write>(writer: &mut Writer<T>, device: &Device) -> Result<(), XmlError> {
    let top = start_element(writer, X_ELEM_DEVICE)?;

    text_element(writer, X_ELEM_DEVICE_TYPE, device.device_type.to_string().as_bytes())?;
    text_element(writer, X_ELEM_FRIENDLY_NAME, device.friendly_name.as_bytes())?;
    text_element(writer, X_ELEM_MANUFACTURER, device.manufacturer.as_bytes())?;

    if let Some(s) = &device.manufacturer_url {
        text_element(writer, X_ELEM_MANUFACTURER_URL, s.as_bytes())?;
    }
    if let Some(s) = &device.model_description {
        text_element(writer, X_ELEM_MODEL_DESCR, s.as_bytes())?;
    }
    text_element(writer, X_ELEM_MODEL_NAME, device.model_name.as_bytes())?;
    if let Some(s) = &device.model_number {
        text_element(writer, X_ELEM_MODEL_NUMBER, s.as_bytes())?;
    }
    if let Some(s) = &device.model_url {
        text_element(writer, X_ELEM_MODEL_URL, s.as_bytes())?;
    }
    if let Some(s) = &device.serial_number {
        text_element(writer, X_ELEM_SERIAL_NUMBER, s.as_bytes())?;
    }

    text_element(writer, X_ELEM_UDN, device.udn.to_string().as_bytes())?;

    if let Some(s) = &device.upc {
        text_element(writer, X_ELEM_UPC, s.as_bytes())?;
    }

    if !device.icons.is_empty() {
        let list = start_element(writer, X_ELEM_ICON_LIST)?;
        for icon in &device.icons {
            write_icon(writer, icon)?;
        }
        list.end(writer)?;
    }

    if !device.services.is_empty() {
        let list = start_element(writer, X_ELEM_SERVICE_LIST)?;
        for service in &device.services {
            write_service_stub(writer, service)?;
        }
        list.end(writer)?;
    }

    if !device.devices.is_empty() {
        let list = start_element(writer, X_ELEM_DEVICE_LIST)?;
        for child in &device.devices {
            write_device(writer, child)?;
        }
        list.end(writer)?;
    }

    if let Some(s) = &device.presentation_url {
        text_element(writer, X_ELEM_PRESENTATION_URL, s.as_bytes())?;
    }

    top.end(writer)
}

fn write_icon<T: Write>(writer: &mut Writer<T>, icon: &Icon) -> Result<(), XmlError> {
    let element = start_element(writer, X_ELEM_ICON)?;
    text_element(writer, X_ELEM_ICON_MIME_TYPE, icon.mime_type.as_bytes())?;
    text_element(writer, X_ELEM_ICON_WIDTH, icon.width.to_string().as_bytes())?;
    text_element(writer, X_ELEM_ICON_HEIGHT, icon.height.to_string().as_bytes())?;
    text_element(writer, X_ELEM_ICON_DEPTH, icon.depth.to_string().as_bytes())?;
    text_element(writer, X_ELEM_ICON_URL, icon.url.as_bytes())?;
    element.end(writer)
}

fn write_service_stub<T: Write>(writer: &mut Writer<T>, service: &Service) -> Result<(), XmlError> {
    let element = start_element(writer, X_ELEM_SERVICE)?;
    text_element(writer, X_ELEM_SERVICE_TYPE, service.service_type.to_string().as_bytes())?;
    text_element(writer, X_ELEM_SERVICE_ID, service.service_id.as_bytes())?;
    text_element(writer, X_ELEM_SERVICE_SCPD_URL, service.scpd_url.as_bytes())?;
    text_element(writer, X_ELEM_SERVICE_CONTROL_URL, service.control_url.as_bytes())?;
    text_element(writer, X_ELEM_SERVICE_EVENT_URL, service.event_sub_url.as_bytes())?;
    element.end(writer)
}

fn write_action<T: Write>(writer: &mut Writer<T>, action: &Action) -> Result<(), XmlError> {
    let element = start_element(writer, X_ELEM_ACTION)?;
    text_element(writer, X_ELEM_NAME, action.name.as_bytes())?;
    if !action.arguments.is_empty() {
        let list = start_element(writer, X_ELEM_ARGUMENT_LIST)?;
        for argument in &action.arguments {
            write_argument(writer, argument)?;
        }
        list.end(writer)?;
    }
    element.end(writer)
}

fn write_argument<T: Write>(writer: &mut Writer<T>, argument: &Argument) -> Result<(), XmlError> {
    let element = start_element(writer, X_ELEM_ARGUMENT)?;
    text_element(writer, X_ELEM_NAME, argument.name.as_bytes())?;
    text_element(
        writer,
        X_ELEM_DIRECTION,
        match argument.direction {
            Direction::In => b"in".as_ref(),
            Direction::Out => b"out".as_ref(),
        },
    )?;
    if argument.return_value {
        self::element(writer, X_ELEM_RETVAL)?;
    }
    text_element(writer, X_ELEM_REL_STATE_VARIABLE, argument.related_state_variable.as_bytes())?;
    element.end(writer)
}

fn write_state_variable<T: Write>(writer: &mut Writer<T>, variable: &StateVariable) -> Result<(), XmlError> {
    let element = start_element_with(
        writer,
        X_ELEM_STATE_VARIABLE,
        vec![(X_ATTR_SEND_EVENTS, if variable.send_events { "yes" } else { "no" })],
    )?;
    text_element(writer, X_ELEM_NAME, variable.name.as_bytes())?;
    text_element(writer, X_ELEM_DATA_TYPE, variable.data_type.to_string().as_bytes())?;
    if let Some(default_value) = &variable.default_value {
        text_element(writer, X_ELEM_DEFAULT_VALUE, variable.data_type.encode_value(default_value).as_bytes())?;
    }
    if let Some(allowed) = &variable.allowed_values {
        write_allowed_value(writer, allowed)?;
    }
    element.end(writer)
}

fn write_allowed_value<T: Write>(writer: &mut Writer<T>, allowed: &AllowedValue) -> Result<(), XmlError> {
    match allowed {
        AllowedValue::List(values) => {
            let list = start_element(writer, X_ELEM_ALLOWED_LIST)?;
            for value in values {
                text_element(writer, X_ELEM_ALLOWED_VALUE, value.as_bytes())?;
            }
            list.end(writer)
        }
        AllowedValue::Range { minimum, maximum, step } => {
            let range = start_element(writer, X_ELEM_ALLOWED_RANGE)?;
            text_element(writer, X_ELEM_MINIMUM, minimum.to_string().as_bytes())?;
            text_element(writer, X_ELEM_MAXIMUM, maximum.to_string().as_bytes())?;
            text_element(writer, X_ELEM_STEP, step.to_string().as_bytes())?;
            range.end(writer)
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

const X_ATTR_SEND_EVENTS: &str = "sendEvents";

const X_ELEM_ACTION: &[u8] = b"action";
const X_ELEM_ACTION_LIST: &[u8] = b"actionList";
const X_ELEM_ALLOWED_LIST: &[u8] = b"allowedValueList";
const X_ELEM_ALLOWED_RANGE: &[u8] = b"allowedValueRange";
const X_ELEM_ALLOWED_VALUE: &[u8] = b"allowedValue";
const X_ELEM_ARGUMENT: &[u8] = b"argument";
const X_ELEM_ARGUMENT_LIST: &[u8] = b"argumentList";
const X_ELEM_DATA_TYPE: &[u8] = b"dataType";
const X_ELEM_DEFAULT_VALUE: &[u8] = b"defaultValue";
const X_ELEM_DEVICE: &[u8] = b"device";
const X_ELEM_DEVICE_LIST: &[u8] = b"deviceList";
const X_ELEM_DEVICE_TYPE: &[u8] = b"deviceType";
const X_ELEM_DIRECTION: &[u8] = b"direction";
const X_ELEM_FRIENDLY_NAME: &[u8] = b"friendlyName";
const X_ELEM_ICON: &[u8] = b"icon";
const X_ELEM_ICON_DEPTH: &[u8] = b"depth";
const X_ELEM_ICON_HEIGHT: &[u8] = b"height";
const X_ELEM_ICON_LIST: &[u8] = b"iconList";
const X_ELEM_ICON_MIME_TYPE: &[u8] = b"mimetype";
const X_ELEM_ICON_URL: &[u8] = b"url";
const X_ELEM_ICON_WIDTH: &[u8] = b"width";
const X_ELEM_MAJOR: &[u8] = b"major";
const X_ELEM_MANUFACTURER: &[u8] = b"manufacturer";
const X_ELEM_MANUFACTURER_URL: &[u8] = b"manufacturerURL";
const X_ELEM_MAXIMUM: &[u8] = b"maximum";
const X_ELEM_MINIMUM: &[u8] = b"minimum";
const X_ELEM_MINOR: &[u8] = b"minor";
const X_ELEM_MODEL_DESCR: &[u8] = b"modelDescription";
const X_ELEM_MODEL_NAME: &[u8] = b"modelName";
const X_ELEM_MODEL_NUMBER: &[u8] = b"modelNumber";
const X_ELEM_MODEL_URL: &[u8] = b"modelURL";
const X_ELEM_NAME: &[u8] = b"name";
const X_ELEM_PRESENTATION_URL: &[u8] = b"presentationURL";
const X_ELEM_REL_STATE_VARIABLE: &[u8] = b"relatedStateVariable";
const X_ELEM_RETVAL: &[u8] = b"retval";
const X_ELEM_ROOT: &[u8] = b"root";
const X_ELEM_SCPD: &[u8] = b"scpd";
const X_ELEM_SERIAL_NUMBER: &[u8] = b"serialNumber";
const X_ELEM_SERVICE: &[u8] = b"service";
const X_ELEM_SERVICE_CONTROL_URL: &[u8] = b"controlURL";
const X_ELEM_SERVICE_EVENT_URL: &[u8] = b"eventSubURL";
const X_ELEM_SERVICE_ID: &[u8] = b"serviceId";
const X_ELEM_SERVICE_LIST: &[u8] = b"serviceList";
const X_ELEM_SERVICE_SCPD_URL: &[u8] = b"SCPDURL";
const X_ELEM_SERVICE_TYPE: &[u8] = b"serviceType";
const X_ELEM_SPEC_VERSION: &[u8] = b"specVersion";
const X_ELEM_STATE_TABLE: &[u8] = b"serviceStateTable";
const X_ELEM_STATE_VARIABLE: &[u8] = b"stateVariable";
const X_ELEM_STEP: &[u8] = b"step";
const X_ELEM_UDN: &[u8] = b"UDN";
const X_ELEM_UPC: &[u8] = b"UPC";
const X_ELEM_URL_BASE: &[u8] = b"URLBase";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResourceKind, ResourceType};

    #[test]
    fn writes_a_minimal_device_description() {
        let device = Device::new(
            ResourceType::new_standard(ResourceKind::Device, "BinaryLight", 1),
            crate::types::udn::new_udn(),
            "Lamp",
            "Acme",
            "Lamp v1",
        );
        let mut buf = Vec::new();
        write_device_description(&device, "http://127.0.0.1:49152/", SpecVersion::V11, &mut buf).unwrap();
        let xml = String::from_utf8(buf).unwrap();
        assert!(xml.contains("<friendlyName>Lamp</friendlyName>"));
        assert!(xml.contains("<deviceType>urn:schemas-upnp-org:device:BinaryLight:1</deviceType>"));
    }
}
