/*!
Encodes and decodes the SOAP 1.1 envelope UDA carries over HTTP POST (§4.5, §4.6): a call with
ordered in-arguments, a response with ordered out-arguments, or a fault.
*/

use crate::error::{invalid_xml_value, missing_required_field, Error};
use crate::model::{Action, DataType, StateVariable, Value};
use crate::soap::fault::{Fault, UpnpErrorCode};
use crate::syntax;
use crate::utils::xml::{read_element_tree, start, start_element_with, text_element, Node};
use quick_xml::Writer;
use std::io::Write;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct ActionCall {
    pub service_type: String,
    pub action_name: String,
    pub arguments: Vec<(String, Value)>,
}

#[derive(Clone, Debug)]
pub struct ActionResponse {
    pub service_type: String,
    pub action_name: String,
    pub arguments: Vec<(String, Value)>,
}

#[derive(Clone, Debug)]
pub enum Envelope {
    Call(ActionCall),
    Response(ActionResponse),
    Fault(Fault),
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl ActionCall {
    pub fn encode(&self, action: &Action, state_variables: &[StateVariable]) -> Result<Vec<u8>, Error> {
        encode_envelope(
            &self.service_type,
            &self.action_name,
            &self.arguments,
            action,
            state_variables,
            false,
        )
    }
}

impl ActionResponse {
    pub fn encode(&self, action: &Action, state_variables: &[StateVariable]) -> Result<Vec<u8>, Error> {
        encode_envelope(
            &self.service_type,
            &format!("{}Response", self.action_name),
            &self.arguments,
            action,
            state_variables,
            true,
        )
    }
}

pub fn decode_call(body: &[u8], action: &Action, state_variables: &[StateVariable]) -> Result<ActionCall, Error> {
    let text =
        std::str::from_utf8(body).map_err(|e| crate::error::invalid_field_value("body", e.to_string()))?;
    let root = read_element_tree(text).map_err(crate::error::xml_error)?;
    let action_element = find_action_element(&root)?;
    let arguments = decode_arguments(action_element, action, state_variables)?;
    Ok(ActionCall {
        service_type: String::new(),
        action_name: action.name.clone(),
        arguments,
    })
}

pub fn decode_response(
    body: &[u8],
    action: &Action,
    state_variables: &[StateVariable],
) -> Result<Envelope, Error> {
    let text =
        std::str::from_utf8(body).map_err(|e| crate::error::invalid_field_value("body", e.to_string()))?;
    let root = read_element_tree(text).map_err(crate::error::xml_error)?;
    let body_element = root
        .child("Body")
        .ok_or_else(|| missing_required_field("SOAP Body"))?;
    if let Some(fault) = body_element.child("Fault") {
        return Ok(Envelope::Fault(decode_fault(fault)?));
    }
    let action_element = body_element
        .children
        .first()
        .ok_or_else(|| missing_required_field("SOAP response action element"))?;
    let arguments = decode_arguments(action_element, action, state_variables)?;
    Ok(Envelope::Response(ActionResponse {
        service_type: String::new(),
        action_name: action.name.clone(),
        arguments,
    }))
}

pub fn encode_fault(fault: &Fault) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut xml = Writer::new(&mut buf);
    start(&mut xml).ok();
    let _ = write_fault_envelope(&mut xml, fault);
    buf
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn encode_envelope(
    service_type: &str,
    element_name: &str,
    arguments: &[(String, Value)],
    action: &Action,
    state_variables: &[StateVariable],
    outputs: bool,
) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    {
        let mut xml = Writer::new(&mut buf);
        start(&mut xml).map_err(crate::error::xml_error)?;
        let envelope = start_element_with(
            &mut xml,
            b"s:Envelope",
            vec![
                ("xmlns:s", syntax::SOAP_NS_ENVELOPE),
                ("s:encodingStyle", syntax::SOAP_NS_ENCODING),
            ],
        )
        .map_err(crate::error::xml_error)?;
        let body = crate::utils::xml::start_element(&mut xml, b"s:Body").map_err(crate::error::xml_error)?;
        let action_element = start_element_with(
            &mut xml,
            format!("u:{}", element_name),
            vec![("xmlns:u", service_type)],
        )
        .map_err(crate::error::xml_error)?;
        for (name, value) in arguments {
            let data_type = lookup_data_type(action, state_variables, name, outputs);
            let encoded = data_type.map(|dt| dt.encode_value(value)).unwrap_or_else(|| match value {
                Value::String(s) => s.clone(),
                _ => String::new(),
            });
            text_element(&mut xml, name.as_str(), encoded.as_bytes()).map_err(crate::error::xml_error)?;
        }
        action_element.end(&mut xml).map_err(crate::error::xml_error)?;
        body.end(&mut xml).map_err(crate::error::xml_error)?;
        envelope.end(&mut xml).map_err(crate::error::xml_error)?;
    }
    Ok(buf)
}

fn lookup_data_type(
    action: &Action,
    state_variables: &[StateVariable],
    argument_name: &str,
    outputs: bool,
) -> Option<DataType> {
    let mut iter: Box<dyn Iterator<Item = &crate::model::Argument>> = if outputs {
        Box::new(action.out_arguments())
    } else {
        Box::new(action.in_arguments())
    };
    let argument = iter.find(|a| a.name == argument_name)?;
    state_variables
        .iter()
        .find(|sv| sv.name == argument.related_state_variable)
        .map(|sv| sv.data_type)
}

fn find_action_element<'a>(root: &'a Node) -> Result<&'a Node, Error> {
    let body = root
        .child("Body")
        .ok_or_else(|| missing_required_field("SOAP Body"))?;
    body.children
        .first()
        .ok_or_else(|| missing_required_field("SOAP action element").into())
}

fn decode_arguments(
    action_element: &Node,
    action: &Action,
    state_variables: &[StateVariable],
) -> Result<Vec<(String, Value)>, Error> {
    let mut values = Vec::new();
    for child in &action_element.children {
        let data_type = action
            .arguments
            .iter()
            .find(|a| a.name == child.name)
            .and_then(|a| state_variables.iter().find(|sv| sv.name == a.related_state_variable))
            .map(|sv| sv.data_type)
            .unwrap_or(DataType::String);
        values.push((child.name.clone(), data_type.parse_value(&child.text)?));
    }
    Ok(values)
}

fn decode_fault(fault_node: &Node) -> Result<Fault, Error> {
    let detail = fault_node
        .child("detail")
        .ok_or_else(|| missing_required_field("Fault/detail"))?;
    let upnp_error = detail
        .child("UPnPError")
        .ok_or_else(|| missing_required_field("Fault/detail/UPnPError"))?;
    let code: u16 = upnp_error
        .child_text("errorCode")
        .ok_or_else(|| missing_required_field("errorCode"))?
        .parse()
        .map_err(|_| invalid_xml_value("errorCode", ""))?;
    let description = upnp_error.child_text("errorDescription").unwrap_or_default().to_string();
    Ok(Fault::new(UpnpErrorCode::from_code(code), description))
}

fn write_fault_envelope<T: Write>(xml: &mut Writer<T>, fault: &Fault) -> Result<(), quick_xml::Error> {
    let envelope = start_element_with(
        xml,
        b"s:Envelope",
        vec![
            ("xmlns:s", syntax::SOAP_NS_ENVELOPE),
            ("s:encodingStyle", syntax::SOAP_NS_ENCODING),
        ],
    )?;
    let body = crate::utils::xml::start_element(xml, b"s:Body")?;
    let fault_element = crate::utils::xml::start_element(xml, syntax::SOAP_ELEM_FAULT)?;
    text_element(xml, syntax::SOAP_ELEM_FAULT_CODE, format!("s:{}", syntax::SOAP_FAULT_CODE_CLIENT).as_bytes())?;
    text_element(xml, syntax::SOAP_ELEM_FAULT_STRING, b"UPnPError")?;
    let detail = crate::utils::xml::start_element(xml, syntax::SOAP_ELEM_FAULT_DETAIL)?;
    let upnp_error =
        crate::utils::xml::start_ns_element(xml, syntax::SOAP_ELEM_UPNP_ERROR, syntax::SOAP_NS_CONTROL, None)?;
    text_element(xml, syntax::SOAP_ELEM_UPNP_ERROR_CODE, fault.code.code().to_string().as_bytes())?;
    text_element(xml, syntax::SOAP_ELEM_UPNP_ERROR_DESC, fault.description.as_bytes())?;
    upnp_error.end(xml)?;
    detail.end(xml)?;
    fault_element.end(xml)?;
    body.end(xml)?;
    envelope.end(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, Argument, Direction};

    #[test]
    fn encodes_a_call_envelope_containing_in_arguments() {
        let action = Action::new("SetTarget", vec![Argument::new("newTargetValue", Direction::In, "Target")]);
        let state_variables = vec![crate::model::StateVariable::new("Target", DataType::Boolean, false)];
        let call = ActionCall {
            service_type: "urn:schemas-upnp-org:service:SwitchPower:1".to_string(),
            action_name: "SetTarget".to_string(),
            arguments: vec![("newTargetValue".to_string(), Value::Boolean(true))],
        };
        let encoded = call.encode(&action, &state_variables).unwrap();
        let xml = String::from_utf8(encoded).unwrap();
        assert!(xml.contains("u:SetTarget"));
        assert!(xml.contains("newTargetValue"));
    }

    #[test]
    fn decodes_a_fault_envelope() {
        let fault = Fault::new(UpnpErrorCode::InvalidArgs, "Invalid Args");
        let encoded = encode_fault(&fault);
        let xml = String::from_utf8(encoded).unwrap();
        let root = read_element_tree(&xml).unwrap();
        let body = root.child("Body").unwrap();
        let decoded = decode_fault(body.child("Fault").unwrap()).unwrap();
        assert_eq!(decoded.code.code(), 402);
    }
}
