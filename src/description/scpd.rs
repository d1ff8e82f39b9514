/*!
Parses a service's `<scpd>` document into its action list and state variable table (§4.4's
second ingestion pass, run once per service against its `SCPDURL`).
*/

use crate::description::ParseMode;
use crate::error::{invalid_argument, invalid_xml_value, missing_required_field, Error};
use crate::model::{Action, AllowedValue, Argument, DataType, Direction, StateVariable};
use crate::types::SpecVersion;
use crate::utils::xml::{read_element_tree, Node};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct ServiceDescription {
    pub spec_version: SpecVersion,
    pub actions: Vec<Action>,
    pub state_variables: Vec<StateVariable>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

pub fn parse_scpd(xml: &str, mode: ParseMode) -> Result<ServiceDescription, Error> {
    let root = read_element_tree(xml).map_err(crate::error::xml_error)?;
    if root.name != "scpd" {
        return Err(invalid_xml_value("scpd", &root.name).into());
    }

    let spec_version_node = root
        .child("specVersion")
        .ok_or_else(|| missing_required_field("specVersion"))?;
    let major: u8 = required_text(spec_version_node, "major")?
        .parse()
        .map_err(|_| invalid_xml_value("major", required_text(spec_version_node, "major")?))?;
    let minor: u8 = required_text(spec_version_node, "minor")?
        .parse()
        .map_err(|_| invalid_xml_value("minor", required_text(spec_version_node, "minor")?))?;
    let spec_version = SpecVersion::from_major_minor(major, minor)
        .ok_or_else(|| invalid_xml_value("specVersion", format!("{}.{}", major, minor)))?;

    let state_table = root
        .child("serviceStateTable")
        .ok_or_else(|| missing_required_field("serviceStateTable"))?;
    let state_variables = state_table
        .children_named("stateVariable")
        .map(|n| parse_state_variable(n, mode))
        .collect::<Result<Vec<_>, Error>>()?;

    let actions = root
        .child("actionList")
        .map(|list| {
            list.children_named("action")
                .map(|n| parse_action(n, &state_variables))
                .collect::<Result<Vec<_>, Error>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(ServiceDescription {
        spec_version,
        actions,
        state_variables,
    })
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn parse_state_variable(node: &Node, mode: ParseMode) -> Result<StateVariable, Error> {
    let name = required_text(node, "name")?.to_string();
    let data_type = DataType::parse(required_text(node, "dataType")?)?;
    let send_events = node
        .attributes
        .iter()
        .find(|(k, _)| k == "sendEvents")
        .map(|(_, v)| v == "yes")
        .unwrap_or(false);

    let mut variable = StateVariable::new(&name, data_type, send_events);

    if let Some(default_text) = node.child_text("defaultValue") {
        variable = variable.with_default(data_type.parse_value(default_text)?);
    }

    if let Some(list) = node.child("allowedValueList") {
        let values: Vec<String> = list
            .children_named("allowedValue")
            .map(|v| v.text.clone())
            .collect();
        variable = variable.with_allowed_values(AllowedValue::List(values));
    } else if let Some(range) = node.child("allowedValueRange") {
        let (minimum, maximum) = match (range.child_text("minimum"), range.child_text("maximum")) {
            (Some(min), Some(max)) => (
                min.parse::<f64>().map_err(|_| invalid_xml_value("minimum", min))?,
                max.parse::<f64>().map_err(|_| invalid_xml_value("maximum", max))?,
            ),
            _ if mode == ParseMode::Loose => (f64::from(i32::MIN), f64::from(i32::MAX)),
            _ => return Err(missing_required_field("allowedValueRange/minimum|maximum").into()),
        };
        let step = range
            .child_text("step")
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or_else(|| data_type.default_step(maximum));
        variable = variable.with_allowed_values(AllowedValue::Range { minimum, maximum, step });
    }

    Ok(variable)
}

fn parse_action(node: &Node, state_variables: &[StateVariable]) -> Result<Action, Error> {
    let name = required_text(node, "name")?.to_string();
    let mut arguments = Vec::new();
    let mut seen_out = false;
    let mut retval_seen = false;

    if let Some(list) = node.child("argumentList") {
        for (i, arg_node) in list.children_named("argument").enumerate() {
            let arg_name = required_text(arg_node, "name")?.to_string();
            let direction = match required_text(arg_node, "direction")? {
                "in" => Direction::In,
                "out" => Direction::Out,
                other => return Err(invalid_xml_value("direction", other).into()),
            };
            let related = required_text(arg_node, "relatedStateVariable")?.to_string();
            if !state_variables.iter().any(|v| v.name == related) {
                return Err(invalid_argument(&arg_name, "relatedStateVariable does not exist").into());
            }

            if direction == Direction::In {
                if seen_out {
                    return Err(invalid_argument(&name, "in-argument follows an out-argument").into());
                }
            } else {
                seen_out = true;
            }

            let return_value = arg_node.child("retval").is_some();
            if return_value {
                if retval_seen {
                    return Err(invalid_argument(&name, "more than one retval argument").into());
                }
                if direction != Direction::Out || i != first_out_index(list) {
                    return Err(invalid_argument(&name, "retval must be the first out argument").into());
                }
                retval_seen = true;
            }

            let mut argument = Argument::new(arg_name, direction, related);
            argument.return_value = return_value;
            arguments.push(argument);
        }
    }

    Ok(Action::new(name, arguments))
}

fn first_out_index(list: &Node) -> usize {
    list.children_named("argument")
        .position(|a| a.child_text("direction") == Some("out"))
        .unwrap_or(usize::MAX)
}

fn required_text<'a>(node: &'a Node, name: &str) -> Result<&'a str, Error> {
    node.child_text(name)
        .ok_or_else(|| Error::MessageFormat(missing_required_field(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWITCH_POWER_SCPD: &str = r#"<?xml version="1.0"?>
<scpd xmlns="urn:schemas-upnp-org:service-1-0">
<specVersion><major>1</major><minor>0</minor></specVersion>
<actionList>
<action>
<name>SetTarget</name>
<argumentList>
<argument><name>newTargetValue</name><direction>in</direction><relatedStateVariable>Target</relatedStateVariable></argument>
</argumentList>
</action>
<action>
<name>GetTarget</name>
<argumentList>
<argument><name>RetTargetValue</name><direction>out</direction><retval/><relatedStateVariable>Target</relatedStateVariable></argument>
</argumentList>
</action>
</actionList>
<serviceStateTable>
<stateVariable sendEvents="no"><name>Target</name><dataType>boolean</dataType><defaultValue>0</defaultValue></stateVariable>
<stateVariable sendEvents="yes"><name>Status</name><dataType>boolean</dataType><defaultValue>0</defaultValue></stateVariable>
</serviceStateTable>
</scpd>"#;

    #[test]
    fn parses_switch_power_scpd() {
        let parsed = parse_scpd(SWITCH_POWER_SCPD, ParseMode::Strict).unwrap();
        assert_eq!(parsed.actions.len(), 2);
        assert_eq!(parsed.state_variables.len(), 2);
        assert!(parsed.state_variables.iter().find(|v| v.name == "Status").unwrap().send_events);
    }

    #[test]
    fn rejects_argument_with_unknown_related_state_variable() {
        let xml = SWITCH_POWER_SCPD.replace("Target</relatedStateVariable></argument>\n</argumentList>\n</action>\n<action>", "Bogus</relatedStateVariable></argument>\n</argumentList>\n</action>\n<action>");
        assert!(parse_scpd(&xml, ParseMode::Strict).is_err());
    }

    #[test]
    fn loose_mode_defaults_missing_range_bounds() {
        let xml = SWITCH_POWER_SCPD.replace(
            "<stateVariable sendEvents=\"no\"><name>Target</name><dataType>boolean</dataType><defaultValue>0</defaultValue></stateVariable>",
            "<stateVariable sendEvents=\"no\"><name>Target</name><dataType>i4</dataType><defaultValue>0</defaultValue><allowedValueRange></allowedValueRange></stateVariable>",
        );
        assert!(parse_scpd(&xml, ParseMode::Strict).is_err());
        assert!(parse_scpd(&xml, ParseMode::Loose).is_ok());
    }
}
