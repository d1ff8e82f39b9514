/*!
A service: the actions and state variables a device exposes under one `serviceId`, plus the three
relative URLs UDA defines for it (SCPD, control, event subscription).
*/

use crate::model::{Action, StateVariable};
use crate::types::ResourceType;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Service {
    pub service_type: ResourceType,
    pub service_id: String,
    pub scpd_url: String,
    pub control_url: String,
    pub event_sub_url: String,
    pub actions: Vec<Action>,
    pub state_variables: Vec<StateVariable>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Service {
    pub fn new(
        service_type: ResourceType,
        service_id: impl Into<String>,
        scpd_url: impl Into<String>,
        control_url: impl Into<String>,
        event_sub_url: impl Into<String>,
    ) -> Self {
        Service {
            service_type,
            service_id: service_id.into(),
            scpd_url: scpd_url.into(),
            control_url: control_url.into(),
            event_sub_url: event_sub_url.into(),
            actions: Vec::new(),
            state_variables: Vec::new(),
        }
    }

    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn find_state_variable(&self, name: &str) -> Option<&StateVariable> {
        self.state_variables.iter().find(|v| v.name == name)
    }

    pub fn find_state_variable_mut(&mut self, name: &str) -> Option<&mut StateVariable> {
        self.state_variables.iter_mut().find(|v| v.name == name)
    }

    /// The subset of state variables flagged `sendEvents="yes"` (§4.7): these, and only these,
    /// may appear in a GENA NOTIFY body.
    pub fn evented_state_variables(&self) -> impl Iterator<Item = &StateVariable> {
        self.state_variables.iter().filter(|v| v.send_events)
    }

    pub fn has_events(&self) -> bool {
        self.evented_state_variables().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::datatype::DataType;
    use crate::types::ResourceKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn evented_state_variables_excludes_non_evented() {
        let mut service = Service::new(
            ResourceType::new_standard(ResourceKind::Service, "SwitchPower", 1),
            "urn:upnp-org:serviceId:SwitchPower",
            "/scpd.xml",
            "/control",
            "/event",
        );
        service
            .state_variables
            .push(StateVariable::new("Status", DataType::Boolean, true));
        service
            .state_variables
            .push(StateVariable::new("Target", DataType::Boolean, false));
        let names: Vec<_> = service.evented_state_variables().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Status"]);
    }

    #[test]
    fn find_action_is_case_sensitive_exact_match() {
        let service = Service::new(
            ResourceType::new_standard(ResourceKind::Service, "SwitchPower", 1),
            "urn:upnp-org:serviceId:SwitchPower",
            "/scpd.xml",
            "/control",
            "/event",
        );
        assert!(service.find_action("SetTarget").is_none());
    }
}
