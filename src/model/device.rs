/*!
The device tree: a root or embedded device, its icons, the services it directly exposes, and any
embedded devices nested beneath it. Owned, non-cyclic (§9): an embedded [`Device`] lives inside its
parent's `devices` vector and is never referenced back.
*/

use crate::types::{ResourceType, Udn};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Icon {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct Device {
    pub device_type: ResourceType,
    pub udn: Udn,
    pub friendly_name: String,
    pub manufacturer: String,
    pub manufacturer_url: Option<String>,
    pub model_description: Option<String>,
    pub model_name: String,
    pub model_number: Option<String>,
    pub model_url: Option<String>,
    pub serial_number: Option<String>,
    pub upc: Option<String>,
    pub presentation_url: Option<String>,
    pub icons: Vec<Icon>,
    pub services: Vec<crate::model::Service>,
    pub devices: Vec<Device>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Device {
    pub fn new(device_type: ResourceType, udn: Udn, friendly_name: impl Into<String>, manufacturer: impl Into<String>, model_name: impl Into<String>) -> Self {
        Device {
            device_type,
            udn,
            friendly_name: friendly_name.into(),
            manufacturer: manufacturer.into(),
            manufacturer_url: None,
            model_description: None,
            model_name: model_name.into(),
            model_number: None,
            model_url: None,
            serial_number: None,
            upc: None,
            presentation_url: None,
            icons: Vec::new(),
            services: Vec::new(),
            devices: Vec::new(),
        }
    }

    /// Depth-first walk of this device and every embedded device, self first (§4.8's advertisement
    /// count of `1 + embedded device count` per device relies on this order).
    pub fn walk(&self) -> Vec<&Device> {
        let mut out = vec![self];
        for child in &self.devices {
            out.extend(child.walk());
        }
        out
    }

    /// Mutable counterpart to [`Device::walk`]: applies `f` to this device and then, depth-first,
    /// every embedded device. Used by a device host to assign URLs and fill in SCPD contents
    /// across the whole tree in a single pass.
    pub fn walk_mut<F: FnMut(&mut Device)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.devices {
            child.walk_mut(f);
        }
    }

    pub fn find_by_udn(&self, udn: &Udn) -> Option<&Device> {
        self.walk().into_iter().find(|d| &d.udn == udn)
    }

    pub fn total_service_count(&self) -> usize {
        self.walk().iter().map(|d| d.services.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceKind;
    use pretty_assertions::assert_eq;

    fn sample_device(name: &str) -> Device {
        Device::new(
            ResourceType::new_standard(ResourceKind::Device, "Basic", 1),
            crate::types::udn::new_udn(),
            name,
            "Acme",
            "Widget",
        )
    }

    #[test]
    fn walk_visits_self_before_children() {
        let mut root = sample_device("root");
        root.devices.push(sample_device("child"));
        let names: Vec<_> = root.walk().iter().map(|d| d.friendly_name.as_str()).collect();
        assert_eq!(names, vec!["root", "child"]);
    }

    #[test]
    fn find_by_udn_locates_nested_device() {
        let mut root = sample_device("root");
        let child = sample_device("child");
        let child_udn = child.udn.clone();
        root.devices.push(child);
        assert!(root.find_by_udn(&child_udn).is_some());
    }

    #[test]
    fn walk_mut_visits_self_before_children() {
        let mut root = sample_device("root");
        root.devices.push(sample_device("child"));
        let mut visited = Vec::new();
        root.walk_mut(&mut |d| visited.push(d.friendly_name.clone()));
        assert_eq!(visited, vec!["root".to_string(), "child".to_string()]);
    }
}
