/*!
[`DeviceHost`]: loads a device's description and per-service SCPDs from disk (§4.4), binds the
HTTP and SSDP sockets, and owns the shared [`HostState`] that [`super::dispatch::DispatchHandler`]
and [`super::advertiser::Advertiser`] both work against.
*/

use crate::config::{ActionHandler, HostConfig};
use crate::description::{parse_device_description, parse_scpd, ParseMode};
use crate::error::Error;
use crate::gena::EventHost;
use crate::host::advertiser::Advertiser;
use crate::host::dispatch::DispatchHandler;
use crate::http::server::Server;
use crate::model::{Device, Service, Value};
use crate::types::{ProductTokens, SpecVersion};
use crate::utils::interface::default_local_ipv4;
use crate::utils::user_agent::default_product_tokens;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

// ------------------------------------------------------------------------------------------------
// Public Values
// ------------------------------------------------------------------------------------------------

/// Fixed resource path the root device description is served under; every service's `SCPDURL`,
/// `controlURL`, and `eventSubURL` come from the description itself and are routed as-is.
pub const DESCRIPTION_PATH: &str = "/description.xml";

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Shared state behind a running host: the device tree (mutable, for state variable updates), the
/// URL it was published under, and the GENA subscriber registry. Held behind `Arc` by both the
/// HTTP dispatch handler and the SSDP advertiser.
pub struct HostState {
    pub(crate) device: RwLock<Device>,
    pub(crate) url_base: String,
    pub(crate) description_path: String,
    pub(crate) spec_version: SpecVersion,
    pub(crate) cache_control_max_age: u32,
    pub(crate) product_tokens: ProductTokens,
    pub(crate) event_host: EventHost,
    pub(crate) action_handlers: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
}

impl Debug for HostState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostState")
            .field("url_base", &self.url_base)
            .field("spec_version", &self.spec_version)
            .finish()
    }
}

/// A running device host: serves descriptions, dispatches control and eventing requests, and
/// advertises the device over SSDP until [`DeviceHost::shutdown`] is called.
pub struct DeviceHost {
    state: Arc<HostState>,
    server: Arc<Server>,
    advertiser: Arc<Advertiser>,
}

impl Debug for DeviceHost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHost").field("state", &self.state).finish()
    }
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl DeviceHost {
    /// Loads the device description named by `config`, resolves every service's SCPD relative to
    /// it, binds an HTTP server and the SSDP sockets, and starts advertising.
    pub fn new(config: HostConfig) -> Result<Self, Error> {
        let xml = fs::read_to_string(&config.path_to_device_description)?;
        let parsed = parse_device_description(&xml, ParseMode::Loose)?;
        let mut device = config.device_factory.make_device(parsed.device);

        let base_dir = config
            .path_to_device_description
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let service_factory = Arc::clone(&config.service_factory);
        device.walk_mut(&mut |d| {
            for service in &mut d.services {
                let replaced = service_factory.make_service(&service.service_type, service.clone());
                *service = replaced;
                load_scpd(service, &base_dir);
            }
        });

        let local_addr = default_local_ipv4();
        let (server, bound_addr) = Server::bind(&format!("{}:0", local_addr))?;
        let url_base = format!("http://{}/", bound_addr);

        let spec_version = parsed.spec_version;
        let product_tokens = default_product_tokens(spec_version);
        let event_host = EventHost::new(config.cache_control_max_age)?;

        let state = Arc::new(HostState {
            device: RwLock::new(device),
            url_base,
            description_path: DESCRIPTION_PATH.to_string(),
            spec_version,
            cache_control_max_age: config.cache_control_max_age,
            product_tokens,
            event_host,
            action_handlers: RwLock::new(HashMap::new()),
        });

        let handler = Arc::new(DispatchHandler::new(Arc::clone(&state)));
        server.serve(Arc::clone(&handler))?;

        let advertiser = Advertiser::spawn(Arc::clone(&state), local_addr)?;

        Ok(DeviceHost {
            state,
            server: Arc::new(server),
            advertiser,
        })
    }

    /// Registers the handler that executes actions for `service_id`. A service with no registered
    /// handler answers every control request with an `ActionFailed` SOAP fault.
    pub fn register_action_handler(&self, service_id: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        self.state
            .action_handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(service_id.into(), handler);
    }

    /// Updates a state variable's current value and, if it is evented, queues a GENA notification
    /// to every subscriber of `service_id` (§4.7).
    pub fn notify_state_change(&self, service_id: &str, name: &str, value: Value) -> Result<(), Error> {
        let encoded = {
            let mut device = self.state.device.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            let service = find_service_mut(&mut device, service_id)
                .ok_or_else(|| crate::error::invalid_argument(service_id, "no such service"))?;
            let state_variable = service
                .find_state_variable_mut(name)
                .ok_or_else(|| crate::error::invalid_argument(name, "no such state variable"))?;
            state_variable.set_value(value)?;
            if !state_variable.send_events {
                return Ok(());
            }
            state_variable.data_type.encode_value(state_variable.current_value())
        };
        self.state
            .event_host
            .notify_service(service_id, vec![(name.to_string(), encoded)]);
        Ok(())
    }

    /// Re-advertises the whole device tree with a fresh `CONFIGID.UPNP.ORG`, as `ssdp:update`
    /// (§4.3: used when a device's service list changes without a reboot).
    pub fn announce_reconfiguration(&self) {
        self.advertiser.announce_update();
    }

    /// The base URL this host was published under (the `LOCATION` prefix).
    pub fn url_base(&self) -> &str {
        &self.state.url_base
    }

    /// Sends `ssdp:byebye` for every advertised target, stops the advertiser, and stops accepting
    /// new HTTP connections.
    pub fn shutdown(&self) {
        self.advertiser.shutdown();
        self.server.shutdown();
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn load_scpd(service: &mut Service, base_dir: &Path) {
    let scpd_path = base_dir.join(service.scpd_url.trim_start_matches('/'));
    match fs::read_to_string(&scpd_path) {
        Ok(xml) => match parse_scpd(&xml, ParseMode::Loose) {
            Ok(parsed) => {
                service.actions = parsed.actions;
                service.state_variables = parsed.state_variables;
            }
            Err(e) => warn!("failed to parse SCPD at {:?}: {}", scpd_path, e),
        },
        Err(e) => warn!("failed to read SCPD at {:?}: {}", scpd_path, e),
    }
}

fn find_service_mut<'a>(device: &'a mut Device, service_id: &str) -> Option<&'a mut Service> {
    if let Some(s) = device.services.iter_mut().find(|s| s.service_id == service_id) {
        return Some(s);
    }
    for child in &mut device.devices {
        if let Some(s) = find_service_mut(child, service_id) {
            return Some(s);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device as ModelDevice, Service as ModelService};
    use crate::types::{udn::new_udn, ResourceKind, ResourceType};
    use pretty_assertions::assert_eq;

    fn sample_device() -> ModelDevice {
        let mut device = ModelDevice::new(
            ResourceType::new_standard(ResourceKind::Device, "Basic", 1),
            new_udn(),
            "Test Device",
            "Acme",
            "Widget",
        );
        device.services.push(ModelService::new(
            ResourceType::new_standard(ResourceKind::Service, "SwitchPower", 1),
            "urn:upnp-org:serviceId:SwitchPower",
            "/scpd.xml",
            "/control",
            "/event",
        ));
        device
    }

    #[test]
    fn find_service_mut_locates_a_top_level_service() {
        let mut device = sample_device();
        assert!(find_service_mut(&mut device, "urn:upnp-org:serviceId:SwitchPower").is_some());
        assert!(find_service_mut(&mut device, "urn:upnp-org:serviceId:Missing").is_none());
    }
}
