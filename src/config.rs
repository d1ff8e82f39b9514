/*!
Process-wide configuration for a device host and a control point (§6): plain data, built by the
embedding application rather than loaded from a file format this crate defines.
*/

use crate::error::Error;
use crate::model::{Device, Service, Value};
use crate::types::{ResourceType, Timeout};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Lets an embedding application mint specialized device objects in place of the generic ones the
/// description parser builds (§9's factory contract). Given the parsed device, `make_device`
/// returns the device the host actually publishes.
pub trait DeviceFactory: Send + Sync {
    fn make_device(&self, parsed: Device) -> Device {
        parsed
    }
}

/// The service-level counterpart to [`DeviceFactory`].
pub trait ServiceFactory: Send + Sync {
    fn make_service(&self, service_type: &ResourceType, parsed: Service) -> Service {
        parsed
    }
}

/// The default factory pair: returns the parser's own objects unchanged.
#[derive(Debug, Default)]
pub struct DefaultDeviceFactory;

impl DeviceFactory for DefaultDeviceFactory {}

#[derive(Debug, Default)]
pub struct DefaultServiceFactory;

impl ServiceFactory for DefaultServiceFactory {}

/// Executes an action's business logic once argument validation and datatype decoding have
/// already happened. Invoked on a dispatch worker thread, never with a registry lock held (§5).
pub trait ActionHandler: Send + Sync {
    fn invoke(
        &self,
        service_id: &str,
        action_name: &str,
        arguments: Vec<(String, Value)>,
    ) -> Result<Vec<(String, Value)>, Error>;
}

/// One device a [`crate::host::registry::DeviceHost`] publishes (§4.8): where its description
/// lives on disk, how long a control point may cache it, and the factory used to specialize it.
#[derive(Clone)]
pub struct HostConfig {
    /// Path to the device's `<root>` description XML. Each service stub's `SCPDURL` is resolved
    /// relative to this file's parent directory when the host loads its SCPD from disk.
    pub path_to_device_description: PathBuf,
    /// `CACHE-CONTROL: max-age` granted to control points (§6); also sets the re-advertisement
    /// interval (`max_age / 2`).
    pub cache_control_max_age: u32,
    pub device_factory: Arc<dyn DeviceFactory>,
    pub service_factory: Arc<dyn ServiceFactory>,
}

impl Debug for HostConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostConfig")
            .field("path_to_device_description", &self.path_to_device_description)
            .field("cache_control_max_age", &self.cache_control_max_age)
            .finish()
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            path_to_device_description: PathBuf::new(),
            cache_control_max_age: 1800,
            device_factory: Arc::new(DefaultDeviceFactory),
            service_factory: Arc::new(DefaultServiceFactory),
        }
    }
}

impl HostConfig {
    pub fn new(path_to_device_description: impl Into<PathBuf>) -> Self {
        HostConfig {
            path_to_device_description: path_to_device_description.into(),
            ..Default::default()
        }
    }
}

/// Configuration for a control point registry (§6).
#[derive(Clone)]
pub struct ControlPointConfig {
    /// Whether to automatically SUBSCRIBE to every evented service of a discovered device.
    pub subscribe_events: bool,
    /// Requested GENA subscription timeout; the host may clamp this down, never up.
    pub desired_subscription_timeout: Timeout,
    /// Whether to send an initial `M-SEARCH` burst on startup.
    pub auto_discovery: bool,
    /// Local IPv4 addresses to bind sockets on; empty means auto-select (§4.8's interface pick).
    pub network_addresses: Vec<Ipv4Addr>,
    /// Optional hook to specialize proxy devices built from a discovered description.
    pub device_proxy_factory: Option<Arc<dyn DeviceFactory>>,
}

impl Debug for ControlPointConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPointConfig")
            .field("subscribe_events", &self.subscribe_events)
            .field("desired_subscription_timeout", &self.desired_subscription_timeout)
            .field("auto_discovery", &self.auto_discovery)
            .field("network_addresses", &self.network_addresses)
            .finish()
    }
}

impl Default for ControlPointConfig {
    fn default() -> Self {
        ControlPointConfig {
            subscribe_events: true,
            desired_subscription_timeout: Timeout::Seconds(1800),
            auto_discovery: true,
            network_addresses: Vec::new(),
            device_proxy_factory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn host_config_defaults_to_the_documented_max_age() {
        let config = HostConfig::default();
        assert_eq!(config.cache_control_max_age, 1800);
    }

    #[test]
    fn control_point_config_defaults_to_auto_discovery_and_subscriptions() {
        let config = ControlPointConfig::default();
        assert!(config.auto_discovery);
        assert!(config.subscribe_events);
        assert_eq!(config.desired_subscription_timeout, Timeout::Seconds(1800));
    }
}
