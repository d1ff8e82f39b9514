/*!
[`ControlPointRegistry`]: the SSDP-driven discovery loop (§4.8, §9). Reacts to alive/byebye/update
NOTIFYs and to its own M-SEARCH responses, runs a bounded "fetch and build" task per newly
announced root device, tracks expiry, and optionally subscribes to every evented service a
discovered device exposes. [`NotifyHandler`] is the HTTP side: the callback endpoint GENA
NOTIFYs are delivered to.
*/

use crate::config::{ControlPointConfig, DefaultDeviceFactory, DefaultServiceFactory, DeviceFactory, ServiceFactory};
use crate::control_point::build::{build_device, resolve_url};
use crate::error::Error;
use crate::gena::client::EventClient;
use crate::gena::notify::parse_notify_request;
use crate::http::client::Client;
use crate::http::server::{Handler, Server};
use crate::http::{Request, Response};
use crate::model::Device;
use crate::ssdp::message::{decode_request, decode_response};
use crate::ssdp::socket::{self, IncomingDatagram};
use crate::ssdp::{Message, SearchRequest};
use crate::syntax;
use crate::types::{DiscoveryType, Sid, SpecVersion, Udn};
use crate::utils::interface::{all_local_ipv4_addresses, default_local_ipv4};
use crate::utils::user_agent::default_product_tokens;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// ------------------------------------------------------------------------------------------------
// Public Values
// ------------------------------------------------------------------------------------------------

const NOTIFY_CALLBACK_PATH: &str = "/notify";

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Receives the lifecycle and eventing signals a registry produces (§9's "event signals to
/// observers"). Every method defaults to a no-op so a caller only overrides what it cares about.
pub trait DeviceObserver: Send + Sync {
    fn on_device_online(&self, _device: &Device) {}
    fn on_device_offline(&self, _udn: &Udn) {}
    fn on_event(&self, _service_id: &str, _properties: &[(String, String)]) {}
}

/// The default observer: ignores everything. Used when an embedding application only wants to
/// poll [`ControlPointRegistry::known_devices`] rather than react to signals.
#[derive(Debug, Default)]
pub struct DefaultDeviceObserver;

impl DeviceObserver for DefaultDeviceObserver {}

/// A running control point: one or more discovery sockets, a NOTIFY callback server, and the
/// background threads that drive discovery, expiry, and event routing until [`shutdown`] is
/// called.
///
/// [`shutdown`]: ControlPointRegistry::shutdown
pub struct ControlPointRegistry {
    state: Arc<RegistryState>,
    server: Arc<Server>,
    exiting: Arc<AtomicBool>,
}

impl Debug for ControlPointRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPointRegistry").field("state", &self.state).finish()
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

struct KnownDevice {
    device: Device,
    locations: Vec<String>,
    url_base: String,
    online: bool,
    expires_at: Instant,
}

struct RegistryState {
    config: ControlPointConfig,
    http_client: Client,
    event_client: EventClient,
    device_factory: Arc<dyn DeviceFactory>,
    service_factory: Arc<dyn ServiceFactory>,
    observer: Arc<dyn DeviceObserver>,
    devices: RwLock<HashMap<String, KnownDevice>>,
    pending_builds: Mutex<HashMap<String, Vec<String>>>,
    sid_routes: RwLock<HashMap<Sid, String>>,
    callback_url: String,
}

impl Debug for RegistryState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryState").field("callback_url", &self.callback_url).finish()
    }
}

struct NotifyHandler {
    state: Arc<RegistryState>,
}

impl Handler for NotifyHandler {
    fn handle(&self, request: &Request) -> Response {
        if !request.method.eq_ignore_ascii_case(syntax::HTTP_METHOD_NOTIFY_EVENT) {
            return Response::new(405, "Method Not Allowed");
        }
        if request.resource != NOTIFY_CALLBACK_PATH {
            return Response::new(404, "Not Found");
        }
        match parse_notify_request(request) {
            Ok((sid, seq, properties)) => {
                let service_id = self
                    .state
                    .sid_routes
                    .read()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .get(&sid)
                    .cloned();
                match service_id {
                    Some(service_id) => {
                        if self.state.event_client.observe_notify(&service_id, seq) {
                            self.state.observer.on_event(&service_id, &properties);
                            Response::new(200, "OK")
                        } else {
                            warn!("dropped out-of-sequence NOTIFY for '{}'", service_id);
                            Response::new(412, "Precondition Failed")
                        }
                    }
                    None => Response::new(412, "Precondition Failed"),
                }
            }
            Err(e) => {
                warn!("malformed NOTIFY: {}", e);
                Response::new(400, "Bad Request")
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl ControlPointRegistry {
    /// Binds the NOTIFY callback server and every discovery socket named (or implied) by
    /// `config`, then starts the discovery loop, expiry sweep, and (if `config.auto_discovery`)
    /// the initial `M-SEARCH` burst.
    pub fn new(config: ControlPointConfig, observer: Arc<dyn DeviceObserver>) -> Result<Arc<Self>, Error> {
        let local_addr = default_local_ipv4();
        let (server, bound_addr) = Server::bind(&format!("{}:0", local_addr))?;
        let callback_url = format!("http://{}{}", bound_addr, NOTIFY_CALLBACK_PATH);

        let state = Arc::new(RegistryState {
            device_factory: config.device_proxy_factory.clone().unwrap_or_else(|| Arc::new(DefaultDeviceFactory)),
            service_factory: Arc::new(DefaultServiceFactory),
            http_client: Client::new(Duration::from_secs(10))?,
            event_client: EventClient::new()?,
            observer,
            devices: RwLock::new(HashMap::new()),
            pending_builds: Mutex::new(HashMap::new()),
            sid_routes: RwLock::new(HashMap::new()),
            callback_url,
            config,
        });

        let notify_handler = Arc::new(NotifyHandler { state: Arc::clone(&state) });
        server.serve(notify_handler)?;

        let exiting = Arc::new(AtomicBool::new(false));
        let registry = Arc::new(ControlPointRegistry {
            state,
            server: Arc::new(server),
            exiting,
        });

        let addresses = if registry.state.config.network_addresses.is_empty() {
            let all = all_local_ipv4_addresses();
            if all.is_empty() {
                vec![local_addr]
            } else {
                all
            }
        } else {
            registry.state.config.network_addresses.clone()
        };

        for address in addresses {
            registry.spawn_discovery_loop(address)?;
        }
        registry.spawn_expiry_loop()?;

        Ok(registry)
    }

    /// A snapshot of every currently known root device, online or not.
    pub fn known_devices(&self) -> Vec<Device> {
        self.state
            .devices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .map(|known| known.device.clone())
            .collect()
    }

    /// Unsubscribes from every active subscription, stops accepting new HTTP connections, and
    /// stops the discovery/expiry background threads.
    pub fn shutdown(&self) {
        self.exiting.store(true, Ordering::SeqCst);
        let service_ids: Vec<String> = self
            .state
            .sid_routes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect();
        for service_id in service_ids {
            let _ = self.state.event_client.unsubscribe(&service_id);
        }
        self.server.shutdown();
    }

    // --------------------------------------------------------------------------------------------
    // Private Functions
    // --------------------------------------------------------------------------------------------

    fn spawn_discovery_loop(self: &Arc<Self>, local_addr: Ipv4Addr) -> Result<(), Error> {
        let unicast_socket = Arc::new(socket::bind_unicast(local_addr)?);
        let multicast_socket = Arc::new(socket::bind_multicast(local_addr, 4)?);

        if self.state.config.auto_discovery {
            self.send_search(&unicast_socket, DiscoveryType::RootDevice, 1);
        }

        self.spawn_listener(Arc::clone(&unicast_socket));
        self.spawn_listener(multicast_socket);
        Ok(())
    }

    fn send_search(&self, socket: &UdpSocket, st: DiscoveryType, mx: u8) {
        let request = SearchRequest {
            st,
            mx,
            user_agent: Some(default_product_tokens(SpecVersion::V11)),
        };
        if let Err(e) = socket::send_request(socket, &request.encode(), socket::multicast_addr()) {
            warn!("failed to send M-SEARCH: {}", e);
        }
    }

    fn spawn_listener(self: &Arc<Self>, socket: Arc<UdpSocket>) {
        let registry = Arc::clone(self);
        let _ = thread::Builder::new().name("upnp-cp-discovery".into()).spawn(move || {
            while !registry.exiting.load(Ordering::SeqCst) {
                match socket::recv(&socket) {
                    Ok(Some((IncomingDatagram::Request(request), _from))) => {
                        if let Ok(message) = decode_request(&request) {
                            registry.handle_message(message);
                        }
                    }
                    Ok(Some((IncomingDatagram::Response(response), _from))) => {
                        if let Ok(message) = decode_response(&response) {
                            registry.handle_message(message);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => debug!("discovery listener recv error: {}", e),
                }
            }
        });
    }

    fn spawn_expiry_loop(self: &Arc<Self>) -> Result<(), Error> {
        let registry = Arc::clone(self);
        thread::Builder::new()
            .name("upnp-cp-expiry".into())
            .spawn(move || {
                while !registry.exiting.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_secs(5));
                    if registry.exiting.load(Ordering::SeqCst) {
                        break;
                    }
                    registry.expire_stale_devices();
                }
            })?;
        Ok(())
    }

    fn expire_stale_devices(&self) {
        let expired: Vec<String> = {
            let devices = self.state.devices.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            devices
                .iter()
                .filter(|(_, known)| Instant::now() >= known.expires_at)
                .map(|(udn, _)| udn.clone())
                .collect()
        };
        for udn in expired {
            self.retire_device(&udn);
        }
    }

    fn handle_message(self: &Arc<Self>, message: Message) {
        match message {
            Message::ResourceAvailable(advert) => {
                self.handle_announce(advert.usn.udn(), vec![advert.location], advert.max_age);
            }
            Message::ResourceUpdate(update) => {
                self.handle_announce(update.usn.udn(), vec![update.location], 1800);
            }
            Message::DiscoveryResponse(response) => {
                self.handle_announce(response.usn.udn(), vec![response.location], response.max_age);
            }
            Message::ResourceUnavailable(bye) => {
                self.retire_device(&bye.usn.udn().to_string());
            }
            Message::DiscoveryRequest(_) => {}
        }
    }

    fn handle_announce(self: &Arc<Self>, udn: &Udn, locations: Vec<String>, max_age: u32) {
        if !udn.is_valid() {
            return;
        }
        let key = udn.to_string();

        {
            let mut devices = self.state.devices.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(known) = devices.get_mut(&key) {
                known.expires_at = Instant::now() + Duration::from_secs(u64::from(max_age));
                if !known.online {
                    known.online = true;
                    self.state.observer.on_device_online(&known.device);
                }
                return;
            }
        }

        let mut pending = self.state.pending_builds.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = pending.get_mut(&key) {
            for location in locations {
                if !existing.contains(&location) {
                    existing.push(location);
                }
            }
            return;
        }
        pending.insert(key.clone(), locations.clone());
        drop(pending);

        self.spawn_build_task(key, locations, max_age);
    }

    fn spawn_build_task(self: &Arc<Self>, key: String, locations: Vec<String>, max_age: u32) {
        let registry = Arc::clone(self);
        let _ = thread::Builder::new().name("upnp-cp-build".into()).spawn(move || {
            let location = match locations.first() {
                Some(l) => l.clone(),
                None => {
                    registry.drop_pending_build(&key);
                    return;
                }
            };
            match build_device(
                &location,
                &registry.state.http_client,
                &registry.state.device_factory,
                &registry.state.service_factory,
            ) {
                Ok(built) => {
                    registry.on_build_succeeded(key, built.device, locations, built.url_base, max_age);
                }
                Err(e) => {
                    warn!("build failed for location '{}': {}", location, e);
                    registry.drop_pending_build(&key);
                }
            }
        });
    }

    fn drop_pending_build(&self, key: &str) {
        self.state
            .pending_builds
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }

    fn on_build_succeeded(self: &Arc<Self>, key: String, device: Device, locations: Vec<String>, url_base: String, max_age: u32) {
        self.drop_pending_build(&key);
        if self.exiting.load(Ordering::SeqCst) {
            return;
        }

        let known = KnownDevice {
            device: device.clone(),
            locations,
            url_base: url_base.clone(),
            online: true,
            expires_at: Instant::now() + Duration::from_secs(u64::from(max_age.max(1))),
        };
        self.state
            .devices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, known);

        self.state.observer.on_device_online(&device);

        if self.state.config.subscribe_events {
            self.subscribe_to_events(&device, &url_base);
        }
    }

    fn subscribe_to_events(&self, device: &Device, url_base: &str) {
        for d in device.walk() {
            for service in d.services.iter().filter(|s| s.has_events()) {
                let event_url = match resolve_url(url_base, &service.event_sub_url) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("could not resolve event URL for '{}': {}", service.service_id, e);
                        continue;
                    }
                };
                let callback_urls = vec![self.state.callback_url.clone()];
                match self.state.event_client.subscribe(
                    &service.service_id,
                    vec![event_url],
                    &callback_urls,
                    self.state.config.desired_subscription_timeout,
                ) {
                    Ok(()) => {
                        if let Some(sid) = self.state.event_client.sid_for(&service.service_id) {
                            self.state
                                .sid_routes
                                .write()
                                .unwrap_or_else(|poisoned| poisoned.into_inner())
                                .insert(sid, service.service_id.clone());
                        }
                    }
                    Err(e) => warn!("subscribe failed for '{}': {}", service.service_id, e),
                }
            }
        }
    }

    fn retire_device(&self, key: &str) {
        let removed = self
            .state
            .devices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
        let known = match removed {
            Some(k) => k,
            None => return,
        };

        for d in known.device.walk() {
            for service in &d.services {
                let _ = self.state.event_client.unsubscribe(&service.service_id);
            }
        }
        self.state.observer.on_device_offline(&known.device.udn);
    }
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_observer_methods_are_no_ops() {
        let observer = DefaultDeviceObserver;
        let device = crate::model::Device::new(
            crate::types::ResourceType::new_standard(crate::types::ResourceKind::Device, "Basic", 1),
            crate::types::udn::new_udn(),
            "Test",
            "Acme",
            "Widget",
        );
        observer.on_device_online(&device);
        observer.on_device_offline(&device.udn);
        observer.on_event("urn:upnp-org:serviceId:SwitchPower", &[]);
    }

    #[test]
    fn control_point_config_default_matches_documented_values() {
        let config = ControlPointConfig::default();
        assert_eq!(config.desired_subscription_timeout, crate::types::Timeout::Seconds(1800));
    }
}
