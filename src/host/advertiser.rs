/*!
Advertises a hosted device over SSDP (§4.3): a startup `ssdp:alive` burst, periodic repeats at
`max-age / 2`, a `ssdp:update` on reconfiguration, `ssdp:byebye` on shutdown, and unicast replies
to matching `M-SEARCH` requests.

Every device in the tree — root and embedded alike — is advertised as three targets
(`upnp:rootdevice`, its bare UUID, and its device type) plus one target per service it directly
exposes. UDA 1.1 reserves the `upnp:rootdevice` notification for the true root; this host sends it
for embedded devices too, trading a few redundant multicast datagrams for one advertisement path
instead of two.
*/

use crate::error::Error;
use crate::host::registry::HostState;
use crate::model::Device;
use crate::ssdp::socket::{self, IncomingDatagram};
use crate::ssdp::{Advertisement, Message, Revocation, SearchRequest, SearchResponse, Update};
use crate::types::{DiscoveryType, MatchMode, Udn, Usn};
use chrono::Utc;
use rand::Rng;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

pub struct Advertiser {
    state: Arc<HostState>,
    unicast_socket: Arc<UdpSocket>,
    exiting: Arc<AtomicBool>,
    boot_id: u32,
    config_id: AtomicU32,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Advertiser {
    pub(crate) fn spawn(state: Arc<HostState>, local_addr: Ipv4Addr) -> Result<Arc<Self>, Error> {
        let unicast_socket = Arc::new(socket::bind_unicast(local_addr)?);
        let multicast_socket = Arc::new(socket::bind_multicast(local_addr, 4)?);
        let boot_id = rand::thread_rng().gen::<u32>() & 0x7fff_ffff;

        let advertiser = Arc::new(Advertiser {
            state,
            unicast_socket,
            exiting: Arc::new(AtomicBool::new(false)),
            boot_id,
            config_id: AtomicU32::new(1),
        });

        advertiser.send_alive_burst();
        advertiser.spawn_announce_loop()?;
        advertiser.spawn_search_listener(multicast_socket)?;

        Ok(advertiser)
    }

    /// Bumps `CONFIGID.UPNP.ORG` and sends `ssdp:update` for every advertised target (§4.3).
    pub(crate) fn announce_update(&self) {
        self.config_id.fetch_add(1, Ordering::SeqCst);
        let config_id = self.config_id.load(Ordering::SeqCst);
        let device = self.state.device.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        for target in collect_targets(&device) {
            let update = Update {
                usn: target.usn,
                nt: target.nt,
                location: self.location(),
                boot_id: self.boot_id,
                config_id,
                next_boot_id: self.boot_id,
            };
            self.send(update.encode());
        }
    }

    /// Sends `ssdp:byebye` for every target and stops the background threads.
    pub(crate) fn shutdown(&self) {
        self.exiting.store(true, Ordering::SeqCst);
        let device = self.state.device.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let config_id = self.config_id.load(Ordering::SeqCst);
        for target in collect_targets(&device) {
            let bye = Revocation {
                usn: target.usn,
                nt: target.nt,
                boot_id: self.boot_id,
                config_id,
            };
            self.send(bye.encode());
        }
    }

    // --------------------------------------------------------------------------------------------
    // Private Functions
    // --------------------------------------------------------------------------------------------

    fn location(&self) -> String {
        format!("{}{}", self.state.url_base, self.state.description_path.trim_start_matches('/'))
    }

    fn send(&self, request: crate::http::Request) {
        if let Err(e) = socket::send_request(&self.unicast_socket, &request, socket::multicast_addr()) {
            warn!("failed to send SSDP datagram: {}", e);
        }
    }

    fn send_alive_burst(self: &Arc<Self>) {
        let device = self.state.device.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let config_id = self.config_id.load(Ordering::SeqCst);
        for target in collect_targets(&device) {
            let advert = Advertisement {
                usn: target.usn,
                nt: target.nt,
                location: self.location(),
                max_age: self.state.cache_control_max_age,
                server: self.state.product_tokens.clone(),
                boot_id: self.boot_id,
                config_id,
            };
            self.send(advert.encode());
        }
    }

    fn spawn_announce_loop(self: &Arc<Self>) -> Result<(), Error> {
        let advertiser = Arc::clone(self);
        let interval = Duration::from_secs(u64::from(advertiser.state.cache_control_max_age / 2).max(30));
        thread::Builder::new()
            .name("upnp-ssdp-announce".into())
            .spawn(move || {
                while !advertiser.exiting.load(Ordering::SeqCst) {
                    thread::sleep(interval);
                    if advertiser.exiting.load(Ordering::SeqCst) {
                        break;
                    }
                    advertiser.send_alive_burst();
                }
            })?;
        Ok(())
    }

    fn spawn_search_listener(self: &Arc<Self>, multicast_socket: Arc<UdpSocket>) -> Result<(), Error> {
        let advertiser = Arc::clone(self);
        thread::Builder::new()
            .name("upnp-ssdp-search".into())
            .spawn(move || {
                while !advertiser.exiting.load(Ordering::SeqCst) {
                    match socket::recv(&multicast_socket) {
                        Ok(Some((IncomingDatagram::Request(request), from))) => {
                            if let Ok(Message::DiscoveryRequest(search)) = crate::ssdp::message::decode_request(&request) {
                                advertiser.respond_to_search(search, from);
                            }
                        }
                        Ok(_) => {}
                        Err(e) => debug!("search listener recv error: {}", e),
                    }
                }
            })?;
        Ok(())
    }

    fn respond_to_search(self: &Arc<Self>, search: SearchRequest, from: SocketAddr) {
        let advertiser = Arc::clone(self);
        thread::spawn(move || {
            let delay_ms = rand::thread_rng().gen_range(0..=u64::from(search.mx) * 1000);
            thread::sleep(Duration::from_millis(delay_ms));
            let device = advertiser.state.device.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            let config_id = advertiser.config_id.load(Ordering::SeqCst);
            for target in collect_targets(&device) {
                if !matches_search(&target, &search.st) {
                    continue;
                }
                let response = SearchResponse {
                    usn: target.usn,
                    st: target.nt.clone(),
                    location: advertiser.location(),
                    max_age: advertiser.state.cache_control_max_age,
                    server: advertiser.state.product_tokens.clone(),
                    date: Utc::now().to_rfc2822(),
                    boot_id: advertiser.boot_id,
                    config_id,
                };
                if let Err(e) = socket::send_response(&advertiser.unicast_socket, &response.encode(), from) {
                    warn!("failed to send search response: {}", e);
                }
            }
        });
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

struct Target {
    nt: DiscoveryType,
    usn: Usn,
    is_root: bool,
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn collect_targets(device: &Device) -> Vec<Target> {
    let mut out = Vec::new();
    for (index, d) in device.walk().into_iter().enumerate() {
        let is_root = index == 0;
        out.push(Target {
            nt: DiscoveryType::RootDevice,
            usn: Usn::new_with(d.udn.clone(), DiscoveryType::RootDevice),
            is_root,
        });
        out.push(Target {
            nt: DiscoveryType::Device(d.udn.clone()),
            usn: Usn::new(d.udn.clone()),
            is_root,
        });
        out.push(Target {
            nt: DiscoveryType::Type(d.device_type.clone()),
            usn: Usn::new_with(d.udn.clone(), DiscoveryType::Type(d.device_type.clone())),
            is_root,
        });
        for service in &d.services {
            out.push(Target {
                nt: DiscoveryType::Type(service.service_type.clone()),
                usn: Usn::new_with(d.udn.clone(), DiscoveryType::Type(service.service_type.clone())),
                is_root,
            });
        }
    }
    out
}

fn matches_search(target: &Target, filter: &DiscoveryType) -> bool {
    match filter {
        DiscoveryType::All => true,
        DiscoveryType::RootDevice => target.is_root && matches!(target.nt, DiscoveryType::RootDevice),
        DiscoveryType::Device(udn) => udn_matches(&target.nt, udn),
        DiscoveryType::Type(rt) => matches!(&target.nt, DiscoveryType::Type(t) if t.compare(rt, MatchMode::Inclusive)),
    }
}

fn udn_matches(nt: &DiscoveryType, filter_udn: &Udn) -> bool {
    matches!(nt, DiscoveryType::Device(d) if d == filter_udn)
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
    fn collects_three_targets_per_device_plus_one_per_service() {
        let device = sample_device();
        let targets = collect_targets(&device);
        assert_eq!(targets.len(), 4);
    }

    #[test]
    fn all_filter_matches_every_target() {
        let device = sample_device();
        for target in collect_targets(&device) {
            assert!(matches_search(&target, &DiscoveryType::All));
        }
    }

    #[test]
    fn root_device_filter_only_matches_the_root_target() {
        let device = sample_device();
        let matches: Vec<_> = collect_targets(&device)
            .into_iter()
            .filter(|t| matches_search(t, &DiscoveryType::RootDevice))
            .collect();
        assert_eq!(matches.len(), 1);
    }
}
