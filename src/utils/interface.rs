use pnet::datalink;
use std::net::{IpAddr, Ipv4Addr};

#[derive(Clone, Debug)]
#[allow(dead_code)]
pub enum IP {
    V4,
    V6,
}

/// Default local-interface selection policy for a device host (§4.8): the first "up",
/// non-loopback IPv4 address found, falling back to loopback if nothing else is available.
pub fn default_local_ipv4() -> Ipv4Addr {
    for interface in datalink::interfaces() {
        if !interface.is_up() || interface.is_loopback() {
            continue;
        }
        for ip in &interface.ips {
            if let IpAddr::V4(addr) = ip.ip() {
                return addr;
            }
        }
    }
    Ipv4Addr::LOCALHOST
}

/// Every "up" IPv4 address across every non-loopback interface, used when advertising on all
/// enabled interfaces (§4.3).
pub fn all_local_ipv4_addresses() -> Vec<Ipv4Addr> {
    let mut addresses = Vec::new();
    for interface in datalink::interfaces() {
        if !interface.is_up() || interface.is_loopback() {
            continue;
        }
        for ip in &interface.ips {
            if let IpAddr::V4(addr) = ip.ip() {
                addresses.push(addr);
            }
        }
    }
    addresses
}

pub fn ip_address_for_interface(
    network_interface: &Option<String>,
    network_version: &Option<IP>,
) -> Option<IpAddr> {
    match network_interface {
        None => None,
        Some(name) => {
            let addresses = ip_addresses_for_interface(name.clone(), network_version.clone());
            if addresses.is_empty() {
                None
            } else {
                let address = addresses.first().unwrap();
                Some(*address)
            }
        }
    }
}

pub fn ip_addresses_for_interface(interface: String, version: Option<IP>) -> Vec<IpAddr> {
    let interfaces = datalink::interfaces();
    match &interfaces.into_iter().find(|ni| ni.name == interface) {
        None => Vec::new(),
        Some(ni) => ni
            .ips
            .iter()
            .filter_map(|ip| match version {
                None => Some(ip.ip()),
                Some(IP::V4) => {
                    if ip.is_ipv4() {
                        Some(ip.ip())
                    } else {
                        None
                    }
                }
                Some(IP::V6) => {
                    if ip.is_ipv6() {
                        Some(ip.ip())
                    } else {
                        None
                    }
                }
            })
            .collect(),
    }
}
