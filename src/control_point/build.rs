/*!
Fetches a device description and its services' SCPDs over the network (§4.8, §4.4) and assembles
the [`Device`] tree a [`super::registry::ControlPointRegistry`] hands to its observer. SCPDs are
fetched through a small bounded worker pool rather than one thread per service.
*/

use crate::config::{DeviceFactory, ServiceFactory};
use crate::description::scpd::ServiceDescription;
use crate::description::{parse_device_description, parse_scpd, ParseMode};
use crate::error::{Error, MessageFormatError};
use crate::http::Client;
use crate::model::{Device, Service};
use reqwest::Url;
use std::sync::Arc;
use std::thread;

// ------------------------------------------------------------------------------------------------
// Public Values
// ------------------------------------------------------------------------------------------------

/// Bounded SCPD fetch concurrency per build task (§4.8: "concurrently, bounded by a small pool").
const SCPD_FETCH_POOL_SIZE: usize = 4;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// The result of one successful build task: the assembled tree plus the base URL every relative
/// service URL (SCPD, control, event subscription) resolves against.
pub struct BuiltDevice {
    pub device: Device,
    pub url_base: String,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

/// Joins a relative reference against a base URL the way a device description's own `URLBase` (or,
/// absent that, its `LOCATION`) is defined to: a bare filename replaces the base's final path
/// segment, exactly as an HTML `<base>` element resolves a relative link.
pub(crate) fn resolve_url(base: &str, relative: &str) -> Result<String, Error> {
    let base = Url::parse(base).map_err(|_| crate::error::invalid_field_value("url", base))?;
    let joined = base.join(relative).map_err(|_| crate::error::invalid_field_value("url", relative))?;
    Ok(joined.to_string())
}

/// Fetches `location`, parses the device description, and fetches every service's SCPD. Fails
/// the whole build atomically: a single failed fetch or parse discards the entire tree, per
/// §4.8's "on any failure the build is discarded" rule.
pub(crate) fn build_device(
    location: &str,
    client: &Client,
    device_factory: &Arc<dyn DeviceFactory>,
    service_factory: &Arc<dyn ServiceFactory>,
) -> Result<BuiltDevice, Error> {
    let (status, _headers, body) = client.get(location)?;
    if !(200..300).contains(&status) {
        return Err(crate::error::protocol_error(status, "failed to fetch device description"));
    }
    let xml = std::str::from_utf8(&body).map_err(MessageFormatError::from)?;
    let parsed = parse_device_description(xml, ParseMode::Loose)?;
    let url_base = parsed.url_base.clone().unwrap_or_else(|| location.to_string());

    let mut device = device_factory.make_device(parsed.device);
    device.walk_mut(&mut |d| {
        for service in &mut d.services {
            let replaced = service_factory.make_service(&service.service_type, service.clone());
            *service = replaced;
        }
    });

    fetch_scpds(&mut device, &url_base, client)?;

    Ok(BuiltDevice { device, url_base })
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn fetch_scpds(device: &mut Device, url_base: &str, client: &Client) -> Result<(), Error> {
    let mut services = Vec::new();
    collect_services_mut(device, &mut services);

    for chunk in services.chunks_mut(SCPD_FETCH_POOL_SIZE) {
        let results: Vec<Result<ServiceDescription, Error>> = thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|service| {
                    let url = resolve_url(url_base, &service.scpd_url);
                    scope.spawn(move || -> Result<ServiceDescription, Error> {
                        let url = url?;
                        let (status, _headers, body) = client.get(&url)?;
                        if !(200..300).contains(&status) {
                            return Err(crate::error::protocol_error(status, "failed to fetch SCPD"));
                        }
                        let xml = std::str::from_utf8(&body).map_err(MessageFormatError::from)?;
                        Ok(parse_scpd(xml, ParseMode::Loose)?)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|_| Err(crate::error::protocol_error(500, "SCPD fetch thread panicked"))))
                .collect()
        });

        for (service, result) in chunk.iter_mut().zip(results) {
            let parsed = result?;
            service.actions = parsed.actions;
            service.state_variables = parsed.state_variables;
        }
    }
    Ok(())
}

fn collect_services_mut<'a>(device: &'a mut Device, out: &mut Vec<&'a mut Service>) {
    for service in &mut device.services {
        out.push(service);
    }
    for child in &mut device.devices {
        collect_services_mut(child, out);
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
    fn resolve_url_replaces_the_final_path_segment() {
        let resolved = resolve_url("http://192.0.2.5:8080/dev.xml", "scpd.xml").unwrap();
        assert_eq!(resolved, "http://192.0.2.5:8080/scpd.xml");
    }

    #[test]
    fn resolve_url_honours_an_absolute_path() {
        let resolved = resolve_url("http://192.0.2.5:8080/dev.xml", "/scpd/power.xml").unwrap();
        assert_eq!(resolved, "http://192.0.2.5:8080/scpd/power.xml");
    }

    #[test]
    fn resolve_url_rejects_a_malformed_base() {
        assert!(resolve_url("not a url", "scpd.xml").is_err());
    }
}
