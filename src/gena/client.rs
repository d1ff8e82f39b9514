/*!
The control point side of GENA eventing (§4.7): sends SUBSCRIBE/RENEW/UNSUBSCRIBE, tracks each
subscription's lifecycle with [`ClientSubscription`], and feeds incoming NOTIFY sequence numbers
back into it to detect drops that force a resubscribe.
*/

use crate::error::Error;
use crate::http::{Client, Headers};
use crate::model::{ClientSubscription, ClientSubscriptionState};
use crate::syntax;
use crate::types::{Sid, Timeout};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

pub struct EventClient {
    client: Client,
    subscriptions: Mutex<HashMap<String, ClientSubscription>>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl EventClient {
    pub fn new() -> Result<Self, Error> {
        Ok(EventClient {
            client: Client::new(Duration::from_secs(30))?,
            subscriptions: Mutex::new(HashMap::new()),
        })
    }

    /// Sends an initial SUBSCRIBE to the first reachable location, trying the rest in order on
    /// connection failure, and records the granted SID/TIMEOUT on success.
    pub fn subscribe(
        &self,
        service_id: &str,
        locations: Vec<String>,
        callback_urls: &[String],
        requested_timeout: Timeout,
    ) -> Result<(), Error> {
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let subscription = subscriptions
            .entry(service_id.to_string())
            .or_insert_with(|| ClientSubscription::new(service_id, locations.clone(), requested_timeout));
        subscription.state = ClientSubscriptionState::Subscribing;

        let mut headers = Headers::new();
        headers.set(syntax::GENA_HEADER_CALLBACK, format_callback_urls(callback_urls));
        headers.set("NT", syntax::GENA_NT_EVENT);
        headers.set(syntax::GENA_HEADER_TIMEOUT, requested_timeout.to_string());

        let mut last_error = None;
        for location in &locations {
            match self.client.method(syntax::HTTP_METHOD_SUBSCRIBE, location, headers.clone(), Vec::new()) {
                Ok((status, response_headers, _)) if (200..300).contains(&status) => {
                    let (sid, timeout) = parse_subscribe_response(&response_headers)?;
                    subscription.on_subscribed(sid, timeout);
                    return Ok(());
                }
                Ok((status, _, _)) => {
                    last_error = Some(crate::error::protocol_error(status, "SUBSCRIBE rejected"));
                }
                Err(e) => last_error = Some(e),
            }
        }
        subscription.on_subscribe_failed();
        Err(last_error.unwrap_or_else(|| crate::error::protocol_error(500, "no locations available")))
    }

    /// Renews the subscription for `service_id`, using its own SID rather than `NT`/`CALLBACK`
    /// (§4.1.2: renewal headers never repeat the callback or notification type).
    pub fn renew(&self, service_id: &str, requested_timeout: Timeout) -> Result<(), Error> {
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let subscription = subscriptions
            .get_mut(service_id)
            .ok_or_else(|| crate::error::invalid_argument(service_id, "no active subscription"))?;
        let sid = subscription
            .sid
            .clone()
            .ok_or_else(|| crate::error::invalid_argument(service_id, "subscription has no SID to renew"))?;
        subscription.state = ClientSubscriptionState::Renewing;

        let mut headers = Headers::new();
        headers.set(syntax::GENA_HEADER_SID, sid.to_string());
        headers.set(syntax::GENA_HEADER_TIMEOUT, requested_timeout.to_string());

        let location = subscription
            .locations
            .first()
            .ok_or_else(|| crate::error::invalid_argument(service_id, "no known location"))?
            .clone();
        match self.client.method(syntax::HTTP_METHOD_SUBSCRIBE, &location, headers, Vec::new()) {
            Ok((status, response_headers, _)) if (200..300).contains(&status) => {
                let (_, timeout) = parse_subscribe_response(&response_headers)?;
                subscription.timeout = timeout;
                subscription.state = ClientSubscriptionState::Active;
                Ok(())
            }
            Ok((status, _, _)) => {
                warn!("RENEW rejected with status {} for '{}'", status, service_id);
                subscription.state = ClientSubscriptionState::Resubscribe;
                Err(crate::error::protocol_error(status, "RENEW rejected"))
            }
            Err(e) => {
                subscription.state = ClientSubscriptionState::Resubscribe;
                Err(e)
            }
        }
    }

    pub fn unsubscribe(&self, service_id: &str) -> Result<(), Error> {
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let subscription = match subscriptions.get_mut(service_id) {
            Some(s) => s,
            None => return Ok(()),
        };
        if let Some(sid) = subscription.sid.clone() {
            let mut headers = Headers::new();
            headers.set(syntax::GENA_HEADER_SID, sid.to_string());
            if let Some(location) = subscription.locations.first() {
                let _ = self.client.method(syntax::HTTP_METHOD_UNSUBSCRIBE, location, headers, Vec::new());
            }
        }
        subscription.unsubscribe();
        Ok(())
    }

    /// Records an incoming NOTIFY's SEQ for `service_id`. Returns `true` if it continued the
    /// expected sequence; `false` means a forced resubscribe is now pending (§4.7).
    pub fn observe_notify(&self, service_id: &str, seq: u32) -> bool {
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match subscriptions.get_mut(service_id) {
            Some(subscription) => subscription.observe_seq(seq),
            None => false,
        }
    }

    pub fn state_of(&self, service_id: &str) -> Option<ClientSubscriptionState> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(service_id)
            .map(|s| s.state)
    }

    /// The SID currently granted for `service_id`, if subscribed. Lets a control point registry
    /// build a reverse `Sid -> service_id` index for routing incoming NOTIFY requests.
    pub fn sid_for(&self, service_id: &str) -> Option<Sid> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(service_id)
            .and_then(|s| s.sid.clone())
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn format_callback_urls(urls: &[String]) -> String {
    urls.iter().map(|u| format!("<{}>", u)).collect::<Vec<_>>().join("")
}

fn parse_subscribe_response(headers: &Headers) -> Result<(Sid, Timeout), Error> {
    let sid = headers
        .get(syntax::GENA_HEADER_SID)
        .ok_or_else(|| crate::error::missing_required_field(syntax::GENA_HEADER_SID))?;
    let sid = Sid::parse(sid)?;
    let timeout = headers
        .get(syntax::GENA_HEADER_TIMEOUT)
        .ok_or_else(|| crate::error::missing_required_field(syntax::GENA_HEADER_TIMEOUT))?;
    let timeout = Timeout::parse(timeout)?;
    Ok((sid, timeout))
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_multiple_callback_urls_bracketed() {
        let urls = vec!["http://host/a".to_string(), "http://host/b".to_string()];
        assert_eq!(format_callback_urls(&urls), "<http://host/a><http://host/b>");
    }

    #[test]
    fn renew_without_a_prior_subscription_is_rejected() {
        let client = EventClient::new().unwrap();
        assert!(client.renew("urn:upnp-org:serviceId:SwitchPower", Timeout::Seconds(1800)).is_err());
    }

    #[test]
    fn unsubscribe_of_an_unknown_service_is_a_no_op() {
        let client = EventClient::new().unwrap();
        assert!(client.unsubscribe("urn:upnp-org:serviceId:SwitchPower").is_ok());
    }
}
