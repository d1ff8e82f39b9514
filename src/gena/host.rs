/*!
The host side of GENA eventing (§4.7): accepts SUBSCRIBE/RENEW/UNSUBSCRIBE for a service, keeps
one [`ServerSubscription`] per subscriber, and runs a dedicated worker thread per subscriber that
drains its delivery queue in order, trying callback URLs first-success-wins.
*/

use crate::error::Error;
use crate::gena::notify::{encode_propertyset, notify_headers};
use crate::http::Client;
use crate::model::ServerSubscription;
use crate::types::{Sid, Timeout};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use tracing::{debug, warn};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// A subscriber's lease plus the worker thread that delivers its events. Events are pushed into
/// [`ServerSubscription::queue`] under the shared lock and a wakeup is sent down `wake`; the
/// worker drains the queue on its own thread, one batch at a time, in order.
pub struct Subscriber {
    subscription: Arc<Mutex<ServerSubscription>>,
    wake: Sender<()>,
}

/// Registry of active subscriptions across every evented service a host exposes. One per
/// [`crate::host::registry::DeviceHost`].
pub struct EventHost {
    client: Arc<Client>,
    subscribers: RwLock<HashMap<String, Arc<Subscriber>>>,
    max_timeout_seconds: u32,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl EventHost {
    pub fn new(max_timeout_seconds: u32) -> Result<Self, Error> {
        Ok(EventHost {
            client: Arc::new(Client::new(std::time::Duration::from_secs(5))?),
            subscribers: RwLock::new(HashMap::new()),
            max_timeout_seconds,
        })
    }

    /// Registers a new subscriber and immediately queues the initial event carrying every evented
    /// state variable's current value at SEQ 0 (§4.7).
    pub fn subscribe(
        &self,
        service_id: &str,
        callback_urls: Vec<String>,
        requested_timeout: Timeout,
        initial_properties: Vec<(String, String)>,
    ) -> (Sid, Timeout) {
        let timeout = requested_timeout.clamp(self.max_timeout_seconds);
        let sid = Sid::new();
        let subscription = ServerSubscription::new(sid.clone(), service_id, callback_urls, timeout);
        let subscriber = Subscriber::spawn(Arc::clone(&self.client), subscription);
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(sid.to_string(), Arc::new(subscriber));
        self.notify_one(&sid, initial_properties);
        (sid, timeout)
    }

    pub fn renew(&self, sid: &Sid, requested_timeout: Timeout) -> Result<Timeout, Error> {
        let subscriber = self.find(sid)?;
        let timeout = requested_timeout.clamp(self.max_timeout_seconds);
        subscriber
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .renew(timeout);
        Ok(timeout)
    }

    pub fn unsubscribe(&self, sid: &Sid) -> Result<(), Error> {
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&sid.to_string())
            .map(|_| ())
            .ok_or_else(|| crate::error::protocol_error(412, "no such subscription"))
    }

    /// Queues `properties` for delivery to every subscriber of `service_id` (a state variable
    /// change notification, as opposed to the initial post-subscribe event).
    pub fn notify_service(&self, service_id: &str, properties: Vec<(String, String)>) {
        let subscribers = self.subscribers.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        for subscriber in subscribers.values() {
            let matches = subscriber
                .subscription
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .service_id
                == service_id;
            if matches {
                subscriber.enqueue(properties.clone());
            }
        }
    }

    /// Drops every subscription past its lease deadline (§4.7: a publisher is not required to
    /// notify a subscriber that its subscription has expired).
    pub fn expire_stale(&self) {
        let mut subscribers = self.subscribers.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|_, s| {
            !s.subscription
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .is_expired()
        });
    }

    fn notify_one(&self, sid: &Sid, properties: Vec<(String, String)>) {
        if let Ok(subscriber) = self.find(sid) {
            subscriber.enqueue(properties);
        }
    }

    fn find(&self, sid: &Sid) -> Result<Arc<Subscriber>, Error> {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&sid.to_string())
            .cloned()
            .ok_or_else(|| crate::error::protocol_error(412, "no such subscription"))
    }
}

impl Subscriber {
    fn spawn(client: Arc<Client>, subscription: ServerSubscription) -> Self {
        let subscription = Arc::new(Mutex::new(subscription));
        let (wake, wake_rx) = channel::<()>();
        let worker_subscription = Arc::clone(&subscription);
        thread::spawn(move || {
            for () in wake_rx {
                while let Some((sid, seq, callback_urls, batch)) = pop_next(&worker_subscription) {
                    deliver(&client, &sid, seq, &callback_urls, &batch, &worker_subscription);
                }
            }
        });
        Subscriber { subscription, wake }
    }

    fn enqueue(&self, properties: Vec<(String, String)>) {
        {
            let mut subscription = self.subscription.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            subscription.queue.push_back(properties);
        }
        let _ = self.wake.send(());
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

type NextDelivery = (Sid, u32, Vec<String>, Vec<(String, String)>);

fn pop_next(subscription: &Arc<Mutex<ServerSubscription>>) -> Option<NextDelivery> {
    let mut subscription = subscription.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let batch = subscription.queue.pop_front()?;
    let seq = subscription.next_seq_value();
    Some((subscription.sid.clone(), seq, subscription.callback_urls.clone(), batch))
}

/// Tries each callback URL in order until one accepts the NOTIFY; marks the subscription failed
/// (a future GENA tick may drop it) only once every URL has been tried without success.
fn deliver(
    client: &Client,
    sid: &Sid,
    seq: u32,
    callback_urls: &[String],
    properties: &[(String, String)],
    subscription: &Arc<Mutex<ServerSubscription>>,
) {
    let headers = notify_headers(sid, seq);
    let body = encode_propertyset(properties);
    for url in callback_urls {
        match client.method("NOTIFY", url, headers.clone(), body.clone()) {
            Ok((status, _, _)) if (200..300).contains(&status) => {
                debug!("delivered event seq {} for '{}' to '{}'", seq, sid, url);
                return;
            }
            Ok((status, _, _)) => {
                warn!("callback '{}' rejected event seq {} with status {}", url, seq, status);
            }
            Err(e) => {
                warn!("callback '{}' unreachable for event seq {}: {}", url, seq, e);
            }
        }
    }
    subscription
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .failed = true;
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn subscribing_grants_a_clamped_timeout_and_a_fresh_sid() {
        let host = EventHost::new(1800).unwrap();
        let (sid, timeout) =
            host.subscribe("urn:upnp-org:serviceId:SwitchPower", vec!["http://127.0.0.1:1/cb".to_string()], Timeout::Seconds(9000), vec![]);
        assert_eq!(timeout, Timeout::Seconds(1800));
        assert!(host.renew(&sid, Timeout::Seconds(100)).is_ok());
    }

    #[test]
    fn unsubscribe_of_unknown_sid_is_rejected() {
        let host = EventHost::new(1800).unwrap();
        assert!(host.unsubscribe(&Sid::new()).is_err());
    }
}
