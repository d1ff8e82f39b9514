/*!
Event subscription state, both the host's view of a subscriber (§4.7) and a control point's view
of its own subscription to a remote service.
*/

use crate::types::{Sid, Timeout};
use std::collections::VecDeque;
use std::time::Instant;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// A host-side view of one subscriber: callback URLs (first-success-wins order), the lease, the
/// SEQ counter, and its pending delivery queue. The dedicated sender worker lives alongside this
/// in [`crate::gena::host::Subscriber`]; this struct holds only the state it drains.
#[derive(Debug)]
pub struct ServerSubscription {
    pub sid: Sid,
    pub service_id: String,
    pub callback_urls: Vec<String>,
    pub timeout: Timeout,
    pub expires_at: Instant,
    /// Next SEQ to send. Starts at 0 for the initial event; wraps `2^32 - 1 -> 1`, skipping 0.
    pub next_seq: u32,
    pub queue: VecDeque<Vec<(String, String)>>,
    pub failed: bool,
}

/// The client-side subscription lifecycle (§4.7's state diagram).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClientSubscriptionState {
    Unsubscribed,
    Subscribing,
    Active,
    Renewing,
    Resubscribe,
    Failed,
}

#[derive(Debug)]
pub struct ClientSubscription {
    pub service_id: String,
    pub locations: Vec<String>,
    pub sid: Option<Sid>,
    pub expected_seq: u32,
    pub timeout: Timeout,
    pub state: ClientSubscriptionState,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl ServerSubscription {
    pub fn new(sid: Sid, service_id: impl Into<String>, callback_urls: Vec<String>, timeout: Timeout) -> Self {
        ServerSubscription {
            sid,
            service_id: service_id.into(),
            callback_urls,
            expires_at: deadline_for(timeout),
            timeout,
            next_seq: 0,
            queue: VecDeque::new(),
            failed: false,
        }
    }

    /// Renewal resets the deadline but preserves SEQ and the in-flight queue.
    pub fn renew(&mut self, timeout: Timeout) {
        self.timeout = timeout;
        self.expires_at = deadline_for(timeout);
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Advances the SEQ counter, skipping the reserved value 0 on wraparound.
    pub fn next_seq_value(&mut self) -> u32 {
        let value = self.next_seq;
        self.next_seq = if self.next_seq == u32::MAX { 1 } else { self.next_seq + 1 };
        value
    }
}

impl ClientSubscription {
    pub fn new(service_id: impl Into<String>, locations: Vec<String>, timeout: Timeout) -> Self {
        ClientSubscription {
            service_id: service_id.into(),
            locations,
            sid: None,
            expected_seq: 0,
            timeout,
            state: ClientSubscriptionState::Unsubscribed,
        }
    }

    pub fn on_subscribed(&mut self, sid: Sid, timeout: Timeout) {
        self.sid = Some(sid);
        self.timeout = timeout;
        self.expected_seq = 0;
        self.state = ClientSubscriptionState::Active;
    }

    pub fn on_subscribe_failed(&mut self) {
        self.state = ClientSubscriptionState::Failed;
    }

    /// A NOTIFY arrived with the given SEQ; if it doesn't match expectation, drop the sid and
    /// demand resubscription (§4.7: "forced resubscribe").
    pub fn observe_seq(&mut self, seq: u32) -> bool {
        if seq == self.expected_seq {
            self.expected_seq = if self.expected_seq == u32::MAX { 1 } else { self.expected_seq + 1 };
            true
        } else {
            self.sid = None;
            self.state = ClientSubscriptionState::Resubscribe;
            false
        }
    }

    pub fn unsubscribe(&mut self) {
        self.sid = None;
        self.state = ClientSubscriptionState::Unsubscribed;
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn deadline_for(timeout: Timeout) -> Instant {
    match timeout {
        Timeout::Infinite => Instant::now() + std::time::Duration::from_secs(60 * 60 * 24 * 365),
        Timeout::Seconds(secs) => Instant::now() + std::time::Duration::from_secs(secs as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn seq_wraps_from_max_to_one_skipping_zero() {
        let mut sub = ServerSubscription::new(
            Sid::new(),
            "urn:upnp-org:serviceId:SwitchPower",
            vec!["http://host/cb".to_string()],
            Timeout::Seconds(1800),
        );
        sub.next_seq = u32::MAX;
        assert_eq!(sub.next_seq_value(), u32::MAX);
        assert_eq!(sub.next_seq_value(), 1);
    }

    #[test]
    fn mismatched_seq_forces_resubscribe() {
        let mut client = ClientSubscription::new(
            "urn:upnp-org:serviceId:SwitchPower",
            vec!["http://host/evt".to_string()],
            Timeout::Seconds(1800),
        );
        client.on_subscribed(Sid::new(), Timeout::Seconds(1800));
        assert!(!client.observe_seq(5));
        assert_eq!(client.state, ClientSubscriptionState::Resubscribe);
        assert!(client.sid.is_none());
    }

    #[test]
    fn matching_seq_advances_and_stays_active() {
        let mut client = ClientSubscription::new(
            "urn:upnp-org:serviceId:SwitchPower",
            vec!["http://host/evt".to_string()],
            Timeout::Seconds(1800),
        );
        client.on_subscribed(Sid::new(), Timeout::Seconds(1800));
        assert!(client.observe_seq(0));
        assert_eq!(client.expected_seq, 1);
        assert_eq!(client.state, ClientSubscriptionState::Active);
    }
}
