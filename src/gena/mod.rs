/*!
GENA eventing (§4.7): the host-side subscriber registry and delivery workers, the control-point
subscription state machine, and the `<e:propertyset>` wire format shared by both.
*/

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod client;
pub mod host;
pub mod notify;

pub use client::EventClient;
pub use host::EventHost;
pub use notify::{decode_propertyset, encode_propertyset, parse_callback_urls, parse_notify_request};
