/*!
Simple Service Discovery Protocol: the multicast/unicast sockets devices and control points use
to advertise themselves and to search for each other, plus the message codec in [`message`].

# Specification

This implements UDA 1.1 §1, Discovery. A device multicasts alive/byebye/update NOTIFYs to
239.255.255.250:1900 as it joins, leaves, or reconfigures the network; a control point multicasts
an M-SEARCH to the same group and collects unicast 200 OK responses. Every discovery message
carries a `USN` identifying the device or service and enough of a `ResourceType`/`DiscoveryType`
to let the receiver filter on what it's interested in.

When a device is removed from the network, it revokes its earlier announcements with byebye.
When its configuration changes (a service added/removed) it announces an update carrying a fresh
`BOOTID.UPNP.ORG`/`NEXTBOOTID.UPNP.ORG` pair rather than a byebye/alive pair, per §4.3.
*/

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod message;
pub mod socket;

pub use message::{Advertisement, Message, Revocation, SearchRequest, SearchResponse, Update};
