/*!
The hosting side of UPnP (§4, §5, §4.7): loads a device description and its services' SCPDs from
disk, serves them and dispatches SOAP control and GENA eventing over HTTP, and advertises the
device over SSDP. A [`DeviceHost`] is the entry point; [`dispatch`] and [`advertiser`] are its
two worker halves.
*/

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod advertiser;
pub mod dispatch;
pub mod registry;

pub use registry::DeviceHost;
