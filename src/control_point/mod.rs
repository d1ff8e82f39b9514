/*!
The control point half of the architecture (§4.8, §9): discovers devices over SSDP, fetches and
assembles their descriptions, and optionally subscribes to their evented services.
*/

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod build;
pub mod registry;

pub use registry::{ControlPointRegistry, DefaultDeviceObserver, DeviceObserver};
