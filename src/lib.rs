/*!
A Universal Plug and Play (UPnP) Device Architecture 1.1 runtime.

[`host`] publishes a device description and its services' SCPDs, dispatches SOAP action calls to
application-provided handlers, advertises over SSDP, and serves GENA subscribers. [`control_point`]
discovers devices over SSDP, fetches and assembles their descriptions, and (optionally) subscribes
to their evented services. Both sides share the wire codecs in [`ssdp`], [`soap`], and [`gena`],
the object model in [`model`], and the description parser/writer in [`description`].

More Information:

* [UPnP Device Architecture 1.1](http://www.upnp.org/specs/arch/UPnP-arch-DeviceArchitecture-v1.1.pdf)

*/

#![warn(
    missing_debug_implementations,
    missing_docs,
    unused_extern_crates,
    rust_2018_idioms
)]

#[macro_use]
extern crate tracing;

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod config;
pub mod control_point;
pub mod description;
pub mod error;
pub mod gena;
pub mod host;
pub mod http;
pub mod model;
pub mod soap;
pub mod ssdp;
pub mod syntax;
pub mod types;
pub mod utils;

pub use config::{ControlPointConfig, HostConfig};
pub use control_point::ControlPointRegistry;
pub use error::Error;
pub use host::DeviceHost;
