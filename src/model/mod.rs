/*!
The in-memory object model shared by a device host and a control point: device and service trees,
actions and their arguments, state variables and their datatypes, and subscriptions.

Devices are modelled as an owned tree (§9: "no back-pointers, no shared ownership across the
parent/child edge"). A [`crate::host::registry::DeviceHost`] or
[`crate::control_point::registry::ControlPointRegistry`] indexes these trees by [`crate::types::Udn`]
and hands out lookups; nothing in this module reaches "up" towards a parent.
*/

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod action;
pub mod datatype;
pub mod device;
pub mod service;
pub mod state_variable;
pub mod subscription;

pub use action::{Action, Argument, Direction};
pub use datatype::{DataType, Value};
pub use device::{Device, Icon};
pub use service::Service;
pub use state_variable::{AllowedValue, StateVariable};
pub use subscription::{ClientSubscription, ClientSubscriptionState, ServerSubscription};
