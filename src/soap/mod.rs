/*!
SOAP 1.1 action invocation (§4.5, §4.6): encoding/decoding the envelope a control point posts to
a service's control URL and the response (or fault) it gets back, plus the client-side invocation
engine with its per-service serialization lock and location rotation on connection failure.
*/

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod envelope;
pub mod fault;
pub mod invoke;

pub use envelope::{ActionCall, ActionResponse, Envelope};
pub use fault::{Fault, UpnpErrorCode};
pub use invoke::{InvokeHandle, Invoker, DEFAULT_INVOKE_TIMEOUT};
