/*!
Client-side action invocation (§4.5): posts a SOAP call to a service's control URL, serializing
concurrent calls to the same service behind a per-`serviceId` lock, rotating through a device's
alternate locations on connection failure, and offering synchronous, blocking-wait, and
fire-and-forget/callback entry points over the same machinery.
*/

use crate::error::Error;
use crate::http::{Client, Headers};
use crate::model::{Action, StateVariable, Value};
use crate::soap::envelope::{decode_response, ActionCall, Envelope};
use crate::soap::fault::Fault;
use crate::syntax;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// The default action invocation timeout (§4.5): 30 seconds, used when a caller does not override
/// it with [`Invoker::with_timeout`].
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// A pending invocation started with [`Invoker::begin_invoke`]. Dropping it without calling
/// [`InvokeHandle::wait`] abandons the result; the worker thread still runs to completion.
pub struct InvokeHandle {
    receiver: Receiver<Result<Vec<(String, Value)>, Error>>,
}

/// Serializes and dispatches SOAP action calls. One `Invoker` is shared by every control point
/// service proxy; it holds a lock per `serviceId` so that two actions on the same service never
/// race on the wire, while actions against different services proceed concurrently.
pub struct Invoker {
    client: Arc<Client>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Invoker {
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_INVOKE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        Ok(Invoker {
            client: Arc::new(Client::new(timeout)?),
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Invokes `action` on `service_id` and blocks until the response (or fault) arrives.
    ///
    /// `locations` lists the control URL to try, then the URLs of any alternate locations for the
    /// same device (e.g. a second network interface); they are tried in order, and only a
    /// connection-level failure (not a fault response) advances to the next one. Exhausting every
    /// location without a single successful exchange surfaces the last transport error.
    pub fn invoke(
        &self,
        service_id: &str,
        service_type: &str,
        locations: &[String],
        action: &Action,
        state_variables: &[StateVariable],
        arguments: Vec<(String, Value)>,
    ) -> Result<Vec<(String, Value)>, Error> {
        action.check_in_arguments(&arguments)?;
        let lock = self.service_lock(service_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let call = ActionCall {
            service_type: service_type.to_string(),
            action_name: action.name.clone(),
            arguments,
        };
        let body = call.encode(action, state_variables)?;

        let mut last_error = None;
        for location in locations {
            match self.post_once(location, service_type, &action.name, &body) {
                Ok(response_body) => {
                    return match decode_response(&response_body, action, state_variables)? {
                        Envelope::Response(response) => Ok(response.arguments),
                        Envelope::Fault(fault) => Err(fault_to_error(fault)),
                        Envelope::Call(_) => Err(crate::error::protocol_error(500, "unexpected call envelope in response")),
                    };
                }
                Err(e) => {
                    warn!("invocation of '{}' at '{}' failed: {}", action.name, location, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| crate::error::protocol_error(500, "no locations available")))
    }

    /// Starts `invoke` on a worker thread and returns immediately with a handle the caller can
    /// poll or block on later (§4.5's asynchronous invocation model).
    pub fn begin_invoke(
        self: &Arc<Self>,
        service_id: String,
        service_type: String,
        locations: Vec<String>,
        action: Arc<Action>,
        state_variables: Arc<Vec<StateVariable>>,
        arguments: Vec<(String, Value)>,
    ) -> InvokeHandle {
        let (sender, receiver) = channel();
        let invoker = Arc::clone(self);
        thread::spawn(move || {
            let result = invoker.invoke(&service_id, &service_type, &locations, &action, &state_variables, arguments);
            let _ = sender.send(result);
        });
        InvokeHandle { receiver }
    }

    /// Fire-and-forget: starts the invocation and hands the result to `on_complete` from the
    /// worker thread once it finishes. The caller never sees a handle and cannot wait on it.
    pub fn begin_invoke_with_callback<F>(
        self: &Arc<Self>,
        service_id: String,
        service_type: String,
        locations: Vec<String>,
        action: Arc<Action>,
        state_variables: Arc<Vec<StateVariable>>,
        arguments: Vec<(String, Value)>,
        on_complete: F,
    ) where
        F: FnOnce(Result<Vec<(String, Value)>, Error>) + Send + 'static,
    {
        let invoker = Arc::clone(self);
        thread::spawn(move || {
            let result = invoker.invoke(&service_id, &service_type, &locations, &action, &state_variables, arguments);
            on_complete(result);
        });
    }

    fn post_once(&self, location: &str, service_type: &str, action_name: &str, body: &[u8]) -> Result<Vec<u8>, Error> {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/xml; charset=\"utf-8\"");
        headers.set(
            String::from_utf8_lossy(syntax::SOAP_HTTP_HEADER_ACTION).to_string(),
            format!("\"{}#{}\"", service_type, action_name),
        );
        let (status, _, response_body) = self.client.post(location, headers, body.to_vec())?;
        if status == 500 {
            debug!("soap fault received from '{}'", location);
            return Ok(response_body);
        }
        if status >= 400 {
            return Err(crate::error::protocol_error(status, "SOAP control request rejected"));
        }
        Ok(response_body)
    }

    fn service_lock(&self, service_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(service_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl InvokeHandle {
    /// Blocks until the invocation completes.
    pub fn wait(self) -> Result<Vec<(String, Value)>, Error> {
        self.receiver.recv().unwrap_or(Err(Error::ShutdownInProgress))
    }

    /// Blocks for at most `timeout`; returns `None` if the invocation has not yet completed.
    pub fn wait_timeout(self, timeout: Duration) -> Option<Result<Vec<(String, Value)>, Error>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(Error::ShutdownInProgress)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn fault_to_error(fault: Fault) -> Error {
    crate::error::protocol_error(fault.code.code(), fault.description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Argument, Direction, StateVariable};
    use crate::model::datatype::DataType;

    #[test]
    fn invoker_rejects_missing_in_argument_before_any_network_call() {
        let invoker = Invoker::new().unwrap();
        let action = Action::new("SetTarget", vec![Argument::new("NewTargetValue", Direction::In, "Target")]);
        let state_variables = vec![StateVariable::new("Target", DataType::Boolean, false)];
        let err = invoker.invoke(
            "urn:upnp-org:serviceId:SwitchPower",
            "urn:schemas-upnp-org:service:SwitchPower:1",
            &[],
            &action,
            &state_variables,
            vec![],
        );
        assert!(err.is_err());
    }

    #[test]
    fn invoker_exhausts_locations_and_surfaces_the_last_error() {
        let invoker = Invoker::new().unwrap();
        let action = Action::new("GetTarget", vec![Argument::new_return_value("RetTargetValue", "Target")]);
        let state_variables = vec![StateVariable::new("Target", DataType::Boolean, false)];
        let err = invoker.invoke(
            "urn:upnp-org:serviceId:SwitchPower",
            "urn:schemas-upnp-org:service:SwitchPower:1",
            &["http://127.0.0.1:1/control".to_string()],
            &action,
            &state_variables,
            vec![],
        );
        assert!(err.is_err());
    }
}
