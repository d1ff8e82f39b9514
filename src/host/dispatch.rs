/*!
Routes inbound HTTP requests for a hosted device (§4.4, §4.5, §4.7): `GET` serves the device and
service descriptions, `POST` dispatches a SOAP action call, and `SUBSCRIBE`/`UNSUBSCRIBE` drive
GENA eventing.
*/

use crate::description::{write_device_description, write_scpd};
use crate::error::{Error, MessageFormatError};
use crate::gena::notify::parse_callback_urls;
use crate::host::registry::HostState;
use crate::http::server::Handler;
use crate::http::{Request, Response};
use crate::soap::envelope::{decode_call, ActionResponse};
use crate::soap::fault::Fault;
use crate::syntax;
use crate::types::{Sid, Timeout};
use std::sync::Arc;
use tracing::warn;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

pub struct DispatchHandler {
    state: Arc<HostState>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Handler for DispatchHandler {
    fn handle(&self, request: &Request) -> Response {
        match self.route(request) {
            Ok(response) => response,
            Err(e) => error_response(e),
        }
    }
}

impl DispatchHandler {
    pub(crate) fn new(state: Arc<HostState>) -> Self {
        DispatchHandler { state }
    }

    fn route(&self, request: &Request) -> Result<Response, Error> {
        if request.method.eq_ignore_ascii_case("GET") {
            return self.serve_get(request);
        }
        if request.method.eq_ignore_ascii_case("POST") {
            return self.serve_control(request);
        }
        if request.method.eq_ignore_ascii_case(syntax::HTTP_METHOD_SUBSCRIBE) {
            return self.serve_subscribe(request);
        }
        if request.method.eq_ignore_ascii_case(syntax::HTTP_METHOD_UNSUBSCRIBE) {
            return self.serve_unsubscribe(request);
        }
        Ok(Response::new(405, "Method Not Allowed"))
    }

    fn serve_get(&self, request: &Request) -> Result<Response, Error> {
        let device = self.state.device.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        if request.resource == self.state.description_path {
            let mut body = Vec::new();
            write_device_description(&device, &self.state.url_base, self.state.spec_version, &mut body)
                .map_err(MessageFormatError::from)?;
            let mut response = Response::new(200, "OK");
            response.headers.set("Content-Type", "text/xml; charset=\"utf-8\"");
            response.headers.set(syntax::HTTP_HEADER_SERVER, self.state.product_tokens.to_string());
            response.body = body;
            return Ok(response);
        }
        for d in device.walk() {
            if let Some(service) = d.services.iter().find(|s| s.scpd_url == request.resource) {
                let mut body = Vec::new();
                write_scpd(service, self.state.spec_version, &mut body).map_err(MessageFormatError::from)?;
                let mut response = Response::new(200, "OK");
                response.headers.set("Content-Type", "text/xml; charset=\"utf-8\"");
                response.body = body;
                return Ok(response);
            }
        }
        Ok(Response::new(404, "Not Found"))
    }

    fn serve_control(&self, request: &Request) -> Result<Response, Error> {
        let (service_id, service_type, action, state_variables) = {
            let device = self.state.device.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            let service = device
                .walk()
                .into_iter()
                .flat_map(|d| d.services.iter())
                .find(|s| s.control_url == request.resource)
                .ok_or_else(|| crate::error::protocol_error(404, "no such control endpoint"))?;

            let soap_action = request
                .headers
                .get("SOAPACTION")
                .ok_or_else(|| crate::error::missing_required_header("SOAPACTION"))?;
            let action_name = soap_action.trim_matches('"').rsplit('#').next().unwrap_or(soap_action);

            let action = match service.find_action(action_name) {
                Some(a) => a.clone(),
                None => return Ok(fault_response(crate::soap::envelope::encode_fault(&Fault::invalid_action()))),
            };
            (
                service.service_id.clone(),
                service.service_type.to_string(),
                action,
                service.state_variables.clone(),
            )
        };

        let call = match decode_call(&request.body, &action, &state_variables) {
            Ok(c) => c,
            Err(_) => return Ok(fault_response(crate::soap::envelope::encode_fault(&Fault::invalid_args()))),
        };

        let handler = self
            .state
            .action_handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&service_id)
            .cloned();
        let handler = match handler {
            Some(h) => h,
            None => {
                return Ok(fault_response(crate::soap::envelope::encode_fault(&Fault::action_failed(
                    "no handler registered for this service",
                ))))
            }
        };

        match handler.invoke(&service_id, &action.name, call.arguments) {
            Ok(out_arguments) => {
                let response_envelope = ActionResponse {
                    service_type,
                    action_name: action.name.clone(),
                    arguments: out_arguments,
                };
                let body = response_envelope.encode(&action, &state_variables)?;
                let mut response = Response::new(200, "OK");
                response.headers.set("Content-Type", "text/xml; charset=\"utf-8\"");
                response.body = body;
                Ok(response)
            }
            Err(e) => Ok(fault_response(crate::soap::envelope::encode_fault(&Fault::action_failed(e.to_string())))),
        }
    }

    fn serve_subscribe(&self, request: &Request) -> Result<Response, Error> {
        if let Some(sid_header) = request.headers.get(syntax::GENA_HEADER_SID) {
            if request.headers.get(syntax::GENA_HEADER_CALLBACK).is_some()
                || request.headers.get(syntax::HTTP_HEADER_NT).is_some()
            {
                return Ok(Response::new(400, "Incompatible Header Fields"));
            }
            let sid = Sid::parse(sid_header)?;
            let requested = match request.headers.get(syntax::GENA_HEADER_TIMEOUT) {
                Some(v) => Timeout::parse(v)?,
                None => Timeout::Seconds(1800),
            };
            let timeout = self.state.event_host.renew(&sid, requested)?;
            let mut response = Response::new(200, "OK");
            response.headers.set(syntax::GENA_HEADER_SID, sid.to_string());
            response.headers.set(syntax::GENA_HEADER_TIMEOUT, timeout.to_string());
            return Ok(response);
        }

        let callback_header = request
            .headers
            .get(syntax::GENA_HEADER_CALLBACK)
            .ok_or_else(|| crate::error::missing_required_header(syntax::GENA_HEADER_CALLBACK))?;
        let callback_urls = parse_callback_urls(callback_header)?;
        let requested = match request.headers.get(syntax::GENA_HEADER_TIMEOUT) {
            Some(v) => Timeout::parse(v)?,
            None => Timeout::Seconds(1800),
        };

        let (service_id, initial_properties) = {
            let device = self.state.device.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            let service = device
                .walk()
                .into_iter()
                .flat_map(|d| d.services.iter())
                .find(|s| s.event_sub_url == request.resource)
                .ok_or_else(|| crate::error::protocol_error(404, "no such event endpoint"))?;
            let properties: Vec<(String, String)> = service
                .evented_state_variables()
                .map(|v| (v.name.clone(), v.data_type.encode_value(v.current_value())))
                .collect();
            (service.service_id.clone(), properties)
        };

        let (sid, timeout) = self.state.event_host.subscribe(&service_id, callback_urls, requested, initial_properties);
        let mut response = Response::new(200, "OK");
        response.headers.set(syntax::GENA_HEADER_SID, sid.to_string());
        response.headers.set(syntax::GENA_HEADER_TIMEOUT, timeout.to_string());
        response.headers.set(syntax::HTTP_HEADER_SERVER, self.state.product_tokens.to_string());
        Ok(response)
    }

    fn serve_unsubscribe(&self, request: &Request) -> Result<Response, Error> {
        let sid_header = request
            .headers
            .get(syntax::GENA_HEADER_SID)
            .ok_or_else(|| crate::error::missing_required_header(syntax::GENA_HEADER_SID))?;
        let sid = Sid::parse(sid_header)?;
        self.state.event_host.unsubscribe(&sid)?;
        Ok(Response::new(200, "OK"))
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn fault_response(body: Vec<u8>) -> Response {
    let mut response = Response::new(500, "Internal Server Error");
    response.headers.set("Content-Type", "text/xml; charset=\"utf-8\"");
    response.body = body;
    response
}

fn error_response(error: Error) -> Response {
    warn!("request failed: {}", error);
    let status = match &error {
        Error::Protocol { status, .. } => *status,
        Error::InvalidArgument { .. } | Error::MessageFormat(_) => 400,
        Error::UnsupportedOperation { .. } | Error::UnsupportedVersion { .. } => 405,
        _ => 500,
    };
    let reason = error.to_string();
    let mut response = Response::new(status, &reason);
    response.body = reason.into_bytes();
    response
}
