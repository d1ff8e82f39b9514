/*!
One-shot HTTP client calls: GET for description/SCPD/icon fetches, POST for SOAP action
invocation, SUBSCRIBE/UNSUBSCRIBE for GENA. Built on `reqwest::blocking`, since every caller in
this crate either already holds a worker thread (the bounded pools described in §5) or is willing
to block one.
*/

use crate::error::Error;
use crate::http::headers::Headers;
use reqwest::blocking::{Client as ReqwestClient, Response as ReqwestResponse};
use reqwest::Method;
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct Client {
    inner: ReqwestClient,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Client {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let inner = ReqwestClient::builder().timeout(timeout).build()?;
        Ok(Client { inner })
    }

    pub fn get(&self, url: &str) -> Result<(u16, Headers, Vec<u8>), Error> {
        self.call(Method::GET, url, Headers::new(), Vec::new())
    }

    pub fn post(&self, url: &str, headers: Headers, body: Vec<u8>) -> Result<(u16, Headers, Vec<u8>), Error> {
        self.call(Method::POST, url, headers, body)
    }

    pub fn method(
        &self,
        method: &str,
        url: &str,
        headers: Headers,
        body: Vec<u8>,
    ) -> Result<(u16, Headers, Vec<u8>), Error> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| crate::error::invalid_field_value("method", method))?;
        self.call(method, url, headers, body)
    }

    fn call(
        &self,
        method: Method,
        url: &str,
        headers: Headers,
        body: Vec<u8>,
    ) -> Result<(u16, Headers, Vec<u8>), Error> {
        let mut request = self.inner.request(method, url);
        for (name, value) in headers.iter() {
            request = request.header(name.as_str(), value.as_str());
        }
        if !body.is_empty() {
            request = request.body(body);
        }
        let response: ReqwestResponse = request.send()?;
        let status = response.status().as_u16();
        let mut out_headers = Headers::new();
        for (name, value) in response.headers().iter() {
            if let Ok(value) = value.to_str() {
                out_headers.set(name.as_str(), value);
            }
        }
        let body = response.bytes()?.to_vec();
        Ok((status, out_headers, body))
    }
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_can_be_constructed_with_a_timeout() {
        assert!(Client::new(Duration::from_secs(5)).is_ok());
    }
}
