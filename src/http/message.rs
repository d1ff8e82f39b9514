/*!
HTTP/1.1 request and response messages: parsing off the wire (header block + the three body
framing rules from §4.2) and encoding back onto it.
*/

use crate::error::{invalid_field_value, missing_required_field, Error, MessageFormatError};
use crate::http::chunked;
use crate::http::headers::Headers;
use crate::syntax;
use std::io::BufRead;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Request {
    pub method: String,
    pub resource: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Request {
    pub fn new<S1, S2>(method: S1, resource: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Request {
            method: method.into(),
            resource: resource.into(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Reads and parses a request off the wire: request line, headers, then a body framed per
    /// §4.2's three rules (chunked, content-length, or read-to-close — the last never applies on
    /// a request so its absence here means an empty body).
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self, Error> {
        let mut request_line = String::new();
        reader.read_line(&mut request_line)?;
        let mut parts = request_line.trim().splitn(3, ' ');
        let method = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing_required_field("method"))?
            .to_string();
        let resource = parts
            .next()
            .unwrap_or(syntax::HTTP_MATCH_ANY_RESOURCE)
            .to_string();

        let headers = read_headers(reader)?;
        let body = read_body(reader, &headers)?;

        Ok(Request {
            method,
            resource,
            headers,
            body,
        })
    }

    pub fn encode(&self, chunk_threshold: usize, max_chunk_size: usize) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        out.extend_from_slice(
            format!(
                "{} {} {}/{}\r\n",
                self.method,
                self.resource,
                syntax::HTTP_PROTOCOL_NAME,
                syntax::HTTP_PROTOCOL_VERSION
            )
            .as_bytes(),
        );
        write_body_framed(&mut out, &mut self.headers.clone(), &self.body, chunk_threshold, max_chunk_size)?;
        Ok(out)
    }
}

impl Response {
    pub fn new(status: u16, reason: &str) -> Self {
        Response {
            status,
            reason: reason.to_string(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self, Error> {
        let mut status_line = String::new();
        reader.read_line(&mut status_line)?;
        let mut parts = status_line.trim().splitn(3, ' ');
        let _protocol_version = parts
            .next()
            .ok_or_else(|| missing_required_field("status-line"))?;
        let status: u16 = parts
            .next()
            .ok_or_else(|| missing_required_field("status-code"))?
            .parse()
            .map_err(|_| invalid_field_value("status-code", &status_line))?;
        let reason = parts.next().unwrap_or("").trim().to_string();

        let headers = read_headers(reader)?;
        let body = read_body(reader, &headers)?;

        Ok(Response {
            status,
            reason,
            headers,
            body,
        })
    }

    pub fn encode(&self, chunk_threshold: usize, max_chunk_size: usize) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        out.extend_from_slice(
            format!(
                "{}/{} {} {}\r\n",
                syntax::HTTP_PROTOCOL_NAME,
                syntax::HTTP_PROTOCOL_VERSION,
                self.status,
                self.reason
            )
            .as_bytes(),
        );
        write_body_framed(&mut out, &mut self.headers.clone(), &self.body, chunk_threshold, max_chunk_size)?;
        Ok(out)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn read_headers<R: BufRead>(reader: &mut R) -> Result<Headers, Error> {
    let mut headers = Headers::new();
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line)?;
        if n == 0 || line.trim().is_empty() {
            break;
        }
        headers
            .parse_line(line.trim_end())
            .map_err(Error::MessageFormat)?;
    }
    Ok(headers)
}

fn read_body<R: BufRead>(reader: &mut R, headers: &Headers) -> Result<Vec<u8>, Error> {
    if headers
        .get("Transfer-Encoding")
        .map(|v| v.eq_ignore_ascii_case("chunked"))
        .unwrap_or(false)
    {
        return chunked::read_chunked(reader);
    }
    if let Some(len) = headers.get("Content-Length") {
        let len: usize = len
            .parse()
            .map_err(|_| MessageFormatError::from(invalid_field_value("Content-Length", len)))?;
        let mut body = vec![0u8; len];
        std::io::Read::read_exact(reader, &mut body)?;
        return Ok(body);
    }
    // Neither framing header present: read until the peer closes the connection.
    let mut body = Vec::new();
    std::io::Read::read_to_end(reader, &mut body)?;
    Ok(body)
}

fn write_body_framed(
    out: &mut Vec<u8>,
    headers: &mut Headers,
    body: &[u8],
    chunk_threshold: usize,
    max_chunk_size: usize,
) -> Result<(), Error> {
    headers.remove("Transfer-Encoding");
    headers.remove("Content-Length");
    let chunked = body.len() >= chunk_threshold;
    if chunked {
        headers.set("Transfer-Encoding", "chunked");
    } else {
        headers.set("Content-Length", body.len().to_string());
    }
    for (name, value) in headers.iter() {
        out.extend_from_slice(format!("{}{} {}\r\n", name, syntax::HTTP_HEADER_SEP, value).as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    if chunked {
        chunked::write_chunked(out, body, max_chunk_size)?;
    } else {
        out.extend_from_slice(body);
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_simple_request_with_content_length() {
        let mut req = Request::new("NOTIFY", "*");
        req.headers.set("HOST", "239.255.255.250:1900");
        req.body = b"hello".to_vec();
        let encoded = req.encode(1024 * 1024, 4096).unwrap();

        let mut reader = Cursor::new(encoded);
        let parsed = Request::read_from(&mut reader).unwrap();
        assert_eq!(parsed.method, "NOTIFY");
        assert_eq!(parsed.resource, "*");
        assert_eq!(parsed.body, b"hello");
        assert_eq!(parsed.headers.get("Content-Length"), Some("5"));
    }

    #[test]
    fn switches_to_chunked_past_threshold() {
        let mut req = Request::new("POST", "/ctl");
        req.body = vec![b'x'; 10];
        let encoded = req.encode(5, 4).unwrap();
        let mut reader = Cursor::new(encoded);
        let parsed = Request::read_from(&mut reader).unwrap();
        assert_eq!(parsed.body, vec![b'x'; 10]);
        assert!(!parsed.headers.contains("Content-Length"));
    }

    #[test]
    fn parses_a_response_status_line() {
        let data = b"HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age=1800\r\n\r\n".to_vec();
        let mut reader = Cursor::new(data);
        let resp = Response::read_from(&mut reader).unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.is_success());
    }
}
