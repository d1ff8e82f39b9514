/*!
GENA event messages (§4.7): the `<e:propertyset>` body carried by a NOTIFY, and the HTTP framing
(`NT`, `NTS`, `SID`, `SEQ` headers) around it.
*/

use crate::error::{invalid_header_value, missing_required_header, Error};
use crate::http::headers::{check_parsed_value, check_regex};
use crate::http::{Headers, Request};
use crate::syntax;
use crate::types::Sid;
use crate::utils::xml::{read_element_tree, start, start_element_with, text_element};
use lazy_static::lazy_static;
use quick_xml::Writer;
use regex::Regex;

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

/// Encodes a set of already-canonicalized `(name, value)` state variable changes as a GENA
/// `<e:propertyset>` body.
pub fn encode_propertyset(properties: &[(String, String)]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut xml = Writer::new(&mut buf);
    start(&mut xml).ok();
    if let Ok(set) = start_element_with(
        &mut xml,
        syntax::XML_ELEM_PROPERTYSET,
        vec![("xmlns:e", syntax::XML_NS_EVENT)],
    ) {
        for (name, value) in properties {
            if let Ok(property) = start_element_with(&mut xml, syntax::XML_ELEM_PROPERTY, vec![]) {
                let _ = text_element(&mut xml, name.as_str(), value.as_bytes());
                let _ = property.end(&mut xml);
            }
        }
        let _ = set.end(&mut xml);
    }
    buf
}

pub fn decode_propertyset(body: &[u8]) -> Result<Vec<(String, String)>, Error> {
    let text =
        std::str::from_utf8(body).map_err(|e| crate::error::invalid_field_value("body", e.to_string()))?;
    let root = read_element_tree(text).map_err(crate::error::xml_error)?;
    let mut properties = Vec::new();
    for property in &root.children {
        for value in &property.children {
            properties.push((value.name.clone(), value.text.clone()));
        }
    }
    Ok(properties)
}

/// The headers carried by one NOTIFY event message: `NT`, `NTS`, `SID`, `SEQ`. `seq` is `0` for
/// the very first event after a subscription, incrementing thereafter.
pub fn notify_headers(sid: &Sid, seq: u32) -> Headers {
    let mut headers = Headers::new();
    headers.set("NT", syntax::GENA_NT_EVENT);
    headers.set("NTS", syntax::GENA_NTS_PROPCHANGE);
    headers.set(syntax::GENA_HEADER_SID, sid.to_string());
    headers.set(syntax::GENA_HEADER_SEQ, seq.to_string());
    headers.set("Content-Type", "text/xml; charset=\"utf-8\"");
    headers
}

/// Builds the full NOTIFY request for one event message, addressed to a single subscriber
/// callback URL. Used by the server-side test harness; the live delivery path in
/// [`crate::gena::host`] posts [`notify_headers`] and [`encode_propertyset`] directly through the
/// blocking HTTP client instead of framing a [`Request`].
pub fn build_notify_request(callback_resource: &str, sid: &Sid, seq: u32, properties: &[(String, String)]) -> Request {
    let mut request = Request::new(syntax::HTTP_METHOD_NOTIFY_EVENT, callback_resource);
    request.headers = notify_headers(sid, seq);
    request.body = encode_propertyset(properties);
    request
}

/// Validates and extracts the GENA fields from an incoming NOTIFY request (the control point side
/// of event delivery).
pub fn parse_notify_request(request: &Request) -> Result<(Sid, u32, Vec<(String, String)>), Error> {
    let nt = request
        .headers
        .get("NT")
        .ok_or_else(|| missing_required_header("NT"))?;
    if nt != syntax::GENA_NT_EVENT {
        return Err(invalid_header_value("NT", nt).into());
    }
    let nts = request
        .headers
        .get("NTS")
        .ok_or_else(|| missing_required_header("NTS"))?;
    if nts != syntax::GENA_NTS_PROPCHANGE {
        return Err(invalid_header_value("NTS", nts).into());
    }
    let sid_header = request
        .headers
        .get(syntax::GENA_HEADER_SID)
        .ok_or_else(|| missing_required_header(syntax::GENA_HEADER_SID))?;
    let sid = Sid::parse(sid_header)?;
    let seq_header = request
        .headers
        .get(syntax::GENA_HEADER_SEQ)
        .ok_or_else(|| missing_required_header(syntax::GENA_HEADER_SEQ))?;
    let seq: u32 = check_parsed_value(seq_header, syntax::GENA_HEADER_SEQ)?;
    let properties = decode_propertyset(&request.body)?;
    Ok((sid, seq, properties))
}

lazy_static! {
    static ref CALLBACK_URL_RE: Regex = Regex::new(r"<([^>]+)>").unwrap();
}

/// Extracts every `<url>` from a `CALLBACK: <url1><url2>...` header value, in the order given
/// (§4.1.1: the subscriber's preference order).
pub fn parse_callback_urls(header_value: &str) -> Result<Vec<String>, Error> {
    let urls: Vec<String> = CALLBACK_URL_RE
        .captures_iter(header_value)
        .map(|c| c[1].to_string())
        .collect();
    if urls.is_empty() {
        return Err(invalid_header_value(syntax::GENA_HEADER_CALLBACK, header_value).into());
    }
    Ok(urls)
}

/// Regex-checked extraction kept for parity with the header helpers used elsewhere in the stack.
pub fn first_callback_url(header_value: &str) -> Result<String, Error> {
    check_regex(header_value, syntax::GENA_HEADER_CALLBACK, &CALLBACK_URL_RE).map_err(Error::from)
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_a_propertyset() {
        let properties = vec![("Status".to_string(), "1".to_string()), ("Target".to_string(), "0".to_string())];
        let encoded = encode_propertyset(&properties);
        let decoded = decode_propertyset(&encoded).unwrap();
        assert_eq!(decoded, properties);
    }

    #[test]
    fn builds_and_parses_a_notify_request() {
        let sid = Sid::new();
        let request = build_notify_request("/events/abc", &sid, 0, &[("Status".to_string(), "1".to_string())]);
        let (parsed_sid, seq, properties) = parse_notify_request(&request).unwrap();
        assert_eq!(parsed_sid, sid);
        assert_eq!(seq, 0);
        assert_eq!(properties, vec![("Status".to_string(), "1".to_string())]);
    }

    #[test]
    fn parses_multiple_callback_urls_in_order() {
        let urls = parse_callback_urls("<http://host/a><http://host/b>").unwrap();
        assert_eq!(urls, vec!["http://host/a".to_string(), "http://host/b".to_string()]);
    }
}
