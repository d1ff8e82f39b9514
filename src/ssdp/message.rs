/*!
Encoders and decoders for the five SSDP message shapes named in §4.3: `ResourceAvailable`
(alive), `ResourceUnavailable` (byebye), `ResourceUpdate`, `DiscoveryRequest` (M-SEARCH), and
`DiscoveryResponse` (200 OK). Alive/byebye/update ride as `NOTIFY * HTTP/1.1` requests,
M-SEARCH as `M-SEARCH * HTTP/1.1`, and the search response as a plain `HTTP/1.1 200 OK`.
*/

use crate::error::{invalid_header_value, missing_required_header, Error, MessageFormatError};
use crate::http::headers::{check_parsed_value, check_regex, check_required, Headers};
use crate::http::message::{Request, Response};
use crate::syntax;
use crate::types::discovery_type::DiscoveryType;
use crate::types::product_tokens::ProductTokens;
use crate::types::usn::Usn;
use lazy_static::lazy_static;
use regex::Regex;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Advertisement {
    pub usn: Usn,
    pub nt: DiscoveryType,
    pub location: String,
    pub max_age: u32,
    pub server: ProductTokens,
    pub boot_id: u32,
    pub config_id: u32,
}

#[derive(Clone, Debug)]
pub struct Revocation {
    pub usn: Usn,
    pub nt: DiscoveryType,
    pub boot_id: u32,
    pub config_id: u32,
}

#[derive(Clone, Debug)]
pub struct Update {
    pub usn: Usn,
    pub nt: DiscoveryType,
    pub location: String,
    pub boot_id: u32,
    pub config_id: u32,
    pub next_boot_id: u32,
}

#[derive(Clone, Debug)]
pub struct SearchRequest {
    pub st: DiscoveryType,
    /// Clamped to `[1, 5]` on send; rejected on receive if outside that range (§4.3).
    pub mx: u8,
    pub user_agent: Option<ProductTokens>,
}

#[derive(Clone, Debug)]
pub struct SearchResponse {
    pub usn: Usn,
    pub st: DiscoveryType,
    pub location: String,
    pub max_age: u32,
    pub server: ProductTokens,
    pub date: String,
    pub boot_id: u32,
    pub config_id: u32,
}

#[derive(Clone, Debug)]
pub enum Message {
    ResourceAvailable(Advertisement),
    ResourceUnavailable(Revocation),
    ResourceUpdate(Update),
    DiscoveryRequest(SearchRequest),
    DiscoveryResponse(SearchResponse),
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Advertisement {
    pub fn encode(&self) -> Request {
        let mut request = Request::new(syntax::HTTP_METHOD_NOTIFY, syntax::HTTP_MATCH_ANY_RESOURCE);
        let headers = &mut request.headers;
        headers.set(syntax::HTTP_HEADER_HOST, syntax::MULTICAST_ADDRESS);
        headers.set(
            syntax::HTTP_HEADER_CACHE_CONTROL,
            format!("max-age={}", self.max_age.clamp(60, 86400)),
        );
        headers.set(syntax::HTTP_HEADER_LOCATION, &self.location);
        headers.set(syntax::HTTP_HEADER_NT, self.nt.to_string());
        headers.set(syntax::HTTP_HEADER_NTS, syntax::NTS_ALIVE);
        headers.set(syntax::HTTP_HEADER_SERVER, self.server.to_string());
        headers.set(syntax::HTTP_HEADER_USN, self.usn.to_string());
        headers.set(syntax::HTTP_HEADER_BOOTID, self.boot_id.to_string());
        headers.set(syntax::HTTP_HEADER_CONFIGID, self.config_id.to_string());
        request
    }
}

impl Revocation {
    pub fn encode(&self) -> Request {
        let mut request = Request::new(syntax::HTTP_METHOD_NOTIFY, syntax::HTTP_MATCH_ANY_RESOURCE);
        let headers = &mut request.headers;
        headers.set(syntax::HTTP_HEADER_HOST, syntax::MULTICAST_ADDRESS);
        headers.set(syntax::HTTP_HEADER_NT, self.nt.to_string());
        headers.set(syntax::HTTP_HEADER_NTS, syntax::NTS_BYE);
        headers.set(syntax::HTTP_HEADER_USN, self.usn.to_string());
        headers.set(syntax::HTTP_HEADER_BOOTID, self.boot_id.to_string());
        headers.set(syntax::HTTP_HEADER_CONFIGID, self.config_id.to_string());
        request
    }
}

impl Update {
    pub fn encode(&self) -> Request {
        let mut request = Request::new(syntax::HTTP_METHOD_NOTIFY, syntax::HTTP_MATCH_ANY_RESOURCE);
        let headers = &mut request.headers;
        headers.set(syntax::HTTP_HEADER_HOST, syntax::MULTICAST_ADDRESS);
        headers.set(syntax::HTTP_HEADER_LOCATION, &self.location);
        headers.set(syntax::HTTP_HEADER_NT, self.nt.to_string());
        headers.set(syntax::HTTP_HEADER_NTS, syntax::NTS_UPDATE);
        headers.set(syntax::HTTP_HEADER_USN, self.usn.to_string());
        headers.set(syntax::HTTP_HEADER_BOOTID, self.boot_id.to_string());
        headers.set(syntax::HTTP_HEADER_CONFIGID, self.config_id.to_string());
        headers.set(syntax::HTTP_HEADER_NEXT_BOOTID, self.next_boot_id.to_string());
        request
    }
}

impl SearchRequest {
    pub fn encode(&self) -> Request {
        let mut request = Request::new(syntax::HTTP_METHOD_SEARCH, syntax::HTTP_MATCH_ANY_RESOURCE);
        let headers = &mut request.headers;
        headers.set(syntax::HTTP_HEADER_HOST, syntax::MULTICAST_ADDRESS);
        headers.set(syntax::HTTP_HEADER_MAN, syntax::HTTP_EXTENSION);
        headers.set(syntax::HTTP_HEADER_MX, self.mx.clamp(1, 5).to_string());
        headers.set(syntax::HTTP_HEADER_ST, self.st.to_string());
        if let Some(ua) = &self.user_agent {
            headers.set(syntax::HTTP_HEADER_USER_AGENT, ua.to_string());
        }
        request
    }
}

impl SearchResponse {
    pub fn encode(&self) -> Response {
        let mut response = Response::new(200, "OK");
        let headers = &mut response.headers;
        headers.set(
            syntax::HTTP_HEADER_CACHE_CONTROL,
            format!("max-age={}", self.max_age.clamp(60, 86400)),
        );
        headers.set(syntax::HTTP_HEADER_DATE, &self.date);
        headers.set(syntax::HTTP_HEADER_EXT, "");
        headers.set(syntax::HTTP_HEADER_LOCATION, &self.location);
        headers.set(syntax::HTTP_HEADER_SERVER, self.server.to_string());
        headers.set(syntax::HTTP_HEADER_ST, self.st.to_string());
        headers.set(syntax::HTTP_HEADER_USN, self.usn.to_string());
        headers.set(syntax::HTTP_HEADER_BOOTID, self.boot_id.to_string());
        headers.set(syntax::HTTP_HEADER_CONFIGID, self.config_id.to_string());
        response
    }
}

/// Decodes an incoming `NOTIFY`/`M-SEARCH` request into a [`Message`].
pub fn decode_request(request: &Request) -> Result<Message, Error> {
    if request.method.eq_ignore_ascii_case(syntax::HTTP_METHOD_SEARCH) {
        return decode_search_request(&request.headers).map(Message::DiscoveryRequest);
    }
    if request.method.eq_ignore_ascii_case(syntax::HTTP_METHOD_NOTIFY) {
        let nts = required(&request.headers, syntax::HTTP_HEADER_NTS)?;
        return match nts.as_str() {
            syntax::NTS_ALIVE => decode_advertisement(&request.headers).map(Message::ResourceAvailable),
            syntax::NTS_BYE => decode_revocation(&request.headers).map(Message::ResourceUnavailable),
            syntax::NTS_UPDATE => decode_update(&request.headers).map(Message::ResourceUpdate),
            other => Err(invalid_header_value(syntax::HTTP_HEADER_NTS, other).into()),
        };
    }
    Err(crate::error::unsupported_operation(request.method.clone()))
}

/// Decodes a `200 OK` search response into a [`Message::DiscoveryResponse`].
pub fn decode_response(response: &Response) -> Result<Message, Error> {
    if response.status != 200 {
        return Err(crate::error::protocol_error(response.status, response.reason.clone()));
    }
    let headers = &response.headers;
    check_required(
        headers,
        &[
            syntax::HTTP_HEADER_CACHE_CONTROL,
            syntax::HTTP_HEADER_DATE,
            syntax::HTTP_HEADER_EXT,
            syntax::HTTP_HEADER_LOCATION,
            syntax::HTTP_HEADER_SERVER,
            syntax::HTTP_HEADER_ST,
            syntax::HTTP_HEADER_USN,
        ],
    )?;
    let max_age = max_age_from(headers, syntax::HTTP_HEADER_CACHE_CONTROL)?;
    let server = ProductTokens::parse(&required(headers, syntax::HTTP_HEADER_SERVER)?)?;
    let st = DiscoveryType::parse(&required(headers, syntax::HTTP_HEADER_ST)?)?;
    let usn = Usn::parse(&required(headers, syntax::HTTP_HEADER_USN)?)?;
    let boot_id = optional_u32(headers, syntax::HTTP_HEADER_BOOTID)?;
    let config_id = optional_u32(headers, syntax::HTTP_HEADER_CONFIGID)?;
    Ok(Message::DiscoveryResponse(SearchResponse {
        usn,
        st,
        location: required(headers, syntax::HTTP_HEADER_LOCATION)?,
        max_age,
        server,
        date: required(headers, syntax::HTTP_HEADER_DATE)?,
        boot_id,
        config_id,
    }))
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn required(headers: &Headers, name: &str) -> Result<String, MessageFormatError> {
    headers
        .get(name)
        .map(|s| s.to_string())
        .ok_or_else(|| missing_required_header(name))
}

fn optional_u32(headers: &Headers, name: &str) -> Result<u32, MessageFormatError> {
    match headers.get(name) {
        Some(v) => check_parsed_value(v, name),
        None => Ok(0),
    }
}

fn max_age_from(headers: &Headers, name: &str) -> Result<u32, MessageFormatError> {
    lazy_static! {
        static ref MAX_AGE: Regex = Regex::new(r"max-age\s*=\s*(\d+)").unwrap();
    }
    let value = required(headers, name)?;
    check_parsed_value(&check_regex(&value, name, &MAX_AGE)?, name)
}

fn decode_advertisement(headers: &Headers) -> Result<Advertisement, Error> {
    check_required(
        headers,
        &[
            syntax::HTTP_HEADER_CACHE_CONTROL,
            syntax::HTTP_HEADER_LOCATION,
            syntax::HTTP_HEADER_NT,
            syntax::HTTP_HEADER_SERVER,
            syntax::HTTP_HEADER_USN,
        ],
    )?;
    Ok(Advertisement {
        usn: Usn::parse(&required(headers, syntax::HTTP_HEADER_USN)?)?,
        nt: DiscoveryType::parse(&required(headers, syntax::HTTP_HEADER_NT)?)?,
        location: required(headers, syntax::HTTP_HEADER_LOCATION)?,
        max_age: max_age_from(headers, syntax::HTTP_HEADER_CACHE_CONTROL)?,
        server: ProductTokens::parse(&required(headers, syntax::HTTP_HEADER_SERVER)?)?,
        boot_id: optional_u32(headers, syntax::HTTP_HEADER_BOOTID)?,
        config_id: optional_u32(headers, syntax::HTTP_HEADER_CONFIGID)?,
    })
}

fn decode_revocation(headers: &Headers) -> Result<Revocation, Error> {
    check_required(headers, &[syntax::HTTP_HEADER_NT, syntax::HTTP_HEADER_USN])?;
    Ok(Revocation {
        usn: Usn::parse(&required(headers, syntax::HTTP_HEADER_USN)?)?,
        nt: DiscoveryType::parse(&required(headers, syntax::HTTP_HEADER_NT)?)?,
        boot_id: optional_u32(headers, syntax::HTTP_HEADER_BOOTID)?,
        config_id: optional_u32(headers, syntax::HTTP_HEADER_CONFIGID)?,
    })
}

fn decode_update(headers: &Headers) -> Result<Update, Error> {
    check_required(
        headers,
        &[
            syntax::HTTP_HEADER_LOCATION,
            syntax::HTTP_HEADER_NT,
            syntax::HTTP_HEADER_USN,
        ],
    )?;
    Ok(Update {
        usn: Usn::parse(&required(headers, syntax::HTTP_HEADER_USN)?)?,
        nt: DiscoveryType::parse(&required(headers, syntax::HTTP_HEADER_NT)?)?,
        location: required(headers, syntax::HTTP_HEADER_LOCATION)?,
        boot_id: optional_u32(headers, syntax::HTTP_HEADER_BOOTID)?,
        config_id: optional_u32(headers, syntax::HTTP_HEADER_CONFIGID)?,
        next_boot_id: optional_u32(headers, syntax::HTTP_HEADER_NEXT_BOOTID)?,
    })
}

fn decode_search_request(headers: &Headers) -> Result<SearchRequest, Error> {
    check_required(headers, &[syntax::HTTP_HEADER_MAN, syntax::HTTP_HEADER_MX, syntax::HTTP_HEADER_ST])?;
    let man = required(headers, syntax::HTTP_HEADER_MAN)?;
    if man != syntax::HTTP_EXTENSION {
        return Err(invalid_header_value(syntax::HTTP_HEADER_MAN, man).into());
    }
    let mx: u8 = check_parsed_value(&required(headers, syntax::HTTP_HEADER_MX)?, syntax::HTTP_HEADER_MX)?;
    if mx < 1 {
        return Err(invalid_header_value(syntax::HTTP_HEADER_MX, mx.to_string()).into());
    }
    let st = DiscoveryType::parse(&required(headers, syntax::HTTP_HEADER_ST)?)?;
    let user_agent = match headers.get(syntax::HTTP_HEADER_USER_AGENT) {
        Some(ua) => Some(ProductTokens::parse(ua)?),
        None => None,
    };
    Ok(SearchRequest {
        st,
        mx: mx.min(5),
        user_agent,
    })
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::discovery_type::DiscoveryType;
    use crate::types::udn::parse_udn;
    use crate::types::SpecVersion;
    use pretty_assertions::assert_eq;

    fn sample_usn() -> Usn {
        Usn::new_with(
            parse_udn("uuid:5d724fc2-5c5e-4760-a123-f04a9136b300"),
            DiscoveryType::RootDevice,
        )
    }

    fn sample_server() -> ProductTokens {
        ProductTokens::new("unix", "5.1", SpecVersion::V11, "upnp-rs", "0.3")
    }

    #[test]
    fn round_trips_an_advertisement_through_request_decode() {
        let advert = Advertisement {
            usn: sample_usn(),
            nt: DiscoveryType::RootDevice,
            location: "http://192.0.2.5:8080/dev.xml".to_string(),
            max_age: 1800,
            server: sample_server(),
            boot_id: 7,
            config_id: 1,
        };
        let request = advert.encode();
        match decode_request(&request).unwrap() {
            Message::ResourceAvailable(decoded) => {
                assert_eq!(decoded.usn, advert.usn);
                assert_eq!(decoded.max_age, 1800);
                assert_eq!(decoded.boot_id, 7);
            }
            _ => panic!("expected ResourceAvailable"),
        }
    }

    #[test]
    fn round_trips_a_byebye() {
        let bye = Revocation {
            usn: sample_usn(),
            nt: DiscoveryType::RootDevice,
            boot_id: 7,
            config_id: 1,
        };
        let request = bye.encode();
        match decode_request(&request).unwrap() {
            Message::ResourceUnavailable(decoded) => assert_eq!(decoded.usn, bye.usn),
            _ => panic!("expected ResourceUnavailable"),
        }
    }

    #[test]
    fn search_request_mx_is_clamped_to_five() {
        let search = SearchRequest {
            st: DiscoveryType::All,
            mx: 30,
            user_agent: None,
        };
        let request = search.encode();
        assert_eq!(request.headers.get(syntax::HTTP_HEADER_MX), Some("5"));
    }

    #[test]
    fn rejects_man_header_without_quotes() {
        let mut headers = Headers::new();
        headers.set(syntax::HTTP_HEADER_MAN, "ssdp:discover");
        headers.set(syntax::HTTP_HEADER_MX, "2");
        headers.set(syntax::HTTP_HEADER_ST, "ssdp:all");
        assert!(decode_search_request(&headers).is_err());
    }
}
