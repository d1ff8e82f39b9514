/*!
The two sockets an SSDP endpoint needs (§4.3): a multicast listener bound to `0.0.0.0:1900`
joined to `239.255.255.250`, and a per-interface unicast socket used both to send searches and
advertisements and to receive their replies. The unicast socket tries port 1900 first, then
scans `49152..65535` until a bind succeeds.
*/

use crate::error::Error;
use crate::http::message::{Request, Response};
use crate::syntax;
use std::io::{BufReader, Cursor};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// Public Values
// ------------------------------------------------------------------------------------------------

pub const SSDP_PORT: u16 = 1900;
pub const UNICAST_PORT_RANGE: std::ops::Range<u16> = 49152..65535;

/// §6: "Maximum message size 1472 bytes... datagrams exceeding this are dropped with a warning."
pub const MAX_DATAGRAM_SIZE: usize = 1472;

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

/// Binds the shared multicast listener socket and joins the SSDP group on `local_addr`.
pub fn bind_multicast(local_addr: Ipv4Addr, ttl: u32) -> Result<UdpSocket, Error> {
    let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, SSDP_PORT))?;
    socket.join_multicast_v4(&multicast_group(), &local_addr)?;
    socket.set_multicast_ttl_v4(ttl)?;
    socket.set_read_timeout(Some(Duration::from_secs(1)))?;
    Ok(socket)
}

/// Binds a per-interface unicast socket: port 1900 first, then `49152..65535` (§4.3).
pub fn bind_unicast(local_addr: Ipv4Addr) -> Result<UdpSocket, Error> {
    if let Ok(socket) = UdpSocket::bind(SocketAddrV4::new(local_addr, SSDP_PORT)) {
        return Ok(socket);
    }
    for port in UNICAST_PORT_RANGE {
        if let Ok(socket) = UdpSocket::bind(SocketAddrV4::new(local_addr, port)) {
            return Ok(socket);
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AddrInUse,
        "exhausted unicast SSDP port range",
    )
    .into())
}

pub fn multicast_group() -> Ipv4Addr {
    Ipv4Addr::new(239, 255, 255, 250)
}

pub fn multicast_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(multicast_group(), SSDP_PORT))
}

/// Sends an encoded NOTIFY/M-SEARCH request datagram. Drops (with a warning) and returns
/// successfully rather than erroring if the encoded message exceeds [`MAX_DATAGRAM_SIZE`], since
/// an oversized outbound message is a caller bug, not a transport failure to retry.
pub fn send_request(socket: &UdpSocket, request: &Request, to: SocketAddr) -> Result<(), Error> {
    let encoded = request.encode(usize::MAX, usize::MAX)?;
    if encoded.len() > MAX_DATAGRAM_SIZE {
        warn!(
            "dropping oversized SSDP datagram ({} bytes > {})",
            encoded.len(),
            MAX_DATAGRAM_SIZE
        );
        return Ok(());
    }
    socket.send_to(&encoded, to)?;
    Ok(())
}

pub fn send_response(socket: &UdpSocket, response: &Response, to: SocketAddr) -> Result<(), Error> {
    let encoded = response.encode(usize::MAX, usize::MAX)?;
    if encoded.len() > MAX_DATAGRAM_SIZE {
        warn!("dropping oversized SSDP response datagram ({} bytes)", encoded.len());
        return Ok(());
    }
    socket.send_to(&encoded, to)?;
    Ok(())
}

/// Reads one datagram and parses it as either a request (NOTIFY/M-SEARCH) or a response
/// (200 OK), distinguishing by the first token on the start line.
pub fn recv(socket: &UdpSocket) -> Result<Option<(IncomingDatagram, SocketAddr)>, Error> {
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    match socket.recv_from(&mut buf) {
        Ok((len, from)) => {
            let datagram = parse_datagram(&buf[..len])?;
            Ok(Some((datagram, from)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub enum IncomingDatagram {
    Request(Request),
    Response(Response),
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn parse_datagram(bytes: &[u8]) -> Result<IncomingDatagram, Error> {
    let is_response = bytes.starts_with(format!("{}/", syntax::HTTP_PROTOCOL_NAME).as_bytes());
    let mut reader = BufReader::new(Cursor::new(bytes));
    if is_response {
        Response::read_from(&mut reader).map(IncomingDatagram::Response)
    } else {
        Request::read_from(&mut reader).map(IncomingDatagram::Request)
    }
}
