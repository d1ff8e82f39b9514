/*!
The HTTP/1.1 subset shared by SSDP's unicast responses, SOAP action invocation, and GENA
SUBSCRIBE/NOTIFY: header parsing, chunked transfer coding, request/response framing, a blocking
client, and a small keep-alive server.
*/

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod chunked;
pub mod client;
pub mod headers;
pub mod message;
pub mod server;

pub use client::Client;
pub use headers::Headers;
pub use message::{Request, Response};
pub use server::{Handler, Server};
