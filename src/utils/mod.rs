/*!
Small helpers shared across layers: local network interface discovery, the element-tree XML
reader/writer used by the description and SOAP/GENA codecs, and the default `SERVER`/`USER-AGENT`
token builder.
*/

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod interface;
pub mod user_agent;
pub mod xml;
