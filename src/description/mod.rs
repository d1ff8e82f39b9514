/*!
Device and service descriptions: the XML documents a device host serves and a control point
fetches (§4.4). [`parser`] ingests a `<root>` device description, [`scpd`] ingests a service's
`<scpd>` action and state table, and [`writer`] serializes a [`crate::model::Device`] tree back
into both forms.
*/

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Strict parsing rejects the edge cases UDA 1.1 leaves ambiguous (an empty but present
/// `presentationURL`, a numeric range missing its bounds); loose parsing fills in the documented
/// defaults instead of failing (§4.4).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseMode {
    Strict,
    Loose,
}

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------

pub mod parser;
pub mod scpd;
pub mod writer;

pub use parser::parse_device_description;
pub use scpd::parse_scpd;
pub use writer::{write_device_description, write_scpd};
