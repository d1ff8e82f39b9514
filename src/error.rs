/*!
A common error type shared by every layer of the stack: the SSDP codec, the HTTP/1.1 subset,
the description parser, SOAP invocation, and the GENA event subscription engine.

Errors are grouped the way the design's error-handling section describes: parse errors,
transport errors, invalid-argument errors, protocol errors (which carry a wire status code),
and a dedicated shutdown-in-progress error that every blocking primitive returns once the
owning registry has started tearing down.
*/

use quick_xml::Error as XMLError;
use reqwest::Error as HTTPError;
use std::fmt::Display;
use std::io::Error as IOError;
use std::str::Utf8Error;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// This provides a common error type across the stack.
///
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    NetworkTransport(#[from] IOError),

    #[error(transparent)]
    Messaging(#[from] HTTPError),

    #[error(transparent)]
    MessageFormat(#[from] MessageFormatError),

    /// A caller-supplied value was invalid without reference to any particular wire message,
    /// e.g. an out-of-range state variable value or an empty UDN. Never alters registry state.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// The peer (or this process, replying to a peer) reported a protocol-level failure that
    /// carries a wire status code the caller needs: 412 Precondition Failed, 400 Incompatible
    /// Header Fields, 501 Action Failed, and the UPnP SOAP fault codes.
    #[error("protocol error {status}: {reason}")]
    Protocol { status: u16, reason: String },

    /// The owning registry has begun shutdown; every blocking primitive polls this and returns
    /// promptly. Callers must propagate this without retrying.
    #[error("operation abandoned, shutdown in progress")]
    ShutdownInProgress,

    #[error("An operation you attempted returned an error status `{status}` (Operation: `{operation}`)")]
    OperationFailed { operation: String, status: String },

    #[error("The version supplied is valid, but not supported (Version: `{version}`)")]
    UnsupportedVersion { version: String },

    #[error("An operation you attempted is not supported (Operation: `{operation}`)")]
    UnsupportedOperation { operation: String },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueSource {
    Socket,
    Header,
    Field,
    Xml,
}

#[derive(Debug, Error)]
pub enum MessageFormatError {
    #[error(transparent)]
    XmlFormat(#[from] XMLError),

    #[error(transparent)]
    SourceEncoding(#[from] Utf8Error),

    #[error("The {source} `{name}` did not match the supported version (expected `{target}`)")]
    VersionMismatch {
        source: ValueSource,
        name: String,
        target: String,
    },

    #[error("A required {source} `{name}` was either missing or empty")]
    MissingRequiredValue { source: ValueSource, name: String },

    #[error("The {source} `{name}` value did not match the expected type (Expected: `{expected}`, Found: `{found}`)")]
    ValueTypeMismatch {
        source: ValueSource,
        name: String,
        expected: String,
        found: String,
    },

    #[error("The {source} `{name}` was incorrectly formatted (Value: `{value}`)")]
    InvalidValue {
        source: ValueSource,
        name: String,
        value: String,
    },

    #[error("The value provided is not valid for type `{for_type}` (Value: `{value}`)")]
    InvalidValueForType { for_type: String, value: String },
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

pub fn version_mismatch<S1, S2>(source: ValueSource, name: S1, target: S2) -> MessageFormatError
where
    S1: Into<String>,
    S2: Into<String>,
{
    MessageFormatError::VersionMismatch {
        source,
        name: name.into(),
        target: target.into(),
    }
}

pub fn missing_required_header<S>(name: S) -> MessageFormatError
where
    S: Into<String>,
{
    MessageFormatError::MissingRequiredValue {
        source: ValueSource::Header,
        name: name.into(),
    }
}

pub fn header_type_mismatch<S1, S2, S3>(name: S1, expected: S2, found: S3) -> MessageFormatError
where
    S1: Into<String>,
    S2: Into<String>,
    S3: Into<String>,
{
    MessageFormatError::ValueTypeMismatch {
        source: ValueSource::Header,
        name: name.into(),
        expected: expected.into(),
        found: found.into(),
    }
}

pub fn invalid_header_value<S1, S2>(name: S1, value: S2) -> MessageFormatError
where
    S1: Into<String>,
    S2: Into<String>,
{
    MessageFormatError::InvalidValue {
        source: ValueSource::Header,
        name: name.into(),
        value: value.into(),
    }
}

pub fn missing_required_field<S>(name: S) -> MessageFormatError
where
    S: Into<String>,
{
    MessageFormatError::MissingRequiredValue {
        source: ValueSource::Field,
        name: name.into(),
    }
}

pub fn field_type_mismatch<S1, S2, S3>(name: S1, expected: S2, found: S3) -> MessageFormatError
where
    S1: Into<String>,
    S2: Into<String>,
    S3: Into<String>,
{
    MessageFormatError::ValueTypeMismatch {
        source: ValueSource::Field,
        name: name.into(),
        expected: expected.into(),
        found: found.into(),
    }
}

pub fn invalid_field_value<S1, S2>(name: S1, value: S2) -> MessageFormatError
where
    S1: Into<String>,
    S2: Into<String>,
{
    MessageFormatError::InvalidValue {
        source: ValueSource::Field,
        name: name.into(),
        value: value.into(),
    }
}

pub fn invalid_socket_value<S1, S2>(name: S1, value: S2) -> MessageFormatError
where
    S1: Into<String>,
    S2: Into<String>,
{
    MessageFormatError::InvalidValue {
        source: ValueSource::Socket,
        name: name.into(),
        value: value.into(),
    }
}

pub fn invalid_xml_value<S1, S2>(name: S1, value: S2) -> MessageFormatError
where
    S1: Into<String>,
    S2: Into<String>,
{
    MessageFormatError::InvalidValue {
        source: ValueSource::Xml,
        name: name.into(),
        value: value.into(),
    }
}

pub fn unsupported_version<S>(version: S) -> Error
where
    S: Into<String>,
{
    Error::UnsupportedVersion {
        version: version.into(),
    }
}

pub fn unsupported_operation<S1>(operation: S1) -> Error
where
    S1: Into<String>,
{
    Error::UnsupportedOperation {
        operation: operation.into(),
    }
}

pub fn invalid_value_for_type<S1, S2>(for_type: S1, value: S2) -> MessageFormatError
where
    S1: Into<String>,
    S2: Into<String>,
{
    MessageFormatError::InvalidValueForType {
        for_type: for_type.into(),
        value: value.into(),
    }
}

pub fn protocol_error<S>(status: u16, reason: S) -> Error
where
    S: Into<String>,
{
    Error::Protocol {
        status,
        reason: reason.into(),
    }
}

pub fn invalid_argument<S1, S2>(name: S1, reason: S2) -> Error
where
    S1: Into<String>,
    S2: Into<String>,
{
    Error::InvalidArgument {
        name: name.into(),
        reason: reason.into(),
    }
}

pub fn xml_error(e: XMLError) -> Error {
    Error::MessageFormat(MessageFormatError::XmlFormat(e))
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ValueSource::Socket => "socket",
                ValueSource::Header => "message header",
                ValueSource::Field => "message field",
                ValueSource::Xml => "XML element",
            }
        )
    }
}

// ------------------------------------------------------------------------------------------------

impl<T> From<MessageFormatError> for Result<T, MessageFormatError> {
    fn from(e: MessageFormatError) -> Self {
        Err(e)
    }
}

impl<T> From<MessageFormatError> for Result<T, Error> {
    fn from(e: MessageFormatError) -> Self {
        Err(Error::MessageFormat(e))
    }
}

impl<T> From<Error> for Result<T, Error> {
    fn from(e: Error) -> Self {
        Err(e)
    }
}

// ------------------------------------------------------------------------------------------------
// Modules
// ------------------------------------------------------------------------------------------------
