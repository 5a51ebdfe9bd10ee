//! Closed error taxonomy for account-scoped operations.
//!
//! Every operation in this crate reports its outcome through a
//! [`ResultEnvelope`](crate::envelope::ResultEnvelope); nothing in the public
//! surface panics or returns a bare `Err`. A successful outcome carries no
//! `ApiError` at all, so the set of failure kinds below is closed and small.

use std::fmt;

use crate::transport::TransportError;

/// Discriminant for every failure an operation can report.
///
/// The set is deliberately closed: callers are expected to match on it
/// exhaustively when deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The server answered with a status code outside the accepted set for
    /// the operation. The message carries the server's reason phrase.
    HttpError,

    /// A transport-level fault (connect, DNS, TLS, read) occurred before an
    /// HTTP status could be evaluated. The message carries the transport
    /// diagnostic.
    Exception,

    /// A body that was expected to be JSON could not be parsed. The message
    /// carries the parser diagnostic.
    JsonParseError,

    /// The body parsed as JSON but its content violated the operation's
    /// contract, e.g. a non-numeric `count`/`bytes` field in a container
    /// listing.
    InvalidPayload,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpError => write!(f, "http error"),
            Self::Exception => write!(f, "transport exception"),
            Self::JsonParseError => write!(f, "json parse error"),
            Self::InvalidPayload => write!(f, "invalid payload"),
        }
    }
}

/// A classified failure: one [`ErrorKind`] plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Classify an unexpected HTTP status; `reason` is the server's reason
    /// phrase, retained verbatim.
    pub fn http(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::HttpError, reason)
    }

    /// Classify a transport fault.
    pub fn exception(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Exception, message)
    }

    /// Classify an unparseable JSON body.
    pub fn json_parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::JsonParseError, message)
    }

    /// Classify a well-formed but contract-violating body.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPayload, message)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        Self::exception(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::json_parse(err.to_string())
    }
}
