//! HTTP transport collaborator boundary.
//!
//! The core never talks to the network directly; it hands a fully built
//! [`TransportRequest`] to a [`Transport`] implementation and receives either
//! a [`TransportResponse`] (status, reason phrase, headers, body) or a
//! [`TransportError`] for connection-level faults. Keeping this seam a trait
//! lets tests substitute an in-memory transport and lets applications bring
//! their own client configuration.
//!
//! Execution is synchronous and blocking: a call occupies the invoking
//! thread for the full round trip. Timeouts and cancellation are transport
//! concerns; [`HttpTransport`] applies a default timeout and honors the
//! per-request override carried in [`TransportRequest::timeout`].

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// HTTP methods used by the account-scoped operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    /// Absolute target URL including any query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Per-call deadline override; `None` means the transport default.
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), body: None, timeout: None }
    }
}

/// Response as observed by the transport, before any classification.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Server reason phrase, e.g. `"Unauthorized"`.
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl From<&TransportResponse> for crate::envelope::RawResponse {
    fn from(response: &TransportResponse) -> Self {
        Self::new(response.status, response.reason.clone(), response.headers.clone())
    }
}

/// Connection-level faults, reported distinctly from HTTP-level outcomes.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect, DNS, TLS, timeout, or read failure.
    #[error("{0}")]
    Connection(String),

    /// The request could not be constructed (malformed URL or header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Blocking HTTP transport contract.
///
/// Implementations must be shareable across threads; the core stores them
/// behind `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Issue the request and return the raw response.
    ///
    /// # Errors
    /// Returns [`TransportError`] for connection-level faults only; any
    /// received HTTP status, including 4xx/5xx, is a successful transport
    /// outcome.
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Production transport on top of `reqwest::blocking`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Default request timeout applied when a request carries no override.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a transport with the default timeout.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidRequest`] if the underlying client
    /// cannot be constructed (e.g. TLS backend initialization failure).
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom default timeout.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidRequest`] if the underlying client
    /// cannot be constructed.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }

    fn method_of(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.request(Self::method_of(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response =
            builder.send().map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        // reqwest does not surface the raw status line, so the canonical
        // reason phrase for the code stands in for it.
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|e| TransportError::Connection(e.to_string()))?
            .to_vec();

        Ok(TransportResponse { status: status.as_u16(), reason, headers, body })
    }
}
