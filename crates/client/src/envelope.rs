//! Uniform success/failure carrier returned by every operation.
//!
//! [`ResultEnvelope`] pairs an optional typed payload with an optional
//! [`ApiError`] and the raw HTTP response retained for diagnostics. The
//! fields are private and only reachable through constructors that uphold
//! the central invariant: **the payload is present if and only if there is
//! no error** — except for the header-only operations (account metadata
//! show/create/update/delete), which are documented to succeed with an
//! absent payload and carry their information in the retained response
//! headers.

use crate::error::ApiError;

/// Status line and headers of an HTTP response, retained for diagnostics
/// even when the operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    reason: String,
    headers: Vec<(String, String)>,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, reason: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        Self { status, reason: reason.into(), headers }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The server's reason phrase, e.g. `"No Content"`.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header value whose name matches case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Generic outcome of an account-scoped operation.
#[derive(Debug)]
#[must_use = "inspect the envelope's error before touching the payload"]
pub struct ResultEnvelope<T> {
    error: Option<ApiError>,
    response: Option<RawResponse>,
    payload: Option<T>,
}

impl<T> ResultEnvelope<T> {
    /// Successful outcome with a payload.
    pub fn success(payload: T, response: RawResponse) -> Self {
        Self { error: None, response: Some(response), payload: Some(payload) }
    }

    /// Successful outcome of a header-only operation: no payload by
    /// contract, information lives in the retained response headers.
    pub fn success_empty(response: RawResponse) -> Self {
        Self { error: None, response: Some(response), payload: None }
    }

    /// Failed outcome. The raw response is retained when the failure
    /// happened after a status line was received.
    pub fn failure(error: ApiError, response: Option<RawResponse>) -> Self {
        Self { error: Some(error), response, payload: None }
    }

    /// `true` when no error was classified.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn response(&self) -> Option<&RawResponse> {
        self.response.as_ref()
    }

    #[must_use]
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Consume the envelope, yielding the payload if present.
    #[must_use]
    pub fn into_payload(self) -> Option<T> {
        self.payload
    }

    /// Drop the payload while keeping error state and retained response.
    ///
    /// Used by the header-only metadata operations, whose success payload is
    /// absent by contract.
    pub fn without_payload(self) -> ResultEnvelope<()> {
        ResultEnvelope { error: self.error, response: self.response, payload: None }
    }

    /// Map the payload type, preserving error and retained response.
    ///
    /// Higher-level operations use this to interpret the executor's raw body
    /// without duplicating any transport or classification logic.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResultEnvelope<U> {
        ResultEnvelope {
            error: self.error,
            response: self.response,
            payload: self.payload.map(f),
        }
    }

    /// Map the payload fallibly; a mapping error replaces the success state.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U, ApiError>) -> ResultEnvelope<U> {
        match self.payload {
            Some(payload) => match f(payload) {
                Ok(mapped) => ResultEnvelope {
                    error: self.error,
                    response: self.response,
                    payload: Some(mapped),
                },
                Err(err) => ResultEnvelope {
                    error: Some(err),
                    response: self.response,
                    payload: None,
                },
            },
            None => ResultEnvelope { error: self.error, response: self.response, payload: None },
        }
    }
}
