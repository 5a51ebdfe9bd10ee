//! Generic transaction dispatcher for account-scoped operations.
//!
//! Every higher-level operation differs only in path, method, query, extra
//! headers, accepted status set, and how it interprets a successful raw
//! body; the transport handling, counter bookkeeping, and outcome
//! classification live here exactly once.

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::account::Account;
use crate::envelope::{RawResponse, ResultEnvelope};
use crate::error::ApiError;
use crate::model::OBJECT_STORE_TYPE;
use crate::transport::{Method, TransportRequest};

/// Description of one account-scoped request.
///
/// `accepted` is a per-call set: container listings treat both 200 and 204
/// as success, metadata operations only 204. Any other status is classified
/// as an HTTP error.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    path: String,
    method: Method,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    accepted: Vec<u16>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
}

impl TransactionRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            query: Vec::new(),
            headers: Vec::new(),
            accepted: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Add a status code to the accepted set.
    #[must_use]
    pub fn accept(mut self, status: u16) -> Self {
        self.accepted.push(status);
        self
    }

    /// Add a URI query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Per-call deadline forwarded to the transport, overriding its default.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Build the target URL for a request against the selected endpoint.
fn target_url(base: &str, request: &TransactionRequest) -> Result<String, ApiError> {
    let joined = if request.path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), request.path)
    };
    let mut url = Url::parse(&joined)
        .map_err(|e| ApiError::exception(format!("invalid object-store endpoint URL: {e}")))?;
    if !request.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in &request.query {
            pairs.append_pair(name, value);
        }
    }
    Ok(url.into())
}

/// Execute one account-scoped transaction, classifying the outcome.
///
/// Increments the shared call counter once per send, regardless of outcome.
/// When the response is 401 Unauthorized, 401 is not in the accepted set,
/// and the account allows reauthentication, the session is refreshed and
/// the request replayed once; the replay is a second send and counts again.
pub(crate) fn execute(account: &Account, request: &TransactionRequest) -> ResultEnvelope<Vec<u8>> {
    let mut replayed = false;
    loop {
        let endpoint = {
            let Some(service) = account.object_store_service() else {
                return ResultEnvelope::failure(
                    ApiError::exception(format!(
                        "no '{OBJECT_STORE_TYPE}' service in the account's service catalog"
                    )),
                    None,
                );
            };
            let preferred = account.preferred_region();
            let Some(endpoint) = service.endpoint_for(preferred.as_deref()) else {
                return ResultEnvelope::failure(
                    ApiError::exception(format!(
                        "'{OBJECT_STORE_TYPE}' service has no endpoints"
                    )),
                    None,
                );
            };
            endpoint.clone()
        };

        let url = match target_url(&endpoint.public_url, request) {
            Ok(url) => url,
            Err(error) => return ResultEnvelope::failure(error, None),
        };

        let mut wire = TransportRequest::new(request.method, url);
        wire.headers.push(("X-Auth-Token".to_string(), account.token_id()));
        wire.headers.extend(request.headers.iter().cloned());
        wire.body = request.body.clone();
        wire.timeout = request.timeout;

        account.counter().increment();
        debug!(method = %request.method, url = %wire.url, "executing transaction");

        let response = match account.transport().send(&wire) {
            Ok(response) => response,
            Err(err) => {
                return ResultEnvelope::failure(ApiError::exception(err.to_string()), None)
            }
        };

        let raw = RawResponse::from(&response);
        if request.accepted.contains(&response.status) {
            return ResultEnvelope::success(response.body, raw);
        }

        // Stale-token hook: a 401 outside the accepted set is treated as
        // token expiry when reauthentication is allowed. One replay maximum;
        // a second 401 is a genuine denial.
        if response.status == 401 && account.allow_reauthenticate() && !replayed {
            warn!("transaction rejected with 401, attempting reauthentication");
            if account.reauthenticate() {
                replayed = true;
                continue;
            }
        }

        return ResultEnvelope::failure(ApiError::http(response.reason.clone()), Some(raw));
    }
}
