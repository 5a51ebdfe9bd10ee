//! The authenticated session and its account-scoped operations.
//!
//! An [`Account`] is created only by [`Account::authenticate`] and is
//! typically shared as `Arc<Account>`. The mutable session state (user id
//! and token) sits behind a `parking_lot::RwLock`, the reauthentication
//! flag is atomic, and the call counter is atomic, so an account is `Send +
//! Sync` and concurrent transactions or reauthentication on the same
//! account are safe without external serialization. This is a documented
//! contract of the type, not an accident of the implementation.
//!
//! Tokens expire (typically after 24 hours). With reauthentication allowed
//! (the default), a 401 on an account-scoped transaction transparently
//! refreshes the session and replays the request once; with it disabled,
//! call [`Account::reauthenticate`] manually. Disabling is recommended for
//! long-living processes that want to control when credentials are used.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::auth;
use crate::counter::CallCounter;
use crate::envelope::{RawResponse, ResultEnvelope};
use crate::error::ApiError;
use crate::model::{
    AccountStats, AuthenticationInfo, ContainerInfo, Role, Service, Tenant, Token,
    OBJECT_STORE_TYPE,
};
use crate::transaction::{self, TransactionRequest};
use crate::transport::{Method, Transport};

/// Header that forces the object store to query all replicas.
const HEADER_NEWEST: &str = "X-Newest";
/// Prefix for setting account metadata.
const META_PREFIX: &str = "X-Account-Meta-";
/// Prefix for removing account metadata.
const META_REMOVE_PREFIX: &str = "X-Remove-Account-Meta-";

/// Session fields replaced in place by reauthentication.
#[derive(Debug)]
struct SessionState {
    user_id: String,
    token: Token,
}

/// An authenticated identity plus token, tenant, roles, and service
/// catalog.
pub struct Account {
    transport: Arc<dyn Transport>,
    counter: CallCounter,
    name: String,
    auth_info: AuthenticationInfo,
    session: RwLock<SessionState>,
    roles: Vec<Role>,
    services: Vec<Service>,
    allow_reauthenticate: AtomicBool,
    preferred_region: RwLock<Option<String>>,
    delimiter: char,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("user_id", &self.user_id())
            .field("name", &self.name)
            .field("username", &self.auth_info.username)
            .field("roles", &self.roles)
            .field("services", &self.services.len())
            .field("allow_reauthenticate", &self.allow_reauthenticate())
            .finish_non_exhaustive()
    }
}

impl Account {
    /// Trigger authentication against the identity endpoint and build a
    /// session from the response.
    ///
    /// The returned envelope carries an `Arc<Account>` on success so the
    /// session can be shared across threads; a failed authentication never
    /// produces an account. The counter handle is shared by every account
    /// authenticated with a clone of it and is incremented only by
    /// account-scoped transactions, never by this call.
    pub fn authenticate(
        transport: Arc<dyn Transport>,
        counter: CallCounter,
        info: AuthenticationInfo,
        allow_reauthenticate: bool,
    ) -> ResultEnvelope<Arc<Self>> {
        auth::login(transport.as_ref(), &info).map(|snapshot| {
            let mut auth_info = info;
            // Keep the caller's password and URL; adopt the
            // server-confirmed username.
            auth_info.username = snapshot.username;
            Arc::new(Self {
                transport,
                counter,
                name: snapshot.name,
                auth_info,
                session: RwLock::new(SessionState {
                    user_id: snapshot.user_id,
                    token: snapshot.token,
                }),
                roles: snapshot.roles,
                services: snapshot.services,
                allow_reauthenticate: AtomicBool::new(allow_reauthenticate),
                preferred_region: RwLock::new(None),
                delimiter: '/',
            })
        })
    }

    /// Re-run the login exchange with the stored credentials and replace
    /// the session's user id and token contents in place.
    ///
    /// On any failure the session is left entirely unchanged and `false` is
    /// returned; no error crosses this boundary. Other holders of the same
    /// `Arc<Account>` observe the refreshed token through their existing
    /// reference.
    pub fn reauthenticate(&self) -> bool {
        let envelope = auth::login(self.transport.as_ref(), &self.auth_info);
        match envelope.into_payload() {
            Some(snapshot) => {
                let mut session = self.session.write();
                session.user_id = snapshot.user_id;
                session.token = snapshot.token;
                debug!("session reauthenticated");
                true
            }
            None => {
                warn!("reauthentication failed, keeping existing session");
                false
            }
        }
    }

    // Session accessors ----------------------------------------------------

    #[must_use]
    pub fn user_id(&self) -> String {
        self.session.read().user_id.clone()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server-confirmed username from the last successful authentication.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.auth_info.username
    }

    /// Snapshot of the current token. Call again after a reauthentication
    /// to observe the refreshed values.
    #[must_use]
    pub fn token(&self) -> Token {
        self.session.read().token.clone()
    }

    /// Snapshot of the tenant the current token is scoped to.
    #[must_use]
    pub fn tenant(&self) -> Tenant {
        self.session.read().token.tenant.clone()
    }

    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// First catalog service of type `object-store`. Absence is a valid
    /// state for the caller to handle, not an error.
    #[must_use]
    pub fn object_store_service(&self) -> Option<&Service> {
        self.services.iter().find(|s| s.service_type == OBJECT_STORE_TYPE)
    }

    #[must_use]
    pub fn allow_reauthenticate(&self) -> bool {
        self.allow_reauthenticate.load(Ordering::Relaxed)
    }

    pub fn set_allow_reauthenticate(&self, allow: bool) {
        self.allow_reauthenticate.store(allow, Ordering::Relaxed);
    }

    #[must_use]
    pub fn preferred_region(&self) -> Option<String> {
        self.preferred_region.read().clone()
    }

    /// Select which regional endpoint transactions are sent to. `None`
    /// (the default) uses the first applicable endpoint.
    pub fn set_preferred_region(&self, region: Option<String>) {
        *self.preferred_region.write() = region;
    }

    /// Path delimiter used for directory boundaries, `/` by default.
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Number of transactions sent through this account's counter handle.
    #[must_use]
    pub fn calls_made(&self) -> u64 {
        self.counter.value()
    }

    pub(crate) fn token_id(&self) -> String {
        self.session.read().token.id.clone()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn counter(&self) -> &CallCounter {
        &self.counter
    }

    // Account-scoped operations --------------------------------------------

    /// Execute an arbitrary account-scoped transaction.
    ///
    /// The building block every operation below is assembled from; exposed
    /// so further resource operations can reuse the same dispatch, counter,
    /// and classification behavior.
    pub fn execute(&self, request: &TransactionRequest) -> ResultEnvelope<Vec<u8>> {
        transaction::execute(self, request)
    }

    /// Account details as the raw response body (JSON listing format).
    ///
    /// 200 carries the listing; 204 means the account has no containers (or
    /// the end of a paged listing was reached).
    pub fn details(&self, newest: bool) -> ResultEnvelope<Vec<u8>> {
        let mut request = TransactionRequest::new(Method::Get, "")
            .query("format", "json")
            .accept(200)
            .accept(204);
        if newest {
            request = request.header(HEADER_NEWEST, "True");
        }
        self.execute(&request)
    }

    /// All containers under this account.
    ///
    /// `newest` forces the object store to query all replicas for the most
    /// recent listing; it is more expensive for the backend, use it only
    /// when needed.
    pub fn containers(&self, newest: bool) -> ResultEnvelope<Vec<ContainerInfo>> {
        self.details(newest).and_then(|body| parse_containers(&body))
    }

    /// Add metadata to this account. Success carries no payload; the
    /// response body is empty by contract.
    pub fn create_metadata(&self, metadata: &[(String, String)]) -> ResultEnvelope<()> {
        let mut request = TransactionRequest::new(Method::Post, "").accept(204);
        for (key, value) in metadata {
            request = request.header(format!("{META_PREFIX}{key}"), value.clone());
        }
        self.execute(&request).without_payload()
    }

    /// Update existing account metadata. The API treats creation and update
    /// identically.
    pub fn update_metadata(&self, metadata: &[(String, String)]) -> ResultEnvelope<()> {
        self.create_metadata(metadata)
    }

    /// Remove the metadata entries with the given keys.
    pub fn delete_metadata(&self, keys: &[String]) -> ResultEnvelope<()> {
        let mut request = TransactionRequest::new(Method::Post, "").accept(204);
        for key in keys {
            request = request.header(format!("{META_REMOVE_PREFIX}{key}"), "x");
        }
        self.execute(&request).without_payload()
    }

    /// Fetch the account metadata headers.
    ///
    /// Success carries no payload: read the `X-Account-Meta-*` headers out
    /// of the retained response, e.g. via [`account_metadata`].
    pub fn show_metadata(&self, newest: bool) -> ResultEnvelope<()> {
        let mut request = TransactionRequest::new(Method::Head, "").accept(204);
        if newest {
            request = request.header(HEADER_NEWEST, "True");
        }
        self.execute(&request).without_payload()
    }

    /// Account-wide usage figures from the metadata response headers.
    pub fn stats(&self, newest: bool) -> ResultEnvelope<AccountStats> {
        let envelope = self.show_metadata(newest);
        if let Some(error) = envelope.error() {
            return ResultEnvelope::failure(error.clone(), envelope.response().cloned());
        }
        let Some(response) = envelope.response().cloned() else {
            return ResultEnvelope::failure(
                ApiError::exception("metadata response missing from envelope"),
                None,
            );
        };
        match parse_stats(&response) {
            Ok(stats) => ResultEnvelope::success(stats, response),
            Err(error) => ResultEnvelope::failure(error, Some(response)),
        }
    }
}

/// Extract the `X-Account-Meta-*` pairs from a retained response, with the
/// prefix stripped from the keys.
#[must_use]
pub fn account_metadata(response: &RawResponse) -> Vec<(String, String)> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            if name.len() >= META_PREFIX.len()
                && name[..META_PREFIX.len()].eq_ignore_ascii_case(META_PREFIX)
            {
                Some((name[META_PREFIX.len()..].to_string(), value.clone()))
            } else {
                None
            }
        })
        .collect()
}

/// A `count`/`bytes` field may arrive as a JSON number or a numeric
/// string; anything else fails the listing with `InvalidPayload`.
fn numeric_field(entry: &serde_json::Value, field: &str) -> Result<u64, ApiError> {
    let value = entry.get(field).unwrap_or(&serde_json::Value::Null);
    match value {
        serde_json::Value::Number(n) => n.as_u64().ok_or_else(|| {
            ApiError::invalid_payload(format!("container field '{field}' is not a u64: {n}"))
        }),
        serde_json::Value::String(s) => s.parse::<u64>().map_err(|_| {
            ApiError::invalid_payload(format!("container field '{field}' is not numeric: '{s}'"))
        }),
        other => Err(ApiError::invalid_payload(format!(
            "container field '{field}' has unexpected type: {other}"
        ))),
    }
}

fn parse_containers(body: &[u8]) -> Result<Vec<ContainerInfo>, ApiError> {
    // A 204 listing has no body at all; that is an empty account.
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let root: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ApiError::json_parse(e.to_string()))?;
    let entries = root
        .as_array()
        .ok_or_else(|| ApiError::invalid_payload("container listing is not a JSON array"))?;

    let mut containers = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        containers.push(ContainerInfo {
            name,
            total_objects: numeric_field(entry, "count")?,
            bytes_used: numeric_field(entry, "bytes")?,
        });
    }
    Ok(containers)
}

fn stat_header(response: &RawResponse, name: &str) -> Result<u64, ApiError> {
    match response.header(name) {
        Some(value) => value.parse::<u64>().map_err(|_| {
            ApiError::invalid_payload(format!("header '{name}' is not numeric: '{value}'"))
        }),
        None => Ok(0),
    }
}

fn parse_stats(response: &RawResponse) -> Result<AccountStats, ApiError> {
    Ok(AccountStats {
        container_count: stat_header(response, "X-Account-Container-Count")?,
        object_count: stat_header(response, "X-Account-Object-Count")?,
        bytes_used: stat_header(response, "X-Account-Bytes-Used")?,
    })
}

#[cfg(test)]
mod tests {
    //! Unit tests for listing/metadata parsing helpers.
    use super::*;
    use crate::error::ErrorKind;

    /// Validates string and number representations of count/bytes both map
    /// to integers.
    #[test]
    fn test_parse_containers_string_and_number() {
        let body = br#"[
            {"name": "a", "count": "3", "bytes": "120"},
            {"name": "b", "count": 7, "bytes": 4096}
        ]"#;
        let containers = parse_containers(body).expect("parse");
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].name, "a");
        assert_eq!(containers[0].total_objects, 3);
        assert_eq!(containers[0].bytes_used, 120);
        assert_eq!(containers[1].total_objects, 7);
        assert_eq!(containers[1].bytes_used, 4096);
    }

    /// Validates the hard-failure policy for non-numeric fields.
    #[test]
    fn test_parse_containers_rejects_non_numeric() {
        let body = br#"[{"name": "a", "count": "many", "bytes": "120"}]"#;
        let error = parse_containers(body).expect_err("must fail");
        assert_eq!(error.kind(), ErrorKind::InvalidPayload);
        assert!(error.message().contains("count"));
    }

    /// Validates an empty (204) body maps to an empty listing.
    #[test]
    fn test_parse_containers_empty_body() {
        assert!(parse_containers(b"").expect("parse").is_empty());
        assert!(parse_containers(b"  \n").expect("parse").is_empty());
    }

    /// Validates a non-array body is rejected as an invalid payload.
    #[test]
    fn test_parse_containers_rejects_non_array() {
        let error = parse_containers(br#"{"name": "a"}"#).expect_err("must fail");
        assert_eq!(error.kind(), ErrorKind::InvalidPayload);
    }

    /// Validates metadata header extraction strips the prefix and matches
    /// case-insensitively.
    #[test]
    fn test_account_metadata_extraction() {
        let response = RawResponse::new(
            204,
            "No Content",
            vec![
                ("x-account-meta-Book".to_string(), "MobyDick".to_string()),
                ("X-Account-Meta-Subject".to_string(), "Whaling".to_string()),
                ("X-Account-Object-Count".to_string(), "12".to_string()),
            ],
        );
        let metadata = account_metadata(&response);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata[0], ("Book".to_string(), "MobyDick".to_string()));
        assert_eq!(metadata[1], ("Subject".to_string(), "Whaling".to_string()));
    }

    /// Validates stats parsing, including the missing-header default and
    /// the non-numeric failure.
    #[test]
    fn test_parse_stats() {
        let response = RawResponse::new(
            204,
            "No Content",
            vec![
                ("X-Account-Container-Count".to_string(), "2".to_string()),
                ("X-Account-Object-Count".to_string(), "15".to_string()),
                ("X-Account-Bytes-Used".to_string(), "670".to_string()),
            ],
        );
        let stats = parse_stats(&response).expect("parse");
        assert_eq!(stats.container_count, 2);
        assert_eq!(stats.object_count, 15);
        assert_eq!(stats.bytes_used, 670);

        let sparse = RawResponse::new(204, "No Content", Vec::new());
        assert_eq!(parse_stats(&sparse).expect("parse"), AccountStats::default());

        let broken = RawResponse::new(
            204,
            "No Content",
            vec![("X-Account-Bytes-Used".to_string(), "lots".to_string())],
        );
        let error = parse_stats(&broken).expect_err("must fail");
        assert_eq!(error.kind(), ErrorKind::InvalidPayload);
    }
}
