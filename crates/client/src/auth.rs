//! Keystone v2 login exchange.
//!
//! Builds the password-credentials request, posts it to the identity
//! endpoint, and maps the `access` document into a session snapshot.
//! Outcome classification follows a strict order: transport fault, then
//! unexpected status, then unparseable body; only then is the document
//! descended into, tolerantly (see [`crate::model`]).
//!
//! This flow never touches the call counter: only account-scoped
//! transactions are counted.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::envelope::{RawResponse, ResultEnvelope};
use crate::error::ApiError;
use crate::model::{AuthenticationInfo, Role, Service, Token};
use crate::transport::{Method, Transport, TransportRequest};

/// Everything a successful login yields; the account is assembled (or
/// refreshed) from this.
#[derive(Debug)]
pub(crate) struct SessionSnapshot {
    pub user_id: String,
    pub name: String,
    /// Server-confirmed username; overwrites the credential copy.
    pub username: String,
    pub roles: Vec<Role>,
    pub token: Token,
    pub services: Vec<Service>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AccessDocument {
    access: AccessSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AccessSection {
    user: UserSection,
    token: Token,
    #[serde(rename = "serviceCatalog")]
    service_catalog: Vec<Service>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserSection {
    id: String,
    name: String,
    username: String,
    roles: Vec<Role>,
}

fn request_body(info: &AuthenticationInfo) -> Vec<u8> {
    let mut auth = serde_json::Map::new();
    // tenantName is omitted entirely when absent or empty, matching the
    // identity API's expectation for unscoped requests.
    if let Some(tenant) = info.tenant_name.as_deref().filter(|t| !t.is_empty()) {
        auth.insert("tenantName".to_string(), json!(tenant));
    }
    auth.insert(
        "passwordCredentials".to_string(),
        json!({ "username": info.username, "password": info.password }),
    );
    json!({ "auth": auth }).to_string().into_bytes()
}

/// Perform the login exchange and classify the outcome.
pub(crate) fn login(
    transport: &dyn Transport,
    info: &AuthenticationInfo,
) -> ResultEnvelope<SessionSnapshot> {
    let mut request = TransportRequest::new(Method::Post, info.auth_url.clone());
    request.headers.push(("Content-Type".to_string(), "application/json".to_string()));
    request.body = Some(request_body(info));

    debug!(auth_url = %info.auth_url, username = %info.username, "authenticating");

    let response = match transport.send(&request) {
        Ok(response) => response,
        Err(err) => return ResultEnvelope::failure(ApiError::exception(err.to_string()), None),
    };

    let raw = RawResponse::from(&response);
    if response.status != 200 {
        return ResultEnvelope::failure(ApiError::http(response.reason.clone()), Some(raw));
    }

    let document: AccessDocument = match serde_json::from_slice(&response.body) {
        Ok(document) => document,
        Err(err) => {
            return ResultEnvelope::failure(ApiError::json_parse(err.to_string()), Some(raw))
        }
    };

    let access = document.access;
    let snapshot = SessionSnapshot {
        user_id: access.user.id,
        name: access.user.name,
        username: access.user.username,
        roles: access.user.roles,
        token: access.token,
        services: access.service_catalog,
    };
    ResultEnvelope::success(snapshot, raw)
}
