//! Domain records populated from the identity service's JSON responses.
//!
//! All records are plain data, immutable after construction. The wire names
//! of the `access` document map straight onto these types via serde, with
//! `#[serde(default)]` everywhere: a missing leaf field degrades to an empty
//! string (role names to the `"null"` sentinel) instead of failing the whole
//! parse. Only an undecodable top-level body is fatal, and that is handled
//! upstream in the authentication flow.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// How to authenticate against the identity endpoint.
///
/// Only Keystone v2 password credentials are implemented; the tag exists so
/// credentials carry their protocol explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthenticationMethod {
    #[default]
    Keystone,
}

impl AuthenticationMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keystone => "KEYSTONE",
        }
    }
}

/// Credentials and endpoint for the login exchange.
///
/// Retained by [`Account`](crate::account::Account) so an expired session
/// can be re-established with the same credentials. The `username` is
/// overwritten once with the server-confirmed value when authentication
/// succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationInfo {
    /// Tenant to scope the token to; omitted from the request when `None`.
    pub tenant_name: Option<String>,
    pub username: String,
    pub password: String,
    /// Identity endpoint, e.g. `http://keystone:5000/v2.0/tokens`.
    pub auth_url: String,
    pub method: AuthenticationMethod,
}

impl AuthenticationInfo {
    #[must_use]
    pub fn new(
        tenant_name: Option<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        auth_url: impl Into<String>,
    ) -> Self {
        Self {
            tenant_name,
            username: username.into(),
            password: password.into(),
            auth_url: auth_url.into(),
            method: AuthenticationMethod::Keystone,
        }
    }
}

/// Billing/ownership scope a token is issued for. Owned by [`Token`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

/// Time-bounded credential issued by the identity endpoint.
///
/// Owned exclusively by an account and replaced wholesale on
/// reauthentication; it is never left partially populated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Token {
    pub id: String,
    /// Expiry timestamp as issued by the server (RFC 3339).
    pub expires: String,
    pub issued_at: String,
    pub tenant: Tenant,
}

impl Token {
    /// Parse the `expires` field; `None` when absent or not RFC 3339.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.expires).ok().map(|t| t.with_timezone(&Utc))
    }

    /// Whether the token is expired or will expire within
    /// `threshold_seconds`. Unknown expiry counts as not expired.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at() {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(threshold_seconds) >= expires_at,
            None => false,
        }
    }
}

fn null_name() -> String {
    "null".to_string()
}

/// A role granted to the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Role {
    /// Role name; the server occasionally omits it, in which case the
    /// original SDK's `"null"` sentinel is kept.
    #[serde(default = "null_name")]
    pub name: String,
}

impl Default for Role {
    fn default() -> Self {
        Self { name: null_name() }
    }
}

/// One regional endpoint of a catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub region: String,
    #[serde(rename = "publicURL")]
    pub public_url: String,
    #[serde(rename = "internalURL")]
    pub internal_url: String,
    #[serde(rename = "adminURL")]
    pub admin_url: String,
}

/// The object-store service type in the catalog.
pub const OBJECT_STORE_TYPE: &str = "object-store";

/// An entry of the service catalog returned at authentication.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    #[serde(rename = "type")]
    pub service_type: String,
    pub name: String,
    pub endpoints: Vec<Endpoint>,
}

impl Service {
    /// Endpoint for the preferred region, falling back to the first one.
    #[must_use]
    pub fn endpoint_for(&self, preferred_region: Option<&str>) -> Option<&Endpoint> {
        if let Some(region) = preferred_region {
            if let Some(endpoint) = self.endpoints.iter().find(|e| e.region == region) {
                return Some(endpoint);
            }
        }
        self.endpoints.first()
    }
}

/// Descriptor of one container from an account listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub name: String,
    pub total_objects: u64,
    pub bytes_used: u64,
}

/// Account-wide usage figures read from the metadata response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountStats {
    pub container_count: u64,
    pub object_count: u64,
    pub bytes_used: u64,
}

#[cfg(test)]
mod tests {
    //! Unit tests for domain record mapping.
    use super::*;

    /// Validates tolerant token mapping: missing leaves default instead of
    /// failing the parse.
    #[test]
    fn test_token_from_partial_json() {
        let token: Token = serde_json::from_str(r#"{"id":"tok-1"}"#).expect("parse");
        assert_eq!(token.id, "tok-1");
        assert_eq!(token.expires, "");
        assert_eq!(token.issued_at, "");
        assert_eq!(token.tenant, Tenant::default());
    }

    /// Validates the `"null"` sentinel for a role without a name.
    #[test]
    fn test_role_name_sentinel() {
        let role: Role = serde_json::from_str("{}").expect("parse");
        assert_eq!(role.name, "null");

        let named: Role = serde_json::from_str(r#"{"name":"admin"}"#).expect("parse");
        assert_eq!(named.name, "admin");
    }

    /// Validates expiry parsing and the threshold check.
    #[test]
    fn test_token_expiry() {
        let live = Token {
            expires: (Utc::now() + chrono::Duration::hours(24)).to_rfc3339(),
            ..Token::default()
        };
        assert!(live.expires_at().is_some());
        assert!(!live.is_expired(300));
        assert!(live.is_expired(25 * 3600));

        let unknown = Token::default();
        assert!(unknown.expires_at().is_none());
        assert!(!unknown.is_expired(300));
    }

    /// Validates catalog endpoint mapping and region preference.
    #[test]
    fn test_service_endpoint_selection() {
        let service: Service = serde_json::from_str(
            r#"{
                "type": "object-store",
                "name": "swift",
                "endpoints": [
                    {"region": "us-east", "publicURL": "http://east/v1/AUTH_t"},
                    {"region": "us-west", "publicURL": "http://west/v1/AUTH_t"}
                ]
            }"#,
        )
        .expect("parse");

        assert_eq!(service.service_type, OBJECT_STORE_TYPE);
        assert_eq!(
            service.endpoint_for(Some("us-west")).map(|e| e.public_url.as_str()),
            Some("http://west/v1/AUTH_t")
        );
        // Unknown region falls back to the first endpoint.
        assert_eq!(
            service.endpoint_for(Some("eu")).map(|e| e.region.as_str()),
            Some("us-east")
        );
        assert_eq!(service.endpoint_for(None).map(|e| e.region.as_str()), Some("us-east"));
    }
}
