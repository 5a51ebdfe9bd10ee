//! End-to-end test against a stub HTTP server.
//!
//! The production `HttpTransport` is blocking, so the SDK calls run inside
//! `spawn_blocking` while wiremock serves the stubbed identity and
//! object-store endpoints.

use std::sync::Arc;

use swiftstore::{Account, AuthenticationInfo, CallCounter, ErrorKind, HttpTransport};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn access_document(storage_url: &str) -> String {
    format!(
        r#"{{
            "access": {{
                "user": {{
                    "id": "u-1",
                    "name": "alice",
                    "username": "alice.server",
                    "roles": [{{"name": "admin"}}]
                }},
                "token": {{
                    "id": "tok-1",
                    "expires": "2026-08-26T12:00:00Z",
                    "issued_at": "2026-08-25T12:00:00Z",
                    "tenant": {{"id": "t-1", "name": "acme", "description": "", "enabled": true}}
                }},
                "serviceCatalog": [
                    {{"type": "object-store", "name": "swift",
                      "endpoints": [{{"region": "r1", "publicURL": "{storage_url}"}}]}}
                ]
            }}
        }}"#
    )
}

/// Full round trip: authenticate, list containers, read account stats.
#[tokio::test(flavor = "multi_thread")]
async fn authenticate_and_list_containers() {
    let server = MockServer::start().await;
    let storage_url = format!("{}/v1/AUTH_acme", server.uri());

    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .and(header("Content-Type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(access_document(&storage_url), "application/json"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/AUTH_acme"))
        .and(query_param("format", "json"))
        .and(header("X-Auth-Token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[{"name":"a","count":"3","bytes":"120"},{"name":"b","count":12,"bytes":550}]"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/v1/AUTH_acme"))
        .and(header("X-Auth-Token", "tok-1"))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("X-Account-Container-Count", "2")
                .insert_header("X-Account-Object-Count", "15")
                .insert_header("X-Account-Bytes-Used", "670")
                .insert_header("X-Account-Meta-Book", "MobyDick"),
        )
        .mount(&server)
        .await;

    let auth_url = format!("{}/v2.0/tokens", server.uri());
    let (containers, stats, metadata, calls) = tokio::task::spawn_blocking(move || {
        let transport = Arc::new(HttpTransport::new().expect("transport"));
        let counter = CallCounter::new();
        let info =
            AuthenticationInfo::new(Some("acme".to_string()), "alice", "secret", auth_url);

        let account = Account::authenticate(transport, counter.clone(), info, true)
            .into_payload()
            .expect("authentication must succeed");
        assert_eq!(account.user_id(), "u-1");
        assert_eq!(account.tenant().name, "acme");

        let containers =
            account.containers(false).into_payload().expect("listing must succeed");

        let shown = account.show_metadata(false);
        assert!(shown.is_ok());
        let metadata =
            swiftstore::account_metadata(shown.response().expect("retained response"));

        let stats = account.stats(false).into_payload().expect("stats must succeed");
        (containers, stats, metadata, counter.value())
    })
    .await
    .expect("blocking task");

    assert_eq!(containers.len(), 2);
    assert_eq!(containers[0].name, "a");
    assert_eq!(containers[0].total_objects, 3);
    assert_eq!(containers[0].bytes_used, 120);
    assert_eq!(containers[1].total_objects, 12);

    assert_eq!(metadata, vec![("Book".to_string(), "MobyDick".to_string())]);
    assert_eq!(stats.object_count, 15);
    assert_eq!(stats.bytes_used, 670);

    // listing + show_metadata + stats(HEAD) = 3 transactions.
    assert_eq!(calls, 3);
}

/// A denied login surfaces the server's reason phrase; the real transport's
/// connection faults are classified as exceptions.
#[tokio::test(flavor = "multi_thread")]
async fn authentication_failures_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let auth_url = format!("{}/v2.0/tokens", server.uri());
    let (denied_kind, denied_reason, fault_kind) = tokio::task::spawn_blocking(move || {
        let transport = Arc::new(HttpTransport::new().expect("transport"));

        let denied = Account::authenticate(
            transport.clone(),
            CallCounter::new(),
            AuthenticationInfo::new(None, "alice", "wrong", auth_url),
            true,
        );
        let denied_error = denied.error().cloned().expect("error");

        // Nothing listens on port 9; the connect fails before any status.
        let fault = Account::authenticate(
            transport,
            CallCounter::new(),
            AuthenticationInfo::new(None, "alice", "secret", "http://127.0.0.1:9/v2.0/tokens"),
            true,
        );
        let fault_error = fault.error().cloned().expect("error");

        (denied_error.kind(), denied_error.message().to_string(), fault_error.kind())
    })
    .await
    .expect("blocking task");

    assert_eq!(denied_kind, ErrorKind::HttpError);
    assert_eq!(denied_reason, "Unauthorized");
    assert_eq!(fault_kind, ErrorKind::Exception);
}
