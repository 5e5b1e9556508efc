#![allow(clippy::unwrap_used)]
// Integration tests for `NetBoxClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nbsync_api::records::{Device, Interface};
use nbsync_api::{
    Collection, Directory, Endpoint, Error, Fields, NetBoxClient, Query, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, NetBoxClient) {
    let server = MockServer::start().await;
    let token: secrecy::SecretString = "0123456789abcdef".to_string().into();
    let client =
        NetBoxClient::new(&server.uri(), &token, &TransportConfig::default()).unwrap();
    (server, client)
}

fn page(results: serde_json::Value, next: Option<String>) -> serde_json::Value {
    let count = results.as_array().map_or(0, Vec::len);
    json!({ "count": count, "next": next, "previous": null, "results": results })
}

// ── Status / auth ───────────────────────────────────────────────────

#[tokio::test]
async fn test_status_sends_token_header() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/status/"))
        .and(header("authorization", "Token 0123456789abcdef"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"netbox-version": "4.1.0"})))
        .mount(&server)
        .await;

    let status = client.status().await.unwrap();
    assert_eq!(status["netbox-version"], "4.1.0");
}

#[tokio::test]
async fn test_invalid_token_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/status/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Invalid token"})))
        .mount(&server)
        .await;

    let result = client.status().await;
    assert!(
        matches!(result, Err(Error::Authentication { ref message }) if message == "Invalid token"),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Lookups ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_find_one_passes_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/"))
        .and(query_param("name", "edge-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{
                "id": 12,
                "name": "edge-01",
                "role": {"id": 1, "display": "core"},
                "site": {"id": 2, "display": "HQ"},
                "device_type": {"id": 3},
                "status": {"value": "active", "label": "Active"},
                "primary_ip4": null
            }]),
            None,
        )))
        .mount(&server)
        .await;

    let devices = Collection::<Device>::new(&client);
    let device = devices
        .find_one(&Query::new().eq("name", "edge-01"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(device.id, 12);
    assert_eq!(device.site.id, 2);
    assert!(device.primary_ip4.is_none());
}

#[tokio::test]
async fn test_find_one_empty_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/manufacturers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), None)))
        .mount(&server)
        .await;

    let found = client
        .find_one(Endpoint::Manufacturers, &Query::new().eq("name", "Nobody"))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_find_one_duplicates_are_ambiguous() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/ipam/vlans/"))
        .and(query_param("vid", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([
                {"id": 1, "vid": 10, "name": "users"},
                {"id": 2, "vid": 10, "name": "users-b"}
            ]),
            None,
        )))
        .mount(&server)
        .await;

    let result = client
        .find_one(Endpoint::Vlans, &Query::new().eq("vid", 10))
        .await;
    assert!(
        matches!(result, Err(Error::Ambiguous { count: 2, .. })),
        "expected Ambiguous error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_find_many_follows_next_links() {
    let (server, client) = setup().await;
    let next = format!("{}/api/dcim/interfaces/?device_id=7&limit=1&offset=1", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/dcim/interfaces/"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"id": 2, "name": "Gi0/2", "device": {"id": 7}, "type": {"value": "1000base-t"}}]),
            None,
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/interfaces/"))
        .and(query_param("device_id", "7"))
        .and(query_param("limit", "250"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"id": 1, "name": "Gi0/1", "device": {"id": 7}, "type": {"value": "1000base-t"}}]),
            Some(next),
        )))
        .mount(&server)
        .await;

    let interfaces = Collection::<Interface>::new(&client)
        .find_many(&Query::new().eq("device_id", 7))
        .await
        .unwrap();

    let names: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Gi0/1", "Gi0/2"]);
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_posts_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/dcim/manufacturers/"))
        .and(body_json(json!({"name": "Acme", "slug": "acme"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 5, "name": "Acme", "slug": "acme"})),
        )
        .mount(&server)
        .await;

    let mut fields = Fields::new();
    fields.insert("name".into(), json!("Acme"));
    fields.insert("slug".into(), json!("acme"));

    let created = client.create(Endpoint::Manufacturers, &fields).await.unwrap();
    assert_eq!(created["id"], 5);
}

#[tokio::test]
async fn test_update_patches_record_path() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/dcim/devices/12/"))
        .and(body_json(json!({"primary_ip4": 40})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "name": "edge-01",
            "site": 2,
            "device_type": 3,
            "primary_ip4": {"id": 40, "display": "10.0.0.1/24"}
        })))
        .mount(&server)
        .await;

    let mut fields = Fields::new();
    fields.insert("primary_ip4".into(), json!(40));

    let device = Collection::<Device>::new(&client)
        .update(12, &fields)
        .await
        .unwrap();
    assert_eq!(device.primary_ip4.map(|r| r.id), Some(40));
}

#[tokio::test]
async fn test_validation_error_surfaces_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ipam/prefixes/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"prefix": ["Enter a valid IPv4 or IPv6 address."]})),
        )
        .mount(&server)
        .await;

    let result = client.create(Endpoint::Prefixes, &Fields::new()).await;
    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("valid IPv4"), "unexpected message: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_success_body_is_deserialization_error() {
    let (server, client) = setup().await;

    // A proxy page whose 200th byte falls inside a multibyte character.
    let body = format!("{}é…", "x".repeat(199));
    Mock::given(method("GET"))
        .and(path("/api/dcim/sites/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let result = client.find_many(Endpoint::Sites, &Query::new()).await;
    match result {
        Err(Error::Deserialization { message, body: raw }) => {
            assert_eq!(raw, body);
            assert!(message.contains('é'), "preview should keep whole characters: {message}");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
