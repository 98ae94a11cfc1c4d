//! Integration tests for the provider API modules using wiremock
//!
//! Each test stands up a mock provider and drives a module end to end,
//! asserting on the calls the module makes as much as on its result.

use phcloud::api::{ApiToken, CloudClient};
use phcloud::modules::{ip_action, power, server};
use phcloud::resource::{locate, resource, Disposition, Located, ResourceRef};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(uri: &str) -> CloudClient {
    let token = ApiToken::resolve(Some("test-token")).expect("explicit token always resolves");
    CloudClient::new(token, uri).expect("mock server URI is a valid base URL")
}

fn creatable_server() -> server::ServerParams {
    server::ServerParams {
        hostname: Some("web1".to_string()),
        unique_hostname: true,
        image: Some("ubuntu22".to_string()),
        package: Some("cloudv-3".to_string()),
        password: Some("hunter2hunter2".to_string()),
        ..Default::default()
    }
}

/// Locating by id must hit the item endpoint only, never the collection.
#[tokio::test]
async fn locate_by_id_never_lists_the_collection() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/7"))
        .and(header("authorization", "Token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "hostname": "web1",
        })))
        .expect(1)
        .mount(&mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(0)
        .mount(&mock)
        .await;

    let client = test_client(&mock.uri());
    let located = locate(&client, resource("servers"), &ResourceRef::Id(7), false)
        .await
        .unwrap();

    assert!(matches!(located, Located::Found(_)));
}

/// Deleting something that is already gone must issue no DELETE at all.
#[tokio::test]
async fn absent_on_missing_server_issues_no_delete() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "detail": "Not found."
        })))
        .mount(&mock)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock)
        .await;

    let client = test_client(&mock.uri());
    let params = server::ServerParams {
        server_id: Some(99),
        ..Default::default()
    };
    let output = server::run(&client, Disposition::Absent, params)
        .await
        .unwrap();

    assert!(!output.changed);
}

/// Running present twice reports changed=true then changed=false.
#[tokio::test]
async fn present_is_idempotent() {
    let mock = MockServer::start().await;
    let client = test_client(&mock.uri());
    let created = json!({
        "id": 5,
        "hostname": "web1",
        "image": "ubuntu22",
        "package": "cloudv-3",
    });

    // First run: nothing exists yet, the module creates.
    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cloud/server-packages/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"slug": "cloudv-3"}]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(&created))
        .expect(1)
        .mount(&mock)
        .await;

    let output = server::run(&client, Disposition::Present, creatable_server())
        .await
        .unwrap();
    assert!(output.changed);

    // Second run: the server exists and matches; no create is mounted,
    // so a stray POST would fail the run outright.
    mock.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [created]
        })))
        .mount(&mock)
        .await;

    let output = server::run(&client, Disposition::Present, creatable_server())
        .await
        .unwrap();
    assert!(!output.changed);
}

/// Client-side validation failures must happen before any network call.
#[tokio::test]
async fn create_without_credentials_makes_no_http_calls() {
    let mock = MockServer::start().await;
    let client = test_client(&mock.uri());

    let mut params = creatable_server();
    params.password = None;

    let err = server::run(&client, Disposition::Present, params)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("password"));
    assert!(mock.received_requests().await.unwrap().is_empty());
}

/// Reattaching a held address must detach it before attaching it.
#[tokio::test]
async fn ip_reattach_detaches_before_attaching() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": 5,
                "hostname": "web1",
                "networks": {"public": {"ipv4": ""}},
            }]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cloud/ipv4/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": 31,
                "address": "203.0.113.9",
                "attached": true,
                "server": "other-host",
            }]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cloud/ipv4/31/detach/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cloud/servers/5/attach-ipv4/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ipv4": "203.0.113.9"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let client = test_client(&mock.uri());
    let params = ip_action::IpActionParams {
        ip_address: "203.0.113.9".to_string(),
        server_hostname: Some("web1".to_string()),
        ..Default::default()
    };
    let output = ip_action::attach(&client, params).await.unwrap();
    assert!(output.changed);

    let requests = mock.received_requests().await.unwrap();
    let detach_at = requests
        .iter()
        .position(|r| r.url.path() == "/api/cloud/ipv4/31/detach/")
        .expect("detach call was made");
    let attach_at = requests
        .iter()
        .position(|r| r.url.path() == "/api/cloud/servers/5/attach-ipv4/")
        .expect("attach call was made");
    assert!(detach_at < attach_at, "detach must precede attach");
}

/// An address already on the target server is a no-op, not a reattach.
#[tokio::test]
async fn ip_attach_is_idempotent() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": 5, "hostname": "web1"}]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cloud/ipv4/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": 31,
                "address": "203.0.113.9",
                "attached": true,
                "server": "web1",
            }]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let client = test_client(&mock.uri());
    let params = ip_action::IpActionParams {
        ip_address: "203.0.113.9".to_string(),
        server_hostname: Some("web1".to_string()),
        ..Default::default()
    };
    let output = ip_action::attach(&client, params).await.unwrap();
    assert!(!output.changed);
}

/// Forced power-off sends the graceful shutdown first, then the hard
/// stop, in that order.
#[tokio::test]
async fn forced_shutdown_sends_shutdown_before_stop() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": 5, "hostname": "web1"}]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/5/power-management/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cloud/servers/5/power-management/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&mock)
        .await;

    let client = test_client(&mock.uri());
    let params = power::PowerParams {
        server_hostname: Some("web1".to_string()),
        force_power_off: true,
        ..Default::default()
    };
    let output = power::run(&client, power::PowerAction::Shutdown, params)
        .await
        .unwrap();
    assert!(output.changed);

    let actions: Vec<String> = mock
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method == "POST")
        .map(|r| {
            let body: serde_json::Value =
                serde_json::from_slice(&r.body).expect("POST body is JSON");
            body["action"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(actions, ["shutdown", "stop"]);
}

/// A server already at the target power state gets no transition call.
#[tokio::test]
async fn power_action_on_server_already_there_sends_nothing() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": 5, "hostname": "web1"}]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/5/power-management/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "stopped"})))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let client = test_client(&mock.uri());
    let params = power::PowerParams {
        server_hostname: Some("web1".to_string()),
        ..Default::default()
    };
    let output = power::run(&client, power::PowerAction::Shutdown, params)
        .await
        .unwrap();
    assert!(!output.changed);
}

/// A long non-ASCII error body must come back as a typed error, not
/// abort the process while being logged.
#[tokio::test]
async fn long_multibyte_error_body_yields_a_typed_error() {
    let mock = MockServer::start().await;

    let body = format!("{}é, quota dépassée", "a".repeat(199));
    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(400).set_body_string(body))
        .mount(&mock)
        .await;

    let client = test_client(&mock.uri());
    let err = client.get("api/cloud/servers/").await.unwrap_err();
    assert!(matches!(err, phcloud::api::ApiError::Validation(_)));
}

/// Two servers sharing a hostname fail the unique policy loudly.
#[tokio::test]
async fn ambiguous_hostname_is_an_error() {
    let mock = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/cloud/servers/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": 1, "hostname": "web1"},
                {"id": 2, "hostname": "web1"},
            ]
        })))
        .mount(&mock)
        .await;

    let client = test_client(&mock.uri());
    let err = locate(
        &client,
        resource("servers"),
        &ResourceRef::Name("web1".to_string()),
        true,
    )
    .await
    .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("web1"));
    assert!(message.contains('1') && message.contains('2'));
}
