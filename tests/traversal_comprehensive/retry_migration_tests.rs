//! Retry and endpoint migration (Tier 2)
//!
//! Driven by a scripted transport so every attempt is visible.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use swhdag::testing::ScriptedTransport;
use swhdag::{
    args, revision_edges, ApiEndpoint, ClientConfig, Endpoint, GraphError, ObjectKind,
    ProtocolClient, ProtocolError, Swhid,
};

const HEX: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const DIR: &str = "cccccccccccccccccccccccccccccccccccccccc";

fn client(transport: &Arc<ScriptedTransport>) -> ProtocolClient {
    let config = ClientConfig::new("https://prod.example")
        .with_secondary(ApiEndpoint::new("https://staging.example").with_token("secret"))
        .with_retry(3, Duration::ZERO);
    ProtocolClient::with_transport(config, transport.clone()).unwrap()
}

#[test]
fn test_forbidden_twice_migrates_once() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_status(403);
    transport.push_status(403);
    let client = client(&transport);

    let err = client.get(Endpoint::Revision, &args![HEX]).unwrap_err();
    assert_eq!(err.status(), Some(403));

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            format!("https://prod.example/api/1/revision/{}/", HEX),
            format!("https://staging.example/api/1/revision/{}/", HEX),
        ]
    );
}

#[test]
fn test_not_found_is_not_retried() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_json(404, json!({"exception": "NotFoundExc", "reason": "gone"}));
    let client = client(&transport);

    let err = client.get(Endpoint::Revision, &args![HEX]).unwrap_err();
    assert_eq!(
        err,
        ProtocolError::RemoteStatus {
            code: 404,
            reason: Some("gone".to_string())
        }
    );
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn test_server_error_then_success_through_graph_layer() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_status(502);
    transport.push_json(200, json!({"directory": DIR, "parents": []}));
    let client = client(&transport);

    let edges = revision_edges(&client, &Swhid::new(ObjectKind::Revision, HEX).unwrap()).unwrap();
    assert_eq!(edges.directory, Some(Swhid::new(ObjectKind::Directory, DIR).unwrap()));
    assert_eq!(transport.request_count(), 2);
}

#[test]
fn test_exhausted_retries_surface_as_graph_error() {
    let transport = Arc::new(ScriptedTransport::new());
    for _ in 0..3 {
        transport.push_status(500);
    }
    let client = client(&transport);

    let err = revision_edges(&client, &Swhid::new(ObjectKind::Revision, HEX).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        GraphError::Protocol(ProtocolError::RemoteStatus { code: 500, .. })
    ));
    assert_eq!(transport.request_count(), 3);
}

#[test]
fn test_bad_argument_never_reaches_the_network() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = client(&transport);

    let err = client.get(Endpoint::Revision, &args!["not-a-hash"]).unwrap_err();
    assert!(matches!(err, ProtocolError::Validation { .. }));
    assert_eq!(transport.request_count(), 0);
}
