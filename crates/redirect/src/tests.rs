//! HTTP-level tests for the redirect middleware.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use corelib::{MembershipSnapshot, Node, RingAccessor, RingConfig};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::{wrap, HeaderExtractor, RedirectStatus, Redirector, RouterState, DEFAULT_DEVICE_HEADER};

fn accessor(addrs: &[&str]) -> Arc<RingAccessor> {
    let accessor = Arc::new(RingAccessor::new(RingConfig::default()));
    if !addrs.is_empty() {
        accessor.update(&MembershipSnapshot::from_addresses(addrs.iter().copied()).unwrap());
    }
    accessor
}

fn app(redirector: Redirector) -> Router {
    let local = Router::new().fallback(|| async { "served locally" });
    wrap(local, RouterState::new(redirector, HeaderExtractor::default()))
}

fn device_request(uri: &str, device: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(device) = device {
        builder = builder.header(DEFAULT_DEVICE_HEADER, device);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_redirects_to_owner_with_path_and_query() {
    let accessor = accessor(&["a:8080", "b:8080", "c:8080"]);
    let owner = accessor.lookup(b"serial:device-42").unwrap();
    let app = app(Redirector::new(accessor));

    let response = app
        .oneshot(device_request("/api/v2/x?y=1", Some("serial:device-42")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("{}/api/v2/x?y=1", owner.address()).as_str()
    );
}

#[tokio::test]
async fn test_equivalent_device_names_share_a_target() {
    let accessor = accessor(&["a:8080", "b:8080", "c:8080", "d:8080"]);
    let app = app(Redirector::new(accessor));

    let mut locations = Vec::new();
    for name in [
        "mac:112233445566",
        "MAC:11-22-33-44-55-66",
        "mac:112233445566/config",
    ] {
        let response = app
            .clone()
            .oneshot(device_request("/", Some(name)))
            .await
            .unwrap();
        locations.push(response.headers()[header::LOCATION].clone());
    }
    assert_eq!(locations[0], locations[1]);
    assert_eq!(locations[0], locations[2]);
}

#[tokio::test]
async fn test_empty_ring_is_unavailable() {
    let app = app(Redirector::new(accessor(&[])));

    let response = app
        .oneshot(device_request("/", Some("mac:112233445566")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert_eq!(body_text(response).await, "no available nodes");
}

#[tokio::test]
async fn test_missing_identifier_is_bad_request() {
    // An empty ring would answer 503; 400 shows the ring was never consulted.
    let app = app(Redirector::new(accessor(&[])));

    let response = app.clone().oneshot(device_request("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("missing device identifier"));

    let response = app
        .oneshot(device_request("/", Some("mac:not-a-mac")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_local_owner_reaches_inner_handler() {
    let accessor = accessor(&["self:8080"]);
    let me = Node::parse("self:8080").unwrap();
    let app = app(Redirector::new(accessor).with_local(me.id().clone()));

    let response = app
        .oneshot(device_request("/anything", Some("uuid:abc")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "served locally");
}

#[tokio::test]
async fn test_configured_redirect_status() {
    let redirector = Redirector::new(accessor(&["a:8080", "b:8080"]))
        .with_status(RedirectStatus::try_from(302).unwrap());
    let app = app(redirector);

    let response = app
        .oneshot(device_request("/", Some("dns:host.example")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_ring_swap_is_seen_by_next_request() {
    let accessor = accessor(&[]);
    let app = app(Redirector::new(Arc::clone(&accessor)));

    let response = app
        .clone()
        .oneshot(device_request("/", Some("serial:1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    accessor.update(&MembershipSnapshot::from_addresses(["b:9000"]).unwrap());
    let response = app
        .oneshot(device_request("/status?v=2", Some("serial:1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "http://b:9000/status?v=2"
    );
}
