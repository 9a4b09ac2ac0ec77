//! End-to-end tests for the `/api` reverse proxy against a mock backend.

mod common;

use reqwest::StatusCode;
use serde_json::Value;

use common::{client, dead_address, edge_config, start_edge, start_mock_backend};

async fn echo_json(response: reqwest::Response) -> Value {
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

fn header_values<'a>(echo: &'a Value, name: &str) -> Vec<&'a str> {
    echo["headers"][name]
        .as_array()
        .map(|values| values.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_hop_by_hop_headers_are_not_forwarded() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let response = client()
        .get(edge.url("/api/echo/meals"))
        .header("keep-alive", "timeout=5")
        .header("proxy-authorization", "Basic c2VjcmV0")
        .header("te", "trailers")
        .header("trailers", "x-checksum")
        .header("x-custom", "kept")
        .send()
        .await
        .unwrap();
    let echo = echo_json(response).await;

    for name in ["keep-alive", "proxy-authorization", "te", "trailers"] {
        assert!(header_values(&echo, name).is_empty(), "{} leaked upstream", name);
    }
    assert_eq!(header_values(&echo, "x-custom"), vec!["kept"]);
    // The upstream client sets Host for the backend itself
    assert_eq!(header_values(&echo, "host"), vec![backend.to_string().as_str()]);
}

#[tokio::test]
async fn test_forwarding_headers_describe_the_caller() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let echo = echo_json(client().get(edge.url("/api/echo/orders")).send().await.unwrap()).await;

    let edge_host = edge.addr.to_string();
    assert_eq!(header_values(&echo, "x-forwarded-host"), vec![edge_host.as_str()]);
    assert_eq!(header_values(&echo, "x-forwarded-proto"), vec!["http"]);
    assert_eq!(header_values(&echo, "origin"), vec![format!("http://{}", edge_host).as_str()]);
}

#[tokio::test]
async fn test_forwarded_proto_from_tls_terminator_is_trusted() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let response = client()
        .get(edge.url("/api/echo/orders"))
        .header("x-forwarded-proto", "https")
        .header("host", "shop.example.com")
        .send()
        .await
        .unwrap();
    let echo = echo_json(response).await;

    assert_eq!(header_values(&echo, "x-forwarded-proto"), vec!["https"]);
    assert_eq!(header_values(&echo, "origin"), vec!["https://shop.example.com"]);
    assert_eq!(header_values(&echo, "x-forwarded-host"), vec!["shop.example.com"]);
}

#[tokio::test]
async fn test_path_and_query_are_preserved_verbatim() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let echo = echo_json(
        client()
            .get(edge.url("/api/echo/meals/search?q=pad%20thai&tag=a&tag=b"))
            .send()
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(echo["path"], "/api/echo/meals/search");
    assert_eq!(echo["query"], "q=pad%20thai&tag=a&tag=b");
}

fn echoed<'a>(response: &'a reqwest::Response, name: &str) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_get_and_head_never_carry_a_body() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    for method in [reqwest::Method::GET, reqwest::Method::HEAD] {
        let response = client()
            .request(method.clone(), edge.url("/api/echo/cart"))
            .body("should not travel")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // What the backend received
        assert_eq!(echoed(&response, "x-echo-method"), method.as_str());
        assert_eq!(echoed(&response, "x-echo-body-bytes"), "0");
        assert_eq!(echoed(&response, "x-echo-content-length"), "none");
    }
}

#[tokio::test]
async fn test_request_body_is_forwarded_for_writes() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let payload = r#"{"meal_id":"m-42","quantity":2}"#;
    for method in [reqwest::Method::POST, reqwest::Method::PUT, reqwest::Method::PATCH, reqwest::Method::DELETE] {
        let response = client()
            .request(method.clone(), edge.url("/api/echo/cart/items"))
            .header("content-type", "application/json")
            .body(payload)
            .send()
            .await
            .unwrap();
        let echo = echo_json(response).await;

        assert_eq!(echo["method"], method.as_str());
        assert_eq!(echo["body"], payload);
        assert_eq!(header_values(&echo, "content-type"), vec!["application/json"]);
    }
}

#[tokio::test]
async fn test_every_set_cookie_is_relayed_separately() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let response = client().get(edge.url("/api/cookies")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<_> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies, vec!["a=1; Path=/", "b=2; Path=/"]);
}

#[tokio::test]
async fn test_upstream_errors_pass_through_unchanged() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let response = client().get(edge.url("/api/missing")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "meal not found");
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_upstream_redirects_are_relayed_not_followed() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let response = client().get(edge.url("/api/moved")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get("location").unwrap(), "/api/elsewhere");
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let mut config = edge_config(dead_address().await);
    config.pages.origin_url = None;
    let edge = start_edge(config).await;

    let response = client().get(edge.url("/api/echo/meals")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_slow_backend_is_gateway_timeout() {
    let backend = start_mock_backend().await;
    let mut config = edge_config(backend);
    config.timeouts.upstream_secs = 1;
    let edge = start_edge(config).await;

    let response = client().get(edge.url("/api/slow")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_request_id_is_forwarded_and_echoed() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let response = client().get(edge.url("/api/echo/meals")).send().await.unwrap();
    let request_id = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let echo = echo_json(response).await;

    assert_eq!(header_values(&echo, "x-request-id"), vec![request_id.as_str()]);
}

#[tokio::test]
async fn test_caller_request_id_is_kept() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let response = client()
        .get(edge.url("/api/echo/meals"))
        .header("x-request-id", "trace-abc")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-abc");
}

#[tokio::test]
async fn test_reload_keeps_the_running_api_prefix() {
    let backend = start_mock_backend().await;
    let edge = start_edge(edge_config(backend)).await;

    let mut reloaded = edge_config(backend);
    reloaded.backend.api_prefix = "/v1".into();
    reloaded.timeouts.upstream_secs = 1;
    edge.config_updates.send(reloaded).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let echo = echo_json(client().get(edge.url("/api/echo/meals")).send().await.unwrap()).await;
    assert_eq!(echo["path"], "/api/echo/meals");

    // The rest of the reload did apply
    let response = client().get(edge.url("/api/slow")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}
