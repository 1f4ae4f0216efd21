use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower::ServiceExt;

use ip2country::{config::Config, server::create_app};

fn test_config(rate_limit: usize) -> Config {
    Config {
        rate_limit,
        ip2country_db: PathBuf::from("testdata/ip2country.txt"),
        ..Config::default()
    }
}

// Drives one request through the router. The x-forwarded-for header stands
// in for the peer address, since oneshot requests carry no socket.
async fn send(app: Router, uri: &str, client: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .uri(uri)
        .header("x-forwarded-for", client)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap();

    (status, body)
}

#[tokio::test]
async fn test_known_ip_returns_country_and_city() {
    let app = create_app(test_config(5));

    let (status, body) = send(app, "/v1/find-country?ip=2.22.233.255", "10.0.0.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["country"], "Israel");
    assert_eq!(body["city"], "Tel-Aviv");
}

#[tokio::test]
async fn test_missing_ip_parameter_is_rejected() {
    let app = create_app(test_config(5));

    let (status, body) = send(app.clone(), "/v1/find-country", "10.0.0.2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "IP is required");

    // An empty value is treated the same as an absent one.
    let (status, body) = send(app, "/v1/find-country?ip=", "10.0.0.2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "IP is required");
}

#[tokio::test]
async fn test_missing_ip_parameter_skips_the_rate_limiter() {
    let app = create_app(test_config(1));

    // Repeated parameterless requests never consume the client's only slot.
    for _ in 0..3 {
        let (status, _) = send(app.clone(), "/v1/find-country", "10.0.0.9").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = send(app, "/v1/find-country?ip=2.22.233.255", "10.0.0.9").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_ip_is_not_found() {
    let app = create_app(test_config(5));

    let (status, body) = send(app, "/v1/find-country?ip=1.1.1.1", "10.0.0.3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "IP not found");
}

#[tokio::test]
async fn test_unreadable_database_answers_not_found() {
    let mut config = test_config(5);
    config.ip2country_db = PathBuf::from("testdata/missing.txt");
    let app = create_app(config);

    let (status, body) = send(app, "/v1/find-country?ip=2.22.233.255", "10.0.0.4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "IP not found");
}

#[tokio::test]
async fn test_second_request_is_rate_limited() {
    let app = create_app(test_config(1));

    let (status, _) = send(app.clone(), "/v1/find-country?ip=2.22.233.255", "10.1.0.1").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), "/v1/find-country?ip=2.22.233.255", "10.1.0.1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded");

    // Another client is unaffected.
    let (status, _) = send(app, "/v1/find-country?ip=2.22.233.255", "10.1.0.2").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_limit_of_five_admits_five_then_denies() {
    let app = create_app(test_config(5));

    for _ in 0..5 {
        let (status, _) =
            send(app.clone(), "/v1/find-country?ip=2.22.233.255", "10.2.0.1").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(app, "/v1/find-country?ip=2.22.233.255", "10.2.0.1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded");
}

#[tokio::test]
async fn test_health_endpoint_reports_healthy() {
    let app = create_app(test_config(5));

    let (status, body) = send(app, "/health", "10.3.0.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_endpoint_reports_database_state() {
    let app = create_app(test_config(5));
    let (status, body) = send(app, "/ready", "10.3.0.2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "readable");

    let mut config = test_config(5);
    config.ip2country_db = PathBuf::from("testdata/missing.txt");
    let app = create_app(config);
    let (status, body) = send(app, "/ready", "10.3.0.2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "unreadable");
}

#[tokio::test]
async fn test_live_server_buckets_clients_by_socket_address() {
    let app = create_app(test_config(1));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let client = reqwest::Client::new();
    let url = format!("http://{addr}/v1/find-country?ip=2.22.233.255");

    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = first.json().await.unwrap();
    assert_eq!(body["country"], "Israel");
    assert_eq!(body["city"], "Tel-Aviv");

    // Same source address, so the second request lands in the same bucket.
    let second = client.get(&url).send().await.unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["error"], "Rate limit exceeded");
}
