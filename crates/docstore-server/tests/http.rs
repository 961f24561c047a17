//! End-to-end tests for the document routes over a real socket.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use docstore_core::time;
use docstore_server::dto::{CreateDocumentResponse, DocumentResponse};
use docstore_server::ServerConfig;
use reqwest::StatusCode;
use serde_json::json;

use common::{memory, spawn, spawn_with, SlowAdapter};

async fn create(client: &reqwest::Client, server: &common::TestServer, data: &str) -> String {
    let response = client
        .post(server.url("/base/create"))
        .json(&json!({ "Data": data }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json::<CreateDocumentResponse>().await.unwrap().id
}

#[tokio::test]
async fn test_ping() {
    let server = spawn(memory()).await;

    let response = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_then_get() {
    let server = spawn(memory()).await;
    let client = reqwest::Client::new();

    let id = create(&client, &server, "hello world").await;

    let response = client
        .get(server.url(&format!("/base/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );

    let raw: serde_json::Value = response.json().await.unwrap();
    assert_eq!(raw["id"], id.as_str());
    assert_eq!(raw["data"], "hello world");
    assert!(raw["createdAt"].is_string());
    assert!(raw.get("deletedAt").is_none());
}

#[tokio::test]
async fn test_create_accepts_lowercase_field() {
    let server = spawn(memory()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/base/create"))
        .json(&json!({ "data": "lower" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_without_data_is_400() {
    let server = spawn(memory()).await;
    let client = reqwest::Client::new();

    for body in [json!({}), json!({ "Data": "" })] {
        let response = client
            .post(server.url("/base/create"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.text().await.unwrap(), "missing parameters: Data");
    }
}

#[tokio::test]
async fn test_delete_then_get() {
    let server = spawn(memory()).await;
    let client = reqwest::Client::new();
    let id = create(&client, &server, "short-lived").await;

    let response = client
        .get(server.url(&format!("/base/delete/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().is_empty());

    let response = client
        .get(server.url(&format!("/base/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response
        .text()
        .await
        .unwrap()
        .starts_with("could not find document: "));

    // Deleting again is not an error.
    let response = client
        .get(server.url(&format!("/base/delete/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_id_is_400() {
    let server = spawn(memory()).await;
    let client = reqwest::Client::new();

    for path in ["/base/not-an-id", "/base/delete/not-an-id"] {
        let response = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
    }
}

#[tokio::test]
async fn test_list_since() {
    let server = spawn(memory()).await;
    let client = reqwest::Client::new();

    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(create(&client, &server, &format!("doc-{i}")).await);
    }

    let since = time::format_since(time::now() - ChronoDuration::hours(1));
    let response = client
        .get(server.url(&format!("/base/since/{since}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let docs: Vec<DocumentResponse> = response.json().await.unwrap();
    assert_eq!(docs.len(), 3);
    for id in &ids {
        assert!(docs.iter().any(|d| &d.id == id));
    }

    let future = time::format_since(time::now() + ChronoDuration::hours(1));
    let response = client
        .get(server.url(&format!("/base/since/{future}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "[]");
}

#[tokio::test]
async fn test_list_since_invalid_date() {
    let server = spawn(memory()).await;

    let response = reqwest::get(server.url("/base/since/yesterday")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "invalid date sent: yesterday");
}

#[tokio::test]
async fn test_list_since_accepts_encoded_and_fractional_dates() {
    let server = spawn(memory()).await;
    let client = reqwest::Client::new();
    create(&client, &server, "recent").await;

    for path in [
        "/base/since/2024-01-01T00%3A00%3A00Z",
        "/base/since/2024-01-01T00:00:00.5Z",
    ] {
        let response = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");

        let docs: Vec<DocumentResponse> = response.json().await.unwrap();
        assert_eq!(docs.len(), 1, "{path}");
        assert_eq!(docs[0].data, "recent");
    }
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let server = spawn(memory()).await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/nope/a/b")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "404 page not found");
}

#[tokio::test]
async fn test_wrong_method_is_405() {
    let server = spawn(memory()).await;
    let client = reqwest::Client::new();

    let response = client.put(server.url("/base/create")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "POST, GET");

    let response = client.delete(server.url("/base/abc")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "GET");
}

#[tokio::test]
async fn test_slow_handler_hits_write_timeout() {
    let adapter = Arc::new(SlowAdapter::new(Duration::from_secs(2)));
    let server = spawn_with(
        adapter,
        ServerConfig::builder().write_timeout(Duration::from_millis(100)),
        Duration::from_secs(1),
    )
    .await;

    let response = reqwest::get(server.url("/base/0190b5e4-8a3c-7a41-9d6e-3b1c2f0a9e11"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}
