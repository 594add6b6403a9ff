//! Integration tests for the JSON API.
//!
//! Each test boots the router on a random port over a fresh in-memory
//! database and talks to it over HTTP.

use forensic_nexus_service::db::Db;
use forensic_nexus_service::{AppState, ServiceConfig, build_router};
use serde_json::{Value, json};
use std::sync::Arc;

async fn start_test_server() -> String {
    let db = Arc::new(Db::open(":memory:").unwrap());
    let state = Arc::new(AppState::new(db, ServiceConfig::default()));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn get(base: &str, path: &str) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .get(format!("{}{}", base, path))
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn post_json(base: &str, path: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}{}", base, path))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

fn ids(items: &Value) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_extended_health() {
    let base = start_test_server().await;
    let (status, body) = get(&base, "/api/health/extended").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["status"], "healthy");
    assert_eq!(data["memoryUsage"], 42.5);
    let latency = data["apiLatency"].as_u64().unwrap();
    assert!((10..60).contains(&latency));
    assert!(data["uptime"].as_u64().is_some());
    assert!(data["timestamp"].as_str().is_some());

    let metrics = data["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 6);
    assert_eq!(metrics[0]["time"], "00:00");
    assert_eq!(metrics[3]["requests"], 980);
}

// ============================================================================
// Semantic memory
// ============================================================================

#[tokio::test]
async fn test_memory_list_seeds_once() {
    let base = start_test_server().await;
    let (status, body) = get(&base, "/api/memory").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body["data"]["items"]), vec!["mem-001", "mem-002"]);
    assert!(body["data"]["cursor"].is_null());

    let (_, again) = get(&base, "/api/memory").await;
    assert_eq!(again["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_memory_pagination_follows_cursor() {
    let base = start_test_server().await;
    get(&base, "/api/memory").await;
    for i in 0..3 {
        let (status, _) = post_json(&base, "/api/memory", json!({ "content": format!("note {}", i) })).await;
        assert_eq!(status, 200);
    }

    let mut seen = Vec::new();
    let mut path = "/api/memory?limit=2".to_string();
    loop {
        let (status, body) = get(&base, &path).await;
        assert_eq!(status, 200);
        seen.extend(ids(&body["data"]["items"]));
        match body["data"]["cursor"].as_str() {
            Some(cursor) => path = format!("/api/memory?limit=2&cursor={}", cursor),
            None => break,
        }
    }
    assert_eq!(seen.len(), 5);
    assert_eq!(&seen[..2], &["mem-001".to_string(), "mem-002".to_string()]);
}

#[tokio::test]
async fn test_memory_bad_cursor_is_client_error() {
    let base = start_test_server().await;
    let (status, body) = get(&base, "/api/memory?cursor=garbage").await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_create_memory_defaults() {
    let base = start_test_server().await;
    let (status, body) = post_json(&base, "/api/memory", json!({ "content": "suspicious binary" })).await;
    assert_eq!(status, 200);

    let data = &body["data"];
    assert_eq!(data["content"], "suspicious binary");
    let vector = data["vector"].as_array().unwrap();
    assert_eq!(vector.len(), 4);
    assert!(vector.iter().all(|v| {
        let v = v.as_f64().unwrap();
        (0.0..1.0).contains(&v)
    }));
    assert_eq!(data["metadata"], json!({}));
    assert!(data["createdAt"].as_i64().unwrap() > 0);

    let id = data["id"].as_str().unwrap();
    let (status, fetched) = get(&base, &format!("/api/memory/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["data"]["content"], "suspicious binary");
}

#[tokio::test]
async fn test_create_memory_keeps_given_fields() {
    let base = start_test_server().await;
    let (status, body) = post_json(
        &base,
        "/api/memory",
        json!({
            "content": "lateral movement",
            "vector": [0.5, 0.25],
            "metadata": { "source": "edr" }
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["vector"], json!([0.5, 0.25]));
    assert_eq!(body["data"]["metadata"]["source"], "edr");
}

#[tokio::test]
async fn test_create_memory_requires_content() {
    let base = start_test_server().await;
    let (status, body) = post_json(&base, "/api/memory", json!({ "vector": [1.0] })).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "content required");

    let (status, _) = post_json(&base, "/api/memory", json!({ "content": "" })).await;
    assert_eq!(status, 400);

    // Only the seed set is present.
    let (_, list) = get(&base, "/api/memory").await;
    assert_eq!(ids(&list["data"]["items"]), vec!["mem-001", "mem-002"]);
}

#[tokio::test]
async fn test_memory_get_missing_is_not_found() {
    let base = start_test_server().await;
    let (status, body) = get(&base, "/api/memory/nope").await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_retrieve_ranks_by_dot_product() {
    let base = start_test_server().await;
    let (_, first) = post_json(&base, "/api/memory", json!({ "content": "x", "vector": [1, 0, 0, 0] })).await;
    post_json(&base, "/api/memory", json!({ "content": "y", "vector": [0, 1, 0, 0] })).await;
    let first_id = first["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &base,
        "/api/memory/retrieve",
        json!({ "vector": [1, 0, 0, 0], "limit": 1 }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body["data"]), vec![first_id]);

    let (_, repeat) = post_json(&base, "/api/memory/retrieve", json!({ "vector": [1, 0, 0, 0] })).await;
    let (_, again) = post_json(&base, "/api/memory/retrieve", json!({ "vector": [1, 0, 0, 0] })).await;
    assert_eq!(repeat["data"], again["data"]);
    assert_eq!(repeat["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_retrieve_validates_vector() {
    let base = start_test_server().await;
    let (status, body) = post_json(&base, "/api/memory/retrieve", json!({ "limit": 3 })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "valid query vector required");

    let (status, body) = post_json(&base, "/api/memory/retrieve", json!({ "vector": "not-an-array" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

// ============================================================================
// Checkpoints
// ============================================================================

#[tokio::test]
async fn test_checkpoints_seeded_newest_first() {
    let base = start_test_server().await;
    let (status, body) = get(&base, "/api/checkpoints").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body["data"]["items"]), vec!["cp-v1.0.1", "cp-v1.0.0"]);
}

#[tokio::test]
async fn test_checkpoint_created_later_listed_first() {
    let base = start_test_server().await;
    let (_, a) = post_json(&base, "/api/checkpoints", json!({ "name": "A" })).await;
    let (_, b) = post_json(&base, "/api/checkpoints", json!({ "name": "B", "description": "second" })).await;
    let a_id = a["data"]["id"].as_str().unwrap().to_string();
    let b_id = b["data"]["id"].as_str().unwrap().to_string();
    assert_ne!(a_id, b_id);
    assert!(a_id.starts_with("cp-"));
    assert_eq!(a["data"]["description"], "");
    assert_eq!(b["data"]["description"], "second");

    let hash = a["data"]["hash"].as_str().unwrap();
    assert_eq!(hash.len(), 32);
    assert!(!hash.contains('-'));

    let (_, list) = get(&base, "/api/checkpoints").await;
    let order = ids(&list["data"]["items"]);
    let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
    assert!(pos(&b_id) < pos(&a_id));

    let (status, fetched) = get(&base, &format!("/api/checkpoints/{}", b_id)).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["data"]["name"], "B");
}

#[tokio::test]
async fn test_newest_checkpoint_leads_first_page_past_page_size() {
    let base = start_test_server().await;
    get(&base, "/api/checkpoints").await;

    let mut created = Vec::new();
    for i in 0..120 {
        let (status, body) = post_json(&base, "/api/checkpoints", json!({ "name": format!("n{}", i) })).await;
        assert_eq!(status, 200);
        created.push(body["data"]["id"].as_str().unwrap().to_string());
    }
    let newest = created.last().unwrap().clone();

    let (status, first) = get(&base, "/api/checkpoints").await;
    assert_eq!(status, 200);
    let first_ids = ids(&first["data"]["items"]);
    assert_eq!(first_ids.len(), 100);
    assert_eq!(first_ids[0], newest);
    assert_eq!(first["data"]["items"][0]["name"], "n119");
    let cursor = first["data"]["cursor"].as_str().unwrap().to_string();

    let (status, second) = get(&base, &format!("/api/checkpoints?cursor={}", cursor)).await;
    assert_eq!(status, 200);
    let second_ids = ids(&second["data"]["items"]);
    assert!(second["data"]["cursor"].is_null());
    assert_eq!(second_ids.len(), 22);
    assert_eq!(&second_ids[20..], &["cp-v1.0.1".to_string(), "cp-v1.0.0".to_string()]);

    let mut all: Vec<String> = first_ids.into_iter().chain(second_ids).collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 122);
}

#[tokio::test]
async fn test_checkpoint_and_log_listing_honor_limit() {
    let base = start_test_server().await;
    let (status, first) = get(&base, "/api/checkpoints?limit=1").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&first["data"]["items"]), vec!["cp-v1.0.1"]);
    let cursor = first["data"]["cursor"].as_str().unwrap().to_string();

    let (_, second) = get(&base, &format!("/api/checkpoints?limit=1&cursor={}", cursor)).await;
    assert_eq!(ids(&second["data"]["items"]), vec!["cp-v1.0.0"]);
    assert!(second["data"]["cursor"].is_null());

    let (status, logs) = get(&base, "/api/logs?limit=1").await;
    assert_eq!(status, 200);
    assert_eq!(logs["data"]["items"].as_array().unwrap().len(), 1);
    assert!(logs["data"]["cursor"].as_str().is_some());

    let (status, _) = get(&base, "/api/logs?limit=many").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_checkpoint_requires_name() {
    let base = start_test_server().await;
    let (status, body) = post_json(&base, "/api/checkpoints", json!({ "description": "no name" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "name required");
}

#[tokio::test]
async fn test_rollback_is_acknowledged_without_changes() {
    let base = start_test_server().await;
    let (_, before) = get(&base, "/api/checkpoints").await;

    let (status, body) = post_json(&base, "/api/checkpoints/rollback", json!({ "id": "cp-x" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["restoredId"], "cp-x");
    assert_eq!(body["data"]["status"], "RECOVERY_COMPLETE");
    assert!(body["data"]["timestamp"].as_i64().is_some());

    let (_, after) = get(&base, "/api/checkpoints").await;
    assert_eq!(before["data"], after["data"]);
}

#[tokio::test]
async fn test_rollback_requires_id() {
    let base = start_test_server().await;
    let (status, body) = post_json(&base, "/api/checkpoints/rollback", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "checkpoint id required");
}

#[tokio::test]
async fn test_malformed_body_uses_envelope() {
    let base = start_test_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{}/api/checkpoints", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
}

// ============================================================================
// Audit logs
// ============================================================================

#[tokio::test]
async fn test_logs_newest_first() {
    let base = start_test_server().await;
    let (status, body) = get(&base, "/api/logs").await;
    assert_eq!(status, 200);
    let items = &body["data"]["items"];
    assert_eq!(ids(items), vec!["log-1", "log-2"]);
    assert_eq!(items[0]["status"], "success");
    assert_eq!(items[0]["action"], "RETRIEVE_MEMORY");
}
