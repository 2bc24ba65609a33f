//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for each endpoint against a
//! temporary SQLite database and an in-process cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use student_api::cache::{Cache, CacheCommand, CacheError, CacheResult, MemoryCache};
use student_api::storage::{SqliteStorage, Storage};
use student_api::{create_router, AppState, CacheSettings};
use tempfile::TempDir;
use tower::ServiceExt;

// == Helper Functions ==

struct TestApp {
    router: Router,
    cache: MemoryCache,
    storage: Arc<SqliteStorage>,
    _dir: TempDir,
}

async fn create_test_app_with_ttl(ttl: Duration) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(
        SqliteStorage::connect(dir.path().join("students.db"), 4)
            .await
            .unwrap(),
    );
    let cache = MemoryCache::new(100);
    let state = AppState::new(
        storage.clone(),
        Arc::new(cache.clone()),
        CacheSettings {
            ttl,
            op_timeout: Duration::from_millis(500),
        },
    );
    TestApp {
        router: create_router(state, Duration::from_secs(30)),
        cache,
        storage,
        _dir: dir,
    }
}

async fn create_test_app() -> TestApp {
    create_test_app_with_ttl(Duration::from_secs(600)).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Polls until the background cache writes have produced the expected state.
async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("cache never reached the expected state");
}

async fn cached_hash(cache: &MemoryCache, key: &str) -> Option<HashMap<String, String>> {
    cache.hash_get_all(key).await.unwrap()
}

const ANA: &str = r#"{"name":"Ana","email":"ana@x.com","age":21}"#;
const BOB: &str = r#"{"name":"Bob","email":"bob@x.com","age":30}"#;

// == Create ==

#[tokio::test]
async fn test_create_returns_assigned_id() {
    let app = create_test_app().await;

    let (status, json) = send(&app.router, "POST", "/api/students", Some(ANA)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json, json!({"status": "OK", "student_id": 1}));

    let (_, json) = send(&app.router, "POST", "/api/students", Some(BOB)).await;
    assert_eq!(json["student_id"], 2);
}

#[tokio::test]
async fn test_create_empty_body() {
    let app = create_test_app().await;

    let (status, json) = send(&app.router, "POST", "/api/students", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"status": "Error", "error": "empty body"}));
}

#[tokio::test]
async fn test_create_malformed_json() {
    let app = create_test_app().await;

    let (status, json) = send(&app.router, "POST", "/api/students", Some("{\"name\":")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "Error");
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = create_test_app().await;

    let (status, json) = send(
        &app.router,
        "POST",
        "/api/students",
        Some(r#"{"name":"Ana","email":"not-an-email","age":200}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "Error");
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "age"]);
    assert!(app.storage.get_students().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_duplicate_email_keeps_store_unchanged() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;

    let (status, json) = send(
        &app.router,
        "POST",
        "/api/students",
        Some(r#"{"name":"Other","email":"ana@x.com","age":40}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "Error");
    let stored = app.storage.get_students().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Ana");
}

// == Read ==

#[tokio::test]
async fn test_get_student_exact_body() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;

    let (status, json) = send(&app.router, "GET", "/api/students/1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "status": "OK",
            "student": {"id": 1, "name": "Ana", "email": "ana@x.com", "age": 21}
        })
    );
}

#[tokio::test]
async fn test_get_nonexistent_student() {
    let app = create_test_app().await;

    let (status, json) = send(&app.router, "GET", "/api/students/999", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({"status": "Error", "error": "student not found"}));
}

#[tokio::test]
async fn test_get_invalid_id() {
    let app = create_test_app().await;

    let (status, json) = send(&app.router, "GET", "/api/students/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "Error");
}

#[tokio::test]
async fn test_create_populates_cache() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;

    eventually(|| async { cached_hash(&app.cache, "student:1").await.is_some() }).await;

    let fields = cached_hash(&app.cache, "student:1").await.unwrap();
    assert_eq!(fields["name"], "Ana");
    assert_eq!(fields["email"], "ana@x.com");
    assert_eq!(fields["age"], "21");
    assert_eq!(fields["id"], "1");
    let ttl = app.cache.ttl_remaining("student:1").await.unwrap();
    assert!(ttl > Duration::from_secs(590) && ttl <= Duration::from_secs(600));
}

#[tokio::test]
async fn test_get_serves_cached_copy() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;
    eventually(|| async { cached_hash(&app.cache, "student:1").await.is_some() }).await;

    // Only the cache knows this name; a hit must return it
    app.cache
        .execute(&[CacheCommand::HashSet {
            key: "student:1".to_string(),
            fields: vec![("name".to_string(), "Cached Ana".to_string())],
            ttl: Duration::from_secs(60),
        }])
        .await
        .unwrap();

    let (_, json) = send(&app.router, "GET", "/api/students/1", None).await;
    assert_eq!(json["student"]["name"], "Cached Ana");
}

#[tokio::test]
async fn test_get_miss_repopulates_cache() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;
    eventually(|| async { cached_hash(&app.cache, "student:1").await.is_some() }).await;

    app.cache
        .execute(&[CacheCommand::Delete {
            key: "student:1".to_string(),
        }])
        .await
        .unwrap();

    let (status, json) = send(&app.router, "GET", "/api/students/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["student"]["name"], "Ana");

    eventually(|| async { cached_hash(&app.cache, "student:1").await.is_some() }).await;
}

// == List ==

#[tokio::test]
async fn test_list_empty() {
    let app = create_test_app().await;

    let (status, json) = send(&app.router, "GET", "/api/students/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "OK", "students": []}));
}

#[tokio::test]
async fn test_list_in_id_order_and_cached() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;
    send(&app.router, "POST", "/api/students", Some(BOB)).await;
    eventually(|| async { cached_hash(&app.cache, "student:2").await.is_some() }).await;

    let (status, json) = send(&app.router, "GET", "/api/students/", None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["students"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ana", "Bob"]);

    eventually(|| async { app.cache.get("students_list").await.unwrap().is_some() }).await;
    let snapshot: Value =
        serde_json::from_str(&app.cache.get("students_list").await.unwrap().unwrap()).unwrap();
    assert_eq!(snapshot, json["students"]);
}

#[tokio::test]
async fn test_list_reflects_writes() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;
    eventually(|| async { cached_hash(&app.cache, "student:1").await.is_some() }).await;

    send(&app.router, "GET", "/api/students/", None).await;
    eventually(|| async { app.cache.get("students_list").await.unwrap().is_some() }).await;

    send(&app.router, "POST", "/api/students", Some(BOB)).await;
    eventually(|| async { app.cache.get("students_list").await.unwrap().is_none() }).await;

    let (_, json) = send(&app.router, "GET", "/api/students/", None).await;
    assert_eq!(json["students"].as_array().unwrap().len(), 2);
    eventually(|| async { app.cache.get("students_list").await.unwrap().is_some() }).await;

    send(&app.router, "DELETE", "/api/students/1", None).await;
    eventually(|| async { app.cache.get("students_list").await.unwrap().is_none() }).await;

    let (_, json) = send(&app.router, "GET", "/api/students/", None).await;
    assert_eq!(json["students"], json!([{"id": 2, "name": "Bob", "email": "bob@x.com", "age": 30}]));
}

#[tokio::test]
async fn test_stale_list_snapshot_expires_with_ttl() {
    let app = create_test_app_with_ttl(Duration::from_millis(300)).await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;
    eventually(|| async { cached_hash(&app.cache, "student:1").await.is_some() }).await;

    // A list read that raced a write and stored its snapshot last
    app.cache
        .execute(&[CacheCommand::Set {
            key: "students_list".to_string(),
            value: "[]".to_string(),
            ttl: Duration::from_millis(300),
        }])
        .await
        .unwrap();

    let (_, json) = send(&app.router, "GET", "/api/students/", None).await;
    assert_eq!(json["students"], json!([]));

    tokio::time::sleep(Duration::from_millis(400)).await;

    let (_, json) = send(&app.router, "GET", "/api/students/", None).await;
    assert_eq!(json["students"].as_array().unwrap().len(), 1);
}

// == Update ==

#[tokio::test]
async fn test_partial_update_preserves_fields() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;

    let (status, json) = send(&app.router, "PUT", "/api/students/1", Some(r#"{"age":22}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "OK", "student_id": 1}));

    let stored = app.storage.get_student_by_id(1).await.unwrap();
    assert_eq!(stored.name, "Ana");
    assert_eq!(stored.email, "ana@x.com");
    assert_eq!(stored.age, 22);

    // The cached copy may lag until the update's refresh lands
    eventually(|| async {
        let (_, json) = send(&app.router, "GET", "/api/students/1", None).await;
        json["student"] == json!({"id": 1, "name": "Ana", "email": "ana@x.com", "age": 22})
    })
    .await;
}

#[tokio::test]
async fn test_update_malformed_body_rejected_before_lookup() {
    let app = create_test_app().await;

    let (status, json) = send(&app.router, "PUT", "/api/students/7", Some("{\"age\":")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "Error");
}

#[tokio::test]
async fn test_update_refreshes_cached_record() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;
    eventually(|| async { cached_hash(&app.cache, "student:1").await.is_some() }).await;

    send(&app.router, "PUT", "/api/students/1", Some(r#"{"name":"Ana Maria"}"#)).await;

    eventually(|| async {
        cached_hash(&app.cache, "student:1")
            .await
            .is_some_and(|fields| fields["name"] == "Ana Maria")
    })
    .await;
    let fields = cached_hash(&app.cache, "student:1").await.unwrap();
    assert_eq!(fields["age"], "21");
}

#[tokio::test]
async fn test_update_empty_body_is_noop() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;

    let (status, _) = send(&app.router, "PUT", "/api/students/1", None).await;

    assert_eq!(status, StatusCode::OK);
    let stored = app.storage.get_student_by_id(1).await.unwrap();
    assert_eq!(stored.name, "Ana");
    assert_eq!(stored.age, 21);
}

#[tokio::test]
async fn test_update_nonexistent_student() {
    let app = create_test_app().await;

    let (status, json) = send(&app.router, "PUT", "/api/students/7", Some(r#"{"age":22}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "student not found");
}

#[tokio::test]
async fn test_update_invalid_field() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;

    let (status, json) = send(&app.router, "PUT", "/api/students/1", Some(r#"{"email":"broken"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "email");
    assert_eq!(
        app.storage.get_student_by_id(1).await.unwrap().email,
        "ana@x.com"
    );
}

#[tokio::test]
async fn test_update_duplicate_email_keeps_store_unchanged() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;
    send(&app.router, "POST", "/api/students", Some(BOB)).await;

    let (status, _) = send(
        &app.router,
        "PUT",
        "/api/students/2",
        Some(r#"{"email":"ana@x.com"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        app.storage.get_student_by_id(2).await.unwrap().email,
        "bob@x.com"
    );
}

// == Delete ==

#[tokio::test]
async fn test_delete_twice() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;

    let (status, json) = send(&app.router, "DELETE", "/api/students/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "OK", "msg": "student deleted successfully"}));

    let (status, json) = send(&app.router, "DELETE", "/api/students/1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "student not found");
}

#[tokio::test]
async fn test_delete_evicts_cache_and_get_fails() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;
    eventually(|| async { cached_hash(&app.cache, "student:1").await.is_some() }).await;

    send(&app.router, "DELETE", "/api/students/1", None).await;
    eventually(|| async { cached_hash(&app.cache, "student:1").await.is_none() }).await;

    let (status, _) = send(&app.router, "GET", "/api/students/1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_ids_not_reused_after_delete() {
    let app = create_test_app().await;
    send(&app.router, "POST", "/api/students", Some(ANA)).await;
    send(&app.router, "DELETE", "/api/students/1", None).await;

    let (_, json) = send(&app.router, "POST", "/api/students", Some(BOB)).await;
    assert_eq!(json["student_id"], 2);
}

// == Cache Failures ==

/// Backend whose every call fails, as if Redis were unreachable.
struct BrokenCache;

#[async_trait]
impl Cache for BrokenCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn hash_get_all(&self, _key: &str) -> CacheResult<Option<HashMap<String, String>>> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn execute(&self, _commands: &[CacheCommand]) -> CacheResult<()> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_broken_cache_never_changes_results() {
    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteStorage::connect(dir.path().join("students.db"), 2)
        .await
        .unwrap();
    let state = AppState::new(
        Arc::new(storage),
        Arc::new(BrokenCache),
        CacheSettings::default(),
    );
    let router = create_router(state, Duration::from_secs(30));

    let (status, json) = send(&router, "POST", "/api/students", Some(ANA)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["student_id"], 1);

    let (status, json) = send(&router, "GET", "/api/students/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["student"]["email"], "ana@x.com");

    let (status, json) = send(&router, "PUT", "/api/students/1", Some(r#"{"age":25}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["student_id"], 1);

    let (status, json) = send(&router, "GET", "/api/students/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["students"][0]["age"], 25);

    let (status, _) = send(&router, "DELETE", "/api/students/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cache"], "down");
    assert_eq!(json["storage"], "up");
}

// == Health ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app().await;

    let (status, json) = send(&app.router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "OK");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_health_reports_closed_storage() {
    let app = create_test_app().await;
    app.storage.close().await;

    let (status, json) = send(&app.router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "Error");
    assert_eq!(json["storage"], "down");
}
