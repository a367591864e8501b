//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use season_cache::{
    api::create_router,
    cache::{keys, DurableStore},
    AppState, CacheConfig, CacheManager,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_state() -> AppState {
    let manager = CacheManager::with_durable(
        CacheConfig::default(),
        DurableStore::in_memory().expect("in-memory sqlite"),
    )
    .expect("valid default config");
    AppState::new(Arc::new(manager))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn app(state: &AppState) -> Router {
    create_router(state.clone())
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let state = create_test_state();

    let response = app(&state).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_empty_cache() {
    let state = create_test_state();

    let response = app(&state)
        .oneshot(get("/system/cache-stats"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["memoryItems"], 0);
    assert_eq!(json["sqliteItems"], 0);
    assert_eq!(json["memoryTTL"], 3600);
    assert_eq!(json["sqliteTTL"], 604800);
    assert_eq!(json["memoryHitRate"], 0.0);
}

#[tokio::test]
async fn test_stats_endpoint_counts_both_layers() {
    let state = create_test_state();
    let recipes = state.recipes();
    recipes
        .set_city("xian", &json!({"name": "Xi'an", "province": "Shaanxi"}))
        .unwrap();
    recipes
        .set_recipe_detail("r1", &json!({"title": "Roujiamo"}))
        .unwrap();

    let response = app(&state)
        .oneshot(get("/system/cache-stats"))
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["memoryItems"], 2);
    assert_eq!(json["sqliteItems"], 2);
}

#[tokio::test]
async fn test_stats_endpoint_after_close() {
    let state = create_test_state();
    state.cache.close().unwrap();

    let response = app(&state)
        .oneshot(get("/system/cache-stats"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "cache is closed");
}

// == Delete Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_invalidates_both_layers() {
    let state = create_test_state();
    let key = keys::recipe_detail_key("r42");
    state.cache.set(&key, b"{\"title\":\"Dumplings\"}".to_vec()).unwrap();

    let response = app(&state)
        .oneshot(delete(&format!("/cache/{}", key)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], key.as_str());
    assert!(json["message"].as_str().unwrap().contains("invalidated"));

    assert_eq!(state.cache.get(&key), None);
    assert_eq!(state.cache.stats().sqlite_items, 0);
}

#[tokio::test]
async fn test_delete_endpoint_absent_key() {
    let state = create_test_state();

    let response = app(&state)
        .oneshot(delete("/cache/recipe:missing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_endpoint_after_close() {
    let state = create_test_state();
    state.cache.close().unwrap();

    let response = app(&state)
        .oneshot(delete("/cache/recipe:r1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_delete_requires_delete_method() {
    let state = create_test_state();

    let response = app(&state).oneshot(get("/cache/recipe:r1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// == Unknown Routes ==

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let state = create_test_state();

    let response = app(&state).oneshot(get("/get/anything")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
