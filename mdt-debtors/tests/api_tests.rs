//! Integration tests for the mdt-debtors HTTP API

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::util::ServiceExt;

use common::*;
use mdt_debtors::services::{IdentityResolver, PhoneCache, PhoneEnricher, RegistrySource};

/// Test helper: app over an in-memory store seeded with one debtor
async fn create_test_app(
    resolver: Arc<MockResolver>,
    registry: Arc<MockRegistry>,
) -> (axum::Router, sqlx::SqlitePool) {
    let pool = local_pool().await;

    sqlx::query("INSERT INTO debtors (id, name, identification) VALUES (1, 'Petrenko Ivan', '1234567890')")
        .execute(&pool)
        .await
        .expect("Failed to seed debtor");
    sqlx::query(
        "INSERT INTO debtor_debts (debtor_id, category, amount) VALUES (1, 'land_tax', 1520.75), (1, 'rent', 300.0)",
    )
    .execute(&pool)
    .await
    .expect("Failed to seed debts");

    let enricher = enricher(enabled_config(), &pool, resolver, registry);
    let state = mdt_debtors::AppState::new(pool.clone(), Arc::new(enricher));

    (mdt_debtors::build_router(state), pool)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = create_test_app(
        MockResolver::unresolved(),
        MockRegistry::new(RegistryBehavior::NotFound),
    )
    .await;

    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "mdt-debtors");
    assert_eq!(json["enrichment_enabled"], true);
}

#[tokio::test]
async fn test_debtor_lookup_includes_phone() {
    let registry = MockRegistry::with_phones(&["380501112233"]);
    let (app, pool) = create_test_app(MockResolver::resolving(42, "1234567890"), registry.clone()).await;

    let (status, json) = get_json(app, "/debtors/1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 1);
    assert_eq!(json["name"], "Petrenko Ivan");
    assert_eq!(json["debts"]["land_tax"], 1520.75);
    assert_eq!(json["phone"], serde_json::json!(["380501112233"]));
    assert_eq!(json["phone_count"], 1);
    assert_eq!(rows_for_client(&pool, 42).await, 1);
}

#[tokio::test]
async fn test_debtor_lookup_survives_registry_failure() {
    let (app, _pool) = create_test_app(
        MockResolver::resolving(42, "1234567890"),
        MockRegistry::new(RegistryBehavior::Timeout),
    )
    .await;

    let (status, json) = get_json(app, "/debtors/1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["phone"].is_null());
    assert_eq!(json["phone_count"], 0);
}

#[tokio::test]
async fn test_debtor_lookup_with_enrichment_disabled() {
    let pool = local_pool().await;
    sqlx::query("INSERT INTO debtors (id, name, identification) VALUES (5, 'Kovalenko Olha', '12345678')")
        .execute(&pool)
        .await
        .unwrap();

    let registry: Arc<dyn RegistrySource> = MockRegistry::new(RegistryBehavior::NotFound);
    let resolver: Option<Arc<dyn IdentityResolver>> = None;
    let mut config = enabled_config();
    config.remote_db_enabled = false;
    let enricher = PhoneEnricher::new(config, PhoneCache::new(pool.clone()), resolver, registry);
    let app = mdt_debtors::build_router(mdt_debtors::AppState::new(pool, Arc::new(enricher)));

    let (status, json) = get_json(app.clone(), "/debtors/5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["phone"].is_null());
    assert!(json["debts"].as_object().unwrap().is_empty());

    let (_, health) = get_json(app, "/health").await;
    assert_eq!(health["enrichment_enabled"], false);
}

#[tokio::test]
async fn test_debtor_not_found() {
    let (app, _pool) = create_test_app(
        MockResolver::unresolved(),
        MockRegistry::new(RegistryBehavior::NotFound),
    )
    .await;

    let (status, json) = get_json(app, "/debtors/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_debtor_id() {
    let (app, _pool) = create_test_app(
        MockResolver::unresolved(),
        MockRegistry::new(RegistryBehavior::NotFound),
    )
    .await;

    let (status, json) = get_json(app.clone(), "/debtors/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");

    let (status, _) = get_json(app, "/debtors/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cached_phone_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("mdt.db");

    let pool = mdt_common::db::init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO debtors (id, name, identification) VALUES (1, 'Petrenko Ivan', '1234567890')")
        .execute(&pool)
        .await
        .unwrap();

    let first = enricher(
        enabled_config(),
        &pool,
        MockResolver::resolving(42, "1234567890"),
        MockRegistry::with_phones(&["380501112233"]),
    );
    let app = mdt_debtors::build_router(mdt_debtors::AppState::new(pool.clone(), Arc::new(first)));
    let (status, _) = get_json(app, "/debtors/1").await;
    assert_eq!(status, StatusCode::OK);
    pool.close().await;

    // Reopen: the answer comes from the local cache alone
    let pool = mdt_common::db::init_database(&db_path).await.unwrap();
    let resolver = MockResolver::unresolved();
    let registry = MockRegistry::new(RegistryBehavior::Timeout);
    let second = enricher(enabled_config(), &pool, resolver.clone(), registry.clone());
    let app = mdt_debtors::build_router(mdt_debtors::AppState::new(pool, Arc::new(second)));

    let (status, json) = get_json(app, "/debtors/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phone"], serde_json::json!(["380501112233"]));
    assert_eq!(resolver.call_count(), 0);
    assert_eq!(registry.call_count(), 0);
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let (app, pool) = create_test_app(
        MockResolver::unresolved(),
        MockRegistry::new(RegistryBehavior::NotFound),
    )
    .await;
    sqlx::query("DROP TABLE debtor_debts").execute(&pool).await.unwrap();

    let (status, json) = get_json(app, "/debtors/1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "COMMON_ERROR");
}
