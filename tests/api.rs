//! End-to-end API tests against a temp-file SQLite database.
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use storeratings::{app, auth, config::Config, database, models::UserRole, state::AppState};

async fn test_app() -> (Router, Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let database_url = format!("sqlite://{}", dir.path().join("test.db").display());
    let pool = database::init_pool(&database_url).await.unwrap();

    let state = Arc::new(AppState {
        config: Config {
            port: 0,
            database_url,
            jwt_secret: "integration-test-secret".to_string(),
            token_ttl_hours: 24,
        },
        pool,
    });

    (app(state.clone()), state, dir)
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);

    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(value) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

const SEED_PASSWORD: &str = "seed-password-1";

/// Insert an account directly and hand back a valid bearer token for it.
async fn seed_user(state: &AppState, name: &str, email: &str, role: UserRole) -> String {
    let hash = auth::hash_password(SEED_PASSWORD).unwrap();

    let user = database::insert_user(&state.pool, name, email, "1 Seed Street", &hash, role)
        .await
        .unwrap();

    auth::issue_token(&user, &state.config.jwt_secret, 24).unwrap()
}

async fn seed_store(app: &Router, admin_token: &str, owner_email: &str) -> String {
    let (status, store) = send(
        app,
        "POST",
        "/admin/stores",
        Some(admin_token),
        Some(json!({
            "name": "Corner Grocer",
            "email": "shop@corner.example",
            "address": "5 Market Square",
            "ownerEmail": owner_email,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store["name"], "Corner Grocer");

    store["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_signup_and_login() {
    let (app, _state, _dir) = test_app().await;

    let payload = json!({
        "name": "Alice Example",
        "email": "alice@example.com",
        "address": "12 Elm Street",
        "password": "hunter2hunter2",
    });

    let (status, user) = send(&app, "POST", "/auth/signup", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "NORMAL_USER");
    assert_eq!(user["email"], "alice@example.com");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password_hash").is_none());

    // Same email again
    let (status, body) = send(&app, "POST", "/auth/signup", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");

    // Broken field
    let (status, body) = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "name": "Bob Example",
            "email": "not-an-email",
            "address": "12 Elm Street",
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "A valid email address is required");

    let (status, _body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "alice@example.com");

    let token = body["token"].as_str().unwrap();
    let (status, stores) = send(&app, "GET", "/user/stores", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stores, json!([]));
}

#[tokio::test]
async fn test_rating_lifecycle() {
    let (app, state, _dir) = test_app().await;

    let admin = seed_user(&state, "Admin", "admin@example.com", UserRole::SystemAdmin).await;
    let _owner = seed_user(&state, "Owner", "owner@example.com", UserRole::StoreOwner).await;
    let alice = seed_user(&state, "Alice", "alice@example.com", UserRole::NormalUser).await;
    let bob = seed_user(&state, "Bob", "bob@example.com", UserRole::NormalUser).await;

    let store_id = seed_store(&app, &admin, "owner@example.com").await;
    let rate_path = format!("/user/stores/{store_id}/rating");

    // Out-of-range and missing values are rejected before any lookup
    for bad in [json!({ "rating": 0 }), json!({ "rating": 6 }), json!({})] {
        let (status, body) = send(&app, "POST", &rate_path, Some(&alice), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Rating must be between 1 and 5");
    }

    // Unknown store
    let (status, body) = send(
        &app,
        "POST",
        "/user/stores/does-not-exist/rating",
        Some(&alice),
        Some(json!({ "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Store not found");

    // First rating creates
    let (status, rating) = send(
        &app,
        "POST",
        &rate_path,
        Some(&alice),
        Some(json!({ "rating": 4, "comment": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rating["rating"], 4);
    assert_eq!(rating["comment"], Value::Null);

    let (status, stores) = send(&app, "GET", "/user/stores", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stores[0]["averageRating"], 4.0);
    assert_eq!(stores[0]["userRating"], 4);

    // Rating again revises in place
    let (status, rating) = send(
        &app,
        "POST",
        &rate_path,
        Some(&alice),
        Some(json!({ "rating": 2, "comment": "went downhill" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rating["rating"], 2);
    assert_eq!(rating["comment"], "went downhill");

    // Second rater moves the average; one row per (user, store) holds
    let (status, _rating) = send(
        &app,
        "POST",
        &rate_path,
        Some(&bob),
        Some(json!({ "rating": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_status, stores) = send(&app, "GET", "/user/stores", Some(&bob), None).await;
    assert_eq!(stores.as_array().unwrap().len(), 1);
    assert_eq!(stores[0]["averageRating"], 3.0);
    assert_eq!(stores[0]["userRating"], 4);
}

#[tokio::test]
async fn test_owner_dashboard() {
    let (app, state, _dir) = test_app().await;

    let admin = seed_user(&state, "Admin", "admin@example.com", UserRole::SystemAdmin).await;
    let owner = seed_user(&state, "Owner", "owner@example.com", UserRole::StoreOwner).await;
    let alice = seed_user(&state, "Alice", "alice@example.com", UserRole::NormalUser).await;
    let bob = seed_user(&state, "Bob", "bob@example.com", UserRole::NormalUser).await;

    // No store yet: null summary, empty ratings
    let (status, body) = send(&app, "GET", "/store-owner/store", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, "GET", "/store-owner/ratings", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let store_id = seed_store(&app, &admin, "owner@example.com").await;

    // Fresh store reports average 0 over 0 ratings
    let (_status, summary) = send(&app, "GET", "/store-owner/store", Some(&owner), None).await;
    assert_eq!(summary["averageRating"], 0.0);
    assert_eq!(summary["totalRatings"], 0);

    let rate_path = format!("/user/stores/{store_id}/rating");
    send(
        &app,
        "POST",
        &rate_path,
        Some(&alice),
        Some(json!({ "rating": 2, "comment": "meh" })),
    )
    .await;
    send(
        &app,
        "POST",
        &rate_path,
        Some(&bob),
        Some(json!({ "rating": 4 })),
    )
    .await;

    let (status, summary) = send(&app, "GET", "/store-owner/store", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["averageRating"], 3.0);
    assert_eq!(summary["totalRatings"], 2);

    let (status, ratings) = send(&app, "GET", "/store-owner/ratings", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let ratings = ratings.as_array().unwrap();
    assert_eq!(ratings.len(), 2);

    let alice_entry = ratings
        .iter()
        .find(|r| r["user"]["email"] == "alice@example.com")
        .unwrap();
    assert_eq!(alice_entry["rating"], 2);
    assert_eq!(alice_entry["comment"], "meh");
    assert_eq!(alice_entry["user"]["name"], "Alice");

    // Wrong role on an owner route
    let (status, _body) = send(&app, "GET", "/store-owner/store", Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_flow() {
    let (app, state, _dir) = test_app().await;

    let token = seed_user(&state, "Alice", "alice@example.com", UserRole::NormalUser).await;

    let (status, body) = send(
        &app,
        "POST",
        "/user/change-password",
        Some(&token),
        Some(json!({ "currentPassword": "", "newPassword": "fresh-password-9" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password and new password are required");

    let (status, body) = send(
        &app,
        "POST",
        "/user/change-password",
        Some(&token),
        Some(json!({ "currentPassword": "not-it", "newPassword": "fresh-password-9" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, body) = send(
        &app,
        "POST",
        "/user/change-password",
        Some(&token),
        Some(json!({ "currentPassword": SEED_PASSWORD, "newPassword": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be between 8 and 64 characters");

    let (status, body) = send(
        &app,
        "POST",
        "/user/change-password",
        Some(&token),
        Some(json!({ "currentPassword": SEED_PASSWORD, "newPassword": "fresh-password-9" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password updated successfully");

    let (status, _body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": SEED_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "fresh-password-9" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes() {
    let (app, state, _dir) = test_app().await;

    let admin = seed_user(&state, "Admin", "admin@example.com", UserRole::SystemAdmin).await;

    // Admin creates a store owner account
    let (status, created) = send(
        &app,
        "POST",
        "/admin/users",
        Some(&admin),
        Some(json!({
            "name": "Olive Owner",
            "email": "owner@example.com",
            "address": "5 Market Square",
            "password": "owner-password-1",
            "role": "STORE_OWNER",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "STORE_OWNER");

    // That account can actually log in
    let (status, _body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "owner@example.com", "password": "owner-password-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Store creation demands a store-owner account behind ownerEmail
    let (status, body) = send(
        &app,
        "POST",
        "/admin/stores",
        Some(&admin),
        Some(json!({
            "name": "Corner Grocer",
            "email": "shop@corner.example",
            "address": "5 Market Square",
            "ownerEmail": "admin@example.com",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Owner must be an existing store owner account");

    seed_store(&app, &admin, "owner@example.com").await;

    let (status, users) = send(&app, "GET", "/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));

    let (status, stores) = send(&app, "GET", "/admin/stores", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stores[0]["averageRating"], 0.0);
    assert_eq!(stores[0]["totalRatings"], 0);

    let (status, stats) = send(&app, "GET", "/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalStores"], 1);
    assert_eq!(stats["totalRatings"], 0);
}

#[tokio::test]
async fn test_auth_guard() {
    let (app, state, _dir) = test_app().await;

    let owner = seed_user(&state, "Owner", "owner@example.com", UserRole::StoreOwner).await;

    // No token
    let (status, _body) = send(&app, "GET", "/user/stores", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Garbage token
    let (status, _body) = send(&app, "GET", "/user/stores", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid token, wrong role
    let (status, _body) = send(&app, "GET", "/admin/stats", Some(&owner), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _body) = send(&app, "GET", "/user/stores", Some(&owner), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
