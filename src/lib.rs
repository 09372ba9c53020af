//! Store rating platform backend.
//!
//! Three roles, three dashboards, one JSON API.
//!
//!
//!
//! # Roles
//!
//! - **Normal users** browse every store, see its average rating alongside
//!   their own, and submit a 1-5 star rating with an optional comment. A user
//!   gets exactly one rating per store; rating again overwrites it.
//! - **Store owners** see their store's average rating, the total number of
//!   ratings, and the individual ratings with who left them.
//! - **System admins** create users and stores and see platform-wide counts.
//!
//!
//!
//! # Auth
//!
//! - Signup creates a normal-user account with an argon2-hashed password
//! - Login returns a signed bearer token (HS256, `sub` + `role` + `exp`)
//! - Every other route extracts the identity from the `Authorization` header
//!   and checks the role for its group; anything off is a 401
//!
//!
//!
//! # Storage
//!
//! SQLite through sqlx. Three tables: `users`, `stores`, `ratings`, with a
//! unique index on ratings `(user_id, store_id)` backing the one-rating-per-
//! user-per-store rule. Schema is applied at startup.
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod validate;

use state::AppState;

/// Build the application router. Split out from [`start_server`] so tests can
/// drive the router directly.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/auth/signup", post(routes::auth::signup_handler))
        .route("/auth/login", post(routes::auth::login_handler))
        .route("/user/stores", get(routes::user::stores_handler))
        .route("/user/stores/{id}/rating", post(routes::user::rate_handler))
        .route(
            "/user/change-password",
            post(routes::user::change_password_handler),
        )
        .route("/store-owner/store", get(routes::owner::store_handler))
        .route("/store-owner/ratings", get(routes::owner::ratings_handler))
        .route(
            "/store-owner/change-password",
            post(routes::owner::change_password_handler),
        )
        .route("/admin/stats", get(routes::admin::stats_handler))
        .route(
            "/admin/users",
            get(routes::admin::users_handler).post(routes::admin::create_user_handler),
        )
        .route(
            "/admin/stores",
            get(routes::admin::stores_handler).post(routes::admin::create_store_handler),
        )
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
