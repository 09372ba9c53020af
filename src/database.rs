//! SQLite storage.
//!
//! Three tables. Ratings carry a unique index on `(user_id, store_id)` so a
//! user holds at most one rating per store; re-rating updates in place.
//!
//! Rows are built in Rust (uuid v4 ids, UTC timestamps) and inserted with
//! plain binds, so every write returns the exact row it stored.
use std::str::FromStr;

use chrono::Utc;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use uuid::Uuid;

use crate::models::{
    PublicUser, Rating, RatingRow, Stats, Store, StoreListing, StoreSummary, User, UserRole,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        address TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS stores (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        address TEXT NOT NULL,
        owner_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ratings (
        id TEXT PRIMARY KEY,
        rating INTEGER NOT NULL,
        comment TEXT,
        user_id TEXT NOT NULL REFERENCES users(id),
        store_id TEXT NOT NULL REFERENCES stores(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(user_id, store_id)
    )",
];

pub async fn init_pool(database_url: &str) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }

    Ok(pool)
}

// --- users ---

pub async fn user_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn user_by_id(pool: &SqlitePool, id: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    address: &str,
    password_hash: &str,
    role: UserRole,
) -> sqlx::Result<User> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        address: address.to_string(),
        role,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, address, role, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.address)
    .bind(user.role)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(user)
}

pub async fn update_password(
    pool: &SqlitePool,
    user_id: &str,
    password_hash: &str,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_users(pool: &SqlitePool) -> sqlx::Result<Vec<PublicUser>> {
    sqlx::query_as::<_, PublicUser>(
        "SELECT id, name, email, address, role, created_at
         FROM users ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn count_role(pool: &SqlitePool, role: UserRole) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(role)
        .fetch_one(pool)
        .await
}

// --- stores ---

pub async fn insert_store(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    address: &str,
    owner_id: &str,
) -> sqlx::Result<Store> {
    let store = Store {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        address: address.to_string(),
        owner_id: owner_id.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO stores (id, name, email, address, owner_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&store.id)
    .bind(&store.name)
    .bind(&store.email)
    .bind(&store.address)
    .bind(&store.owner_id)
    .bind(store.created_at)
    .execute(pool)
    .await?;

    Ok(store)
}

pub async fn store_exists(pool: &SqlitePool, store_id: &str) -> sqlx::Result<bool> {
    let id: Option<String> = sqlx::query_scalar("SELECT id FROM stores WHERE id = ?")
        .bind(store_id)
        .fetch_optional(pool)
        .await?;

    Ok(id.is_some())
}

pub async fn store_by_owner(pool: &SqlitePool, owner_id: &str) -> sqlx::Result<Option<Store>> {
    sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE owner_id = ? ORDER BY created_at LIMIT 1")
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

/// Every store, newest first, with its average and the caller's own rating.
pub async fn list_stores_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Vec<StoreListing>> {
    sqlx::query_as::<_, StoreListing>(
        "SELECT s.id, s.name, s.email, s.address,
                (SELECT AVG(rating) FROM ratings WHERE store_id = s.id) AS average_rating,
                (SELECT rating FROM ratings WHERE store_id = s.id AND user_id = ?) AS user_rating
         FROM stores s
         ORDER BY s.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn store_summary_by_owner(
    pool: &SqlitePool,
    owner_id: &str,
) -> sqlx::Result<Option<StoreSummary>> {
    sqlx::query_as::<_, StoreSummary>(
        "SELECT s.id, s.name, s.email, s.address,
                COALESCE(AVG(r.rating), 0.0) AS average_rating,
                COUNT(r.rating) AS total_ratings
         FROM stores s
         LEFT JOIN ratings r ON r.store_id = s.id
         WHERE s.owner_id = ?
         GROUP BY s.id
         ORDER BY s.created_at
         LIMIT 1",
    )
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_store_summaries(pool: &SqlitePool) -> sqlx::Result<Vec<StoreSummary>> {
    sqlx::query_as::<_, StoreSummary>(
        "SELECT s.id, s.name, s.email, s.address,
                COALESCE(AVG(r.rating), 0.0) AS average_rating,
                COUNT(r.rating) AS total_ratings
         FROM stores s
         LEFT JOIN ratings r ON r.store_id = s.id
         GROUP BY s.id
         ORDER BY s.created_at DESC",
    )
    .fetch_all(pool)
    .await
}

// --- ratings ---

pub async fn rating_by_user_store(
    pool: &SqlitePool,
    user_id: &str,
    store_id: &str,
) -> sqlx::Result<Option<Rating>> {
    sqlx::query_as::<_, Rating>("SELECT * FROM ratings WHERE user_id = ? AND store_id = ?")
        .bind(user_id)
        .bind(store_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_rating(
    pool: &SqlitePool,
    user_id: &str,
    store_id: &str,
    value: i64,
    comment: Option<&str>,
) -> sqlx::Result<Rating> {
    let now = Utc::now();
    let rating = Rating {
        id: Uuid::new_v4().to_string(),
        rating: value,
        comment: comment.map(str::to_string),
        user_id: user_id.to_string(),
        store_id: store_id.to_string(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO ratings (id, rating, comment, user_id, store_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&rating.id)
    .bind(rating.rating)
    .bind(&rating.comment)
    .bind(&rating.user_id)
    .bind(&rating.store_id)
    .bind(rating.created_at)
    .bind(rating.updated_at)
    .execute(pool)
    .await?;

    Ok(rating)
}

pub async fn update_rating(
    pool: &SqlitePool,
    existing: Rating,
    value: i64,
    comment: Option<&str>,
) -> sqlx::Result<Rating> {
    let updated = Rating {
        rating: value,
        comment: comment.map(str::to_string),
        updated_at: Utc::now(),
        ..existing
    };

    sqlx::query("UPDATE ratings SET rating = ?, comment = ?, updated_at = ? WHERE id = ?")
        .bind(updated.rating)
        .bind(&updated.comment)
        .bind(updated.updated_at)
        .bind(&updated.id)
        .execute(pool)
        .await?;

    Ok(updated)
}

/// Ratings for one store, newest first, rater name and email joined in.
pub async fn ratings_for_store(pool: &SqlitePool, store_id: &str) -> sqlx::Result<Vec<RatingRow>> {
    sqlx::query_as::<_, RatingRow>(
        "SELECT r.id, r.rating, r.comment, r.created_at,
                u.name AS user_name, u.email AS user_email
         FROM ratings r
         JOIN users u ON u.id = r.user_id
         WHERE r.store_id = ?
         ORDER BY r.created_at DESC",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
}

// --- admin ---

pub async fn stats(pool: &SqlitePool) -> sqlx::Result<Stats> {
    sqlx::query_as::<_, Stats>(
        "SELECT (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM stores) AS total_stores,
                (SELECT COUNT(*) FROM ratings) AS total_ratings",
    )
    .fetch_one(pool)
    .await
}
