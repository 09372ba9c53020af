//! Admin routes: platform stats plus user and store management.
use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::{
    auth, database,
    error::AppError,
    models::{PublicUser, Stats, StoreSummary, UserRole},
    state::AppState,
    validate,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStorePayload {
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_email: String,
}

pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    auth: auth::AuthUser,
) -> Result<Json<Stats>, AppError> {
    auth.require(UserRole::SystemAdmin)?;

    Ok(Json(database::stats(&state.pool).await?))
}

pub async fn users_handler(
    State(state): State<Arc<AppState>>,
    auth: auth::AuthUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    auth.require(UserRole::SystemAdmin)?;

    Ok(Json(database::list_users(&state.pool).await?))
}

pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    auth: auth::AuthUser,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(UserRole::SystemAdmin)?;

    validate::account(
        &payload.name,
        &payload.email,
        &payload.address,
        &payload.password,
    )?;

    if database::user_by_email(&state.pool, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::EmailTaken);
    }

    let hash = auth::hash_password(&payload.password)?;

    let user = database::insert_user(
        &state.pool,
        payload.name.trim(),
        &payload.email,
        &payload.address,
        &hash,
        payload.role,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

pub async fn stores_handler(
    State(state): State<Arc<AppState>>,
    auth: auth::AuthUser,
) -> Result<Json<Vec<StoreSummary>>, AppError> {
    auth.require(UserRole::SystemAdmin)?;

    Ok(Json(database::list_store_summaries(&state.pool).await?))
}

/// Create a store and attach it to an existing store-owner account by email.
pub async fn create_store_handler(
    State(state): State<Arc<AppState>>,
    auth: auth::AuthUser,
    Json(payload): Json<CreateStorePayload>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(UserRole::SystemAdmin)?;

    validate::name(&payload.name)?;
    validate::email(&payload.email)?;
    validate::address(&payload.address)?;

    let owner = database::user_by_email(&state.pool, &payload.owner_email)
        .await?
        .filter(|user| user.role == UserRole::StoreOwner)
        .ok_or_else(|| {
            AppError::Validation("Owner must be an existing store owner account".to_string())
        })?;

    let store = database::insert_store(
        &state.pool,
        payload.name.trim(),
        &payload.email,
        &payload.address,
        &owner.id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(store)))
}
