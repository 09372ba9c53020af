//! Signup and login. Signup always creates a normal user; owner and admin
//! accounts come from the admin routes.
use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth, database,
    error::AppError,
    models::{PublicUser, UserRole},
    state::AppState,
    validate,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupPayload {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse, AppError> {
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
        UserRole::NormalUser,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    let user = database::user_by_email(&state.pool, &payload.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let token = auth::issue_token(&user, &state.config.jwt_secret, state.config.token_ttl_hours)?;

    Ok(Json(json!({
        "token": token,
        "user": PublicUser::from(user),
    })))
}
