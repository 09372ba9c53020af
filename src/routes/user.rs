//! Normal-user routes: the store list and rating submission.
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    database,
    error::AppError,
    models::{StoreListing, UserRole},
    state::AppState,
};

use super::{ChangePasswordPayload, change_password};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPayload {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

pub async fn stores_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<StoreListing>>, AppError> {
    auth.require(UserRole::NormalUser)?;

    let stores = database::list_stores_for_user(&state.pool, &auth.id).await?;

    Ok(Json(stores))
}

/// Submit or revise a rating. First rating for this store is a 201, revising
/// an existing one is a 200; either way the stored row is echoed back.
pub async fn rate_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(store_id): Path<String>,
    Json(payload): Json<RatingPayload>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(UserRole::NormalUser)?;

    let Some(value) = payload.rating.filter(|r| (1..=5).contains(r)) else {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    };

    if !database::store_exists(&state.pool, &store_id).await? {
        return Err(AppError::NotFound("Store"));
    }

    // Empty comments are stored as null, not as "".
    let comment = payload.comment.as_deref().filter(|c| !c.is_empty());

    match database::rating_by_user_store(&state.pool, &auth.id, &store_id).await? {
        Some(existing) => {
            let updated = database::update_rating(&state.pool, existing, value, comment).await?;
            Ok((StatusCode::OK, Json(updated)))
        }
        None => {
            let created =
                database::insert_rating(&state.pool, &auth.id, &store_id, value, comment).await?;
            Ok((StatusCode::CREATED, Json(created)))
        }
    }
}

pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(UserRole::NormalUser)?;

    change_password(&state, &auth.id, payload).await
}
