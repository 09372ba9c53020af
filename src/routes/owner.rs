//! Store-owner routes: the store summary and its individual ratings.
use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    auth::AuthUser,
    database,
    error::AppError,
    models::{RatingEntry, StoreSummary, UserRole},
    state::AppState,
};

use super::{ChangePasswordPayload, change_password};

/// The owner's store with its average and rating count. Owners without a
/// store get a null body, which the dashboard treats as "no store yet".
pub async fn store_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Option<StoreSummary>>, AppError> {
    auth.require(UserRole::StoreOwner)?;

    let summary = database::store_summary_by_owner(&state.pool, &auth.id).await?;

    Ok(Json(summary))
}

pub async fn ratings_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<RatingEntry>>, AppError> {
    auth.require(UserRole::StoreOwner)?;

    let Some(store) = database::store_by_owner(&state.pool, &auth.id).await? else {
        return Ok(Json(Vec::new()));
    };

    let ratings = database::ratings_for_store(&state.pool, &store.id)
        .await?
        .into_iter()
        .map(RatingEntry::from)
        .collect();

    Ok(Json(ratings))
}

pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(UserRole::StoreOwner)?;

    change_password(&state, &auth.id, payload).await
}
