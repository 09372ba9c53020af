//! Request handlers, grouped by role.
use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{database, error::AppError, state::AppState, validate};

pub mod admin;
pub mod auth;
pub mod owner;
pub mod user;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Shared by the user and store-owner change-password routes; the role gate
/// happens in the calling handler.
pub(crate) async fn change_password(
    state: &AppState,
    user_id: &str,
    payload: ChangePasswordPayload,
) -> Result<Json<Value>, AppError> {
    let (Some(current), Some(new)) = (
        payload.current_password.filter(|p| !p.is_empty()),
        payload.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Current password and new password are required".to_string(),
        ));
    };

    let user = database::user_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if !crate::auth::verify_password(&current, &user.password_hash) {
        return Err(AppError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }

    validate::password(&new)?;

    let hash = crate::auth::hash_password(&new)?;
    database::update_password(&state.pool, user_id, &hash).await?;

    Ok(Json(json!({ "message": "Password updated successfully" })))
}
