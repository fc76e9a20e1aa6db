// src/handlers/profile.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::user::{UpdateProfilePayload, User},
};

// GET /api/user/profile: o próprio usuário da sessão.
pub async fn get_profile(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// PUT /api/user/profile: nome e, com a senha atual correta, nova senha.
pub async fn update_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<User>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let updated = app_state
        .user_service
        .update_profile(&user, &payload)
        .await?;
    Ok(Json(updated))
}
