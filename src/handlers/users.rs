// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::user::{CreateUserPayload, StatusActionPayload, UpdateUserPayload, User},
};

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    // Honrado apenas para o admin da plataforma.
    pub company_id: Option<Uuid>,
}

pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(params): Query<UserListParams>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = app_state
        .user_service
        .list_users(&user, params.company_id)
        .await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let created = app_state.user_service.create_user(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id)?;
    let target = app_state.user_service.get_user(&user, id).await?;
    Ok(Json(target))
}

pub async fn update_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let updated = app_state
        .user_service
        .update_user(&user, id, &payload)
        .await?;
    Ok(Json(updated))
}

// PATCH /api/users/{id}/status com body {"action": "..."}
pub async fn change_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<StatusActionPayload>,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id)?;
    let updated = app_state
        .user_service
        .change_status(&user, id, payload.action)
        .await?;
    Ok(Json(updated))
}

// DELETE /api/users/{id}: soft delete. POST /api/users/{id}/delete é
// um apelido para clientes que não enviam DELETE.
pub async fn soft_delete_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    app_state.user_service.soft_delete_user(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
