// src/handlers/stores.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::store::{CreateStorePayload, Store, UpdateStorePayload},
};

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId)
}

pub async fn list_stores(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Store>>, AppError> {
    let stores = app_state.tenancy_service.list_stores(&user).await?;
    Ok(Json(stores))
}

pub async fn create_store(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateStorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let store = app_state.tenancy_service.create_store(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

pub async fn get_store(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Store>, AppError> {
    let id = parse_id(&id)?;
    let store = app_state.tenancy_service.get_store(&user, id).await?;
    Ok(Json(store))
}

pub async fn update_store(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStorePayload>,
) -> Result<Json<Store>, AppError> {
    let id = parse_id(&id)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let store = app_state
        .tenancy_service
        .update_store(&user, id, &payload)
        .await?;
    Ok(Json(store))
}

pub async fn delete_store(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    app_state.tenancy_service.delete_store(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/stores/{id}/users/{user_id}: desvincula sem deletar o usuário.
pub async fn unassign_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((store_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let store_id = parse_id(&store_id)?;
    let user_id = parse_id(&user_id)?;

    app_state
        .tenancy_service
        .unassign_user(&user, store_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
