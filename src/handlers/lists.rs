// src/handlers/lists.rs

use axum::{
    extract::{Path, Query, State},
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
    models::list::{CreateListPayload, List, ListFilters, UpdateListPayload},
};

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId)
}

pub async fn list_lists(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filters): Query<ListFilters>,
) -> Result<Json<Vec<List>>, AppError> {
    let lists = app_state.catalog_service.list_lists(&user, &filters).await?;
    Ok(Json(lists))
}

pub async fn create_list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateListPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let list = app_state.catalog_service.create_list(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn get_list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<List>, AppError> {
    let id = parse_id(&id)?;
    let list = app_state.catalog_service.get_list(&user, id).await?;
    Ok(Json(list))
}

pub async fn update_list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateListPayload>,
) -> Result<Json<List>, AppError> {
    let id = parse_id(&id)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let list = app_state
        .catalog_service
        .update_list(&user, id, &payload)
        .await?;
    Ok(Json(list))
}

// DELETE /api/lists/{id}/items/{book_id}: remove um livro da lista.
pub async fn remove_list_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, book_id)): Path<(String, String)>,
) -> Result<Json<List>, AppError> {
    let id = parse_id(&id)?;
    let book_id = parse_id(&book_id)?;

    let list = app_state
        .catalog_service
        .remove_list_item(&user, id, book_id)
        .await?;
    Ok(Json(list))
}

pub async fn delete_list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    app_state.catalog_service.delete_list(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
