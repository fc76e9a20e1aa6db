// src/handlers/books.rs

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
    models::book::{Book, BookFilters, CreateBookPayload, UpdateBookPayload},
};

// Os ids chegam como texto e são validados na borda: formato ruim é 400,
// nunca um 500 vindo do banco.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId)
}

pub async fn list_books(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filters): Query<BookFilters>,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = app_state.catalog_service.list_books(&user, &filters).await?;
    Ok(Json(books))
}

pub async fn create_book(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateBookPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let book = app_state.catalog_service.create_book(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn get_book(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&id)?;
    let book = app_state.catalog_service.get_book(&user, id).await?;
    Ok(Json(book))
}

pub async fn update_book(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBookPayload>,
) -> Result<Json<Book>, AppError> {
    let id = parse_id(&id)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let book = app_state
        .catalog_service
        .update_book(&user, id, &payload)
        .await?;
    Ok(Json(book))
}

pub async fn delete_book(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    app_state.catalog_service.delete_book(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
