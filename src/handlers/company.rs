// src/handlers/company.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::company::{Company, UpdateCompanyPayload},
};

// GET /api/company: os dados do tenant da sessão (inclui status e
// fim do trial, que o painel exibe).
pub async fn get_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Company>, AppError> {
    let company = app_state.tenancy_service.get_company(&user).await?;
    Ok(Json(company))
}

// PUT /api/company: restrito ao companyAdmin (e ao admin da plataforma).
pub async fn update_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<Json<Company>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let company = app_state
        .tenancy_service
        .update_company(&user, &payload)
        .await?;
    Ok(Json(company))
}
