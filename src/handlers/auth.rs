// src/handlers/auth.rs

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{clear_session_cookie, session_cookie, AuthenticatedUser},
    models::auth::{AuthResponse, LoginPayload, SignupPayload, UserSummary},
    models::user::User,
};

/// O IP do cliente: atrás de proxy vem no X-Forwarded-For, senão é o
/// endereço da conexão.
pub fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string())
}

fn summarize(user: &User, company_name: Option<String>) -> UserSummary {
    UserSummary {
        id: user.id,
        email: user.email.clone(),
        name: user.full_name(),
        role: user.role,
        company_id: user.company_id,
        store_id: user.store_id,
        company_name,
    }
}

// Handler de login
pub async fn login(
    State(app_state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let ip = client_ip(&headers, &addr);
    let user = app_state
        .auth_service
        .login_user(&payload.email, &payload.password, &ip)
        .await?;

    // Desnormaliza o nome da empresa para a resposta.
    let company_name = if user.company_id.is_some() {
        Some(app_state.tenancy_service.get_company(&user).await?.name)
    } else {
        None
    };

    let token = app_state.auth_service.create_session_token(&user)?;
    let cookie = session_cookie(&app_state.config.session_cookie_name, &token);

    let body = AuthResponse {
        user: summarize(&user, company_name),
        redirect_url: "/dashboard".to_string(),
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)))
}

// Handler de signup: bootstrap do tenant inteiro, limitado por IP.
pub async fn signup(
    State(app_state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, &addr);
    if !app_state.signup_limiter.check(&ip).await {
        return Err(AppError::RateLimited);
    }

    payload.validate().map_err(AppError::ValidationError)?;

    // Validação de consistência manual, no mesmo formato de resposta.
    payload.validate_confirmation().map_err(|e| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("confirmPassword", e);
        AppError::ValidationError(errors)
    })?;

    let (user, company) = app_state.auth_service.signup(&payload).await?;

    let token = app_state.auth_service.create_session_token(&user)?;
    let cookie = session_cookie(&app_state.config.session_cookie_name, &token);

    let body = AuthResponse {
        user: summarize(&user, Some(company.name)),
        redirect_url: "/dashboard/settings/onboarding".to_string(),
    };

    Ok((StatusCode::CREATED, [(SET_COOKIE, cookie)], Json(body)))
}

// Handler de logout: destrói o cookie; idempotente. A rota aceita GET
// como apelido de POST para navegação por link.
pub async fn logout(State(app_state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_session_cookie(&app_state.config.session_cookie_name);
    ([(SET_COOKIE, cookie)], Json(json!({ "message": "Sessão encerrada." })))
}

// Handler da rota protegida /session: hidrata o front com o usuário atual.
pub async fn get_session(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<UserSummary>, AppError> {
    let company_name = if user.company_id.is_some() {
        Some(app_state.tenancy_service.get_company(&user).await?.name)
    } else {
        None
    };
    Ok(Json(summarize(&user, company_name)))
}
