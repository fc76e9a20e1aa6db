// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{common::error::AppError, config::AppState, models::user::User};

// Atributos do cookie de sessão: protegido de script e de cross-site,
// com a mesma vida útil dos claims (2 horas).
const COOKIE_MAX_AGE_SECS: i64 = 2 * 60 * 60;

pub fn session_cookie(name: &str, token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        name, token, COOKIE_MAX_AGE_SECS
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", name)
}

async fn authenticate(app_state: &AppState, jar: &CookieJar) -> Result<User, AppError> {
    let token = jar
        .get(&app_state.config.session_cookie_name)
        .map(|cookie| cookie.value().to_owned())
        .ok_or(AppError::InvalidSession)?;

    let claims = app_state.auth_service.validate_session_token(&token)?;
    app_state.auth_service.revalidate_user(claims.sub).await
}

// O middleware de sessão: lê o cookie, valida os claims assinados e
// RE-BUSCA o usuário no banco. O cookie é um cache da identidade: um
// usuário deletado ou suspenso é cortado na requisição seguinte, com o
// cookie inválido destruído na resposta.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&app_state, &jar).await {
        Ok(user) => {
            // Insere o usuário nos "extensions" da requisição
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            let mut response = err.into_response();
            if response.status() == StatusCode::UNAUTHORIZED {
                let cookie = clear_session_cookie(&app_state.config.session_cookie_name);
                if let Ok(value) = HeaderValue::from_str(&cookie) {
                    response.headers_mut().append(SET_COOKIE, value);
                }
            }
            response
        }
    }
}

// Extrator para obter o usuário autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidSession)
    }
}
