use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Identificador inválido")]
    InvalidId,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Identificador único já em uso: {0}")]
    DuplicateKey(String),

    #[error("ISBN já cadastrado para este usuário")]
    IsbnAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials { attempts_remaining: Option<i32> },

    #[error("Conta bloqueada até {locked_until}")]
    AccountLocked { locked_until: DateTime<Utc> },

    #[error("Sessão inválida")]
    InvalidSession,

    #[error("Acesso negado")]
    Forbidden(&'static str),

    // "Não encontrado" e "sem permissão sobre o registro" são o MESMO erro
    // de propósito: a existência de dados de outro tenant não pode vazar.
    #[error("Registro não encontrado")]
    NotFound,

    #[error("Regra de negócio violada: {0}")]
    BusinessRule(&'static str),

    #[error("Limite de requisições excedido")]
    RateLimited,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro ao contatar serviço externo")]
    UpstreamError(#[from] reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::InvalidCredentials { attempts_remaining } => {
                let mut body = json!({ "error": "E-mail ou senha inválidos." });
                if let Some(n) = attempts_remaining {
                    body["attemptsRemaining"] = json!(n);
                }
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }

            AppError::AccountLocked { locked_until } => {
                let body = Json(json!({
                    "error": "Conta temporariamente bloqueada por excesso de tentativas.",
                    "lockedUntil": locked_until,
                }));
                return (StatusCode::LOCKED, body).into_response();
            }

            AppError::InvalidId => (
                StatusCode::BAD_REQUEST,
                "Identificador com formato inválido.".to_string(),
            ),
            AppError::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "Este e-mail já está em uso.".to_string(),
            ),
            AppError::DuplicateKey(what) => {
                (StatusCode::CONFLICT, format!("Valor já em uso: {}.", what))
            }
            AppError::IsbnAlreadyExists => (
                StatusCode::CONFLICT,
                "Este ISBN já está cadastrado para este usuário.".to_string(),
            ),
            AppError::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                "Sessão inválida ou expirada.".to_string(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "Registro não encontrado ou permissão insuficiente.".to_string(),
            ),
            AppError::BusinessRule(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Muitas requisições. Tente novamente mais tarde.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente recebe algo genérico.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
