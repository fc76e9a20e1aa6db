// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::{validate_password_strength, Role};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_status", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

// Ações administrativas sobre o status. A reativação é sempre disparada
// por um admin; não existe auto-serviço nem expiração automática.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusAction {
    Activate,
    Deactivate,
    Suspend,
}

impl StatusAction {
    /// Aplica a transição sobre o status atual.
    /// Devolve `None` quando a transição não é permitida pela máquina de estados.
    pub fn apply(&self, current: UserStatus) -> Option<UserStatus> {
        match (self, current) {
            (StatusAction::Activate, UserStatus::Inactive)
            | (StatusAction::Activate, UserStatus::Suspended) => Some(UserStatus::Active),
            (StatusAction::Deactivate, UserStatus::Active) => Some(UserStatus::Inactive),
            (StatusAction::Suspend, UserStatus::Active)
            | (StatusAction::Suspend, UserStatus::Inactive) => Some(UserStatus::Suspended),
            _ => None,
        }
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    // Ausente apenas para o admin da plataforma
    pub company_id: Option<Uuid>,
    // Presente apenas para storeAdmin/librarian
    pub store_id: Option<Uuid>,

    pub role: Role,
    pub status: UserStatus,

    pub first_name: String,
    pub last_name: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    #[serde(skip_serializing)]
    pub failed_login_attempts: i32,
    #[serde(skip_serializing)]
    pub locked_until: Option<DateTime<Utc>>,

    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub last_login_ip: Option<String>,

    pub sections: Vec<String>,

    pub deleted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// O bloqueio é derivado do timestamp, nunca de um booleano separado.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map(|until| until > now).unwrap_or(false)
    }

    /// Usuário apto a manter uma sessão: não deletado e com status ativo.
    pub fn can_authenticate(&self) -> bool {
        self.deleted_at.is_none() && self.status == UserStatus::Active
    }
}

// Dados para criação de usuário por um admin
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "O primeiro nome é obrigatório."))]
    pub first_name: String,

    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    pub last_name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,

    pub role: Role,

    // Honrado apenas quando o criador é o admin da plataforma.
    pub company_id: Option<Uuid>,

    pub store_id: Option<Uuid>,

    #[serde(default)]
    pub sections: Vec<String>,
}

// Atualização de usuário por um admin (status tem rota própria)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, message = "O primeiro nome é obrigatório."))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    pub last_name: Option<String>,

    pub store_id: Option<Uuid>,

    pub sections: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusActionPayload {
    pub action: StatusAction,
}

// Atualização do próprio perfil
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, message = "O primeiro nome é obrigatório."))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    pub last_name: Option<String>,

    // Troca de senha exige a senha atual
    pub current_password: Option<String>,

    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transicoes_validas() {
        assert_eq!(
            StatusAction::Deactivate.apply(UserStatus::Active),
            Some(UserStatus::Inactive)
        );
        assert_eq!(
            StatusAction::Activate.apply(UserStatus::Inactive),
            Some(UserStatus::Active)
        );
        assert_eq!(
            StatusAction::Suspend.apply(UserStatus::Active),
            Some(UserStatus::Suspended)
        );
        assert_eq!(
            StatusAction::Suspend.apply(UserStatus::Inactive),
            Some(UserStatus::Suspended)
        );
        assert_eq!(
            StatusAction::Activate.apply(UserStatus::Suspended),
            Some(UserStatus::Active)
        );
    }

    #[test]
    fn transicoes_invalidas() {
        assert_eq!(StatusAction::Activate.apply(UserStatus::Active), None);
        assert_eq!(StatusAction::Deactivate.apply(UserStatus::Inactive), None);
        assert_eq!(StatusAction::Deactivate.apply(UserStatus::Suspended), None);
        assert_eq!(StatusAction::Suspend.apply(UserStatus::Suspended), None);
    }
}
