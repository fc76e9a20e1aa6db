// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---
// O papel (Role) é o enum canônico compartilhado: o mesmo tipo serve a
// camada de sessão e a de persistência. A ordem das variantes define a
// hierarquia de privilégio (Librarian < StoreAdmin < CompanyAdmin < Admin).
// ---
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Librarian,
    StoreAdmin,
    CompanyAdmin,
    Admin,
}

impl Role {
    /// Papéis que exigem uma loja vinculada.
    pub fn requires_store(&self) -> bool {
        matches!(self, Role::StoreAdmin | Role::Librarian)
    }
}

// Estrutura de dados ("claims") assinada dentro do cookie de sessão.
// Os claims são um cache da identidade: cada requisição re-valida o
// usuário no banco antes de confiar neles.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // Subject (ID do usuário)
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Uuid>,
    pub exp: usize, // Expiration time (quando o cookie expira)
    pub iat: usize, // Issued At (quando foi criado)
}

// Dados para login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Dados para o signup: cria a empresa, a loja padrão e o primeiro admin.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub company_name: String,

    #[validate(length(min = 1, message = "O primeiro nome é obrigatório."))]
    pub first_name: String,

    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    pub last_name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,

    pub confirm_password: String,
}

impl SignupPayload {
    /// Validação de consistência que o `validator` não expressa sozinho.
    pub fn validate_confirmation(&self) -> Result<(), ValidationError> {
        if self.password != self.confirm_password {
            let mut err = ValidationError::new("password_mismatch");
            err.message = Some("As senhas informadas não coincidem.".into());
            return Err(err);
        }
        Ok(())
    }
}

/// Senha forte: mínimo 8 caracteres, com maiúscula, minúscula e dígito.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= 8;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_upper && has_lower && has_digit {
        return Ok(());
    }

    let mut err = ValidationError::new("weak_password");
    err.message =
        Some("A senha deve ter no mínimo 8 caracteres, com maiúscula, minúscula e número.".into());
    Err(err)
}

// Resumo do usuário embutido nas respostas de autenticação.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

// Resposta de autenticação; o cookie de sessão vai como efeito colateral.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserSummary,
    pub redirect_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarquia_de_papeis() {
        assert!(Role::Admin > Role::CompanyAdmin);
        assert!(Role::CompanyAdmin > Role::StoreAdmin);
        assert!(Role::StoreAdmin > Role::Librarian);
    }

    #[test]
    fn papeis_que_exigem_loja() {
        assert!(Role::StoreAdmin.requires_store());
        assert!(Role::Librarian.requires_store());
        assert!(!Role::Admin.requires_store());
        assert!(!Role::CompanyAdmin.requires_store());
    }

    #[test]
    fn senha_forte_aceita() {
        assert!(validate_password_strength("Abcdefg1").is_ok());
    }

    #[test]
    fn senha_fraca_rejeitada() {
        assert!(validate_password_strength("curta1A").is_err()); // < 8
        assert!(validate_password_strength("semnumeroA").is_err());
        assert!(validate_password_strength("semmaiuscula1").is_err());
        assert!(validate_password_strength("SEMMINUSCULA1").is_err());
    }

    #[test]
    fn confirmacao_de_senha() {
        let mut payload = SignupPayload {
            company_name: "Acme".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@acme.com".into(),
            password: "Abcdefg1".into(),
            confirm_password: "Abcdefg1".into(),
        };
        assert!(payload.validate_confirmation().is_ok());

        payload.confirm_password = "Outra123".into();
        assert!(payload.validate_confirmation().is_err());
    }
}
