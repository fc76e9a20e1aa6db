// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "company_status", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum CompanyStatus {
    Trial,
    Active,
    Suspended,
}

// Feature flags do tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanySettings {
    pub public_lists_enabled: bool,
    pub isbn_lookup_enabled: bool,
}

// A raiz do tenant: toda loja, usuário e conteúdo pertence a uma Company.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: CompanyStatus,
    pub plan: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub settings: Json<CompanySettings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Atualização do tenant pelo companyAdmin. O slug é imutável.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub name: Option<String>,

    #[validate(email(message = "O e-mail de contato é inválido."))]
    pub contact_email: Option<String>,

    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub settings: Option<CompanySettings>,
}
