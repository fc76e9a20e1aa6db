// src/models/store.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "store_status", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum StoreStatus {
    Active,
    Inactive,
    Maintenance,
}

// Horário de funcionamento, um registro livre por dia da semana.
pub type OpeningHours = std::collections::BTreeMap<String, String>;

// O sub-tenant: uma loja física dentro da empresa.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub status: StoreStatus,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Json<OpeningHours>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStorePayload {
    #[validate(length(min = 1, message = "O nome da loja é obrigatório."))]
    pub name: String,

    // Se omitido, o código é derivado do nome.
    pub code: Option<String>,

    #[validate(email(message = "O e-mail de contato é inválido."))]
    pub contact_email: Option<String>,

    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStorePayload {
    #[validate(length(min = 1, message = "O nome da loja é obrigatório."))]
    pub name: Option<String>,

    pub status: Option<StoreStatus>,

    #[validate(email(message = "O e-mail de contato é inválido."))]
    pub contact_email: Option<String>,

    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<OpeningHours>,
}
