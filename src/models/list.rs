// src/models/list.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "list_visibility", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Draft,
    Unlisted,
    Public,
}

// Uma entrada da lista: referência ao livro + posição densa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub book_id: Uuid,
    pub position: u32,
    pub added_at: DateTime<Utc>,
}

// Uma lista curada de recomendações, com soft delete.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: Uuid,
    pub company_id: Uuid,
    pub store_id: Option<Uuid>,
    pub owner_user_id: Uuid,

    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,

    pub visibility: Visibility,
    pub published_at: Option<DateTime<Utc>>,
    pub unpublished_at: Option<DateTime<Utc>>,

    pub items: Json<Vec<ListItem>>,

    pub assigned_to: Vec<Uuid>,
    pub sections: Vec<String>,

    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,

    pub deleted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateListPayload {
    #[validate(length(min = 1, message = "O título da lista é obrigatório."))]
    pub title: String,

    pub description: Option<String>,
    pub cover_image: Option<String>,

    pub visibility: Option<Visibility>,

    #[serde(default)]
    pub book_ids: Vec<Uuid>,

    #[serde(default)]
    pub assigned_to: Vec<Uuid>,
    #[serde(default)]
    pub sections: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListPayload {
    #[validate(length(min = 1, message = "O título da lista é obrigatório."))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub cover_image: Option<String>,

    pub visibility: Option<Visibility>,

    // Substitui o conjunto de itens (posições recalculadas na ordem dada).
    pub book_ids: Option<Vec<Uuid>>,

    // Ignorados silenciosamente quando quem edita é um librarian.
    pub assigned_to: Option<Vec<Uuid>>,
    pub sections: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilters {
    pub company_id: Option<Uuid>,
    pub visibility: Option<Visibility>,
}
