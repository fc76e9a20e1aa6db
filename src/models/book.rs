// src/models/book.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Dados bibliográficos aninhados, preenchidos à mão ou pela consulta de ISBN.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookData {
    pub title: String,
    pub authors: Vec<String>,
    pub cover_image: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<u32>,
    pub publish_date: Option<String>,
    pub description: Option<String>,
}

// Um item do catálogo, com escopo de empresa/loja.
// Livros são deletados fisicamente a pedido; não há soft delete aqui.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub company_id: Uuid,
    pub store_id: Option<Uuid>,

    pub isbn: String,
    pub book_data: Json<BookData>,

    // Facetas de categorização
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub age_group: Option<String>,

    pub purchase_link: Option<String>,
    pub recommendation: Option<String>,

    pub owner_user_id: Uuid,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,

    pub assigned_to: Vec<Uuid>,
    pub sections: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// ISBN-10 ou ISBN-13, com dígito verificador `X` aceito no ISBN-10.
pub fn validate_isbn_shape(isbn: &str) -> Result<(), ValidationError> {
    let cleaned: String = isbn.chars().filter(|c| *c != '-').collect();
    let valid = match cleaned.len() {
        10 => cleaned[..9].chars().all(|c| c.is_ascii_digit())
            && cleaned
                .chars()
                .last()
                .map(|c| c.is_ascii_digit() || c == 'X' || c == 'x')
                .unwrap_or(false),
        13 => cleaned.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_isbn");
        err.message = Some("O ISBN deve ter 10 ou 13 dígitos.".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookPayload {
    #[validate(custom(function = "validate_isbn_shape"))]
    pub isbn: String,

    pub book_data: BookData,

    pub genre: Option<String>,
    pub tone: Option<String>,
    pub age_group: Option<String>,

    #[validate(url(message = "O link de compra deve ser uma URL válida."))]
    pub purchase_link: Option<String>,

    pub recommendation: Option<String>,

    #[serde(default)]
    pub assigned_to: Vec<Uuid>,
    #[serde(default)]
    pub sections: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookPayload {
    pub book_data: Option<BookData>,

    pub genre: Option<String>,
    pub tone: Option<String>,
    pub age_group: Option<String>,

    #[validate(url(message = "O link de compra deve ser uma URL válida."))]
    pub purchase_link: Option<String>,

    pub recommendation: Option<String>,

    // Ignorados silenciosamente quando quem edita é um librarian.
    pub assigned_to: Option<Vec<Uuid>>,
    pub sections: Option<Vec<String>>,
}

// Filtros de listagem (facetas + escolha explícita de empresa p/ admin)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFilters {
    pub company_id: Option<Uuid>,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub age_group: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn_valido() {
        assert!(validate_isbn_shape("9780134685991").is_ok());
        assert!(validate_isbn_shape("978-0-13-468599-1").is_ok());
        assert!(validate_isbn_shape("013468599X").is_ok());
    }

    #[test]
    fn isbn_invalido() {
        assert!(validate_isbn_shape("12345").is_err());
        assert!(validate_isbn_shape("97801346859").is_err()); // 11 dígitos
        assert!(validate_isbn_shape("abcdefghij").is_err());
    }
}
