// src/handlers/integrations.rs

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::ValidationErrors;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::book::{validate_isbn_shape, BookData},
};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// O formato que o provedor de ISBN devolve; só nos interessa o miolo.
#[derive(Debug, Deserialize)]
struct IsbnDbResponse {
    book: IsbnDbBook,
}

#[derive(Debug, Deserialize)]
struct IsbnDbBook {
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    pages: Option<u32>,
    date_published: Option<String>,
    synopsis: Option<String>,
    image: Option<String>,
}

// GET /api/isbn/{isbn}: proxy para o provedor de ISBN. A chave fica no
// servidor; o cliente nunca a vê.
pub async fn isbn_lookup(
    State(app_state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<BookData>, AppError> {
    validate_isbn_shape(&isbn).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("isbn", e);
        AppError::ValidationError(errors)
    })?;

    let key = app_state
        .config
        .isbn_db_key
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("ISBN_DB_KEY não configurada"))?;

    let cleaned: String = isbn.chars().filter(|c| *c != '-').collect();
    let response = app_state
        .http_client
        .get(format!("https://api2.isbndb.com/book/{}", cleaned))
        .header(AUTHORIZATION, key.as_str())
        .send()
        .await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(AppError::NotFound);
    }
    let payload: IsbnDbResponse = response.error_for_status()?.json().await?;

    let book = payload.book;
    Ok(Json(BookData {
        title: book.title,
        authors: book.authors,
        cover_image: book.image,
        publisher: book.publisher,
        page_count: book.pages,
        publish_date: book.date_published,
        description: book.synopsis,
    }))
}

#[derive(Debug, Deserialize)]
struct UploadUrlPayload {
    url: String,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    secure_url: String,
}

// POST /api/upload/image: aceita multipart (campo 'file') ou JSON com
// uma URL, e repassa ao provedor de hospedagem de imagens.
pub async fn upload_image(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    request: Request,
) -> Result<Json<serde_json::Value>, AppError> {
    let upload_url = app_state
        .config
        .image_upload_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("IMAGE_UPLOAD_URL não configurada"))?;
    let preset = app_state
        .config
        .image_upload_preset
        .clone()
        .unwrap_or_default();

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let form = if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| AppError::BusinessRule("Envio multipart inválido."))?;

        let mut file: Option<(String, Vec<u8>)> = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| AppError::BusinessRule("Envio multipart inválido."))?
        {
            if field.name() == Some("file") {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BusinessRule("Falha ao ler o arquivo enviado."))?;
                file = Some((file_name, data.to_vec()));
            }
        }

        let (file_name, data) =
            file.ok_or(AppError::BusinessRule("Campo 'file' ausente no multipart."))?;

        reqwest::multipart::Form::new()
            .text("upload_preset", preset)
            .part(
                "file",
                reqwest::multipart::Part::bytes(data).file_name(file_name),
            )
    } else {
        let body = axum::body::to_bytes(request.into_body(), MAX_UPLOAD_BYTES)
            .await
            .map_err(|_| AppError::BusinessRule("Corpo da requisição inválido."))?;
        let payload: UploadUrlPayload = serde_json::from_slice(&body).map_err(|_| {
            AppError::BusinessRule("Informe a imagem em multipart ou como {\"url\": ...}.")
        })?;

        reqwest::multipart::Form::new()
            .text("upload_preset", preset)
            .text("file", payload.url)
    };

    let response = app_state
        .http_client
        .post(&upload_url)
        .multipart(form)
        .send()
        .await?
        .error_for_status()?;

    let uploaded: UploadedImage = response.json().await?;
    Ok(Json(json!({ "url": uploaded.secure_url })))
}
