// src/db/company_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::company::{Company, CompanySettings},
};

// O repositório de empresas, responsável pela tabela 'companies'.
// Empresas nunca são deletadas, nem por soft delete.
#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let maybe_company = sqlx::query_as::<_, Company>(
            r#"
            SELECT * FROM companies WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_company)
    }

    /// Usado pelo laço de geração de slug: o candidato precisa estar livre
    /// antes de ser persistido.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM companies WHERE slug = $1)
            "#,
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    // Cria uma nova empresa em status trial.
    // Aceita um executor para participar da transação do signup.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        contact_email: &str,
        trial_ends_at: DateTime<Utc>,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, slug, status, trial_ends_at, contact_email)
            VALUES ($1, $2, 'trial', $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(trial_ends_at)
        .bind(contact_email)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    // Dois signups concorrentes com o mesmo nome podem perder
                    // a corrida do laço de slug; o conflito vira 409.
                    return AppError::DuplicateKey("slug da empresa".to_string());
                }
            }
            e.into()
        })?;

        Ok(company)
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        contact_email: Option<&str>,
        contact_phone: Option<&str>,
        address: Option<&str>,
        settings: Option<CompanySettings>,
    ) -> Result<Company, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                contact_email = COALESCE($3, contact_email),
                contact_phone = COALESCE($4, contact_phone),
                address = COALESCE($5, address),
                settings = COALESCE($6, settings),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(contact_email)
        .bind(contact_phone)
        .bind(address)
        .bind(settings.map(Json))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(company)
    }
}
