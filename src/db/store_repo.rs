// src/db/store_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::store::{OpeningHours, Store, StoreStatus},
};

#[derive(Clone)]
pub struct StoreRepository {
    pool: PgPool,
}

impl StoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, AppError> {
        let maybe_store = sqlx::query_as::<_, Store>(
            r#"
            SELECT * FROM stores WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_store)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Store>, AppError> {
        let stores = sqlx::query_as::<_, Store>(
            r#"
            SELECT * FROM stores WHERE company_id = $1 ORDER BY created_at
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stores)
    }

    pub async fn list_all(&self) -> Result<Vec<Store>, AppError> {
        let stores = sqlx::query_as::<_, Store>(
            r#"
            SELECT * FROM stores ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stores)
    }

    /// O código da loja é único por empresa; o laço de geração consulta aqui.
    pub async fn code_exists(&self, company_id: Uuid, code: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM stores WHERE company_id = $1 AND code = $2)
            "#,
        )
        .bind(company_id)
        .bind(code)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        code: &str,
        name: &str,
        contact_email: Option<&str>,
        contact_phone: Option<&str>,
        address: Option<&str>,
        opening_hours: Option<OpeningHours>,
    ) -> Result<Store, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let store = sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (company_id, code, name, contact_email, contact_phone, address, opening_hours)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, '{}'::jsonb))
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(code)
        .bind(name)
        .bind(contact_email)
        .bind(contact_phone)
        .bind(address)
        .bind(opening_hours.map(Json))
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateKey("código da loja".to_string());
                }
            }
            e.into()
        })?;

        Ok(store)
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        status: Option<StoreStatus>,
        contact_email: Option<&str>,
        contact_phone: Option<&str>,
        address: Option<&str>,
        opening_hours: Option<OpeningHours>,
    ) -> Result<Store, AppError> {
        let store = sqlx::query_as::<_, Store>(
            r#"
            UPDATE stores SET
                name = COALESCE($2, name),
                status = COALESCE($3, status),
                contact_email = COALESCE($4, contact_email),
                contact_phone = COALESCE($5, contact_phone),
                address = COALESCE($6, address),
                opening_hours = COALESCE($7, opening_hours),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(status)
        .bind(contact_email)
        .bind(contact_phone)
        .bind(address)
        .bind(opening_hours.map(Json))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(store)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM stores WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
