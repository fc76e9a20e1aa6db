// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::Role,
    models::user::{User, UserStatus},
};

// Predicado central de soft delete: todas as consultas padrão enxergam
// apenas usuários "vivos". A linha nunca é removida fisicamente.
const ACTIVE: &str = "deleted_at IS NULL";

// O repositório de usuários, responsável pela tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário não deletado pelo seu e-mail (já em minúsculas)
    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT * FROM users WHERE email = $1 AND {ACTIVE}
            "#
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    // Busca um usuário não deletado pelo seu ID
    pub async fn find_active_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT * FROM users WHERE id = $1 AND {ACTIVE}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(&format!(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND {ACTIVE})
            "#
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    // Cria um novo usuário.
    // Aceita um executor para participar de transações (signup).
    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Option<Uuid>,
        store_id: Option<Uuid>,
        role: Role,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
        sections: &[String],
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                company_id, store_id, role, first_name, last_name,
                email, password_hash, sections
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(store_id)
        .bind(role)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(password_hash)
        .bind(sections)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    if let Some("users_active_email_key") = db_err.constraint() {
                        return AppError::EmailAlreadyExists;
                    }
                }
            }
            e.into()
        })?;

        Ok(user)
    }

    /// Listagem administrativa: escopo por empresa e/ou loja, sem deletados.
    pub async fn list(
        &self,
        company_id: Option<Uuid>,
        store_id: Option<Uuid>,
    ) -> Result<Vec<User>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT * FROM users WHERE {ACTIVE}"
        ));

        if let Some(company_id) = company_id {
            qb.push(" AND company_id = ").push_bind(company_id);
        }
        if let Some(store_id) = store_id {
            qb.push(" AND store_id = ").push_bind(store_id);
        }
        qb.push(" ORDER BY created_at");

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Materializa o conjunto de autores deletados: o filtro secundário de
    /// visibilidade exclui conteúdo criado por eles.
    pub async fn deleted_user_ids(
        &self,
        company_id: Option<Uuid>,
    ) -> Result<Vec<Uuid>, AppError> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT id FROM users WHERE deleted_at IS NOT NULL");
        if let Some(company_id) = company_id {
            qb.push(" AND company_id = ").push_bind(company_id);
        }

        let ids = qb
            .build_query_scalar::<Uuid>()
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    // --- Controle de tentativas de login ---

    pub async fn set_login_failure(
        &self,
        id: Uuid,
        failed_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users SET
                failed_login_attempts = $2,
                locked_until = $3,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(failed_attempts)
        .bind(locked_until)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_login_success(&self, id: Uuid, ip: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users SET
                failed_login_attempts = 0,
                locked_until = NULL,
                last_login_at = now(),
                last_login_ip = $2,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(ip)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- Atualizações administrativas ---

    pub async fn update(
        &self,
        id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
        store_id: Option<Uuid>,
        sections: Option<&[String]>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                store_id = COALESCE($4, store_id),
                sections = COALESCE($5, sections),
                updated_at = now()
            WHERE id = $1 AND {ACTIVE}
            RETURNING *
            "#
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(store_id)
        .bind(sections)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(user)
    }

    pub async fn set_status(&self, id: Uuid, status: UserStatus) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET status = $2, updated_at = now()
            WHERE id = $1 AND {ACTIVE}
            RETURNING *
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(user)
    }

    pub async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            UPDATE users SET password_hash = $2, updated_at = now()
            WHERE id = $1 AND {ACTIVE}
            "#
        ))
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Marca o usuário como deletado. Terminal: não existe "undelete".
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE users SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND {ACTIVE}
            "#
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // --- Vínculo com lojas ---

    /// Quantos usuários (não deletados) ainda apontam para a loja.
    /// A exclusão de lojas é bloqueada enquanto isso for maior que zero.
    pub async fn count_by_store(&self, store_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT COUNT(*) FROM users WHERE store_id = $1 AND {ACTIVE}
            "#
        ))
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn unassign_store(&self, user_id: Uuid, store_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE users SET store_id = NULL, updated_at = now()
            WHERE id = $1 AND store_id = $2 AND {ACTIVE}
            "#
        ))
        .bind(user_id)
        .bind(store_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
