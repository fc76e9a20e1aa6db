// src/db/list_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::scope::{push_author_exclusion, CatalogScope},
    models::list::{List, ListFilters, ListItem, Visibility},
};

// Predicado central de soft delete das listas.
const ACTIVE: &str = "deleted_at IS NULL";

#[derive(Clone)]
pub struct ListRepository {
    pool: PgPool,
}

impl ListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_active_by_id(&self, id: Uuid) -> Result<Option<List>, AppError> {
        let maybe_list = sqlx::query_as::<_, List>(&format!(
            r#"
            SELECT * FROM lists WHERE id = $1 AND {ACTIVE}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_list)
    }

    /// Slug único por (empresa, dono) entre listas não deletadas.
    pub async fn slug_exists(
        &self,
        company_id: Uuid,
        owner_user_id: Uuid,
        slug: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(&format!(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM lists
                WHERE company_id = $1 AND owner_user_id = $2 AND slug = $3 AND {ACTIVE}
            )
            "#
        ))
        .bind(company_id)
        .bind(owner_user_id)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn list(
        &self,
        scope: &CatalogScope,
        filters: &ListFilters,
        deleted_authors: &[Uuid],
    ) -> Result<Vec<List>, AppError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT * FROM lists WHERE {ACTIVE}"));

        scope.push_sql(&mut qb);
        push_author_exclusion(&mut qb, deleted_authors);

        if let Some(visibility) = filters.visibility {
            qb.push(" AND visibility = ").push_bind(visibility);
        }

        qb.push(" ORDER BY created_at DESC");

        let lists = qb.build_query_as::<List>().fetch_all(&self.pool).await?;
        Ok(lists)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        company_id: Uuid,
        store_id: Option<Uuid>,
        owner_user_id: Uuid,
        title: &str,
        slug: &str,
        description: Option<&str>,
        cover_image: Option<&str>,
        visibility: Visibility,
        published_at: Option<DateTime<Utc>>,
        items: Vec<ListItem>,
        assigned_to: &[Uuid],
        sections: &[String],
        created_by: Uuid,
    ) -> Result<List, AppError> {
        let list = sqlx::query_as::<_, List>(
            r#"
            INSERT INTO lists (
                company_id, store_id, owner_user_id,
                title, slug, description, cover_image,
                visibility, published_at, items,
                assigned_to, sections, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(store_id)
        .bind(owner_user_id)
        .bind(title)
        .bind(slug)
        .bind(description)
        .bind(cover_image)
        .bind(visibility)
        .bind(published_at)
        .bind(Json(items))
        .bind(assigned_to)
        .bind(sections)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    // Corrida perdida no laço de slug: vira 409.
                    return AppError::DuplicateKey("slug da lista".to_string());
                }
            }
            e.into()
        })?;

        Ok(list)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        cover_image: Option<&str>,
        visibility: Option<Visibility>,
        published_at: Option<DateTime<Utc>>,
        unpublished_at: Option<DateTime<Utc>>,
        items: Option<Vec<ListItem>>,
        assigned_to: Option<&[Uuid]>,
        sections: Option<&[String]>,
        updated_by: Uuid,
    ) -> Result<List, AppError> {
        let list = sqlx::query_as::<_, List>(&format!(
            r#"
            UPDATE lists SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                cover_image = COALESCE($4, cover_image),
                visibility = COALESCE($5, visibility),
                published_at = COALESCE($6, published_at),
                unpublished_at = COALESCE($7, unpublished_at),
                items = COALESCE($8, items),
                assigned_to = COALESCE($9, assigned_to),
                sections = COALESCE($10, sections),
                updated_by = $11,
                updated_at = now()
            WHERE id = $1 AND {ACTIVE}
            RETURNING *
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(cover_image)
        .bind(visibility)
        .bind(published_at)
        .bind(unpublished_at)
        .bind(items.map(Json))
        .bind(assigned_to.map(|a| a.to_vec()))
        .bind(sections.map(|s| s.to_vec()))
        .bind(updated_by)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(list)
    }

    /// Soft delete: a lista some das consultas padrão, mas a linha fica.
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE lists SET deleted_at = now(), updated_at = now()
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
}
