// src/db/book_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::scope::{push_author_exclusion, CatalogScope},
    models::book::{Book, BookData, BookFilters},
};

#[derive(Clone)]
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, AppError> {
        let maybe_book = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_book)
    }

    /// Listagem com o escopo da sessão e a exclusão de autores deletados
    /// já aplicados na consulta.
    pub async fn list(
        &self,
        scope: &CatalogScope,
        filters: &BookFilters,
        deleted_authors: &[Uuid],
    ) -> Result<Vec<Book>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM books WHERE 1=1");

        scope.push_sql(&mut qb);
        push_author_exclusion(&mut qb, deleted_authors);

        if let Some(genre) = &filters.genre {
            qb.push(" AND genre = ").push_bind(genre.clone());
        }
        if let Some(tone) = &filters.tone {
            qb.push(" AND tone = ").push_bind(tone.clone());
        }
        if let Some(age_group) = &filters.age_group {
            qb.push(" AND age_group = ").push_bind(age_group.clone());
        }

        qb.push(" ORDER BY created_at DESC");

        let books = qb.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(books)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        company_id: Uuid,
        store_id: Option<Uuid>,
        isbn: &str,
        book_data: BookData,
        genre: Option<&str>,
        tone: Option<&str>,
        age_group: Option<&str>,
        purchase_link: Option<&str>,
        recommendation: Option<&str>,
        owner_user_id: Uuid,
        created_by: Uuid,
        assigned_to: &[Uuid],
        sections: &[String],
    ) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                company_id, store_id, isbn, book_data,
                genre, tone, age_group,
                purchase_link, recommendation,
                owner_user_id, created_by, assigned_to, sections
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(store_id)
        .bind(isbn)
        .bind(Json(book_data))
        .bind(genre)
        .bind(tone)
        .bind(age_group)
        .bind(purchase_link)
        .bind(recommendation)
        .bind(owner_user_id)
        .bind(created_by)
        .bind(assigned_to)
        .bind(sections)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    if let Some("books_company_owner_isbn_key") = db_err.constraint() {
                        return AppError::IsbnAlreadyExists;
                    }
                }
            }
            e.into()
        })?;

        Ok(book)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        book_data: Option<BookData>,
        genre: Option<&str>,
        tone: Option<&str>,
        age_group: Option<&str>,
        purchase_link: Option<&str>,
        recommendation: Option<&str>,
        assigned_to: Option<&[Uuid]>,
        sections: Option<&[String]>,
        updated_by: Uuid,
    ) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                book_data = COALESCE($2, book_data),
                genre = COALESCE($3, genre),
                tone = COALESCE($4, tone),
                age_group = COALESCE($5, age_group),
                purchase_link = COALESCE($6, purchase_link),
                recommendation = COALESCE($7, recommendation),
                assigned_to = COALESCE($8, assigned_to),
                sections = COALESCE($9, sections),
                updated_by = $10,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(book_data.map(Json))
        .bind(genre)
        .bind(tone)
        .bind(age_group)
        .bind(purchase_link)
        .bind(recommendation)
        .bind(assigned_to.map(|a| a.to_vec()))
        .bind(sections.map(|s| s.to_vec()))
        .bind(updated_by)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(book)
    }

    // Deleção física, a pedido. Livros não têm soft delete.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM books WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
