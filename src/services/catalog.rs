// src/services/catalog.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::slug::{candidate, slugify},
    db::scope::CatalogScope,
    db::{BookRepository, ListRepository, UserRepository},
    models::auth::Role,
    models::book::{Book, BookFilters, CreateBookPayload, UpdateBookPayload},
    models::list::{
        CreateListPayload, List, ListFilters, ListItem, UpdateListPayload, Visibility,
    },
    models::user::User,
};

/// Para listas, o companyAdmin é um papel somente-leitura: enxerga a
/// empresa inteira, mas não cria, edita nem remove. Assimetria deliberada
/// entre o alcance de leitura e o de escrita.
pub fn can_write_lists(role: Role) -> bool {
    !matches!(role, Role::CompanyAdmin)
}

/// Campos de curadoria (atribuições e seções) só são aceitos de storeAdmin
/// para cima. Vindos de um librarian, são descartados em silêncio: a
/// atualização prossegue e os campos ficam como estavam.
pub fn strip_restricted_fields<A, S>(
    role: Role,
    assigned_to: Option<A>,
    sections: Option<S>,
) -> (Option<A>, Option<S>) {
    if role == Role::Librarian {
        (None, None)
    } else {
        (assigned_to, sections)
    }
}

/// Monta os itens da lista a partir dos ids, descartando duplicatas e
/// atribuindo posições densas (0, 1, 2, ...) na ordem recebida.
pub fn items_from_book_ids(book_ids: &[Uuid], now: DateTime<Utc>) -> Vec<ListItem> {
    let mut seen = std::collections::HashSet::new();
    book_ids
        .iter()
        .filter(|id| seen.insert(**id))
        .enumerate()
        .map(|(position, book_id)| ListItem {
            book_id: *book_id,
            position: position as u32,
            added_at: now,
        })
        .collect()
}

/// Remove um livro da lista e recompacta as posições.
pub fn remove_item(items: &mut Vec<ListItem>, book_id: Uuid) {
    items.retain(|item| item.book_id != book_id);
    for (position, item) in items.iter_mut().enumerate() {
        item.position = position as u32;
    }
}

#[derive(Clone)]
pub struct CatalogService {
    book_repo: BookRepository,
    list_repo: ListRepository,
    user_repo: UserRepository,
}

impl CatalogService {
    pub fn new(
        book_repo: BookRepository,
        list_repo: ListRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            book_repo,
            list_repo,
            user_repo,
        }
    }

    /// De qual empresa vem o conjunto de autores deletados a excluir.
    fn exclusion_company(scope: &CatalogScope, actor: &User) -> Option<Uuid> {
        match scope {
            CatalogScope::All => None,
            CatalogScope::Company(company_id) => Some(*company_id),
            _ => actor.company_id,
        }
    }

    // --- Livros ---

    pub async fn list_books(
        &self,
        actor: &User,
        filters: &BookFilters,
    ) -> Result<Vec<Book>, AppError> {
        let scope = CatalogScope::for_user(actor, filters.company_id)?;

        // Etapa 1: materializa os autores deletados. Etapa 2: filtra.
        let deleted_authors = self
            .user_repo
            .deleted_user_ids(Self::exclusion_company(&scope, actor))
            .await?;

        self.book_repo.list(&scope, filters, &deleted_authors).await
    }

    pub async fn get_book(&self, actor: &User, id: Uuid) -> Result<Book, AppError> {
        let scope = CatalogScope::for_user(actor, None)?;
        let book = self
            .book_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !scope.allows_book(&book) {
            return Err(AppError::NotFound);
        }
        Ok(book)
    }

    pub async fn create_book(
        &self,
        actor: &User,
        payload: &CreateBookPayload,
    ) -> Result<Book, AppError> {
        let company_id = actor.company_id.ok_or(AppError::Forbidden(
            "O admin da plataforma não possui catálogo próprio.",
        ))?;

        // Um librarian não escolhe as atribuições: nasce atribuído a si.
        let assigned_to = if actor.role == Role::Librarian {
            vec![actor.id]
        } else {
            payload.assigned_to.clone()
        };

        let book = self
            .book_repo
            .create(
                company_id,
                actor.store_id,
                &payload.isbn,
                payload.book_data.clone(),
                payload.genre.as_deref(),
                payload.tone.as_deref(),
                payload.age_group.as_deref(),
                payload.purchase_link.as_deref(),
                payload.recommendation.as_deref(),
                actor.id,
                actor.id,
                &assigned_to,
                &payload.sections,
            )
            .await?;

        tracing::info!("📚 Livro {} cadastrado por {}", book.isbn, actor.email);
        Ok(book)
    }

    pub async fn update_book(
        &self,
        actor: &User,
        id: Uuid,
        payload: &UpdateBookPayload,
    ) -> Result<Book, AppError> {
        // Leitura escopada primeiro: fora do alcance é 404.
        let book = self.get_book(actor, id).await?;

        let (assigned_to, sections) = strip_restricted_fields(
            actor.role,
            payload.assigned_to.as_deref(),
            payload.sections.as_deref(),
        );

        self.book_repo
            .update(
                book.id,
                payload.book_data.clone(),
                payload.genre.as_deref(),
                payload.tone.as_deref(),
                payload.age_group.as_deref(),
                payload.purchase_link.as_deref(),
                payload.recommendation.as_deref(),
                assigned_to,
                sections,
                actor.id,
            )
            .await
    }

    pub async fn delete_book(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        let book = self.get_book(actor, id).await?;
        self.book_repo.delete(book.id).await?;
        tracing::info!("🗑️ Livro {} removido por {}", book.isbn, actor.email);
        Ok(())
    }

    // --- Listas ---

    pub async fn list_lists(
        &self,
        actor: &User,
        filters: &ListFilters,
    ) -> Result<Vec<List>, AppError> {
        let scope = CatalogScope::for_user(actor, filters.company_id)?;

        let deleted_authors = self
            .user_repo
            .deleted_user_ids(Self::exclusion_company(&scope, actor))
            .await?;

        self.list_repo.list(&scope, filters, &deleted_authors).await
    }

    pub async fn get_list(&self, actor: &User, id: Uuid) -> Result<List, AppError> {
        let scope = CatalogScope::for_user(actor, None)?;
        let list = self
            .list_repo
            .find_active_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !scope.allows_list(&list) {
            return Err(AppError::NotFound);
        }
        Ok(list)
    }

    pub async fn create_list(
        &self,
        actor: &User,
        payload: &CreateListPayload,
    ) -> Result<List, AppError> {
        if !can_write_lists(actor.role) {
            return Err(AppError::Forbidden(
                "O companyAdmin não cria nem edita listas.",
            ));
        }
        let company_id = actor.company_id.ok_or(AppError::Forbidden(
            "O admin da plataforma não possui catálogo próprio.",
        ))?;

        // Slug livre por (empresa, dono), entre listas não deletadas.
        let base = slugify(&payload.title);
        let mut slug = base.clone();
        let mut n = 0u32;
        while self
            .list_repo
            .slug_exists(company_id, actor.id, &slug)
            .await?
        {
            n += 1;
            slug = candidate(&base, n);
        }

        let now = Utc::now();
        let visibility = payload.visibility.unwrap_or(Visibility::Draft);
        let published_at = (visibility == Visibility::Public).then_some(now);
        let items = items_from_book_ids(&payload.book_ids, now);

        let assigned_to = if actor.role == Role::Librarian {
            vec![actor.id]
        } else {
            payload.assigned_to.clone()
        };

        let list = self
            .list_repo
            .create(
                company_id,
                actor.store_id,
                actor.id,
                &payload.title,
                &slug,
                payload.description.as_deref(),
                payload.cover_image.as_deref(),
                visibility,
                published_at,
                items,
                &assigned_to,
                &payload.sections,
                actor.id,
            )
            .await?;

        tracing::info!("📋 Lista '{}' criada por {}", list.title, actor.email);
        Ok(list)
    }

    pub async fn update_list(
        &self,
        actor: &User,
        id: Uuid,
        payload: &UpdateListPayload,
    ) -> Result<List, AppError> {
        if !can_write_lists(actor.role) {
            return Err(AppError::Forbidden(
                "O companyAdmin não cria nem edita listas.",
            ));
        }

        let list = self.get_list(actor, id).await?;

        let (assigned_to, sections) = strip_restricted_fields(
            actor.role,
            payload.assigned_to.as_deref(),
            payload.sections.as_deref(),
        );

        let now = Utc::now();

        // Os carimbos de publicação seguem a transição de visibilidade.
        let (published_at, unpublished_at) = match payload.visibility {
            Some(Visibility::Public) if list.visibility != Visibility::Public => {
                (Some(now), None)
            }
            Some(new) if new != Visibility::Public && list.visibility == Visibility::Public => {
                (None, Some(now))
            }
            _ => (None, None),
        };

        let items = payload
            .book_ids
            .as_deref()
            .map(|ids| items_from_book_ids(ids, now));

        self.list_repo
            .update(
                list.id,
                payload.title.as_deref(),
                payload.description.as_deref(),
                payload.cover_image.as_deref(),
                payload.visibility,
                published_at,
                unpublished_at,
                items,
                assigned_to,
                sections,
                actor.id,
            )
            .await
    }

    /// Tira um livro da lista; as posições restantes voltam a ser densas.
    pub async fn remove_list_item(
        &self,
        actor: &User,
        list_id: Uuid,
        book_id: Uuid,
    ) -> Result<List, AppError> {
        if !can_write_lists(actor.role) {
            return Err(AppError::Forbidden(
                "O companyAdmin não cria nem edita listas.",
            ));
        }

        let list = self.get_list(actor, list_id).await?;

        let mut items = list.items.0.clone();
        if !items.iter().any(|item| item.book_id == book_id) {
            return Err(AppError::NotFound);
        }
        remove_item(&mut items, book_id);

        self.list_repo
            .update(
                list.id, None, None, None, None, None, None,
                Some(items), None, None, actor.id,
            )
            .await
    }

    pub async fn delete_list(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        if !can_write_lists(actor.role) {
            return Err(AppError::Forbidden(
                "O companyAdmin não remove listas.",
            ));
        }

        let list = self.get_list(actor, id).await?;
        self.list_repo.soft_delete(list.id).await?;
        tracing::info!("🗑️ Lista '{}' removida por {}", list.title, actor.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_admin_nao_escreve_listas() {
        assert!(!can_write_lists(Role::CompanyAdmin));
        assert!(can_write_lists(Role::Admin));
        assert!(can_write_lists(Role::StoreAdmin));
        assert!(can_write_lists(Role::Librarian));
    }

    #[test]
    fn librarian_perde_campos_de_curadoria_em_silencio() {
        let assigned = Some(vec![Uuid::new_v4()]);
        let sections = Some(vec!["infantil".to_string()]);

        let (a, s) = strip_restricted_fields(Role::Librarian, assigned.clone(), sections.clone());
        assert!(a.is_none());
        assert!(s.is_none());

        let (a, s) = strip_restricted_fields(Role::StoreAdmin, assigned, sections);
        assert!(a.is_some());
        assert!(s.is_some());
    }

    #[test]
    fn itens_com_posicoes_densas_e_sem_duplicatas() {
        let now = Utc::now();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let items = items_from_book_ids(&[a, b, a, c], now);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].book_id, a);
        assert_eq!(items[1].book_id, b);
        assert_eq!(items[2].book_id, c);
        assert_eq!(
            items.iter().map(|i| i.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn remocao_recompacta_posicoes() {
        let now = Utc::now();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let mut items = items_from_book_ids(&[a, b, c], now);
        remove_item(&mut items, b);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].book_id, a);
        assert_eq!(items[1].book_id, c);
        // A ordenação continua densa após a remoção.
        assert_eq!(
            items.iter().map(|i| i.position).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }
}
