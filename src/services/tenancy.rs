// src/services/tenancy.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::slug::{candidate, slugify},
    db::{CompanyRepository, StoreRepository, UserRepository},
    models::auth::Role,
    models::company::{Company, UpdateCompanyPayload},
    models::store::{CreateStorePayload, Store, UpdateStorePayload},
    models::user::User,
};

/// Apenas admin/companyAdmin criam, editam e removem lojas.
pub fn can_manage_stores(role: Role) -> bool {
    matches!(role, Role::Admin | Role::CompanyAdmin)
}

#[derive(Clone)]
pub struct TenancyService {
    company_repo: CompanyRepository,
    store_repo: StoreRepository,
    user_repo: UserRepository,
    pool: sqlx::PgPool,
}

impl TenancyService {
    pub fn new(
        company_repo: CompanyRepository,
        store_repo: StoreRepository,
        user_repo: UserRepository,
        pool: sqlx::PgPool,
    ) -> Self {
        Self {
            company_repo,
            store_repo,
            user_repo,
            pool,
        }
    }

    // --- Empresa (o tenant) ---

    pub async fn get_company(&self, actor: &User) -> Result<Company, AppError> {
        let company_id = actor.company_id.ok_or(AppError::NotFound)?;
        self.company_repo
            .find_by_id(company_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn update_company(
        &self,
        actor: &User,
        payload: &UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        if !matches!(actor.role, Role::Admin | Role::CompanyAdmin) {
            return Err(AppError::Forbidden(
                "Seu papel não permite alterar os dados da empresa.",
            ));
        }

        let company_id = actor.company_id.ok_or(AppError::NotFound)?;
        self.company_repo
            .update(
                company_id,
                payload.name.as_deref(),
                payload.contact_email.as_deref(),
                payload.contact_phone.as_deref(),
                payload.address.as_deref(),
                payload.settings.clone(),
            )
            .await
    }

    // --- Lojas (o sub-tenant) ---

    /// Listagem com o escopo do papel: admin vê tudo, companyAdmin vê a
    /// empresa, storeAdmin/librarian veem apenas a própria loja.
    pub async fn list_stores(&self, actor: &User) -> Result<Vec<Store>, AppError> {
        match actor.role {
            Role::Admin => self.store_repo.list_all().await,
            Role::CompanyAdmin => {
                let company_id = actor.company_id.ok_or(AppError::NotFound)?;
                self.store_repo.list_by_company(company_id).await
            }
            Role::StoreAdmin | Role::Librarian => {
                let store_id = actor
                    .store_id
                    .ok_or(AppError::Forbidden("Usuário sem loja vinculada."))?;
                let store = self
                    .store_repo
                    .find_by_id(store_id)
                    .await?
                    .ok_or(AppError::NotFound)?;
                Ok(vec![store])
            }
        }
    }

    /// Busca uma loja respeitando a fronteira do tenant. Fora dela o
    /// resultado é 404, nunca 403.
    pub async fn get_store(&self, actor: &User, id: Uuid) -> Result<Store, AppError> {
        let store = self
            .store_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;

        let in_reach = match actor.role {
            Role::Admin => true,
            Role::CompanyAdmin => actor.company_id == Some(store.company_id),
            Role::StoreAdmin | Role::Librarian => actor.store_id == Some(store.id),
        };
        if !in_reach {
            return Err(AppError::NotFound);
        }
        Ok(store)
    }

    pub async fn create_store(
        &self,
        actor: &User,
        payload: &CreateStorePayload,
    ) -> Result<Store, AppError> {
        if !can_manage_stores(actor.role) {
            return Err(AppError::Forbidden("Seu papel não permite criar lojas."));
        }
        let company_id = actor.company_id.ok_or(AppError::NotFound)?;

        // Código livre dentro da empresa (laço otimista de sufixos).
        let base = payload
            .code
            .as_deref()
            .map(slugify)
            .unwrap_or_else(|| slugify(&payload.name));
        let mut code = base.clone();
        let mut n = 0u32;
        while self.store_repo.code_exists(company_id, &code).await? {
            n += 1;
            code = candidate(&base, n);
        }

        let store = self
            .store_repo
            .create(
                &self.pool,
                company_id,
                &code,
                &payload.name,
                payload.contact_email.as_deref(),
                payload.contact_phone.as_deref(),
                payload.address.as_deref(),
                payload.opening_hours.clone(),
            )
            .await?;

        tracing::info!("🏬 Loja '{}' ({}) criada por {}", store.name, store.code, actor.email);
        Ok(store)
    }

    pub async fn update_store(
        &self,
        actor: &User,
        id: Uuid,
        payload: &UpdateStorePayload,
    ) -> Result<Store, AppError> {
        if !can_manage_stores(actor.role) {
            return Err(AppError::Forbidden("Seu papel não permite editar lojas."));
        }
        // Garante a fronteira do tenant antes de escrever.
        let store = self.get_store(actor, id).await?;

        self.store_repo
            .update(
                store.id,
                payload.name.as_deref(),
                payload.status,
                payload.contact_email.as_deref(),
                payload.contact_phone.as_deref(),
                payload.address.as_deref(),
                payload.opening_hours.clone(),
            )
            .await
    }

    /// Integridade referencial como regra de negócio: a loja só sai
    /// quando nenhum usuário aponta mais para ela.
    pub async fn delete_store(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        if !can_manage_stores(actor.role) {
            return Err(AppError::Forbidden("Seu papel não permite remover lojas."));
        }
        let store = self.get_store(actor, id).await?;

        let users_in_store = self.user_repo.count_by_store(store.id).await?;
        if users_in_store > 0 {
            return Err(AppError::BusinessRule(
                "A loja ainda possui usuários vinculados.",
            ));
        }

        self.store_repo.delete(store.id).await?;
        tracing::info!("🏬 Loja '{}' removida por {}", store.name, actor.email);
        Ok(())
    }

    /// Desvincula um usuário da loja (store_id volta a nulo).
    pub async fn unassign_user(
        &self,
        actor: &User,
        store_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        if !can_manage_stores(actor.role) {
            return Err(AppError::Forbidden(
                "Seu papel não permite desvincular usuários.",
            ));
        }
        let store = self.get_store(actor, store_id).await?;
        self.user_repo.unassign_store(user_id, store.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gestao_de_lojas_restrita_aos_admins() {
        assert!(can_manage_stores(Role::Admin));
        assert!(can_manage_stores(Role::CompanyAdmin));
        assert!(!can_manage_stores(Role::StoreAdmin));
        assert!(!can_manage_stores(Role::Librarian));
    }
}
