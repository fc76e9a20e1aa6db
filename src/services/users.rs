// src/services/users.rs

use bcrypt::{hash, verify};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::Role,
    models::user::{
        CreateUserPayload, StatusAction, UpdateProfilePayload, UpdateUserPayload, User,
    },
};

// ---
// Autorização de ESCRITA sobre usuários. Não é a mesma coisa que a
// visibilidade de leitura: as regras aqui são verificadas alvo a alvo.
// ---

/// Um ator pode criar/editar/deletar um usuário com o papel `target_role`?
///   admin        -> qualquer um
///   companyAdmin -> apenas storeAdmin e librarian (nunca admin/companyAdmin)
///   storeAdmin   -> apenas librarian
///   librarian    -> ninguém
pub fn can_manage_role(actor_role: Role, target_role: Role) -> bool {
    match actor_role {
        Role::Admin => true,
        Role::CompanyAdmin => matches!(target_role, Role::StoreAdmin | Role::Librarian),
        Role::StoreAdmin => target_role == Role::Librarian,
        Role::Librarian => false,
    }
}

/// Apenas admin/companyAdmin podem soft-deletar usuários.
pub fn can_soft_delete(actor_role: Role) -> bool {
    matches!(actor_role, Role::Admin | Role::CompanyAdmin)
}

/// Confere o alcance do ator sobre um usuário alvo já carregado.
/// Fora do alcance vira `NotFound` (e não 403): a existência de usuários
/// de outro tenant não pode vazar.
pub fn check_target_in_reach(actor: &User, target: &User) -> Result<(), AppError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::CompanyAdmin => {
            if actor.company_id.is_some() && actor.company_id == target.company_id {
                Ok(())
            } else {
                Err(AppError::NotFound)
            }
        }
        Role::StoreAdmin => {
            if actor.store_id.is_some() && actor.store_id == target.store_id {
                Ok(())
            } else {
                Err(AppError::NotFound)
            }
        }
        Role::Librarian => Err(AppError::NotFound),
    }
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    pool: sqlx::PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, pool: sqlx::PgPool) -> Self {
        Self { user_repo, pool }
    }

    /// Listagem administrativa, com o escopo do papel aplicado.
    pub async fn list_users(
        &self,
        actor: &User,
        explicit_company: Option<Uuid>,
    ) -> Result<Vec<User>, AppError> {
        match actor.role {
            Role::Admin => self.user_repo.list(explicit_company, None).await,
            Role::CompanyAdmin => self.user_repo.list(actor.company_id, None).await,
            Role::StoreAdmin => {
                let store_id = actor
                    .store_id
                    .ok_or(AppError::Forbidden("Usuário sem loja vinculada."))?;
                self.user_repo.list(actor.company_id, Some(store_id)).await
            }
            Role::Librarian => Err(AppError::Forbidden(
                "Seu papel não permite gerenciar usuários.",
            )),
        }
    }

    pub async fn get_user(&self, actor: &User, id: Uuid) -> Result<User, AppError> {
        let target = self
            .user_repo
            .find_active_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;
        check_target_in_reach(actor, &target)?;
        Ok(target)
    }

    pub async fn create_user(
        &self,
        actor: &User,
        payload: &CreateUserPayload,
    ) -> Result<User, AppError> {
        if !can_manage_role(actor.role, payload.role) {
            return Err(AppError::Forbidden(
                "Seu papel não permite criar usuários com esse papel.",
            ));
        }

        // Em qual empresa o novo usuário nasce?
        let company_id = match (actor.role, payload.role) {
            // admin da plataforma não pertence a empresa nenhuma
            (_, Role::Admin) => None,
            (Role::Admin, _) => {
                let company = payload
                    .company_id
                    .ok_or(AppError::BusinessRule("Informe a empresa do novo usuário."))?;
                Some(company)
            }
            _ => actor.company_id,
        };

        // storeAdmin só cria librarians dentro da própria loja.
        let store_id = if actor.role == Role::StoreAdmin {
            actor.store_id
        } else {
            payload.store_id
        };

        // O papel dita se a loja é obrigatória ou proibida.
        if payload.role.requires_store() && store_id.is_none() {
            return Err(AppError::BusinessRule(
                "Este papel exige uma loja vinculada.",
            ));
        }
        if payload.role == Role::Admin && store_id.is_some() {
            return Err(AppError::BusinessRule(
                "O admin da plataforma não pode ter loja vinculada.",
            ));
        }

        let email = payload.email.trim().to_lowercase();
        if self.user_repo.email_exists(&email).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        let password_clone = payload.password.clone();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .user_repo
            .create(
                &self.pool,
                company_id,
                store_id,
                payload.role,
                &payload.first_name,
                &payload.last_name,
                &email,
                &hashed_password,
                &payload.sections,
            )
            .await?;

        tracing::info!("👤 Usuário {} criado por {}", user.email, actor.email);
        Ok(user)
    }

    pub async fn update_user(
        &self,
        actor: &User,
        id: Uuid,
        payload: &UpdateUserPayload,
    ) -> Result<User, AppError> {
        let target = self.get_user(actor, id).await?;

        if !can_manage_role(actor.role, target.role) {
            return Err(AppError::Forbidden(
                "Seu papel não permite editar este usuário.",
            ));
        }

        // storeAdmin não move librarians para outra loja.
        let store_id = if actor.role == Role::StoreAdmin {
            None
        } else {
            payload.store_id
        };

        self.user_repo
            .update(
                target.id,
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
                store_id,
                payload.sections.as_deref(),
            )
            .await
    }

    /// Transições de status (activate/deactivate/suspend), sempre disparadas
    /// por um admin: e nunca sobre a própria conta.
    pub async fn change_status(
        &self,
        actor: &User,
        id: Uuid,
        action: StatusAction,
    ) -> Result<User, AppError> {
        if actor.id == id {
            return Err(AppError::BusinessRule(
                "Você não pode alterar o status da própria conta.",
            ));
        }

        let target = self.get_user(actor, id).await?;

        if !can_manage_role(actor.role, target.role) {
            return Err(AppError::Forbidden(
                "Seu papel não permite alterar o status deste usuário.",
            ));
        }

        let new_status = action
            .apply(target.status)
            .ok_or(AppError::BusinessRule("Transição de status inválida."))?;

        let updated = self.user_repo.set_status(target.id, new_status).await?;
        tracing::info!(
            "🔄 Status de {} alterado para {:?} por {}",
            updated.email,
            updated.status,
            actor.email
        );
        Ok(updated)
    }

    /// Soft delete: terminal, a partir de qualquer status. A linha permanece
    /// para vínculos históricos (createdBy em livros, por exemplo).
    pub async fn soft_delete_user(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        if actor.id == id {
            return Err(AppError::BusinessRule(
                "Você não pode deletar a própria conta.",
            ));
        }
        if !can_soft_delete(actor.role) {
            return Err(AppError::Forbidden(
                "Seu papel não permite deletar usuários.",
            ));
        }

        let target = self.get_user(actor, id).await?;

        if !can_manage_role(actor.role, target.role) {
            return Err(AppError::Forbidden(
                "Seu papel não permite deletar este usuário.",
            ));
        }

        self.user_repo.soft_delete(target.id).await?;
        tracing::info!("🗑️ Usuário {} deletado por {}", target.email, actor.email);
        Ok(())
    }

    // --- Perfil próprio ---

    pub async fn update_profile(
        &self,
        actor: &User,
        payload: &UpdateProfilePayload,
    ) -> Result<User, AppError> {
        // Troca de senha pede a senha atual correta.
        if let Some(new_password) = &payload.new_password {
            let current = payload.current_password.as_deref().ok_or(
                AppError::BusinessRule("Informe a senha atual para trocar a senha."),
            )?;

            let current_clone = current.to_owned();
            let hash_clone = actor.password_hash.clone();
            let valid = tokio::task::spawn_blocking(move || verify(&current_clone, &hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

            if !valid {
                return Err(AppError::InvalidCredentials {
                    attempts_remaining: None,
                });
            }

            let new_clone = new_password.clone();
            let new_hash =
                tokio::task::spawn_blocking(move || hash(&new_clone, bcrypt::DEFAULT_COST))
                    .await
                    .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

            self.user_repo.set_password(actor.id, &new_hash).await?;
        }

        self.user_repo
            .update(
                actor.id,
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
                None,
                None,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gerencia_qualquer_papel() {
        for role in [
            Role::Admin,
            Role::CompanyAdmin,
            Role::StoreAdmin,
            Role::Librarian,
        ] {
            assert!(can_manage_role(Role::Admin, role));
        }
    }

    #[test]
    fn company_admin_nao_toca_em_pares_nem_admins() {
        assert!(!can_manage_role(Role::CompanyAdmin, Role::Admin));
        assert!(!can_manage_role(Role::CompanyAdmin, Role::CompanyAdmin));
        assert!(can_manage_role(Role::CompanyAdmin, Role::StoreAdmin));
        assert!(can_manage_role(Role::CompanyAdmin, Role::Librarian));
    }

    #[test]
    fn store_admin_so_gerencia_librarians() {
        assert!(can_manage_role(Role::StoreAdmin, Role::Librarian));
        assert!(!can_manage_role(Role::StoreAdmin, Role::StoreAdmin));
        assert!(!can_manage_role(Role::StoreAdmin, Role::CompanyAdmin));
    }

    #[test]
    fn librarian_nao_gerencia_ninguem() {
        for role in [
            Role::Admin,
            Role::CompanyAdmin,
            Role::StoreAdmin,
            Role::Librarian,
        ] {
            assert!(!can_manage_role(Role::Librarian, role));
        }
    }

    #[test]
    fn soft_delete_restrito_aos_admins() {
        assert!(can_soft_delete(Role::Admin));
        assert!(can_soft_delete(Role::CompanyAdmin));
        assert!(!can_soft_delete(Role::StoreAdmin));
        assert!(!can_soft_delete(Role::Librarian));
    }
}
