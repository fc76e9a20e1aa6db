// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::slug::{candidate, slugify},
    config::AuthConfig,
    db::{CompanyRepository, StoreRepository, UserRepository},
    models::auth::{Claims, Role, SignupPayload},
    models::company::Company,
    models::user::User,
};

// Duração da sessão: o cookie e os claims expiram juntos.
const SESSION_TTL_HOURS: i64 = 2;
const TRIAL_DAYS: i64 = 30;

/// Decide o novo estado de bloqueio após uma falha de login.
/// Devolve (novo contador, bloqueio até). Puro, para ser testável.
fn lockout_after_failure(
    attempts_before: i32,
    max_attempts: i32,
    lockout_minutes: i64,
    now: DateTime<Utc>,
) -> (i32, Option<DateTime<Utc>>) {
    let attempts = attempts_before + 1;
    if attempts >= max_attempts {
        (attempts, Some(now + Duration::minutes(lockout_minutes)))
    } else {
        (attempts, None)
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    store_repo: StoreRepository,
    pool: PgPool,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        company_repo: CompanyRepository,
        store_repo: StoreRepository,
        pool: PgPool,
        config: AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            company_repo,
            store_repo,
            pool,
            config,
        }
    }

    /// Valida credenciais e aplica a política de bloqueio por tentativas.
    /// As falhas são genéricas de propósito: a existência do e-mail não vaza.
    pub async fn login_user(
        &self,
        email: &str,
        password: &str,
        ip: &str,
    ) -> Result<User, AppError> {
        let email = email.trim().to_lowercase();

        let user = self
            .user_repo
            .find_active_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials {
                attempts_remaining: None,
            })?;

        let now = Utc::now();
        if user.is_locked(now) {
            return Err(AppError::AccountLocked {
                // is_locked garante que o timestamp existe
                locked_until: user.locked_until.unwrap_or(now),
            });
        }

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em uma thread separada
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            let (attempts, locked_until) = lockout_after_failure(
                user.failed_login_attempts,
                self.config.max_login_attempts,
                self.config.lockout_duration_minutes,
                now,
            );
            self.user_repo
                .set_login_failure(user.id, attempts, locked_until)
                .await?;

            if let Some(locked_until) = locked_until {
                return Err(AppError::AccountLocked { locked_until });
            }
            return Err(AppError::InvalidCredentials {
                attempts_remaining: Some(self.config.max_login_attempts - attempts),
            });
        }

        // Usuário inativo/suspenso não entra, mas a resposta continua genérica.
        if !user.can_authenticate() {
            return Err(AppError::InvalidCredentials {
                attempts_remaining: None,
            });
        }

        self.user_repo.record_login_success(user.id, ip).await?;

        tracing::info!("✅ Login de {} ({})", user.email, user.id);
        Ok(user)
    }

    /// Bootstrap do tenant: Company (trial) + loja padrão + companyAdmin,
    /// tudo dentro de UMA transação: se qualquer passo falhar, nada fica
    /// órfão no banco.
    pub async fn signup(&self, payload: &SignupPayload) -> Result<(User, Company), AppError> {
        let email = payload.email.trim().to_lowercase();

        if self.user_repo.email_exists(&email).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        // 1. Hashing (fora da transação, pois não toca no banco)
        let password_clone = payload.password.clone();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        // 2. Slug livre para a empresa (laço otimista; a corrida perdida
        //    vira violação de unicidade dentro da transação -> 409)
        let base = slugify(&payload.company_name);
        let mut slug = base.clone();
        let mut n = 0u32;
        while self.company_repo.slug_exists(&slug).await? {
            n += 1;
            slug = candidate(&base, n);
        }

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let trial_ends_at = Utc::now() + Duration::days(TRIAL_DAYS);
        let company = self
            .company_repo
            .create(&mut *tx, &payload.company_name, &slug, &email, trial_ends_at)
            .await?;

        // Toda empresa nasce com uma loja padrão.
        let store = self
            .store_repo
            .create(
                &mut *tx,
                company.id,
                "main",
                "Loja Principal",
                Some(email.as_str()),
                None,
                None,
                None,
            )
            .await?;

        let user = self
            .user_repo
            .create(
                &mut *tx,
                Some(company.id),
                None,
                Role::CompanyAdmin,
                &payload.first_name,
                &payload.last_name,
                &email,
                &hashed_password,
                &[],
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(
            "🏪 Nova empresa '{}' ({}) com loja padrão {}",
            company.name,
            company.slug,
            store.code
        );

        Ok((user, company))
    }

    /// Emite os claims assinados que vão dentro do cookie de sessão.
    pub fn create_session_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(SESSION_TTL_HOURS);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.full_name(),
            role: user.role,
            company_id: user.company_id,
            store_id: user.store_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.session_secret.as_ref()),
        )?)
    }

    /// Decodifica e verifica a assinatura/expiração dos claims do cookie.
    /// Os claims são só um cache: quem re-valida o usuário é o middleware.
    pub fn validate_session_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.session_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidSession)?;

        Ok(token_data.claims)
    }

    /// Re-validação por requisição: o usuário precisa continuar vivo e ativo.
    pub async fn revalidate_user(&self, user_id: Uuid) -> Result<User, AppError> {
        let user = self
            .user_repo
            .find_active_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidSession)?;

        if !user.can_authenticate() {
            return Err(AppError::InvalidSession);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falha_abaixo_do_limite_nao_bloqueia() {
        let now = Utc::now();
        let (attempts, locked) = lockout_after_failure(2, 5, 15, now);
        assert_eq!(attempts, 3);
        assert!(locked.is_none());
    }

    #[test]
    fn falha_no_limite_bloqueia_pelo_periodo() {
        let now = Utc::now();
        let (attempts, locked) = lockout_after_failure(4, 5, 15, now);
        assert_eq!(attempts, 5);
        assert_eq!(locked, Some(now + Duration::minutes(15)));
    }

    #[test]
    fn bloqueio_expira_com_o_tempo() {
        use crate::models::user::{User, UserStatus};

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            company_id: None,
            store_id: None,
            role: Role::Admin,
            status: UserStatus::Active,
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            email: "ana@acme.com".into(),
            password_hash: "x".into(),
            failed_login_attempts: 5,
            locked_until: Some(now - Duration::minutes(1)),
            last_login_at: None,
            last_login_ip: None,
            sections: vec![],
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        // O bloqueio é derivado do timestamp: já passou, então não vale mais.
        assert!(!user.is_locked(now));
        assert!(user.is_locked(now - Duration::minutes(2)));
    }
}
