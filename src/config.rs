// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{BookRepository, CompanyRepository, ListRepository, StoreRepository, UserRepository},
    middleware::rate_limit::RateLimiter,
    services::{
        auth::AuthService, catalog::CatalogService, tenancy::TenancyService, users::UserService,
    },
};

// Parâmetros da política de autenticação, lidos do ambiente.
#[derive(Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    pub max_login_attempts: i32,
    pub lockout_duration_minutes: i64,
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub session_cookie_name: String,
    pub auth: AuthConfig,
    pub signup_rate_limit: u32,
    pub signup_rate_window_secs: u64,
    // Chaves dos serviços externos; ausentes, as rotas respondem 500.
    pub isbn_db_key: Option<String>,
    pub image_upload_url: Option<String>,
    pub image_upload_preset: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let session_secret =
            env::var("SESSION_SECRET").map_err(|_| anyhow::anyhow!("SESSION_SECRET deve ser definida"))?;

        Ok(Self {
            port: env_or("PORT", 3000),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "staffpicks_session".to_string()),
            auth: AuthConfig {
                session_secret,
                max_login_attempts: env_or("MAX_LOGIN_ATTEMPTS", 5),
                lockout_duration_minutes: env_or("LOCKOUT_DURATION_MINUTES", 15),
            },
            signup_rate_limit: env_or("SIGNUP_RATE_LIMIT", 5),
            signup_rate_window_secs: env_or("SIGNUP_RATE_WINDOW_SECS", 3600),
            isbn_db_key: env::var("ISBN_DB_KEY").ok(),
            image_upload_url: env::var("IMAGE_UPLOAD_URL").ok(),
            image_upload_preset: env::var("IMAGE_UPLOAD_PRESET").ok(),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    pub auth_service: AuthService,
    pub tenancy_service: TenancyService,
    pub user_service: UserService,
    pub catalog_service: CatalogService,
    pub signup_limiter: Arc<RateLimiter>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::from_env()?;

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let store_repo = StoreRepository::new(db_pool.clone());
        let book_repo = BookRepository::new(db_pool.clone());
        let list_repo = ListRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            company_repo.clone(),
            store_repo.clone(),
            db_pool.clone(),
            config.auth.clone(),
        );
        let tenancy_service = TenancyService::new(
            company_repo,
            store_repo,
            user_repo.clone(),
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo.clone(), db_pool.clone());
        let catalog_service = CatalogService::new(book_repo, list_repo, user_repo);

        let signup_limiter = Arc::new(RateLimiter::new(
            config.signup_rate_limit,
            config.signup_rate_window_secs,
        ));

        Ok(Self {
            db_pool,
            config,
            auth_service,
            tenancy_service,
            user_service,
            catalog_service,
            signup_limiter,
            http_client: reqwest::Client::new(),
        })
    }
}
