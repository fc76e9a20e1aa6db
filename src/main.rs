//src/main.rs

use std::net::SocketAddr;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/signup", post(handlers::auth::signup))
        // GET é um apelido de POST para navegação por link
        .route(
            "/logout",
            post(handlers::auth::logout).get(handlers::auth::logout),
        );

    let book_routes = Router::new()
        .route(
            "/",
            get(handlers::books::list_books).post(handlers::books::create_book),
        )
        .route(
            "/{id}",
            get(handlers::books::get_book)
                .put(handlers::books::update_book)
                .delete(handlers::books::delete_book),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let list_routes = Router::new()
        .route(
            "/",
            get(handlers::lists::list_lists).post(handlers::lists::create_list),
        )
        .route(
            "/{id}",
            get(handlers::lists::get_list)
                .put(handlers::lists::update_list)
                .delete(handlers::lists::delete_list),
        )
        .route(
            "/{id}/items/{book_id}",
            axum::routing::delete(handlers::lists::remove_list_item),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let store_routes = Router::new()
        .route(
            "/",
            get(handlers::stores::list_stores).post(handlers::stores::create_store),
        )
        .route(
            "/{id}",
            get(handlers::stores::get_store)
                .put(handlers::stores::update_store)
                .delete(handlers::stores::delete_store),
        )
        .route(
            "/{id}/users/{user_id}",
            axum::routing::delete(handlers::stores::unassign_user),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::soft_delete_user),
        )
        .route(
            "/{id}/status",
            axum::routing::patch(handlers::users::change_status),
        )
        // Apelido de DELETE para clientes que só enviam POST
        .route("/{id}/delete", post(handlers::users::soft_delete_user))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let tenant_routes = Router::new()
        .route(
            "/company",
            get(handlers::company::get_company).put(handlers::company::update_company),
        )
        .route(
            "/user/profile",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .route("/upload/image", post(handlers::integrations::upload_image))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        // A chave do provedor fica no servidor; a rota em si é pública.
        .route("/api/isbn/{isbn}", get(handlers::integrations::isbn_lookup))
        .nest("/api/auth", auth_routes)
        // A sessão atual exige o guard (re-valida o usuário no banco)
        .route(
            "/api/auth/session",
            get(handlers::auth::get_session).layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                auth_guard,
            )),
        )
        .nest("/api/books", book_routes)
        .nest("/api/lists", list_routes)
        .nest("/api/stores", store_routes)
        .nest("/api/users", user_routes)
        .nest("/api", tenant_routes)
        .with_state(app_state.clone());

    // Inicia o servidor
    let addr = format!("0.0.0.0:{}", app_state.config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());

    // ConnectInfo alimenta o IP usado no lockout e no rate limit de signup
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Erro no servidor Axum");
}
