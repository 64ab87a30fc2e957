use crate::auth::hash_password;
use crate::error::AppError;
use crate::model::entity::{UserEntity, UserEntityCreateUpdate};
use crate::model::{CrudRepository, DbConnection, ModelManager};
use crate::utils::signal::shutdown_signal;
use crate::web::{AuthenticatedUser, UserRole};
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod error;
pub mod mail;
pub mod model;
pub mod utils;
pub mod web;
pub mod worker;

pub(crate) static APPLICATION_NAME: &str = "campus";

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = config::Config::get_or_init(use_local).await;
    let db = DbConnection::connect(config.app().database_uri())?;

    tracing::debug!("applying migrations...");
    sqlx::migrate!()
        .run(db.pool())
        .await
        .map_err(model::DatabaseError::from)?;

    build_server_with_pool(db, config).await
}

pub async fn build_server_with_pool(
    db: DbConnection,
    config: &'static Config,
) -> AppResult<(AppState, Router)> {
    let mm = ModelManager::new(db);
    ensure_admin(&mm, config).await?;

    let state = AppState::new(mm, config);
    let app = web::routes::build_app(state.clone());
    Ok((state, app))
}

/// Creates the `[admin]` account from config, or promotes it when it already exists.
async fn ensure_admin(mm: &ModelManager, config: &Config) -> AppResult<()> {
    let Some(admin) = config.admin() else {
        return Ok(());
    };
    let actor = AuthenticatedUser::admin();

    match UserEntity::find_by_username(mm, &actor, admin.username()).await? {
        Some(user) if user.role() == UserRole::Admin => {}
        Some(user) => {
            user.set_role(mm, &actor, UserRole::Admin).await?;
            tracing::info!(username = admin.username(), "promoted configured admin");
        }
        None => {
            let password_hash = hash_password(admin.password()).map_err(AppError::CryptError)?;
            UserEntity::create(
                mm,
                &actor,
                UserEntityCreateUpdate {
                    username: admin.username().to_string(),
                    password_hash,
                    email: None,
                    role: UserRole::Admin,
                },
            )
            .await?;
            tracing::info!(username = admin.username(), "created configured admin");
        }
    }
    Ok(())
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (state, app) = build_server().await?;
    let config = state.config();
    let listener = TcpListener::bind(config.host().bindto()).await?;
    let shutdown = CancellationToken::new();

    let worker = tokio::spawn(worker::maintenance_worker(
        state.pool().clone(),
        shutdown.clone(),
    ));

    tracing::info!("axum is starting at: {}", config.host().bindto());
    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await;

    // the server may also stop on its own error
    shutdown.cancel();
    if let Err(e) = worker.await {
        error::log_error(&e);
    }

    serve_result?;
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
