use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{CredentialStore, StaticCredentialStore, TokenService};
use crate::config::{AppConfig, ConfigError, PaginationConfig, StoreBackend};
use crate::database::{DatabaseManager, PgCharacterStore};
use crate::handlers::{protected, public};
use crate::store::{CharacterStore, JsonFileStore};

/// Everything a request handler needs, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CharacterStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub pagination: PaginationConfig,
}

impl AppState {
    /// Connects the configured store and registers the built-in accounts
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let store = open_store(config).await?;
        let credentials = StaticCredentialStore::with_default_accounts()
            .map_err(|e| anyhow::anyhow!("failed to hash built-in credentials: {}", e))?;
        let secret = config.security.jwt_secret.as_deref().ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            store,
            credentials: Arc::new(credentials),
            tokens: Arc::new(TokenService::new(secret, config.security.jwt_expiry_hours)),
            pagination: config.pagination.clone(),
        })
    }
}

/// Opens the store selected by `STORE_BACKEND`, migrating the database when relational
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CharacterStore>> {
    let store: Arc<dyn CharacterStore> = match config.store.backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect_and_migrate(&config.database).await?;
            Arc::new(PgCharacterStore::new(pool))
        }
        StoreBackend::Json => {
            tracing::info!("Using character file {}", config.store.json_path.display());
            Arc::new(JsonFileStore::new(config.store.json_path.clone()))
        }
    };
    Ok(store)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_routes())
        .merge(character_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(public::auth::login_post))
        .route("/auth/whoami", get(protected::auth::whoami_get))
}

fn character_routes() -> Router<AppState> {
    Router::new()
        // Reads take an optional token
        .route("/characters/list", get(public::characters_list))
        .route(
            "/characters/:id",
            get(public::character_get)
                .patch(protected::character_update)
                .delete(protected::character_delete),
        )
        // Mutations require one
        .route("/characters", post(protected::character_create))
        .route("/character", post(protected::character_create))
}
