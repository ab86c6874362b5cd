use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, Environment, StorageBackend};
use crate::database::{
    ContactRepository, DatabaseError, DatabaseManager, InMemoryContactRepository,
    InMemoryUserRepository, PgContactRepository, PgUserRepository, UserRepository,
};
use crate::handlers::{contacts, system};

/// Shared handler dependencies. Repositories sit behind traits so the router
/// runs the same against PostgreSQL or the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub contacts: Arc<dyn ContactRepository>,
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        contacts: Arc<dyn ContactRepository>,
        users: Arc<dyn UserRepository>,
        config: AppConfig,
    ) -> Self {
        Self {
            contacts,
            users,
            config: Arc::new(config),
        }
    }

    /// Fresh, empty in-memory store
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            Arc::new(InMemoryContactRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            config,
        )
    }

    /// Build the state for the configured storage backend
    pub async fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        match config.database.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Ok(Self::in_memory(config))
            }
            StorageBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                if config.database.auto_migrate {
                    DatabaseManager::ensure_schema(&pool).await?;
                }
                Ok(Self::new(
                    Arc::new(PgContactRepository::new(pool.clone())),
                    Arc::new(PgUserRepository::new(pool)),
                    config,
                ))
            }
        }
    }
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Token required
        .merge(contact_routes(state.clone()))
        .with_state(state);

    let router = router.layer(
        ServiceBuilder::new()
            .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
            .layer(cors_layer(&config)),
    );

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn contact_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/contacts", get(contacts::index).post(contacts::store))
        .route(
            "/api/contacts/:id",
            get(contacts::show)
                .patch(contacts::update)
                .put(contacts::update)
                .delete(contacts::destroy),
        )
        .route_layer(middleware::from_fn_with_state(state, crate::middleware::require_user))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
