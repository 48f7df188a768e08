use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::api::handlers;
use crate::api::server_config::*;
use crate::auth::core::{PasswordService, TokenService};
use crate::auth::AuthService;
use crate::catalog::{CatalogGateway, CatalogSource, PokeApiClient};
use crate::collection::{CollectionService, TypeCache};
use crate::config::AppConfig;
use crate::storage::Database;
use crate::users::UserAdminService;

/// Shared application state.
pub struct PokedexServer {
    pub config: AppConfig,
    pub db: Database,
    pub auth: AuthService,
    pub users: UserAdminService,
    pub catalog: CatalogGateway,
    pub collection: CollectionService,
}

impl PokedexServer {
    /// Connects the store, wires the services and creates the bootstrap
    /// admin when none exists.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let client = PokeApiClient::new(&config.catalog)?;
        Self::with_catalog(config, Arc::new(client)).await
    }

    /// Same as [`PokedexServer::new`] with a given catalog source.
    pub async fn with_catalog(
        config: AppConfig,
        source: Arc<dyn CatalogSource>,
    ) -> anyhow::Result<Self> {
        let db = Database::connect(&config.database).await?;

        let passwords = PasswordService::new(&config.auth.password)?;
        let tokens = TokenService::new(config.auth.jwt_secret.clone(), config.auth.token_ttl_secs);

        let users = UserAdminService::new(db.clone());
        users.ensure_admin(&passwords, &config.bootstrap).await?;

        let auth = AuthService::new(db.clone(), passwords, tokens);
        let catalog = CatalogGateway::new(db.clone(), source.clone(), config.catalog.search_window);
        let collection = CollectionService::new(db.clone(), TypeCache::new(source));

        Ok(Self {
            config,
            db,
            auth,
            users,
            catalog,
            collection,
        })
    }

    pub fn create_router(self) -> Router {
        let cors = cors_layer(&self.config.server.cors_origins);
        let state = Arc::new(self);

        Router::new()
            .route("/", get(handlers::root))
            .route("/auth/register", post(handlers::auth::register))
            .route("/auth/login", post(handlers::auth::login))
            .route("/auth/change-password", post(handlers::auth::change_password))
            .route(
                "/auth/admin/reset-password",
                post(handlers::auth::admin_reset_password),
            )
            .route("/pokemon", get(handlers::pokemon::list_pokemon))
            .route(
                "/user-pokemon/favoritos",
                get(handlers::user_pokemon::list_favorites).post(handlers::user_pokemon::add_favorite),
            )
            .route(
                "/user-pokemon/favoritos/:codigo",
                delete(handlers::user_pokemon::remove_favorite),
            )
            .route(
                "/user-pokemon/equipe",
                get(handlers::user_pokemon::list_team).post(handlers::user_pokemon::add_to_team),
            )
            .route(
                "/user-pokemon/equipe/:codigo",
                delete(handlers::user_pokemon::remove_from_team),
            )
            .route("/usuarios", get(handlers::users::list_users))
            .route(
                "/usuarios/:id",
                get(handlers::users::get_user)
                    .put(handlers::users::update_user)
                    .delete(handlers::users::delete_user),
            )
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENCY))
                    .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE)),
            )
            .layer(cors)
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let app = self.create_router();

        let listener = TcpListener::bind(&addr).await?;
        info!("Server listening on {}", addr);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    info!(count = origins.len(), "CORS origins configured");

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
