use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{
    AuthorizationGuard, DatabaseSessionResolver, SessionResolver, TokenSessionResolver, TracingAuditSink,
};
use crate::config::{AppConfig, SessionSource};
use crate::database::{DatabaseError, DatabaseManager};
use crate::handlers;
use crate::middleware::require_admin;

/// Shared per-process state, built once at startup and cloned into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub guard: AuthorizationGuard,
    pub database: DatabaseManager,
}

impl FromRef<AppState> for AuthorizationGuard {
    fn from_ref(state: &AppState) -> Self {
        state.guard.clone()
    }
}

impl AppState {
    /// Wire the guard from configuration: the allowlist is copied out of the
    /// config once and never reloaded.
    pub fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        let database = DatabaseManager::connect_lazy(&config.database)?;
        let tokens = TokenSessionResolver::new(
            config.security.jwt_secret.clone(),
            config.security.session_cookie.clone(),
        );

        let sessions: Arc<dyn SessionResolver> = match config.security.session_source {
            SessionSource::Token => Arc::new(tokens),
            SessionSource::Database => Arc::new(DatabaseSessionResolver::new(tokens, database.pool()?.clone())),
        };

        let guard = AuthorizationGuard::new(
            sessions,
            Arc::new(config.security.admin_allowlist.clone()),
            Arc::new(TracingAuditSink),
        );

        tracing::info!(
            "Admin allowlist loaded with {} entries ({:?} sessions)",
            config.security.admin_allowlist.len(),
            config.security.session_source
        );

        Ok(Self {
            config: Arc::new(config),
            guard,
            database,
        })
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        // Admin-gated
        .merge(admin_routes(state.clone()))
        // Owner-or-admin, authorized inside the handler
        .route("/api/admin/courses/:id", patch(handlers::admin::update_course))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use handlers::admin;

    Router::new()
        .route("/api/admin/whoami", get(admin::whoami))
        .route("/api/admin/allowlist", get(admin::allowlist_summary))
        .route_layer(from_fn_with_state(state, require_admin))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
