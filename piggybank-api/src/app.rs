/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use piggybank_api::{app::AppState, config::Config};
/// use piggybank_shared::advice::MockAdviceClient;
/// use piggybank_shared::store::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MockAdviceClient::new()),
///     config,
/// );
/// let app = piggybank_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        auth::{jwt_auth_layer, require_user},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use piggybank_shared::advice::{AdviceClient, AdviceGenerator};
use piggybank_shared::store::SharedStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: SharedStore,

    /// Advice generation over the configured client
    pub advisor: AdviceGenerator,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: SharedStore, client: Arc<dyn AdviceClient>, config: Config) -> Self {
        let advisor = AdviceGenerator::new(client, config.advice.model.clone(), config.advice.max_tokens);

        Self {
            store,
            advisor,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET  /                         # Service banner (public)
/// ├── GET  /health                   # Health check (public)
/// └── /api/v1/                       # Bearer token required
///     ├── /users/
///     │   ├── POST   /               # Register the token subject
///     │   └── GET|PUT|DELETE /me     # Own profile
///     ├── /transactions/
///     │   ├── POST   /               # Create
///     │   ├── GET    /               # List (?skip=&limit=)
///     │   └── GET|PUT|DELETE /:id    # Read, update, delete
///     └── GET /analysis/             # Summary with AI advice
/// ```
///
/// Collection routes answer with and without the trailing slash.
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, tracing, then per-route JWT
/// authentication and registered-user resolution.
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{analysis, health, transactions, users};

    let public_routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check));

    // Token only; the subject may not be registered yet
    let account_routes = Router::new()
        .route("/api/v1/users", post(users::register))
        .route("/api/v1/users/", post(users::register))
        .route(
            "/api/v1/users/me",
            get(users::me).put(users::update_me).delete(users::delete_me),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let user_routes = Router::new()
        .route(
            "/api/v1/transactions",
            post(transactions::create_transaction).get(transactions::list_transactions),
        )
        .route(
            "/api/v1/transactions/",
            post(transactions::create_transaction).get(transactions::list_transactions),
        )
        .route(
            "/api/v1/transactions/:id",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route("/api/v1/analysis", get(analysis::get_analysis))
        .route("/api/v1/analysis/", get(analysis::get_analysis))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(user_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
