//! Fina Web Server
//!
//! Axum-based JSON API over the Fina transaction intelligence engine.
//!
//! Security features:
//! - Bearer API-key authentication (secure by default, use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input validation (month ranges, forecast horizon)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use fina_core::{Database, EngineConfig, InsightPhraser, IntelligenceEngine, OllamaPhraser};

mod handlers;

/// Longest forecast horizon accepted by the API
pub const MAX_FORECAST_MONTHS: u32 = 24;

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// API keys accepted as "Bearer <key>" in the Authorization header
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub engine: IntelligenceEngine<Database>,
    pub config: ServerConfig,
    /// Narrative phrasing for `/insights` (None = rule output only)
    pub phraser: Option<Arc<dyn InsightPhraser>>,
}

impl AppState {
    pub fn db(&self) -> &Database {
        self.engine.store()
    }
}

/// Authentication middleware - validates a bearer API key
///
/// API keys are compared in constant time. `/api/health` is always open.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth || request.uri().path() == "/api/health" {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        info!(user = "api-key", path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub phraser: bool,
}

/// Create the application router with the default engine config and Ollama from env
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    create_router_with_options(db, EngineConfig::default(), config, phraser_from_env())
}

/// Ollama-backed phraser when `OLLAMA_HOST` is set
fn phraser_from_env() -> Option<Arc<dyn InsightPhraser>> {
    match OllamaPhraser::from_env() {
        Some(phraser) => {
            info!("Insight phraser configured (model: {})", phraser.model());
            Some(Arc::new(phraser))
        }
        None => {
            info!("ℹ️  Insight phraser not configured (set OLLAMA_HOST to enable narratives)");
            None
        }
    }
}

/// Create the application router with an explicit engine config and phraser
pub fn create_router_with_options(
    db: Database,
    engine_config: EngineConfig,
    config: ServerConfig,
    phraser: Option<Arc<dyn InsightPhraser>>,
) -> Router {
    let state = Arc::new(AppState {
        engine: IntelligenceEngine::new(db, engine_config),
        config: config.clone(),
        phraser,
    });

    let user_routes = Router::new()
        // Classification
        .route("/classify", post(handlers::classify))
        .route("/classify/simple", post(handlers::classify_simple))
        .route("/learn", post(handlers::learn))
        .route(
            "/classification-stats",
            get(handlers::classification_stats),
        )
        // Analysis
        .route("/anomaly", get(handlers::detect_anomaly))
        .route("/forecast", get(handlers::forecast))
        .route("/recommendations", get(handlers::recommendations))
        .route("/insights", get(handlers::insights));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .nest("/users/:user_id", user_routes);

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default(), EngineConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
    engine_config: EngineConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.api_keys.is_empty() {
        warn!("⚠️  Authentication required but no API keys configured; every request will be rejected");
    }

    let app = create_router_with_options(db, engine_config, config, phraser_from_env());
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
