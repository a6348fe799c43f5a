//! Spendscope Web Server
//!
//! Axum-based REST API for the spendscope expense dashboard.
//!
//! All routes live under `/api`. Requests name the acting user with a
//! `user_id` query parameter; authentication is left to a fronting proxy.
//!
//! Security features:
//! - Restrictive CORS policy
//! - Input validation (pagination limits, body size limits)
//! - Security headers on every response
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use spendscope_core::ai::{AIClient, InsightBackend};
use spendscope_core::insights::{InsightService, SeededStrategy};
use spendscope_core::{Config, MemoryStore};

mod handlers;

/// Maximum request body size (1 MB; Gmail imports are the largest bodies)
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Read `SPENDSCOPE_ALLOWED_ORIGINS` (comma-separated)
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("SPENDSCOPE_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self { allowed_origins }
    }
}

/// Shared application state
pub struct AppState {
    pub store: MemoryStore,
    pub config: Config,
    pub ai: Option<AIClient>,
    /// Analysis reports (generated or templated)
    pub insights: InsightService<AIClient>,
}

impl AppState {
    pub fn new(store: MemoryStore, config: Config, ai: Option<AIClient>) -> Self {
        let mut insights = InsightService::new(ai.clone()).with_timeout(config.insights.timeout);
        if let Some(seed) = config.insights.seed {
            insights = insights.with_strategy(SeededStrategy::new(seed));
        }
        Self {
            store,
            config,
            ai,
            insights,
        }
    }
}

/// Message response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Create the application router (AI backend chosen by the config)
pub fn create_router(store: MemoryStore, config: Config, server: ServerConfig) -> Router {
    let ai = config.ai_client();
    match ai {
        Some(ref client) => info!(
            "AI backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => info!("AI backend not configured, insights will use templates"),
    }
    create_router_with_state(AppState::new(store, config, ai), server)
}

/// Create the application router around prepared state (for testing)
pub fn create_router_with_state(state: AppState, server: ServerConfig) -> Router {
    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Users
        .route("/users", post(handlers::create_user))
        .route("/users/:id", get(handlers::get_user))
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/expenses/stats", get(handlers::expense_stats))
        .route(
            "/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // Partners
        .route("/partners/invite", post(handlers::send_invite))
        .route("/partners/invites", get(handlers::list_invites))
        .route(
            "/partners/invites/:id/accept",
            post(handlers::accept_invite),
        )
        .route(
            "/partners/invites/:id/decline",
            post(handlers::decline_invite),
        )
        .route("/partners/unlink", axum::routing::delete(handlers::unlink_partner))
        .route("/partners/status", get(handlers::partner_status))
        // Analysis
        .route("/analysis", post(handlers::analyze_expenses))
        .route("/analysis/comparison", get(handlers::compare_with_partner))
        // Gmail
        .route("/gmail/import", post(handlers::import_gmail));

    let cors = build_cors(&server);

    // CSP: API only, nothing to render
    let csp_value = HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'");

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ))
}

fn build_cors(server: &ServerConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if server.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        return cors;
    }
    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors.allow_origin(origins)
}

/// Start the server
pub async fn serve(
    store: MemoryStore,
    config: Config,
    host: &str,
    port: u16,
    server: ServerConfig,
) -> anyhow::Result<()> {
    check_ai_connection(&config).await;

    let app = create_router(store, config, server);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(config: &Config) {
    match config.ai_client() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("AI backend not configured (set AI_BACKEND to enable generated insights)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn forbidden(msg: &str) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: &str) -> Self {
        Self::with_status(StatusCode::CONFLICT, msg)
    }

    pub fn status(&self) -> StatusCode {
        self.status
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

impl From<spendscope_core::Error> for AppError {
    fn from(err: spendscope_core::Error) -> Self {
        use spendscope_core::Error;

        match err {
            Error::Validation(msg) | Error::Import(msg) => Self::bad_request(&msg),
            Error::NotFound(what) => Self::not_found(&format!("{} not found", what)),
            Error::Forbidden(msg) => Self::forbidden(&msg),
            Error::Conflict(msg) => Self::conflict(&msg),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(other.into()),
            },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}
