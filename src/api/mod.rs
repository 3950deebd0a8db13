mod handlers;
pub mod middleware;

pub use handlers::{CheckRainTriggerRequest, CheckRainTriggerResponse};

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::ComplianceEngine;
use middleware::SecurityConfig;

/// Router with security disabled, for local development and tests.
pub fn create_router(engine: Arc<ComplianceEngine>) -> Router {
    create_router_with_security(engine, SecurityConfig::disabled())
}

pub fn create_router_with_security(engine: Arc<ComplianceEngine>, security: SecurityConfig) -> Router {
    let api = Router::new()
        // Evaluation
        .route("/compliance/check", post(handlers::check_rain_trigger))
        .route("/compliance/sweep", post(handlers::run_escalation_sweep))
        .route("/compliance/last-error", get(handlers::last_error))
        // Per-project compliance views
        .route("/projects/{id}/compliance/history", get(handlers::compliance_history))
        .route("/projects/{id}/compliance/cooldown", get(handlers::cooldown_status))
        // Triggers
        .route("/triggers/{id}", get(handlers::get_trigger))
        .route("/triggers/{id}/discharge", post(handlers::discharge_trigger));

    let cors = match &security.cors_origins {
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parsed))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    let mut router = Router::new()
        .nest("/api/v1", api)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(engine);

    if let Some(rate_limiter) = security.rate_limiter.clone() {
        router = router.layer(from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ));
    }
    router.layer(from_fn_with_state(security, middleware::auth_middleware))
}
