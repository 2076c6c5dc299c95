use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{auth, batteries, customers, health, invoices, permissions, settings, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    // Rate limiting covers login attempts; 0 disables it
    let rate_limiter = if config.security.rate_limit_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.security.rate_limit_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        pool,
        config: config.clone(),
        rate_limiter,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh));

    // Authenticated routes. Each handler runs the bearer-token extractor
    // and applies its own role or permission gate.
    let api_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/permissions", get(permissions::get_permissions))
        // Battery workflow
        .route("/api/v1/batteries", post(batteries::intake_battery))
        .route("/api/v1/batteries", get(batteries::list_batteries))
        .route("/api/v1/batteries/scan", post(batteries::scan_battery))
        .route("/api/v1/batteries/:id", get(batteries::get_battery))
        .route(
            "/api/v1/batteries/:id/transitions",
            post(batteries::transition_battery),
        )
        .route(
            "/api/v1/batteries/:id/assignment",
            post(batteries::assign_technician),
        )
        .route("/api/v1/batteries/:id/repair", put(batteries::update_repair))
        .route(
            "/api/v1/batteries/:id/history",
            get(batteries::get_battery_history),
        )
        .route("/api/v1/batteries/:id/qr", get(batteries::get_battery_qr))
        // Customers
        .route("/api/v1/customers", post(customers::create_customer))
        .route("/api/v1/customers", get(customers::list_customers))
        .route("/api/v1/customers/:id", get(customers::get_customer))
        .route("/api/v1/customers/:id", put(customers::update_customer))
        .route(
            "/api/v1/customers/:id",
            delete(customers::deactivate_customer),
        )
        // Invoices
        .route("/api/v1/invoices", post(invoices::create_invoice))
        .route("/api/v1/invoices", get(invoices::list_invoices))
        .route("/api/v1/invoices/:id", get(invoices::get_invoice))
        .route(
            "/api/v1/invoices/:id/payments",
            post(invoices::record_payment),
        )
        // Staff accounts (admin only, gated in the handlers)
        .route("/api/v1/users", post(users::create_user))
        .route("/api/v1/users", get(users::list_users))
        .route("/api/v1/users/:id", get(users::get_user))
        .route("/api/v1/users/:id", put(users::update_user))
        .route("/api/v1/users/:id", delete(users::deactivate_user))
        .route(
            "/api/v1/users/:id/reset-password",
            post(users::reset_password),
        )
        // Shop settings
        .route("/api/v1/settings", get(settings::get_settings))
        .route("/api/v1/settings", put(settings::update_settings));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
