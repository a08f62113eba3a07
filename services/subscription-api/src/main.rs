//! Vetly Subscription API
//!
//! Subscription lifecycle microservice for the clinic platform.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/clinics` - Register a clinic
//! - `GET /api/v1/clinics/{id}` - Get a clinic with its derived status
//! - `GET /api/v1/clinics/{id}/status` - Derived access status only
//! - `GET /api/v1/clinics/{id}/subscriptions` - Full record history
//! - `POST /api/v1/clinics/{id}/subscriptions` - Purchase a subscription
//! - `POST /api/v1/subscriptions/{id}/suspend` - Suspend an active subscription
//! - `POST /api/v1/subscriptions/{id}/reactivate` - Reactivate a suspended subscription
//! - `POST /api/v1/subscriptions/{id}/refund` - Refund a subscription
//! - `GET /api/v1/subscriptions/active` - Batch active-record lookup
//! - `GET|POST /api/v1/plans`, `DELETE /api/v1/plans/{id}` - Plan catalog
//! - `GET|POST /api/v1/payment-methods`, `DELETE /api/v1/payment-methods/{id}` - Payment methods
//! - `POST /api/v1/reconciliation/run` - Manual reconciliation sweep
//!
//! ## Background Work
//!
//! A scheduler runs the reconciliation sweep on a configurable interval,
//! activating due UPCOMING records and expiring overdue ACTIVE ones.
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::connect_info::IntoMakeServiceWithConnectInfo;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use vetly_db::pg::Repositories;
use vetly_subscription_core::{SubscriptionService, SystemClock};

use crate::config::Config;
use crate::handlers::reconciliation::record_reconciliation_metrics;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("subscription_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Vetly Subscription API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        reconciliation_enabled = config.reconciliation_enabled,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool =
        vetly_db::create_pool_with_size(&config.database_url, config.database_max_connections)
            .await?;
    tracing::info!("Database pool created");

    // Create repositories
    let repos = Repositories::new(pool.clone());

    // Create the subscription engine
    let subscriptions = SubscriptionService::new(
        Arc::new(repos.subscriptions.clone()),
        Arc::new(repos.clinics.clone()),
        Arc::new(repos.plans.clone()),
        Arc::new(repos.payment_methods.clone()),
        Arc::new(SystemClock),
        config.subscription.clone(),
    );

    // Create application state
    let state = AppState::new(subscriptions, repos, pool, config.clone());

    // Build HTTP router
    let app = build_router(state.clone(), metrics_handle);

    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));

    // Run the server and the reconciliation scheduler concurrently
    tokio::select! {
        result = run_http_server(app, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = ?e, "HTTP server error");
            }
        }
        () = run_reconciliation_scheduler(state), if config.reconciliation_enabled => {
            tracing::error!("Reconciliation scheduler exited unexpectedly");
        }
        () = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API v1 routes
    let api_v1 = Router::new()
        // Clinic routes
        .route("/clinics", post(handlers::create_clinic))
        .route("/clinics/{id}", get(handlers::get_clinic))
        .route("/clinics/{id}/status", get(handlers::get_clinic_status))
        .route(
            "/clinics/{id}/subscriptions",
            get(handlers::list_clinic_subscriptions).post(handlers::create_subscription),
        )
        // Subscription transitions
        .route(
            "/subscriptions/{id}/suspend",
            post(handlers::suspend_subscription),
        )
        .route(
            "/subscriptions/{id}/reactivate",
            post(handlers::reactivate_subscription),
        )
        .route(
            "/subscriptions/{id}/refund",
            post(handlers::refund_subscription),
        )
        .route("/subscriptions/active", get(handlers::active_subscriptions))
        // Catalog routes
        .route("/plans", get(handlers::list_plans).post(handlers::create_plan))
        .route("/plans/{id}", delete(handlers::delete_plan))
        .route(
            "/payment-methods",
            get(handlers::list_payment_methods).post(handlers::create_payment_method),
        )
        .route(
            "/payment-methods/{id}",
            delete(handlers::delete_payment_method),
        )
        // Reconciliation
        .route("/reconciliation/run", post(handlers::run_reconciliation));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    // Combine all routes
    Router::new()
        .nest("/api/v1", api_v1)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let service: IntoMakeServiceWithConnectInfo<Router, SocketAddr> =
        app.into_make_service_with_connect_info();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Periodic reconciliation sweep.
///
/// The first tick fires immediately so a restarted service catches up on
/// transitions missed while it was down.
async fn run_reconciliation_scheduler(state: AppState) {
    let mut ticker = tokio::time::interval(state.config.reconciliation_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let start = Instant::now();
        match state.subscriptions.run_daily_reconciliation().await {
            Ok(report) => {
                record_reconciliation_metrics(&report, start.elapsed().as_secs_f64());
            }
            Err(err) => {
                tracing::error!(error = %err, "Scheduled reconciliation sweep failed");
            }
        }
    }
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Transitions are short single-row appends; sweeps can span many
    // clinics, so they get a wider bucket range.
    let operation_latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];
    let sweep_latency_buckets = &[0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0];

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            operation_latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("subscription_operation_duration_seconds".to_string()),
            operation_latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("reconciliation_duration_seconds".to_string()),
            sweep_latency_buckets,
        )?;

    let handle = builder.install_recorder()?;

    // Register metrics with descriptions
    metrics::describe_counter!(
        "subscription_transitions_total",
        "Total subscription transitions by action"
    );
    metrics::describe_counter!(
        "reconciliation_runs_total",
        "Total reconciliation sweeps executed"
    );
    metrics::describe_counter!(
        "reconciliation_records_total",
        "Total records transitioned by reconciliation, by kind"
    );
    metrics::describe_counter!(
        "reconciliation_clinics_failed_total",
        "Total clinics skipped by a sweep due to errors"
    );
    metrics::describe_histogram!(
        "subscription_operation_duration_seconds",
        "Subscription operation latency in seconds"
    );
    metrics::describe_histogram!(
        "reconciliation_duration_seconds",
        "Reconciliation sweep latency in seconds"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
