//! Application state for the Subscription API service.

use std::sync::Arc;

use vetly_db::pg::{
    PgClinicRepository, PgPaymentMethodRepository, PgPlanRepository, PgSubscriptionRepository,
    Repositories,
};
use vetly_db::DbPool;
use vetly_subscription_core::SubscriptionService;

use crate::config::Config;

/// The subscription engine wired to the PostgreSQL repositories
pub type PgSubscriptionService = SubscriptionService<
    PgSubscriptionRepository,
    PgClinicRepository,
    PgPlanRepository,
    PgPaymentMethodRepository,
>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Subscription lifecycle engine
    pub subscriptions: Arc<PgSubscriptionService>,
    /// Database repositories (catalog and clinic management)
    pub repos: Repositories,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        subscriptions: PgSubscriptionService,
        repos: Repositories,
        pool: DbPool,
        config: Config,
    ) -> Self {
        Self {
            subscriptions: Arc::new(subscriptions),
            repos,
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
