//! Configuration for the Subscription API service.

use std::time::Duration;

use vetly_subscription_core::{SubscriptionConfig, UpcomingClinicPolicy};

/// Subscription API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Maximum database pool size
    pub database_max_connections: u32,
    /// Subscription engine configuration
    pub subscription: SubscriptionConfig,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
    /// Background reconciliation sweep enabled
    pub reconciliation_enabled: bool,
    /// Interval between reconciliation sweeps
    pub reconciliation_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| vetly_db::pool::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Request timeout
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Metrics
        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        // Reconciliation scheduler
        let reconciliation_enabled = std::env::var("RECONCILIATION_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let reconciliation_interval_secs: u64 = std::env::var("RECONCILIATION_INTERVAL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("RECONCILIATION_INTERVAL_SECS"))?;

        // Engine policy
        let allow_past_start_date = std::env::var("ALLOW_PAST_START_DATE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("ALLOW_PAST_START_DATE"))?;

        let upcoming_clinic_policy: UpcomingClinicPolicy =
            std::env::var("UPCOMING_CLINIC_POLICY")
                .unwrap_or_else(|_| "ended".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("UPCOMING_CLINIC_POLICY"))?;

        let max_apply_attempts: u32 = std::env::var("MAX_APPLY_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("MAX_APPLY_ATTEMPTS"))?;

        let subscription = SubscriptionConfig::new()
            .with_allow_past_start_date(allow_past_start_date)
            .with_upcoming_clinic_policy(upcoming_clinic_policy)
            .with_max_apply_attempts(max_apply_attempts);

        Ok(Self {
            http_port,
            database_url,
            database_max_connections,
            subscription,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            reconciliation_enabled,
            reconciliation_interval: Duration::from_secs(reconciliation_interval_secs),
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
