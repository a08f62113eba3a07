//! Vetly Subscription Core - the subscription lifecycle engine
//!
//! Governs a clinic's subscription records over time:
//! - a pure state machine computing legal transitions, end dates, and
//!   the clinic's derived access status ([`machine`])
//! - the transition engine creating records through locked, re-validated
//!   writes ([`service`])
//! - the daily reconciliation sweep that activates due UPCOMING records
//!   and expires overdue ACTIVE ones ([`reconciliation`])
//!
//! The record log is append-only: status changes append a new row
//! sharing the group id, never edit history.

pub mod clock;
pub mod config;
pub mod error;
pub mod machine;
pub mod reconciliation;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{SubscriptionConfig, UpcomingClinicPolicy};
pub use error::SubscriptionError;
pub use reconciliation::{ClinicReconciliation, ReconciliationReport};
pub use service::{CreateSubscription, SubscriptionService};
