//! Vetly Types - Shared domain types
//!
//! This crate contains domain types used across Vetly services:
//! - Clinic tenants and their derived access status
//! - Subscription plans and payment methods
//! - Subscription records (the append-only lifecycle log)

pub mod clinic;
pub mod error;
pub mod payment;
pub mod plan;
pub mod record;

pub use clinic::*;
pub use error::*;
pub use payment::*;
pub use plan::*;
pub use record::*;
