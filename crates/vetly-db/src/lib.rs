//! Vetly DB - Database abstractions
//!
//! SQLx-based database layer for Vetly services.
//!
//! # Example
//!
//! ```rust,ignore
//! use vetly_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/vetly").await?;
//! let repos = Repositories::new(pool);
//!
//! let history = repos.subscriptions.history_for_clinic(clinic_id).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_size, DbPool};
pub use repo::*;
