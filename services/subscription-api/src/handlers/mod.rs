//! REST API handlers

pub mod clinics;
pub mod health;
pub mod payment_methods;
pub mod plans;
pub mod reconciliation;
pub mod shared;
pub mod subscriptions;

pub use clinics::*;
pub use health::*;
pub use payment_methods::*;
pub use plans::*;
pub use reconciliation::*;
pub use subscriptions::*;
