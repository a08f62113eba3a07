//! PostgreSQL repository implementations

mod clinic;
mod payment_method;
mod plan;
mod subscription;

pub use clinic::PgClinicRepository;
pub use payment_method::PgPaymentMethodRepository;
pub use plan::PgPlanRepository;
pub use subscription::PgSubscriptionRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub clinics: PgClinicRepository,
    pub plans: PgPlanRepository,
    pub payment_methods: PgPaymentMethodRepository,
    pub subscriptions: PgSubscriptionRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            clinics: PgClinicRepository::new(pool.clone()),
            plans: PgPlanRepository::new(pool.clone()),
            payment_methods: PgPaymentMethodRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool),
        }
    }
}
