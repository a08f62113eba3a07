//! Common test utilities for vetly-subscription-core integration tests

pub mod mock_repos;

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use vetly_db::{ClinicRow, PaymentMethodRow, PlanRow};
use vetly_subscription_core::{FixedClock, SubscriptionConfig, SubscriptionService};
use vetly_types::{ClinicId, PaymentMethodId, PlanId};

pub use mock_repos::{
    MockClinicRepository, MockPaymentMethodRepository, MockPlanRepository,
    MockSubscriptionRepository,
};

pub type TestService = SubscriptionService<
    MockSubscriptionRepository,
    MockClinicRepository,
    MockPlanRepository,
    MockPaymentMethodRepository,
>;

/// Service over in-memory repositories with a pinned clock
pub struct TestWorld {
    pub service: TestService,
    pub clock: Arc<FixedClock>,
    pub subscriptions: Arc<MockSubscriptionRepository>,
    pub clinics: Arc<MockClinicRepository>,
    pub plans: Arc<MockPlanRepository>,
    pub payment_methods: Arc<MockPaymentMethodRepository>,
}

impl TestWorld {
    pub fn new(today: NaiveDate) -> Self {
        Self::with_config(today, SubscriptionConfig::default())
    }

    pub fn with_config(today: NaiveDate, config: SubscriptionConfig) -> Self {
        let subscriptions = Arc::new(MockSubscriptionRepository::new());
        let clinics = Arc::new(MockClinicRepository::new());
        let plans = Arc::new(MockPlanRepository::new(subscriptions.clone()));
        let payment_methods = Arc::new(MockPaymentMethodRepository::new(subscriptions.clone()));
        let clock = Arc::new(FixedClock::new(today));

        let service = SubscriptionService::new(
            subscriptions.clone(),
            clinics.clone(),
            plans.clone(),
            payment_methods.clone(),
            clock.clone(),
            config,
        );

        Self {
            service,
            clock,
            subscriptions,
            clinics,
            plans,
            payment_methods,
        }
    }

    /// Register a clinic and return its ID
    pub fn add_clinic(&self, name: &str) -> ClinicId {
        let id = Uuid::new_v4();
        self.clinics.insert(ClinicRow {
            id,
            name: name.to_string(),
            owner_name: format!("{name} owner"),
            is_deactivated: false,
            created_at: chrono::Utc::now(),
        });
        ClinicId(id)
    }

    /// Register an active plan and return its ID
    pub fn add_plan(&self, duration_days: i32) -> PlanId {
        let id = Uuid::new_v4();
        self.plans.insert(PlanRow {
            id,
            name: format!("{duration_days}-day plan"),
            price_cents: 10_000,
            duration_days,
            allowed_accounts: 5,
            is_active: true,
        });
        PlanId(id)
    }

    /// Register an active payment method and return its ID
    pub fn add_payment_method(&self, name: &str) -> PaymentMethodId {
        let id = Uuid::new_v4();
        self.payment_methods.insert(PaymentMethodRow {
            id,
            name: name.to_string(),
            is_active: true,
        });
        PaymentMethodId(id)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
