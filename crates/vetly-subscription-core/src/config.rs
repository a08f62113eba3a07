//! Subscription engine policy configuration

/// How a clinic with only UPCOMING records derives its status.
///
/// The clinic is not yet served either way; the policy decides whether
/// access gating treats it like a lapsed clinic or a brand-new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpcomingClinicPolicy {
    /// Classify as ended (the default)
    #[default]
    Ended,
    /// Classify as inactive
    Inactive,
}

impl std::str::FromStr for UpcomingClinicPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ended" => Ok(Self::Ended),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown upcoming-clinic policy: {other}")),
        }
    }
}

/// Engine policy knobs
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    /// Permit a new subscription to start in the past (it is then
    /// treated as immediately active). Default: false.
    pub allow_past_start_date: bool,
    /// Derived status for a clinic whose only records are UPCOMING
    pub upcoming_clinic_policy: UpcomingClinicPolicy,
    /// Attempts before a transition gives up on conflicting writers
    pub max_apply_attempts: u32,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            allow_past_start_date: false,
            upcoming_clinic_policy: UpcomingClinicPolicy::default(),
            max_apply_attempts: 3,
        }
    }
}

impl SubscriptionConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Permit past start dates on new subscriptions
    #[must_use]
    pub fn with_allow_past_start_date(mut self, allow: bool) -> Self {
        self.allow_past_start_date = allow;
        self
    }

    /// Set the UPCOMING-only clinic status policy
    #[must_use]
    pub fn with_upcoming_clinic_policy(mut self, policy: UpcomingClinicPolicy) -> Self {
        self.upcoming_clinic_policy = policy;
        self
    }

    /// Set the conflict retry budget
    #[must_use]
    pub fn with_max_apply_attempts(mut self, attempts: u32) -> Self {
        self.max_apply_attempts = attempts.max(1);
        self
    }
}
