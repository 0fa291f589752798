//! Domain-level command and outcome types used by the services.

pub mod profile {
    use shared::{ConsumptionMethod, Frequency};

    /// Input for creating a new profile.
    #[derive(Debug, Clone)]
    pub struct CreateProfileCommand {
        pub name: String,
        pub age: u32,
        pub weight: u32,
        pub frequency: Frequency,
        pub method: ConsumptionMethod,
    }

    /// Full replacement of an existing profile's editable fields.
    #[derive(Debug, Clone)]
    pub struct UpdateProfileCommand {
        pub profile_id: String,
        pub name: String,
        pub age: u32,
        pub weight: u32,
        pub frequency: Frequency,
        pub method: ConsumptionMethod,
    }
}

pub mod calculation {
    use chrono::{DateTime, Utc};
    use shared::{CalculationResult, Consumption, ConsumptionMethod, Profile};

    /// Input for recording a consumption and computing its wait time.
    #[derive(Debug, Clone, Default)]
    pub struct CalculateWaitTimeCommand {
        /// Falls back to the current profile
        pub profile_id: Option<String>,
        /// Grams consumed
        pub amount: f64,
        /// Falls back to the profile's default method
        pub method: Option<ConsumptionMethod>,
        /// When it was consumed; falls back to now
        pub timestamp: Option<DateTime<Utc>>,
    }

    /// Everything persisted by one calculation.
    #[derive(Debug, Clone)]
    pub struct CalculationOutcome {
        pub profile: Profile,
        pub consumption: Consumption,
        pub result: CalculationResult,
    }
}
