//! # Storage Traits
//!
//! Storage abstractions used by the domain services. Every operation is
//! synchronous; lookups that find nothing return `None` or an empty `Vec`
//! rather than an error.

use anyhow::Result;
use shared::{CalculationHistory, CalculationResult, Consumption, Profile};

/// Profiles and the current-profile pointer
pub trait ProfileStorage {
    /// Insert a profile, or replace the one with the same id in place
    fn save_profile(&self, profile: &Profile) -> Result<()>;

    /// All profiles in first-insertion order
    fn get_profiles(&self) -> Result<Vec<Profile>>;

    fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>>;

    /// Remove a profile together with every consumption and result that references it.
    /// Returns true if the profile existed.
    fn delete_profile(&self, profile_id: &str) -> Result<bool>;

    fn set_current_profile(&self, profile_id: &str) -> Result<()>;

    fn get_current_profile_id(&self) -> Result<Option<String>>;

    /// The profile the pointer refers to; `None` if unset or the profile is gone
    fn get_current_profile(&self) -> Result<Option<Profile>>;
}

/// Consumption events
pub trait ConsumptionStorage {
    fn save_consumption(&self, consumption: &Consumption) -> Result<()>;

    fn get_consumptions(&self) -> Result<Vec<Consumption>>;

    fn get_consumption(&self, consumption_id: &str) -> Result<Option<Consumption>>;

    /// Consumptions of one profile, in store order
    fn get_consumptions_by_profile_id(&self, profile_id: &str) -> Result<Vec<Consumption>>;

    /// Returns the number of consumptions removed
    fn delete_consumptions_by_profile_id(&self, profile_id: &str) -> Result<usize>;
}

/// Calculation results and the derived history view
pub trait ResultStorage {
    /// Insert or replace a result. At most one result is kept per consumption:
    /// a result for an already-covered consumption replaces the old one in place.
    fn save_result(&self, result: &CalculationResult) -> Result<()>;

    fn get_results(&self) -> Result<Vec<CalculationResult>>;

    fn get_results_by_profile_id(&self, profile_id: &str) -> Result<Vec<CalculationResult>>;

    fn get_result_for_consumption(&self, consumption_id: &str) -> Result<Option<CalculationResult>>;

    /// Returns the number of results removed
    fn delete_results_by_profile_id(&self, profile_id: &str) -> Result<usize>;

    /// Results joined with their profile and consumption, in result order.
    /// Results whose profile or consumption is missing are left out.
    fn get_calculation_history(&self) -> Result<Vec<CalculationHistory>>;

    fn get_history_by_profile_id(&self, profile_id: &str) -> Result<Vec<CalculationHistory>>;
}
