//! Calculation orchestration.
//!
//! Records a consumption for a profile, runs the estimator under both
//! thresholds and stores the combined result. Also serves the history views
//! and the time-remaining status of a stored result.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{info, warn};
use shared::{CalculationHistory, CalculationResult, Consumption, DriveStatus, Profile};

use crate::config::Settings;
use crate::domain::commands::calculation::{CalculateWaitTimeCommand, CalculationOutcome};
use crate::domain::models::validation::validate_amount;
use crate::domain::wait_time::{self, Threshold};
use crate::storage::{
    ConsumptionRepository, ConsumptionStorage, JsonConnection, ProfileRepository, ProfileStorage, ResultRepository,
    ResultStorage,
};

#[derive(Debug, Clone)]
pub struct CalculationService {
    connection: JsonConnection,
    profile_repository: ProfileRepository,
    consumption_repository: ConsumptionRepository,
    result_repository: ResultRepository,
    settings: Settings,
}

impl CalculationService {
    /// Create a CalculationService with default settings
    pub fn new(connection: JsonConnection) -> Self {
        Self::with_config(connection, Settings::default())
    }

    pub fn with_config(connection: JsonConnection, settings: Settings) -> Self {
        Self {
            profile_repository: ProfileRepository::new(connection.clone()),
            consumption_repository: ConsumptionRepository::new(connection.clone()),
            result_repository: ResultRepository::new(connection.clone()),
            connection,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Record a consumption and compute its wait time.
    ///
    /// Nothing is stored if the profile cannot be resolved or the input is
    /// out of range.
    pub fn calculate(&self, command: CalculateWaitTimeCommand) -> Result<CalculationOutcome> {
        let profile = self.resolve_profile(command.profile_id.as_deref())?;
        validate_amount(command.amount)?;

        let now = Utc::now();
        let consumption = Consumption {
            id: JsonConnection::generate_id(),
            profile_id: profile.id.clone(),
            amount: command.amount,
            method: command.method.unwrap_or(profile.method),
            timestamp: command.timestamp.unwrap_or(now),
            created_at: now,
        };

        info!(
            "Calculating wait time for profile {}: {}g {} at {}",
            profile.id, consumption.amount, consumption.method, consumption.timestamp
        );

        // Compute before persisting so a rejected input leaves no orphan consumption
        let result = self.compute_result(&profile, &consumption, now)?;

        // Consumption and result are committed together or not at all
        self.connection.transaction(|batch| {
            ConsumptionRepository::stage_save(batch, &consumption)?;
            ResultRepository::stage_save(batch, &result)?;
            Ok(())
        })?;

        info!(
            "Wait time for consumption {}: {} hours, safe to drive at {}",
            consumption.id, result.wait_hours, result.safe_drive_time
        );

        Ok(CalculationOutcome {
            profile,
            consumption,
            result,
        })
    }

    /// Recompute the result of a stored consumption with its profile's current data.
    ///
    /// The new result replaces the stored one. Returns `None` if the
    /// consumption or its profile no longer exists.
    pub fn recalculate(&self, consumption_id: &str) -> Result<Option<CalculationResult>> {
        let consumption = match self.consumption_repository.get_consumption(consumption_id)? {
            Some(consumption) => consumption,
            None => {
                warn!("Consumption not found: {}", consumption_id);
                return Ok(None);
            }
        };

        let profile = match self.profile_repository.get_profile(&consumption.profile_id)? {
            Some(profile) => profile,
            None => {
                warn!(
                    "Profile {} of consumption {} not found",
                    consumption.profile_id, consumption_id
                );
                return Ok(None);
            }
        };

        let result = self.compute_result(&profile, &consumption, Utc::now())?;
        self.result_repository.save_result(&result)?;

        info!("Recalculated consumption {}: {} hours", consumption_id, result.wait_hours);
        Ok(Some(result))
    }

    pub fn history(&self) -> Result<Vec<CalculationHistory>> {
        self.result_repository.get_calculation_history()
    }

    pub fn history_for_profile(&self, profile_id: &str) -> Result<Vec<CalculationHistory>> {
        self.result_repository.get_history_by_profile_id(profile_id)
    }

    pub fn consumptions_for_profile(&self, profile_id: &str) -> Result<Vec<Consumption>> {
        self.consumption_repository.get_consumptions_by_profile_id(profile_id)
    }

    pub fn results_for_profile(&self, profile_id: &str) -> Result<Vec<CalculationResult>> {
        self.result_repository.get_results_by_profile_id(profile_id)
    }

    /// Whether the thresholds of `result` are reached at `now`
    pub fn drive_status(&self, result: &CalculationResult, now: DateTime<Utc>) -> DriveStatus {
        DriveStatus {
            is_safe_now: wait_time::is_safe_now(now, result.safe_drive_time),
            is_below_informational: wait_time::is_safe_now(now, result.informational_time),
            minutes_until_safe: minutes_until(now, result.safe_drive_time),
            minutes_until_informational: minutes_until(now, result.informational_time),
        }
    }

    fn resolve_profile(&self, profile_id: Option<&str>) -> Result<Profile> {
        match profile_id {
            Some(id) => self
                .profile_repository
                .get_profile(id)?
                .ok_or_else(|| anyhow::anyhow!("Profile not found: {}", id)),
            None => self
                .profile_repository
                .get_current_profile()?
                .ok_or_else(|| anyhow::anyhow!("No current profile selected")),
        }
    }

    fn compute_result(
        &self,
        profile: &Profile,
        consumption: &Consumption,
        created_at: DateTime<Utc>,
    ) -> Result<CalculationResult> {
        let estimate = |threshold| {
            wait_time::estimate_for_threshold(
                threshold,
                profile.age,
                profile.weight,
                profile.frequency,
                consumption.amount,
                consumption.method,
            )
        };

        let wait_hours = estimate(Threshold::Conservative)?;
        let informational_hours = estimate(Threshold::Informational)?;

        let explanation = wait_time::build_explanation(
            wait_hours,
            profile.frequency,
            consumption.amount,
            Threshold::Conservative.ng_per_ml(&self.settings),
        );

        Ok(CalculationResult {
            id: JsonConnection::generate_id(),
            profile_id: profile.id.clone(),
            consumption_id: consumption.id.clone(),
            safe_drive_time: wait_time::safe_drive_time(consumption.timestamp, wait_hours),
            wait_hours,
            explanation,
            informational_time: wait_time::safe_drive_time(consumption.timestamp, informational_hours),
            informational_hours,
            created_at,
        })
    }
}

/// Whole minutes from `now` until `target`, rounded up; zero once reached
fn minutes_until(now: DateTime<Utc>, target: DateTime<Utc>) -> i64 {
    let seconds = (target - now).num_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds + 59) / 60
    }
}
