//! # JSON Result Repository
//!
//! Calculation results live in `results.json` in insertion order. At most one
//! result is kept per consumption; recomputing replaces the earlier result
//! where it stood.
//!
//! The history view joins each result with its profile and consumption.
//! Results whose profile or consumption has disappeared are skipped.

use anyhow::Result;
use log::{debug, info};
use shared::{CalculationHistory, CalculationResult, Consumption, Profile};

use super::connection::{Batch, Collection, JsonConnection};
use crate::storage::ResultStorage;

#[derive(Debug, Clone)]
pub struct ResultRepository {
    connection: JsonConnection,
}

impl ResultRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    /// Save a result as part of an open batch; returns the result it replaced
    pub fn stage_save(batch: &mut Batch<'_>, result: &CalculationResult) -> Result<Option<CalculationResult>> {
        let mut results: Vec<CalculationResult> = batch.read(Collection::Results)?;

        let position = results
            .iter()
            .position(|r| r.id == result.id)
            .or_else(|| results.iter().position(|r| r.consumption_id == result.consumption_id));

        let replaced = match position {
            Some(index) => Some(std::mem::replace(&mut results[index], result.clone())),
            None => {
                results.push(result.clone());
                None
            }
        };

        batch.write(Collection::Results, &results)?;
        Ok(replaced)
    }
}

impl ResultStorage for ResultRepository {
    fn save_result(&self, result: &CalculationResult) -> Result<()> {
        let replaced = self
            .connection
            .transaction(|batch| Self::stage_save(batch, result))?;

        match replaced {
            Some(previous) if previous.id != result.id => info!(
                "Result {} replaced result {} for consumption {}",
                result.id, previous.id, result.consumption_id
            ),
            _ => info!("Saved result {} for consumption {}", result.id, result.consumption_id),
        }
        Ok(())
    }

    fn get_results(&self) -> Result<Vec<CalculationResult>> {
        self.connection.read_collection(Collection::Results)
    }

    fn get_results_by_profile_id(&self, profile_id: &str) -> Result<Vec<CalculationResult>> {
        let results = self.get_results()?;
        Ok(results.into_iter().filter(|r| r.profile_id == profile_id).collect())
    }

    fn get_result_for_consumption(&self, consumption_id: &str) -> Result<Option<CalculationResult>> {
        let results = self.get_results()?;
        Ok(results.into_iter().find(|r| r.consumption_id == consumption_id))
    }

    fn delete_results_by_profile_id(&self, profile_id: &str) -> Result<usize> {
        let removed = self.connection.transaction(|batch| {
            let mut results: Vec<CalculationResult> = batch.read(Collection::Results)?;
            let before = results.len();
            results.retain(|r| r.profile_id != profile_id);
            let removed = before - results.len();

            if removed > 0 {
                batch.write(Collection::Results, &results)?;
            }
            Ok(removed)
        })?;

        info!("Deleted {} result(s) for profile {}", removed, profile_id);
        Ok(removed)
    }

    fn get_calculation_history(&self) -> Result<Vec<CalculationHistory>> {
        let (profiles, consumptions, results) = self.connection.transaction(|batch| {
            let profiles: Vec<Profile> = batch.read(Collection::Profiles)?;
            let consumptions: Vec<Consumption> = batch.read(Collection::Consumptions)?;
            let results: Vec<CalculationResult> = batch.read(Collection::Results)?;
            Ok((profiles, consumptions, results))
        })?;

        let total = results.len();
        let history: Vec<CalculationHistory> = results
            .into_iter()
            .filter_map(|result| {
                let profile = profiles.iter().find(|p| p.id == result.profile_id)?;
                let consumption = consumptions.iter().find(|c| c.id == result.consumption_id)?;
                Some(CalculationHistory {
                    profile: profile.clone(),
                    consumption: consumption.clone(),
                    result,
                })
            })
            .collect();

        if history.len() < total {
            debug!("Skipped {} result(s) with a missing profile or consumption", total - history.len());
        }
        Ok(history)
    }

    fn get_history_by_profile_id(&self, profile_id: &str) -> Result<Vec<CalculationHistory>> {
        let history = self.get_calculation_history()?;
        Ok(history.into_iter().filter(|h| h.profile.id == profile_id).collect())
    }
}
