//! # JSON Consumption Repository
//!
//! Consumption events live in `consumptions.json` in insertion order.

use anyhow::Result;
use log::info;
use shared::Consumption;

use super::connection::{Batch, Collection, JsonConnection};
use crate::storage::ConsumptionStorage;

#[derive(Debug, Clone)]
pub struct ConsumptionRepository {
    connection: JsonConnection,
}

impl ConsumptionRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    /// Insert or replace a consumption as part of an open batch
    pub fn stage_save(batch: &mut Batch<'_>, consumption: &Consumption) -> Result<()> {
        let mut consumptions: Vec<Consumption> = batch.read(Collection::Consumptions)?;

        match consumptions.iter_mut().find(|c| c.id == consumption.id) {
            Some(existing) => *existing = consumption.clone(),
            None => consumptions.push(consumption.clone()),
        }

        batch.write(Collection::Consumptions, &consumptions)
    }
}

impl ConsumptionStorage for ConsumptionRepository {
    fn save_consumption(&self, consumption: &Consumption) -> Result<()> {
        self.connection
            .transaction(|batch| Self::stage_save(batch, consumption))?;

        info!(
            "Saved consumption {} of {}g for profile {}",
            consumption.id, consumption.amount, consumption.profile_id
        );
        Ok(())
    }

    fn get_consumptions(&self) -> Result<Vec<Consumption>> {
        self.connection.read_collection(Collection::Consumptions)
    }

    fn get_consumption(&self, consumption_id: &str) -> Result<Option<Consumption>> {
        let consumptions = self.get_consumptions()?;
        Ok(consumptions.into_iter().find(|c| c.id == consumption_id))
    }

    fn get_consumptions_by_profile_id(&self, profile_id: &str) -> Result<Vec<Consumption>> {
        let consumptions = self.get_consumptions()?;
        Ok(consumptions
            .into_iter()
            .filter(|c| c.profile_id == profile_id)
            .collect())
    }

    fn delete_consumptions_by_profile_id(&self, profile_id: &str) -> Result<usize> {
        let removed = self.connection.transaction(|batch| {
            let mut consumptions: Vec<Consumption> = batch.read(Collection::Consumptions)?;
            let before = consumptions.len();
            consumptions.retain(|c| c.profile_id != profile_id);
            let removed = before - consumptions.len();

            if removed > 0 {
                batch.write(Collection::Consumptions, &consumptions)?;
            }
            Ok(removed)
        })?;

        info!("Deleted {} consumption(s) for profile {}", removed, profile_id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::json::test_utils::{sample_consumption, RepositoryTestHelper};

    #[test]
    fn test_filter_by_profile_preserves_store_order() {
        let helper = RepositoryTestHelper::new().unwrap();
        for (id, profile_id) in [("c1", "p1"), ("c2", "p2"), ("c3", "p1"), ("c4", "p1")] {
            helper
                .consumption_repo
                .save_consumption(&sample_consumption(id, profile_id))
                .unwrap();
        }

        let ids: Vec<String> = helper
            .consumption_repo
            .get_consumptions_by_profile_id("p1")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["c1", "c3", "c4"]);
    }

    #[test]
    fn test_get_consumption_by_id() {
        let helper = RepositoryTestHelper::new().unwrap();
        let consumption = sample_consumption("c1", "p1");
        helper.consumption_repo.save_consumption(&consumption).unwrap();

        assert_eq!(helper.consumption_repo.get_consumption("c1").unwrap(), Some(consumption));
        assert_eq!(helper.consumption_repo.get_consumption("c2").unwrap(), None);
    }

    #[test]
    fn test_saving_same_id_does_not_duplicate() {
        let helper = RepositoryTestHelper::new().unwrap();
        let mut consumption = sample_consumption("c1", "p1");
        helper.consumption_repo.save_consumption(&consumption).unwrap();

        consumption.amount = 0.8;
        helper.consumption_repo.save_consumption(&consumption).unwrap();

        let consumptions = helper.consumption_repo.get_consumptions().unwrap();
        assert_eq!(consumptions.len(), 1);
        assert_eq!(consumptions[0].amount, 0.8);
    }

    #[test]
    fn test_delete_consumptions_by_profile_id() {
        let helper = RepositoryTestHelper::new().unwrap();
        helper.consumption_repo.save_consumption(&sample_consumption("c1", "p1")).unwrap();
        helper.consumption_repo.save_consumption(&sample_consumption("c2", "p2")).unwrap();

        assert_eq!(helper.consumption_repo.delete_consumptions_by_profile_id("p1").unwrap(), 1);
        assert_eq!(helper.consumption_repo.delete_consumptions_by_profile_id("p1").unwrap(), 0);
        assert_eq!(helper.consumption_repo.get_consumptions().unwrap().len(), 1);
    }

    #[test]
    fn test_timestamps_survive_persistence() {
        let helper = RepositoryTestHelper::new().unwrap();
        let consumption = sample_consumption("c1", "p1");
        helper.consumption_repo.save_consumption(&consumption).unwrap();

        let raw = std::fs::read_to_string(helper.env.connection.collection_path(Collection::Consumptions)).unwrap();
        assert!(raw.contains("\"timestamp\":\"2025-03-01T20:00:00Z\""));
        assert!(raw.contains("\"profileId\":\"p1\""));

        let loaded = helper.consumption_repo.get_consumption("c1").unwrap().unwrap();
        assert_eq!(loaded.timestamp, consumption.timestamp);
    }
}
