//! # JSON Profile Repository
//!
//! Profiles live in `profiles.json` in first-insertion order; the
//! current-profile pointer lives in `current_profile`.
//!
//! Deleting a profile rewrites `profiles.json`, `consumptions.json` and
//! `results.json` in a single batch, so callers never observe a profile
//! gone while its consumptions or results remain.

use anyhow::Result;
use log::{debug, info, warn};
use shared::{CalculationResult, Consumption, Profile};

use super::connection::{Collection, JsonConnection};
use crate::storage::ProfileStorage;

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    connection: JsonConnection,
}

impl ProfileRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

impl ProfileStorage for ProfileRepository {
    fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.connection.transaction(|batch| {
            let mut profiles: Vec<Profile> = batch.read(Collection::Profiles)?;

            match profiles.iter_mut().find(|p| p.id == profile.id) {
                Some(existing) => *existing = profile.clone(),
                None => profiles.push(profile.clone()),
            }

            batch.write(Collection::Profiles, &profiles)
        })?;

        info!("Saved profile {} ({})", profile.name, profile.id);
        Ok(())
    }

    fn get_profiles(&self) -> Result<Vec<Profile>> {
        self.connection.read_collection(Collection::Profiles)
    }

    fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        let profiles = self.get_profiles()?;
        Ok(profiles.into_iter().find(|p| p.id == profile_id))
    }

    fn delete_profile(&self, profile_id: &str) -> Result<bool> {
        let (existed, consumptions_removed, results_removed) = self.connection.transaction(|batch| {
            let mut profiles: Vec<Profile> = batch.read(Collection::Profiles)?;
            let mut consumptions: Vec<Consumption> = batch.read(Collection::Consumptions)?;
            let mut results: Vec<CalculationResult> = batch.read(Collection::Results)?;

            let profile_count = profiles.len();
            let consumption_count = consumptions.len();
            let result_count = results.len();

            profiles.retain(|p| p.id != profile_id);
            consumptions.retain(|c| c.profile_id != profile_id);
            results.retain(|r| r.profile_id != profile_id);

            batch.write(Collection::Profiles, &profiles)?;
            batch.write(Collection::Consumptions, &consumptions)?;
            batch.write(Collection::Results, &results)?;

            Ok((
                profiles.len() < profile_count,
                consumption_count - consumptions.len(),
                result_count - results.len(),
            ))
        })?;

        if existed {
            info!(
                "Deleted profile {} with {} consumption(s) and {} result(s)",
                profile_id, consumptions_removed, results_removed
            );
        } else {
            warn!(
                "Profile {} not found; removed {} orphaned consumption(s) and {} result(s)",
                profile_id, consumptions_removed, results_removed
            );
        }
        Ok(existed)
    }

    fn set_current_profile(&self, profile_id: &str) -> Result<()> {
        self.connection.transaction(|batch| {
            batch.write_current_profile_id(profile_id);
            Ok(())
        })?;

        info!("Set current profile to {}", profile_id);
        Ok(())
    }

    fn get_current_profile_id(&self) -> Result<Option<String>> {
        self.connection.transaction(|batch| batch.read_current_profile_id())
    }

    fn get_current_profile(&self) -> Result<Option<Profile>> {
        let profile = self.connection.transaction(|batch| {
            let profile_id = match batch.read_current_profile_id()? {
                Some(id) => id,
                None => return Ok(None),
            };
            let profiles: Vec<Profile> = batch.read(Collection::Profiles)?;
            Ok(profiles.into_iter().find(|p| p.id == profile_id))
        })?;

        if profile.is_none() {
            debug!("No current profile");
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::json::test_utils::{sample_consumption, sample_profile, sample_result, RepositoryTestHelper};
    use crate::storage::{ConsumptionStorage, ResultStorage};

    #[test]
    fn test_save_and_get_profile() {
        let helper = RepositoryTestHelper::new().unwrap();
        let profile = sample_profile("p1");

        helper.profile_repo.save_profile(&profile).unwrap();

        assert_eq!(helper.profile_repo.get_profile("p1").unwrap(), Some(profile));
        assert_eq!(helper.profile_repo.get_profile("missing").unwrap(), None);
    }

    #[test]
    fn test_save_existing_profile_replaces_in_place() {
        let helper = RepositoryTestHelper::new().unwrap();
        for id in ["p1", "p2", "p3"] {
            helper.profile_repo.save_profile(&sample_profile(id)).unwrap();
        }

        let mut updated = sample_profile("p2");
        updated.name = "Renamed".to_string();
        updated.age = 62;
        helper.profile_repo.save_profile(&updated).unwrap();

        let profiles = helper.profile_repo.get_profiles().unwrap();
        let ids: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert_eq!(profiles[1], updated);
    }

    #[test]
    fn test_delete_profile_cascades() {
        let helper = RepositoryTestHelper::new().unwrap();
        helper.profile_repo.save_profile(&sample_profile("p1")).unwrap();
        helper.profile_repo.save_profile(&sample_profile("p2")).unwrap();
        helper.consumption_repo.save_consumption(&sample_consumption("c1", "p1")).unwrap();
        helper.consumption_repo.save_consumption(&sample_consumption("c2", "p2")).unwrap();
        helper.consumption_repo.save_consumption(&sample_consumption("c3", "p1")).unwrap();
        helper.result_repo.save_result(&sample_result("r1", "p1", "c1")).unwrap();
        helper.result_repo.save_result(&sample_result("r2", "p2", "c2")).unwrap();
        helper.result_repo.save_result(&sample_result("r3", "p1", "c3")).unwrap();

        assert!(helper.profile_repo.delete_profile("p1").unwrap());

        assert_eq!(helper.profile_repo.get_profile("p1").unwrap(), None);
        assert!(helper.consumption_repo.get_consumptions_by_profile_id("p1").unwrap().is_empty());
        assert!(helper.result_repo.get_results_by_profile_id("p1").unwrap().is_empty());
        assert_eq!(helper.consumption_repo.get_consumptions().unwrap().len(), 1);
        assert_eq!(helper.result_repo.get_results().unwrap().len(), 1);
        assert!(helper.profile_repo.get_profile("p2").unwrap().is_some());
    }

    #[test]
    fn test_delete_missing_profile_returns_false() {
        let helper = RepositoryTestHelper::new().unwrap();
        helper.profile_repo.save_profile(&sample_profile("p1")).unwrap();

        assert!(!helper.profile_repo.delete_profile("nope").unwrap());
        assert_eq!(helper.profile_repo.get_profiles().unwrap().len(), 1);
    }

    #[test]
    fn test_current_profile_pointer() {
        let helper = RepositoryTestHelper::new().unwrap();
        assert_eq!(helper.profile_repo.get_current_profile_id().unwrap(), None);
        assert_eq!(helper.profile_repo.get_current_profile().unwrap(), None);

        let profile = sample_profile("p1");
        helper.profile_repo.save_profile(&profile).unwrap();
        helper.profile_repo.set_current_profile("p1").unwrap();

        assert_eq!(helper.profile_repo.get_current_profile_id().unwrap(), Some("p1".to_string()));
        assert_eq!(helper.profile_repo.get_current_profile().unwrap(), Some(profile));
    }

    #[test]
    fn test_current_profile_resolves_to_none_after_delete() {
        let helper = RepositoryTestHelper::new().unwrap();
        helper.profile_repo.save_profile(&sample_profile("p1")).unwrap();
        helper.profile_repo.set_current_profile("p1").unwrap();

        helper.profile_repo.delete_profile("p1").unwrap();

        assert_eq!(helper.profile_repo.get_current_profile_id().unwrap(), Some("p1".to_string()));
        assert_eq!(helper.profile_repo.get_current_profile().unwrap(), None);
    }

    #[test]
    fn test_profiles_survive_reopening_the_store() {
        let helper = RepositoryTestHelper::new().unwrap();
        let profile = sample_profile("p1");
        helper.profile_repo.save_profile(&profile).unwrap();

        let reopened = ProfileRepository::new(JsonConnection::open(&helper.env.base_path).unwrap());
        assert_eq!(reopened.get_profiles().unwrap(), vec![profile]);
    }
}
