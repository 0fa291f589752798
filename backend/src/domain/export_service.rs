//! Export of all on-device data.
//!
//! Produces a [`DataExport`] snapshot and can write it to a file as pretty
//! JSON. The file is written to a temporary sibling first and renamed into
//! place.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info};
use shared::DataExport;
use std::fs;
use std::path::Path;

use crate::storage::{
    ConsumptionRepository, ConsumptionStorage, JsonConnection, ProfileRepository, ProfileStorage, ResultRepository,
    ResultStorage,
};

#[derive(Debug, Clone)]
pub struct ExportService {
    profile_repository: ProfileRepository,
    consumption_repository: ConsumptionRepository,
    result_repository: ResultRepository,
}

impl ExportService {
    pub fn new(connection: JsonConnection) -> Self {
        Self {
            profile_repository: ProfileRepository::new(connection.clone()),
            consumption_repository: ConsumptionRepository::new(connection.clone()),
            result_repository: ResultRepository::new(connection),
        }
    }

    /// Snapshot of every collection plus the joined history
    pub fn export_data(&self) -> Result<DataExport> {
        let export = DataExport {
            exported_at: Utc::now(),
            profiles: self.profile_repository.get_profiles()?,
            consumptions: self.consumption_repository.get_consumptions()?,
            results: self.result_repository.get_results()?,
            history: self.result_repository.get_calculation_history()?,
        };

        info!(
            "Exported {} profile(s), {} consumption(s) and {} result(s)",
            export.profiles.len(),
            export.consumptions.len(),
            export.results.len()
        );
        Ok(export)
    }

    /// Write the snapshot to `path`, replacing any existing file
    pub fn export_to_path(&self, path: &Path) -> Result<DataExport> {
        let export = self.export_data()?;
        let content = serde_json::to_string_pretty(&export).context("Failed to serialize export")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create export directory {}", parent.display()))?;
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).with_context(|| format!("Failed to write {}", temp_path.display()))?;
        if let Err(e) = fs::rename(&temp_path, path) {
            error!("Failed to move export into place at {}: {}", path.display(), e);
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("Failed to write export to {}", path.display()));
        }

        info!("Wrote export to {}", path.display());
        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::json::test_utils::{sample_consumption, sample_profile, sample_result, RepositoryTestHelper};
    use shared::CalculationHistory;

    fn seeded() -> (RepositoryTestHelper, ExportService) {
        let helper = RepositoryTestHelper::new().unwrap();
        helper.profile_repo.save_profile(&sample_profile("p1")).unwrap();
        helper.consumption_repo.save_consumption(&sample_consumption("c1", "p1")).unwrap();
        helper.consumption_repo.save_consumption(&sample_consumption("c2", "p1")).unwrap();
        helper.result_repo.save_result(&sample_result("r1", "p1", "c1")).unwrap();
        let service = ExportService::new(helper.env.connection.clone());
        (helper, service)
    }

    #[test]
    fn test_export_data_contains_every_collection() {
        let (_helper, service) = seeded();

        let export = service.export_data().unwrap();

        assert_eq!(export.profiles.len(), 1);
        assert_eq!(export.consumptions.len(), 2);
        assert_eq!(export.results.len(), 1);
        assert_eq!(
            export.history,
            vec![CalculationHistory {
                profile: sample_profile("p1"),
                consumption: sample_consumption("c1", "p1"),
                result: sample_result("r1", "p1", "c1"),
            }]
        );
    }

    #[test]
    fn test_export_of_empty_store() {
        let helper = RepositoryTestHelper::new().unwrap();
        let service = ExportService::new(helper.env.connection.clone());

        let export = service.export_data().unwrap();
        assert!(export.profiles.is_empty());
        assert!(export.history.is_empty());
    }

    #[test]
    fn test_export_to_path_writes_pretty_json() {
        let (helper, service) = seeded();
        let path = helper.env.base_path.join("exports").join("safe_drive_export.json");

        let export = service.export_to_path(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"exportedAt\""));
        let parsed: DataExport = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, export);
        assert!(!path.with_extension("tmp").exists());
    }
}
