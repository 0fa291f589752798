//! Test utilities: a throwaway store per test plus record fixtures.
//!
//! The temporary directory lives as long as the `TestEnvironment`, so the
//! store is removed even when a test panics.

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::{CalculationResult, Consumption, ConsumptionMethod, Frequency, Profile};
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::JsonConnection;
use super::consumption_repository::ConsumptionRepository;
use super::profile_repository::ProfileRepository;
use super::result_repository::ResultRepository;

/// Store rooted in a temporary directory
pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub connection: JsonConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        init_test_logging();

        let temp_dir = TempDir::with_prefix("safe_drive_test_")?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = JsonConnection::open(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }
}

/// All repositories over one test store
pub struct RepositoryTestHelper {
    pub env: TestEnvironment,
    pub profile_repo: ProfileRepository,
    pub consumption_repo: ConsumptionRepository,
    pub result_repo: ResultRepository,
}

impl RepositoryTestHelper {
    pub fn new() -> Result<Self> {
        let env = TestEnvironment::new()?;

        let profile_repo = ProfileRepository::new(env.connection.clone());
        let consumption_repo = ConsumptionRepository::new(env.connection.clone());
        let result_repo = ResultRepository::new(env.connection.clone());

        Ok(RepositoryTestHelper {
            env,
            profile_repo,
            consumption_repo,
            result_repo,
        })
    }
}

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap()
}

pub fn sample_profile(id: &str) -> Profile {
    Profile {
        id: id.to_string(),
        name: format!("Profile {}", id),
        age: 30,
        weight: 75,
        frequency: Frequency::Occasional,
        method: ConsumptionMethod::Smoked,
        created_at: fixed_time(),
    }
}

pub fn sample_consumption(id: &str, profile_id: &str) -> Consumption {
    Consumption {
        id: id.to_string(),
        profile_id: profile_id.to_string(),
        amount: 0.3,
        method: ConsumptionMethod::Smoked,
        timestamp: fixed_time(),
        created_at: fixed_time(),
    }
}

pub fn sample_result(id: &str, profile_id: &str, consumption_id: &str) -> CalculationResult {
    CalculationResult {
        id: id.to_string(),
        profile_id: profile_id.to_string(),
        consumption_id: consumption_id.to_string(),
        safe_drive_time: fixed_time() + Duration::hours(18),
        wait_hours: 18,
        explanation: "You should wait 18 hours.".to_string(),
        informational_time: fixed_time() + Duration::hours(18),
        informational_hours: 18,
        created_at: fixed_time(),
    }
}
