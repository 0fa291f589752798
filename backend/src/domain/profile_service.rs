//! Profile management: creation, full-replacement updates, deletion and the
//! current-profile selection.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use shared::Profile;

use crate::domain::commands::profile::{CreateProfileCommand, UpdateProfileCommand};
use crate::domain::models::validation::{validate_age, validate_name, validate_weight};
use crate::storage::{JsonConnection, ProfileRepository, ProfileStorage};

/// Service for managing profiles
#[derive(Debug, Clone)]
pub struct ProfileService {
    profile_repository: ProfileRepository,
}

impl ProfileService {
    pub fn new(connection: JsonConnection) -> Self {
        Self {
            profile_repository: ProfileRepository::new(connection),
        }
    }

    /// Create a profile and make it the current one
    pub fn create_profile(&self, command: CreateProfileCommand) -> Result<Profile> {
        info!("Creating profile: name={}, frequency={}", command.name.trim(), command.frequency);

        validate_name(&command.name)?;
        validate_age(command.age)?;
        validate_weight(command.weight)?;

        let profile = Profile {
            id: JsonConnection::generate_id(),
            name: command.name.trim().to_string(),
            age: command.age,
            weight: command.weight,
            frequency: command.frequency,
            method: command.method,
            created_at: Utc::now(),
        };

        self.profile_repository.save_profile(&profile)?;
        self.profile_repository.set_current_profile(&profile.id)?;

        info!("Created profile {} with ID: {}", profile.name, profile.id);
        Ok(profile)
    }

    /// Replace every editable field of an existing profile.
    ///
    /// The id and creation time are kept.
    pub fn update_profile(&self, command: UpdateProfileCommand) -> Result<Profile> {
        info!("Updating profile: {}", command.profile_id);

        let existing = self
            .profile_repository
            .get_profile(&command.profile_id)?
            .ok_or_else(|| anyhow::anyhow!("Profile not found: {}", command.profile_id))?;

        validate_name(&command.name)?;
        validate_age(command.age)?;
        validate_weight(command.weight)?;

        let profile = Profile {
            id: existing.id,
            name: command.name.trim().to_string(),
            age: command.age,
            weight: command.weight,
            frequency: command.frequency,
            method: command.method,
            created_at: existing.created_at,
        };

        self.profile_repository.save_profile(&profile)?;
        Ok(profile)
    }

    pub fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        let profile = self.profile_repository.get_profile(profile_id)?;
        if profile.is_none() {
            warn!("Profile not found: {}", profile_id);
        }
        Ok(profile)
    }

    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.profile_repository.get_profiles()
    }

    /// Delete a profile with all its consumptions and results.
    ///
    /// Returns false if no such profile existed.
    pub fn delete_profile(&self, profile_id: &str) -> Result<bool> {
        info!("Deleting profile: {}", profile_id);
        self.profile_repository.delete_profile(profile_id)
    }

    /// Make an existing profile the current one
    pub fn select_profile(&self, profile_id: &str) -> Result<Profile> {
        let profile = self
            .profile_repository
            .get_profile(profile_id)?
            .ok_or_else(|| anyhow::anyhow!("Profile not found: {}", profile_id))?;

        self.profile_repository.set_current_profile(&profile.id)?;
        Ok(profile)
    }

    pub fn current_profile(&self) -> Result<Option<Profile>> {
        self.profile_repository.get_current_profile()
    }
}
