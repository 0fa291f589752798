//! # Safe Drive Backend
//!
//! Non-UI logic of the safe-to-drive estimator: the wait-time heuristic, the
//! on-device store and the services a UI calls into.
//!
//! ## Architecture
//!
//! ```text
//! UI layer (external)
//!     ↓
//! Domain layer (services, estimator, validation)
//!     ↓
//! Storage layer (JSON blobs in the data directory)
//! ```
//!
//! [`Backend`] wires one store handle, the settings and all services
//! together. Tests and embedders that need isolation open one per directory.

pub mod config;
pub mod domain;
pub mod storage;

use anyhow::Result;
use log::info;
use std::path::Path;

use crate::config::Settings;
use crate::domain::{CalculationService, ExportService, ProfileService};
use crate::storage::JsonConnection;

/// Services over one on-device store
#[derive(Debug, Clone)]
pub struct Backend {
    pub connection: JsonConnection,
    pub settings: Settings,
    pub profile_service: ProfileService,
    pub calculation_service: CalculationService,
    pub export_service: ExportService,
}

impl Backend {
    /// Open the store in `data_directory` with the settings found there
    pub fn open<P: AsRef<Path>>(data_directory: P) -> Result<Self> {
        let connection = JsonConnection::open(data_directory)?;
        let settings = Settings::load(connection.base_directory());
        Ok(Self::with_connection(connection, settings))
    }

    /// Open the store in the per-user data directory
    pub fn open_default() -> Result<Self> {
        let connection = JsonConnection::open_default()?;
        let settings = Settings::load(connection.base_directory());
        Ok(Self::with_connection(connection, settings))
    }

    fn with_connection(connection: JsonConnection, settings: Settings) -> Self {
        info!("Setting up services for {}", connection.base_directory().display());

        Self {
            profile_service: ProfileService::new(connection.clone()),
            calculation_service: CalculationService::with_config(connection.clone(), settings.clone()),
            export_service: ExportService::new(connection.clone()),
            connection,
            settings,
        }
    }

    /// Remove every profile, consumption, result and the current-profile pointer
    pub fn clear_all_data(&self) -> Result<()> {
        self.connection.clear_all_data()
    }
}
