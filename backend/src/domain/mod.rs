//! # Domain Module
//!
//! Business logic for the safe-to-drive estimator.
//!
//! ## Module Organization
//!
//! - **wait_time**: the wait-time heuristic and derived timestamps
//! - **models**: input domains and validation errors
//! - **commands**: inputs and outcomes of service operations
//! - **profile_service**: profile CRUD and the current-profile selection
//! - **calculation_service**: recording consumptions and computing results
//! - **export_service**: full data export
//!
//! ## Flow
//!
//! A profile is created and becomes current. Each reported consumption is
//! stored together with one result holding the conservative and the
//! informational estimate. The history view joins results back to their
//! profile and consumption.

pub mod calculation_service;
pub mod commands;
pub mod export_service;
pub mod models;
pub mod profile_service;
pub mod wait_time;

pub use calculation_service::CalculationService;
pub use export_service::ExportService;
pub use models::validation::InvalidInput;
pub use profile_service::ProfileService;
