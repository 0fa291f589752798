//! # Storage Module
//!
//! On-device persistence for profiles, consumptions, results and the
//! current-profile pointer.
//!
//! Each collection is one JSON blob in the data directory, rewritten in full
//! on every mutation. A [`JsonConnection`] is the store handle: it owns the
//! directory and serialises the read-modify-write cycles of its clones, so a
//! multi-collection change such as the profile cascade is applied as one unit.
//!
//! The domain layer depends on the traits in [`traits`], not on the JSON
//! repositories directly.

pub mod json;
pub mod traits;

pub use json::{ConsumptionRepository, JsonConnection, ProfileRepository, ResultRepository};
pub use traits::{ConsumptionStorage, ProfileStorage, ResultStorage};
