pub mod connection;
pub mod consumption_repository;
pub mod profile_repository;
pub mod result_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::{Batch, Collection, JsonConnection};
pub use consumption_repository::ConsumptionRepository;
pub use profile_repository::ProfileRepository;
pub use result_repository::ResultRepository;
