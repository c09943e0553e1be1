mod gateway;
pub mod import;
mod redb_store;
mod sample;
mod traits;

pub use gateway::{CandidateGateway, DEFAULT_FETCH_LIMIT};
pub use redb_store::{RedbEntityStore, CURRENT_SCHEMA_VERSION};
pub use sample::sample_entities;
pub use traits::EntityStore;
