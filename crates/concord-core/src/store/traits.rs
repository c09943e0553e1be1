use crate::error::Result;
use crate::types::{CandidateEntity, EntityType};

/// Persistent store of previously known entities.
pub trait EntityStore: Send + Sync {
    /// Store an entity (insert or replace by id)
    fn put_entity(&self, entity: &CandidateEntity) -> Result<()>;

    /// Insert or replace multiple entities in a single transaction
    fn put_entities_batch(&self, entities: &[CandidateEntity]) -> Result<()>;

    /// Retrieve an entity by id
    fn get_entity(&self, id: &str) -> Result<Option<CandidateEntity>>;

    /// Up to `limit` entities whose type equals `entity_type`
    fn list_by_type(&self, entity_type: &EntityType, limit: usize) -> Result<Vec<CandidateEntity>>;

    /// Total number of stored entities
    fn count(&self) -> Result<u64>;
}

impl<S: EntityStore + ?Sized> EntityStore for std::sync::Arc<S> {
    fn put_entity(&self, entity: &CandidateEntity) -> Result<()> {
        (**self).put_entity(entity)
    }
    fn put_entities_batch(&self, entities: &[CandidateEntity]) -> Result<()> {
        (**self).put_entities_batch(entities)
    }
    fn get_entity(&self, id: &str) -> Result<Option<CandidateEntity>> {
        (**self).get_entity(id)
    }
    fn list_by_type(&self, entity_type: &EntityType, limit: usize) -> Result<Vec<CandidateEntity>> {
        (**self).list_by_type(entity_type, limit)
    }
    fn count(&self) -> Result<u64> {
        (**self).count()
    }
}
