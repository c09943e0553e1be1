use crate::error::{ConcordError, Result};
use crate::store::traits::EntityStore;
use crate::types::{CandidateEntity, EntityType};
use redb::{
    Database, MultimapTable, MultimapTableDefinition, ReadableTable,
    ReadableTableMetadata, Table, TableDefinition,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Entities keyed by id, JSON-encoded (open extension fields must round-trip).
const ENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entities");

// Secondary index: entity type -> ids
const ENTITIES_BY_TYPE: MultimapTableDefinition<&str, &str> =
    MultimapTableDefinition::new("entities_by_type");

const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Redb-backed candidate store
pub struct RedbEntityStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbEntityStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConcordError::Validation(format!("Failed to create directory: {}", e))
            })?;
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        if !is_new {
            Self::check_schema_version(&db)?;
        }

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ENTITIES)?;
            let _ = write_txn.open_multimap_table(ENTITIES_BY_TYPE)?;
            let mut meta = write_txn.open_table(META)?;
            if is_new {
                meta.insert(SCHEMA_VERSION_KEY, CURRENT_SCHEMA_VERSION.to_string().as_bytes())?;
            }
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let version = read_txn
            .open_table(META)
            .ok()
            .and_then(|t| {
                t.get(SCHEMA_VERSION_KEY).ok().flatten().and_then(|v| {
                    std::str::from_utf8(v.value())
                        .ok()
                        .and_then(|s| s.parse::<u32>().ok())
                })
            })
            .unwrap_or(CURRENT_SCHEMA_VERSION);

        if version != CURRENT_SCHEMA_VERSION {
            return Err(ConcordError::Validation(format!(
                "Store schema v{} does not match this binary (v{})",
                version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn serialize_entity(entity: &CandidateEntity) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(entity)?)
    }

    fn deserialize_entity(bytes: &[u8]) -> Result<CandidateEntity> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn write_entity(
        table: &mut Table<'_, &'static str, &'static [u8]>,
        by_type: &mut MultimapTable<'_, &'static str, &'static str>,
        entity: &CandidateEntity,
    ) -> Result<()> {
        if entity.id.trim().is_empty() {
            return Err(ConcordError::Validation("Entity id must not be empty".into()));
        }

        let previous_type = match table.get(entity.id.as_str())? {
            Some(bytes) => Some(Self::deserialize_entity(bytes.value())?.entity_type),
            None => None,
        };

        if let Some(previous) = previous_type {
            if previous != entity.entity_type {
                by_type.remove(previous.as_str(), entity.id.as_str())?;
            }
        }

        let bytes = Self::serialize_entity(entity)?;
        table.insert(entity.id.as_str(), bytes.as_slice())?;
        by_type.insert(entity.entity_type.as_str(), entity.id.as_str())?;
        Ok(())
    }
}

impl EntityStore for RedbEntityStore {
    fn put_entity(&self, entity: &CandidateEntity) -> Result<()> {
        self.put_entities_batch(std::slice::from_ref(entity))
    }

    fn put_entities_batch(&self, entities: &[CandidateEntity]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTITIES)?;
            let mut by_type = write_txn.open_multimap_table(ENTITIES_BY_TYPE)?;
            for entity in entities {
                Self::write_entity(&mut table, &mut by_type, entity)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_entity(&self, id: &str) -> Result<Option<CandidateEntity>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTITIES)?;
        match table.get(id)? {
            Some(bytes) => Ok(Some(Self::deserialize_entity(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn list_by_type(&self, entity_type: &EntityType, limit: usize) -> Result<Vec<CandidateEntity>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTITIES)?;
        let by_type = read_txn.open_multimap_table(ENTITIES_BY_TYPE)?;

        let mut entities = Vec::new();
        if limit == 0 {
            return Ok(entities);
        }

        for id in by_type.get(entity_type.as_str())? {
            let id = id?;
            if let Some(bytes) = table.get(id.value())? {
                entities.push(Self::deserialize_entity(bytes.value())?);
                if entities.len() >= limit {
                    break;
                }
            }
        }

        Ok(entities)
    }

    fn count(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTITIES)?;
        Ok(table.len()?)
    }
}
