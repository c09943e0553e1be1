//! Recording test doubles for the store and oracle seams.

use crate::error::{ConcordError, Result};
use crate::oracle::{Oracle, SamplingParams};
use crate::store::EntityStore;
use crate::types::{CandidateEntity, EntityType};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory store that counts reads and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    entities: Mutex<Vec<CandidateEntity>>,
    fail: bool,
    list_calls: AtomicUsize,
}

impl RecordingStore {
    pub fn with_entities(entities: Vec<CandidateEntity>) -> Self {
        Self {
            entities: Mutex::new(entities),
            ..Default::default()
        }
    }

    /// Every operation returns a storage error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            Err(ConcordError::Validation("store offline".into()))
        } else {
            Ok(())
        }
    }
}

impl EntityStore for RecordingStore {
    fn put_entity(&self, entity: &CandidateEntity) -> Result<()> {
        self.put_entities_batch(std::slice::from_ref(entity))
    }

    fn put_entities_batch(&self, entities: &[CandidateEntity]) -> Result<()> {
        self.check()?;
        let mut stored = self.entities.lock().unwrap();
        for entity in entities {
            stored.retain(|e| e.id != entity.id);
            stored.push(entity.clone());
        }
        Ok(())
    }

    fn get_entity(&self, id: &str) -> Result<Option<CandidateEntity>> {
        self.check()?;
        Ok(self.entities.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    fn list_by_type(&self, entity_type: &EntityType, limit: usize) -> Result<Vec<CandidateEntity>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .entities
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.entity_type == entity_type)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<u64> {
        self.check()?;
        Ok(self.entities.lock().unwrap().len() as u64)
    }
}

type Responder = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Oracle whose replies are computed from the prompt by a closure.
pub struct ScriptedOracle {
    responder: Box<Responder>,
    prompts: Mutex<Vec<String>>,
    params: Mutex<Vec<SamplingParams>>,
}

impl ScriptedOracle {
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        }
    }

    /// Always replies with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::with_responder(move |_| Ok(text.clone()))
    }

    /// Always unreachable.
    pub fn failing() -> Self {
        Self::with_responder(|_| Err(ConcordError::OracleUnavailable("connection refused".into())))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    pub fn last_params(&self) -> Option<SamplingParams> {
        self.params.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, params: SamplingParams) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.params.lock().unwrap().push(params);
        (self.responder)(prompt)
    }
}
