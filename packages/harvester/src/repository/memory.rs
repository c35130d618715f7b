//! In-process job repository.

use std::collections::BTreeMap;

use super::{resolve_save, IngestRepository};
use crate::error::RepositoryError;
use crate::types::Ingest;

#[derive(Debug, Default)]
pub struct InMemoryIngestRepository {
    jobs: BTreeMap<u64, Ingest>,
}

impl InMemoryIngestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IngestRepository for InMemoryIngestRepository {
    fn find_by_id(&self, id: u64) -> Result<Option<Ingest>, RepositoryError> {
        Ok(self.jobs.get(&id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Ingest>, RepositoryError> {
        Ok(self.jobs.values().find(|job| job.name == name).cloned())
    }

    fn find_all(&self) -> Result<Vec<Ingest>, RepositoryError> {
        Ok(self.jobs.values().cloned().collect())
    }

    fn save(&mut self, mut ingest: Ingest) -> Result<Ingest, RepositoryError> {
        let existing: Vec<Ingest> = self.jobs.values().cloned().collect();
        let id = resolve_save(&existing, &ingest)?;
        ingest.id = Some(id);
        self.jobs.insert(id, ingest.clone());
        Ok(ingest)
    }

    fn delete(&mut self, id: u64) -> Result<(), RepositoryError> {
        self.jobs
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }
}
