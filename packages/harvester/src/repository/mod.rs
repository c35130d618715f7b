//! Storage of harvest jobs and their run history.

pub mod memory;
pub mod yaml;

pub use memory::InMemoryIngestRepository;
pub use yaml::YamlIngestRepository;

use crate::error::RepositoryError;
use crate::types::Ingest;

/// CRUD access to harvest jobs keyed by id.
///
/// A saved job, including runs and their finalized reports, must come back
/// unchanged from the find operations.
pub trait IngestRepository {
    fn find_by_id(&self, id: u64) -> Result<Option<Ingest>, RepositoryError>;

    fn find_by_name(&self, name: &str) -> Result<Option<Ingest>, RepositoryError>;

    /// All jobs, ordered by id.
    fn find_all(&self) -> Result<Vec<Ingest>, RepositoryError>;

    /// Insert or update a job and return the stored value.
    ///
    /// A job without id is assigned the next free one. Names are unique.
    fn save(&mut self, ingest: Ingest) -> Result<Ingest, RepositoryError>;

    fn delete(&mut self, id: u64) -> Result<(), RepositoryError>;
}

/// Shared checks for `save`: the id must exist when given and the name must
/// not belong to another job. Returns the id to store under.
pub(crate) fn resolve_save(
    existing: &[Ingest],
    ingest: &Ingest,
) -> Result<u64, RepositoryError> {
    if existing
        .iter()
        .any(|other| other.name == ingest.name && other.id != ingest.id)
    {
        return Err(RepositoryError::DuplicateName(ingest.name.clone()));
    }

    match ingest.id {
        Some(id) if existing.iter().any(|other| other.id == Some(id)) => Ok(id),
        Some(id) => Err(RepositoryError::NotFound(id)),
        None => Ok(existing
            .iter()
            .filter_map(|other| other.id)
            .max()
            .map_or(1, |max| max + 1)),
    }
}
