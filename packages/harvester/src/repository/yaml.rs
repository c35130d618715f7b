//! Directory-backed job repository: one YAML file per job.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{resolve_save, IngestRepository};
use crate::error::RepositoryError;
use crate::types::Ingest;

const FILE_PREFIX: &str = "ingest-";
const FILE_SUFFIX: &str = ".yaml";

/// Stores each job as `ingest-<id>.yaml` under a directory.
#[derive(Debug, Clone)]
pub struct YamlIngestRepository {
    dir: PathBuf,
}

impl YamlIngestRepository {
    /// Open (and create if needed) a repository directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{id}{FILE_SUFFIX}"))
    }

    fn read(path: &Path) -> Result<Ingest, RepositoryError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&content)?)
    }

    /// Ids of all stored jobs, ascending.
    fn ids(&self) -> Result<Vec<u64>, RepositoryError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let id = name
                .to_str()
                .and_then(|n| n.strip_prefix(FILE_PREFIX))
                .and_then(|n| n.strip_suffix(FILE_SUFFIX))
                .and_then(|n| n.parse::<u64>().ok());
            if let Some(id) = id {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

impl IngestRepository for YamlIngestRepository {
    fn find_by_id(&self, id: u64) -> Result<Option<Ingest>, RepositoryError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Ingest>, RepositoryError> {
        Ok(self.find_all()?.into_iter().find(|job| job.name == name))
    }

    fn find_all(&self) -> Result<Vec<Ingest>, RepositoryError> {
        self.ids()?
            .into_iter()
            .map(|id| Self::read(&self.path_for(id)))
            .collect()
    }

    fn save(&mut self, mut ingest: Ingest) -> Result<Ingest, RepositoryError> {
        let id = resolve_save(&self.find_all()?, &ingest)?;
        ingest.id = Some(id);

        let content = serde_yaml_ng::to_string(&ingest)?;
        let path = self.path_for(id);
        let temp = self.dir.join(format!(".{FILE_PREFIX}{id}{FILE_SUFFIX}.tmp"));
        {
            let mut file = File::create(&temp)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)?;
        }

        fs::rename(&temp, &path)?;
        tracing::debug!(id, name = %ingest.name, path = %path.display(), "saved harvest job");
        Ok(ingest)
    }

    fn delete(&mut self, id: u64) -> Result<(), RepositoryError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(RepositoryError::NotFound(id));
        }
        fs::remove_file(&path)?;
        tracing::debug!(id, "deleted harvest job");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_writes_one_file_per_job() {
        let dir = tempdir().unwrap();
        let mut repo = YamlIngestRepository::open(dir.path()).unwrap();
        repo.save(Ingest::new("a", "http://a")).unwrap();
        repo.save(Ingest::new("b", "http://b")).unwrap();

        assert!(dir.path().join("ingest-1.yaml").exists());
        assert!(dir.path().join("ingest-2.yaml").exists());
        assert!(!dir.path().join(".ingest-2.yaml.tmp").exists());
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let repo = YamlIngestRepository::open(dir.path()).unwrap();
        assert!(repo.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_missing_job() {
        let dir = tempdir().unwrap();
        let mut repo = YamlIngestRepository::open(dir.path()).unwrap();
        assert!(repo.find_by_id(7).unwrap().is_none());
        assert!(matches!(repo.delete(7), Err(RepositoryError::NotFound(7))));
    }
}
