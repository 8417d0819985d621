//! Season storage.
//!
//! The `repository` module defines the [`SeasonRepository`] trait that
//! reporting code queries for season snapshots, and a simple
//! implementation backed by a directory of JSON files.

use crate::models::{SeasonRecord, SeasonSummary};
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

/// Read access to seasons and everything attached to them.
///
/// Repositories must be thread-safe (`Send + Sync`) because they are
/// shared across request handlers.
pub trait SeasonRepository: Send + Sync {
    /// Returns the full snapshot of a season, or `None` if the id is
    /// unknown.
    fn season(&self, id: &str) -> Result<Option<SeasonRecord>>;
    /// Lists all seasons, newest season number first.
    fn seasons(&self) -> Result<Vec<SeasonSummary>>;
}

/// In-memory repository, usually loaded from JSON files.
#[derive(Debug, Default)]
pub struct JsonSeasonRepository {
    seasons: HashMap<String, SeasonRecord>,
}

impl JsonSeasonRepository {
    /// Builds a repository from records already in memory.  Later
    /// records with a duplicate id are ignored.
    pub fn from_seasons(records: impl IntoIterator<Item = SeasonRecord>) -> Self {
        let mut repo = Self::default();
        for record in records {
            repo.insert(record);
        }
        repo
    }

    /// Loads every `.json` file in `path` as a [`SeasonRecord`].
    ///
    /// Files that fail to parse are logged and skipped.  A missing
    /// directory yields an empty repository.
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let mut repo = Self::default();
        if !path.is_dir() {
            tracing::warn!(path = %path.display(), "season directory not found");
            return Ok(repo);
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file = entry.path();
            if entry.file_type()?.is_file() && file.extension().is_some_and(|ext| ext == "json") {
                files.push(file);
            }
        }
        files.sort();
        for file in files {
            let data = std::fs::read_to_string(&file)?;
            match serde_json::from_str::<SeasonRecord>(&data) {
                Ok(season) => repo.insert(season),
                Err(err) => {
                    tracing::warn!(file = %file.display(), %err, "failed to parse season file");
                }
            }
        }
        tracing::info!(count = repo.seasons.len(), path = %path.display(), "loaded seasons");
        Ok(repo)
    }

    fn insert(&mut self, season: SeasonRecord) {
        if self.seasons.contains_key(&season.id) {
            tracing::warn!(id = %season.id, "duplicate season id, keeping the first");
            return;
        }
        self.seasons.insert(season.id.clone(), season);
    }

    pub fn len(&self) -> usize {
        self.seasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }
}

impl SeasonRepository for JsonSeasonRepository {
    fn season(&self, id: &str) -> Result<Option<SeasonRecord>> {
        Ok(self.seasons.get(id).cloned())
    }

    fn seasons(&self) -> Result<Vec<SeasonSummary>> {
        let mut list: Vec<SeasonSummary> =
            self.seasons.values().map(SeasonRecord::summary).collect();
        list.sort_by(|a, b| {
            b.season_number
                .cmp(&a.season_number)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(list)
    }
}
