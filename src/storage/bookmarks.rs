//! Saved scan targets.
//!
//! Bookmarks let users save and reuse a target together with the profile
//! and port list to scan it with. All bookmarks live in one JSON file.

use crate::config::{Paths, ScanProfile};
use crate::error::{StorageError, StorageResult};
use crate::types::TargetSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A saved scan target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Bookmark name (used as identifier).
    pub name: String,
    /// Target expression, as accepted by `scan`.
    pub target: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile: ScanProfile,
    /// Explicit port list overriding the profile's port set.
    #[serde(default)]
    pub ports: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            description: String::new(),
            profile: ScanProfile::default(),
            ports: None,
            created_at: Utc::now(),
        }
    }

    /// Validate the bookmark configuration.
    pub fn validate(&self) -> StorageResult<()> {
        if self.name.is_empty() {
            return Err(StorageError::InvalidBookmark(
                "name cannot be empty".to_string(),
            ));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StorageError::InvalidBookmark(
                "name can only contain alphanumeric characters, hyphens, and underscores"
                    .to_string(),
            ));
        }

        TargetSpec::parse(&self.target)
            .map_err(|e| StorageError::InvalidBookmark(e.to_string()))?;

        Ok(())
    }
}

/// Fields changed by [`BookmarkStore::update`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct BookmarkUpdate {
    pub target: Option<String>,
    pub description: Option<String>,
    pub profile: Option<ScanProfile>,
    pub ports: Option<Option<String>>,
}

/// Manages bookmark storage and retrieval.
pub struct BookmarkStore {
    file: PathBuf,
    bookmarks: Vec<Bookmark>,
}

impl BookmarkStore {
    /// Load bookmarks from `file`, which need not exist yet.
    pub fn open(file: impl AsRef<Path>) -> StorageResult<Self> {
        let file = file.as_ref().to_path_buf();

        let bookmarks = if file.exists() {
            let content =
                fs::read_to_string(&file).map_err(|e| StorageError::LoadFailed(e.to_string()))?;
            serde_json::from_str(&content).map_err(|e| StorageError::LoadFailed(e.to_string()))?
        } else {
            Vec::new()
        };

        Ok(Self { file, bookmarks })
    }

    /// Open the bookmark file in the user's data directory.
    pub fn open_default(paths: &Paths) -> StorageResult<Self> {
        Self::open(paths.bookmarks_file())
    }

    /// All bookmarks, newest first.
    pub fn list(&self) -> Vec<&Bookmark> {
        let mut list: Vec<_> = self.bookmarks.iter().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn get(&self, name: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.name == name)
    }

    /// Add a new bookmark.
    pub fn create(&mut self, bookmark: Bookmark) -> StorageResult<()> {
        bookmark.validate()?;

        if self.get(&bookmark.name).is_some() {
            return Err(StorageError::BookmarkExists(bookmark.name));
        }

        self.bookmarks.push(bookmark);
        self.persist()
    }

    /// Change an existing bookmark.
    pub fn update(&mut self, name: &str, update: BookmarkUpdate) -> StorageResult<&Bookmark> {
        let index = self
            .bookmarks
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| StorageError::BookmarkNotFound(name.to_string()))?;

        let mut changed = self.bookmarks[index].clone();
        if let Some(target) = update.target {
            changed.target = target;
        }
        if let Some(description) = update.description {
            changed.description = description;
        }
        if let Some(profile) = update.profile {
            changed.profile = profile;
        }
        if let Some(ports) = update.ports {
            changed.ports = ports;
        }
        changed.validate()?;

        self.bookmarks[index] = changed;
        self.persist()?;
        Ok(&self.bookmarks[index])
    }

    /// Remove a bookmark.
    pub fn delete(&mut self, name: &str) -> StorageResult<()> {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| b.name != name);

        if self.bookmarks.len() == before {
            return Err(StorageError::BookmarkNotFound(name.to_string()));
        }

        self.persist()
    }

    fn persist(&self) -> StorageResult<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::DirectoryError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(&self.bookmarks)?;
        fs::write(&self.file, content).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }
}
