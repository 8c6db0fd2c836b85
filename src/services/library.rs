//! Game library scanning and title metadata.
//!
//! Games are discovered from the emulator's data directory by folder name:
//! each title the emulator has seen gets a folder named after its 16-digit
//! hexadecimal title id.
//!
//! - Ryujinx: `<data>/games/<title id>/`
//! - Yuzu: `<data>/load/<title id>/`
//!
//! Titles are described by an optional local [`TitleDatabase`] (YAML map of
//! title id to `{ title, image }`). Unknown ids fall back to the id itself.

use super::ports::{AlertCode, CollaboratorError, GameCatalog};
use crate::models::{EmulatorKind, GameMetadata};
use anyhow::{Context, Result};
use camino::Utf8Path;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::fs;

/// Folder under the data directory holding one sub-folder per title.
pub fn games_dir_name(emulator: EmulatorKind) -> &'static str {
    match emulator {
        EmulatorKind::Ryu => "games",
        EmulatorKind::Yuzu => "load",
    }
}

/// Local title id → metadata lookup.
#[derive(Debug, Clone, Default)]
pub struct TitleDatabase {
    entries: HashMap<String, GameMetadata>,
}

impl TitleDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a YAML map of title id to metadata. Ids are matched case-insensitively.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read title database: {}", path))?;
        let raw: HashMap<String, GameMetadata> = serde_yaml_ng::from_str(&contents)
            .with_context(|| format!("Failed to parse title database: {}", path))?;

        tracing::info!("Loaded {} title(s) from {}", raw.len(), path);
        Ok(Self::from_entries(raw))
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, GameMetadata)>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(id, meta)| (id.to_ascii_uppercase(), meta))
                .collect(),
        }
    }

    pub fn get(&self, title_id: &str) -> Option<&GameMetadata> {
        self.entries.get(&title_id.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// [`GameCatalog`] backed by the filesystem and a [`TitleDatabase`].
#[derive(Debug, Clone)]
pub struct FsGameCatalog {
    titles: TitleDatabase,

    /// Switch title ids are 16 hex digits
    title_id_pattern: Regex,
}

impl FsGameCatalog {
    pub fn new(titles: TitleDatabase) -> Self {
        Self {
            titles,
            title_id_pattern: Regex::new(r"^[0-9A-Fa-f]{16}$").expect("Invalid title id regex"),
        }
    }

    pub fn is_title_id(&self, name: &str) -> bool {
        self.title_id_pattern.is_match(name)
    }
}

impl Default for FsGameCatalog {
    fn default() -> Self {
        Self::new(TitleDatabase::new())
    }
}

impl GameCatalog for FsGameCatalog {
    fn scan_games(&self, data_path: &Utf8Path, emulator: EmulatorKind) -> Result<Vec<String>, CollaboratorError> {
        let games_dir = data_path.join(games_dir_name(emulator));
        if !games_dir.is_dir() {
            tracing::debug!("No games directory at {}", games_dir);
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&games_dir).map_err(|e| {
            CollaboratorError::new(
                AlertCode::GameScanFailed,
                format!("Cannot read {}: {}", games_dir, e),
            )
        })?;

        let ids: BTreeSet<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| self.is_title_id(name))
            .map(|name| name.to_ascii_uppercase())
            .collect();

        tracing::info!("Found {} game(s) in {}", ids.len(), games_dir);
        Ok(ids.into_iter().collect())
    }

    fn fetch_game_metadata(&self, title_id: &str) -> Result<GameMetadata, CollaboratorError> {
        Ok(self
            .titles
            .get(title_id)
            .cloned()
            .unwrap_or_else(|| GameMetadata::unknown(title_id)))
    }
}
