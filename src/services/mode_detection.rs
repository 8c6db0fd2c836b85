//! Filesystem-backed mode detection for Ryujinx and Yuzu installations.
//!
//! Both emulators can run either *portable* (data next to the binary, in a
//! marker folder) or *installed* (data in the user's profile):
//!
//! | Emulator | Portable marker | Installed data dir |
//! |----------|-----------------|--------------------|
//! | Ryujinx  | `portable/`     | `<config_dir>/Ryujinx` |
//! | Yuzu     | `user/`         | `<data_dir>/yuzu` |
//!
//! `<config_dir>` and `<data_dir>` come from the `dirs` crate (`%APPDATA%` on
//! Windows, `~/.config` and `~/.local/share` on Linux).

use super::ports::{AlertCode, CollaboratorError, DirectoryLister, ModeDetector};
use crate::models::{EmulatorConfig, EmulatorKind, EmulatorMode, ModeKind};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::fs;

/// Name given to configurations synthesized from an installed layout.
pub const DEFAULT_CONFIG_NAME: &str = "Default";

/// Folder whose presence next to the binary means portable mode.
pub fn portable_marker(emulator: EmulatorKind) -> &'static str {
    match emulator {
        EmulatorKind::Ryu => "portable",
        EmulatorKind::Yuzu => "user",
    }
}

fn binary_names(emulator: EmulatorKind) -> &'static [&'static str] {
    match emulator {
        EmulatorKind::Ryu => &["ryujinx", "ryujinx.exe", "ryujinx.ava", "ryujinx.ava.exe"],
        EmulatorKind::Yuzu => &["yuzu", "yuzu.exe"],
    }
}

/// Look for the emulator executable directly inside `folder`.
///
/// Matching is case-insensitive. Returns the first match.
pub fn find_emulator_binary(emulator: EmulatorKind, folder: &Utf8Path) -> Option<Utf8PathBuf> {
    let entries = fs::read_dir(folder).ok()?;
    let names = binary_names(emulator);

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| Utf8PathBuf::try_from(entry.path()).ok())
        .find(|path| {
            path.file_name()
                .map(|name| names.contains(&name.to_lowercase().as_str()))
                .unwrap_or(false)
        })
}

/// Lists directories with `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDirectoryLister;

impl DirectoryLister for FsDirectoryLister {
    fn list_subdirectories(&self, path: &Utf8Path) -> Result<BTreeSet<String>, CollaboratorError> {
        let entries = fs::read_dir(path).map_err(|e| {
            CollaboratorError::new(
                AlertCode::EmulatorBinaryNotFound,
                format!("Cannot read {}: {}", path, e),
            )
        })?;

        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect())
    }
}

/// [`ModeDetector`] that inspects the filesystem.
#[derive(Debug, Clone)]
pub struct FsModeDetector<L = FsDirectoryLister> {
    lister: L,
    config_root: Option<Utf8PathBuf>,
    data_root: Option<Utf8PathBuf>,
}

impl FsModeDetector<FsDirectoryLister> {
    /// Detector using the platform's config and data directories.
    pub fn new() -> Self {
        let to_utf8 = |p: std::path::PathBuf| Utf8PathBuf::try_from(p).ok();
        Self {
            lister: FsDirectoryLister,
            config_root: dirs::config_dir().and_then(to_utf8),
            data_root: dirs::data_dir().and_then(to_utf8),
        }
    }
}

impl Default for FsModeDetector<FsDirectoryLister> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: DirectoryLister> FsModeDetector<L> {
    /// Detector with explicit roots for installed layouts.
    pub fn with_roots(
        lister: L,
        config_root: impl Into<Utf8PathBuf>,
        data_root: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            lister,
            config_root: Some(config_root.into()),
            data_root: Some(data_root.into()),
        }
    }

    /// Where an installed (non-portable) emulator keeps its data.
    pub fn installed_data_dir(&self, emulator: EmulatorKind) -> Option<Utf8PathBuf> {
        match emulator {
            EmulatorKind::Ryu => self.config_root.as_ref().map(|r| r.join("Ryujinx")),
            EmulatorKind::Yuzu => self.data_root.as_ref().map(|r| r.join("yuzu")),
        }
    }
}

impl<L: DirectoryLister> ModeDetector for FsModeDetector<L> {
    fn detect_mode(&self, emulator: EmulatorKind, path: &str) -> Result<EmulatorMode, CollaboratorError> {
        if path.is_empty() {
            return Err(CollaboratorError::new(
                AlertCode::ModeDetectionFailed,
                "Configuration has no path",
            ));
        }

        let path = Utf8Path::new(path);
        // A bare file name has an empty parent: the current directory
        let folder = if path.is_file() {
            match path.parent() {
                Some(parent) if !parent.as_str().is_empty() => parent,
                _ => Utf8Path::new("."),
            }
        } else {
            path
        };

        if !folder.is_dir() {
            return Err(CollaboratorError::new(
                AlertCode::EmulatorBinaryNotFound,
                format!("{} does not exist", folder),
            ));
        }

        let marker = portable_marker(emulator);
        let subdirs = self.lister.list_subdirectories(folder)?;

        if let Some(found) = subdirs.iter().find(|d| d.eq_ignore_ascii_case(marker)) {
            let data_path = folder.join(found);
            tracing::debug!("{} at {} is portable ({})", emulator, folder, data_path);
            return Ok(EmulatorMode::new(ModeKind::Portable, data_path));
        }

        let data_path = self.installed_data_dir(emulator).ok_or_else(|| {
            CollaboratorError::new(
                AlertCode::ModeDetectionFailed,
                format!("Cannot determine the installed data directory for {}", emulator.display_name()),
            )
        })?;

        tracing::debug!("{} at {} is installed ({})", emulator, folder, data_path);
        Ok(EmulatorMode::new(ModeKind::Installed, data_path))
    }

    fn synthesize_default_config(&self, emulator: EmulatorKind) -> Result<EmulatorConfig, CollaboratorError> {
        let data_dir = self.installed_data_dir(emulator).ok_or_else(|| {
            CollaboratorError::new(
                AlertCode::DefaultConfigUnavailable,
                "Cannot determine the user data directory",
            )
        })?;

        if !data_dir.is_dir() {
            return Err(CollaboratorError::new(
                AlertCode::DefaultConfigUnavailable,
                format!("No {} installation found at {}", emulator.display_name(), data_dir),
            ));
        }

        tracing::info!("Found installed {} data at {}", emulator.display_name(), data_dir);
        Ok(EmulatorConfig::new(data_dir.as_str(), DEFAULT_CONFIG_NAME, emulator))
    }
}
