//! Collaborator ports.
//!
//! The core talks to dialogs, the filesystem and the title database only
//! through these traits. Each call is a plain request/response; the core
//! imposes no timeout on them.

use crate::models::{EmulatorConfig, EmulatorKind, EmulatorMode, GameMetadata};
use camino::Utf8Path;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Severity of a user-facing alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Error,
    Warning,
    Info,
}

/// Stable message codes for alerts. The presentation layer owns the wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCode {
    EmulatorPathAlreadyExists,
    EmulatorBinaryNotFound,
    ModeDetectionFailed,
    DefaultConfigUnavailable,
    GameScanFailed,
    PersistenceFailed,
}

impl AlertCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCode::EmulatorPathAlreadyExists => "EMULATOR_PATH_ALREADY_EXISTS",
            AlertCode::EmulatorBinaryNotFound => "EMULATOR_BINARY_NOT_FOUND",
            AlertCode::ModeDetectionFailed => "MODE_DETECTION_FAILED",
            AlertCode::DefaultConfigUnavailable => "DEFAULT_CONFIG_UNAVAILABLE",
            AlertCode::GameScanFailed => "GAME_SCAN_FAILED",
            AlertCode::PersistenceFailed => "PERSISTENCE_FAILED",
        }
    }
}

impl fmt::Display for AlertCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collaborator returned an error or an unusable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct CollaboratorError {
    pub code: AlertCode,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(code: AlertCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Folder selection dialog.
#[cfg_attr(test, mockall::automock)]
pub trait FolderPicker {
    /// `Ok(None)` when the user cancelled.
    fn pick_folder(&self, emulator: EmulatorKind) -> Result<Option<String>, CollaboratorError>;
}

/// Text prompt asking for a configuration name.
#[cfg_attr(test, mockall::automock)]
pub trait NamePrompt {
    /// Raw input, or `None` when the prompt was dismissed.
    fn prompt_name(&self) -> Option<String>;
}

/// Directory listing, used to find layout marker folders.
#[cfg_attr(test, mockall::automock)]
pub trait DirectoryLister {
    fn list_subdirectories(&self, path: &Utf8Path) -> Result<BTreeSet<String>, CollaboratorError>;
}

/// Resolves configuration paths to runtime modes.
#[cfg_attr(test, mockall::automock)]
pub trait ModeDetector {
    fn detect_mode(&self, emulator: EmulatorKind, path: &str) -> Result<EmulatorMode, CollaboratorError>;

    /// Build a configuration for an installation found without user input.
    fn synthesize_default_config(&self, emulator: EmulatorKind) -> Result<EmulatorConfig, CollaboratorError>;
}

/// Game library lookup.
#[cfg_attr(test, mockall::automock)]
pub trait GameCatalog {
    /// Title ids found under `data_path`, in a stable order.
    fn scan_games(&self, data_path: &Utf8Path, emulator: EmulatorKind) -> Result<Vec<String>, CollaboratorError>;

    fn fetch_game_metadata(&self, title_id: &str) -> Result<GameMetadata, CollaboratorError>;
}

/// Fire-and-forget user notification channel.
#[cfg_attr(test, mockall::automock)]
pub trait AlertSink {
    fn emit_alert(&self, kind: AlertKind, code: AlertCode, detail: &str);
}
