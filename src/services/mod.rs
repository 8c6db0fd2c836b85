//! Services module - collaborators the core talks to.
//!
//! The core (registry, selection, controller) never touches dialogs, the
//! filesystem layout of an emulator, or title metadata directly. It goes
//! through the traits in [`ports`], and this module provides the local
//! implementations used by the binary.
//!
//! # Components
//!
//! - [`ports`]: collaborator traits ([`FolderPicker`], [`NamePrompt`],
//!   [`DirectoryLister`], [`ModeDetector`], [`GameCatalog`], [`AlertSink`]) plus
//!   [`CollaboratorError`] and the alert vocabulary
//! - [`mode_detection`]: [`FsModeDetector`] resolves a configuration path to
//!   portable or installed mode and synthesizes default configurations
//! - [`library`]: [`FsGameCatalog`] scans title folders and looks titles up in
//!   a local [`TitleDatabase`]
//!
//! # Usage Example
//!
//! ```ignore
//! use emusak::services::{FsModeDetector, ModeDetector};
//! use emusak::models::EmulatorKind;
//!
//! let detector = FsModeDetector::new();
//! let mode = detector.detect_mode(EmulatorKind::Ryu, "/opt/ryujinx")?;
//! println!("{} -> {}", mode.mode, mode.data_path);
//! ```

pub mod library;
pub mod mode_detection;
pub mod ports;

pub use library::{FsGameCatalog, TitleDatabase};
pub use mode_detection::{FsDirectoryLister, FsModeDetector, find_emulator_binary};
pub use ports::{
    AlertCode, AlertKind, AlertSink, CollaboratorError, DirectoryLister, FolderPicker,
    GameCatalog, ModeDetector, NamePrompt,
};
