// EmuSAK - configuration manager for Nintendo Switch emulators
//
// This is the library crate containing the emulator configuration registry,
// selection tracking and the collaborators they drive.
// The binary crate (main.rs) provides the terminal entry point.

pub mod config;
pub mod logging;
pub mod models;
pub mod registry;
pub mod services;
pub mod state;
pub mod store;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::{AppSettings, SettingsManager};
pub use models::{EmulatorConfig, EmulatorKind, EmulatorMode, GameMetadata, ModeKind, SelectionState};
pub use registry::{ConfigRegistry, RegistryError};
pub use state::{StateChange, StateManager};
pub use store::{ConfigStore, FileStore, KeyValueStore, MemoryStore, StoreError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
