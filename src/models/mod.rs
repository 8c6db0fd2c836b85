//! Data models for EmuSAK.
//!
//! - [`EmulatorConfig`]: a named, path-addressed emulator installation (persisted)
//! - [`EmulatorKind`]: which emulator family a configuration belongs to
//! - [`EmulatorMode`]: portable/installed layout and data directory (derived, never persisted)
//! - [`SelectionState`]: the emulator in focus and its active configuration
//! - [`GameMetadata`]: display data for one title in the game library
//!
//! Persisted types derive `Serialize`/`Deserialize`; the selection is held by
//! [`StateManager`](crate::state::StateManager) and only changes through it.

pub mod emulator;
pub mod game;
pub mod selection;

pub use emulator::{EmulatorConfig, EmulatorKind, EmulatorMode, ModeKind, UnknownEmulator};
pub use game::GameMetadata;
pub use selection::{SelectionState, first_matching};
