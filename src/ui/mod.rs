// UI module - front-end orchestration
//
// This module contains:
// - EmulatorController: wires the registry, selection and collaborators together
// - console: terminal implementations of the dialog and alert collaborators

pub mod console;
pub mod controller;

pub use console::{LogAlertSink, RfdFolderPicker, StdinNamePrompt};
pub use controller::{
    AddOutcome, Collaborators, ControllerError, EmulatorController, GameEntry, LibraryListing,
    ModeCache, NamePromptOutcome,
};
