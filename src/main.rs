//! EmuSAK - configuration manager for Nintendo Switch emulators
//!
//! Main entry point for the terminal application.
//!
//! # Overview
//!
//! This binary wires the library together and runs a line-based command loop:
//! - Settings ([`SettingsManager`]): `emusak.yaml` plus `EMUSAK_*` overrides
//! - Logging infrastructure (daily rotating file, optional console output)
//! - Persistent store ([`FileStore`]) holding the configuration record
//! - Selection tracking ([`StateManager`]) with a listener thread logging changes
//! - [`EmulatorController`] with the native folder dialog and terminal prompts
//!
//! # Execution Flow
//!
//! 1. Resolve the app directory (`EMUSAK_HOME` or `<config_dir>/emusak`)
//! 2. Load settings, initialize logging → `<log_dir>/emusak.<date>`
//! 3. Open the store and load the configuration collection
//! 4. Run commands until `quit` or end of input

use anyhow::{Context, Result};
use emusak::services::{FsGameCatalog, FsModeDetector, TitleDatabase};
use emusak::ui::{
    AddOutcome, Collaborators, ControllerError, EmulatorController, LogAlertSink, RfdFolderPicker, StdinNamePrompt,
};
use emusak::{
    APP_NAME, ConfigRegistry, EmulatorKind, FileStore, KeyValueStore, SettingsManager,
    StateManager, VERSION,
};
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Commands:
  list              List configurations
  add               Add a configuration with the folder picker
  remove <path>     Remove the configuration at <path>
  default           Create a configuration from the installed emulator
  select <path>     Make the configuration at <path> active
  switch <ryu|yuzu> Change the emulator in focus
  mode              Show the mode of the active configuration
  games             List games of the active configuration
  help              Show this help
  quit              Exit";

fn main() -> Result<()> {
    let settings_manager = SettingsManager::from_env()?;
    let settings = settings_manager.load_settings()?;

    let _log_guard = emusak::logging::setup_logging_with_console(
        &settings_manager.log_dir(&settings),
        APP_NAME,
        settings.debug_mode,
        settings.debug_mode,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let store = FileStore::open(settings_manager.store_dir(&settings))
        .context("Failed to open configuration store")?;
    let registry = ConfigRegistry::load(store);

    let titles = match settings_manager.title_database_path(&settings) {
        Some(path) => TitleDatabase::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Title database unavailable, using title ids: {:#}", e);
            TitleDatabase::new()
        }),
        None => TitleDatabase::new(),
    };

    let state_manager = StateManager::new(settings.default_emulator);
    spawn_state_listener(&state_manager);

    let collaborators = Collaborators::new(
        RfdFolderPicker::new(),
        StdinNamePrompt::new(),
        FsModeDetector::new(),
        FsGameCatalog::new(titles),
        LogAlertSink::new(),
    );
    let mut controller = EmulatorController::new(registry, state_manager, collaborators);

    println!("{} v{} - type 'help' for commands", APP_NAME, VERSION);
    run_command_loop(&mut controller)?;

    tracing::info!("Application shutdown complete");
    Ok(())
}

/// Log every state change from a background thread
fn spawn_state_listener(state_manager: &StateManager) {
    let mut rx = state_manager.subscribe();

    std::thread::Builder::new()
        .name("emusak-state".to_string())
        .spawn(move || {
            while let Ok(change) = rx.blocking_recv() {
                tracing::debug!("State change: {:?}", change);
            }
        })
        .map(|_| ())
        .unwrap_or_else(|e| tracing::warn!("State listener not started: {}", e));
}

fn run_command_loop<S: KeyValueStore>(controller: &mut EmulatorController<S>) -> Result<()> {
    let stdin = io::stdin();

    loop {
        print!("[{}] > ", controller.current_emu().display_name());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let argument = parts.next().map(str::trim).unwrap_or_default();

        match command {
            "" => {}
            "list" => print_configs(controller),
            "add" => match controller.add_config_interactive() {
                Ok(AddOutcome::Added(config)) => println!("Added '{}' at {}", config.name, config.path),
                Ok(AddOutcome::Cancelled) => println!("Cancelled"),
                Err(e) => report_unalerted(&e),
            },
            "remove" => match controller.remove_config(argument) {
                Ok(Some(config)) => println!("Removed '{}'", config.name),
                Ok(None) => println!("No configuration at {}", argument),
                Err(e) => report_unalerted(&e),
            },
            "default" => match controller.create_default_config() {
                Ok(config) => println!("Created '{}' at {}", config.name, config.path),
                Err(e) => report_unalerted(&e),
            },
            "select" => {
                controller.select_path(argument);
                match controller.selected() {
                    Some(config) if config.path == argument => println!("Using '{}'", config.name),
                    _ => println!("No {} configuration at {}", controller.current_emu(), argument),
                }
            }
            "switch" => match argument.parse::<EmulatorKind>() {
                Ok(kind) => {
                    controller.switch_emulator(kind);
                }
                Err(e) => println!("{}", e),
            },
            "mode" => match controller.resolve_selected_mode() {
                Ok(Some(mode)) => println!("{} mode, data in {}", mode.mode, mode.data_path),
                Ok(None) => println!("No configuration selected"),
                Err(e) => report_unalerted(&e),
            },
            "games" => match controller.load_library() {
                Ok(Some(listing)) if listing.is_empty() => {
                    println!("No games yet. Launch a game once in the emulator first.")
                }
                Ok(Some(listing)) => {
                    let columns = listing.columns();
                    for row in listing.games.chunks(columns) {
                        let cells: Vec<String> = row
                            .iter()
                            .map(|game| format!("{:<34}", game.display_title()))
                            .collect();
                        println!("{}", cells.join(""));
                    }
                }
                Ok(None) => println!("No configuration selected"),
                Err(e) => report_unalerted(&e),
            },
            "help" => println!("{}", HELP),
            "quit" | "exit" => break,
            other => println!("Unknown command '{}', type 'help'", other),
        }
    }

    Ok(())
}

fn print_configs<S: KeyValueStore>(controller: &EmulatorController<S>) {
    let selected = controller.selected();
    let current = controller.current_emu();

    let configs = controller.configs();
    if configs.is_empty() {
        println!("No configurations. Use 'add' or 'default'.");
        return;
    }

    for config in configs {
        let marker = if selected.as_ref() == Some(config) { "*" } else { " " };
        let focus = if config.emulator == current { "" } else { " (other emulator)" };
        println!("{} {:<20} {:<5} {}{}", marker, config.name, config.emulator.as_str(), config.path, focus);
    }
}

/// Errors with an alert code were already shown by the alert sink
fn report_unalerted(error: &ControllerError) {
    if error.alert_code().is_none() {
        println!("{}", error);
    }
}
