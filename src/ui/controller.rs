// Emulator controller - orchestrates the registry, selection and collaborators
//
// This module contains the EmulatorController which coordinates between:
// - ConfigRegistry (persisted configurations)
// - StateManager (emulator in focus + active configuration)
// - ModeCache (session cache of resolved modes)
// - Collaborator ports (dialogs, mode detection, game catalog, alerts)
//
// It handles:
// - The interactive add flow (folder picker → duplicate check → naming loop)
// - Recomputing the selection after every registry mutation
// - Routing collaborator failures to the alert channel
// - Building the game library listing for the active configuration

use crate::models::{EmulatorConfig, EmulatorKind, EmulatorMode, GameMetadata};
use crate::registry::{ConfigRegistry, RegistryError};
use crate::services::ports::{
    AlertCode, AlertKind, AlertSink, CollaboratorError, FolderPicker, GameCatalog, ModeDetector,
    NamePrompt,
};
use crate::state::{StateChange, StateManager};
use crate::store::KeyValueStore;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::broadcast;

/// Longest title shown in full in the library listing
pub const MAX_TITLE_CHARS: usize = 29;

/// Errors returned by controller operations
///
/// Duplicate paths, persistence failures and collaborator failures have
/// already been sent to the [`AlertSink`] when they are returned.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("Cannot resolve a configuration without a path")]
    EmptyPath,
}

impl ControllerError {
    /// Alert code for errors that are surfaced to the user
    pub fn alert_code(&self) -> Option<AlertCode> {
        match self {
            ControllerError::Registry(RegistryError::DuplicatePath(_)) => {
                Some(AlertCode::EmulatorPathAlreadyExists)
            }
            ControllerError::Registry(RegistryError::Persist(_)) => Some(AlertCode::PersistenceFailed),
            ControllerError::Registry(_) | ControllerError::EmptyPath => None,
            ControllerError::Collaborator(e) => Some(e.code),
        }
    }
}

/// Result of the interactive add flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A configuration was committed and selected
    Added(EmulatorConfig),

    /// The user dismissed the picker or the naming prompt; nothing changed
    Cancelled,
}

/// One iteration of the naming loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePromptOutcome {
    Confirmed(String),
    Cancelled,
    /// Empty or blank input; the loop asks again
    Invalid,
}

impl NamePromptOutcome {
    pub fn classify(input: Option<String>) -> Self {
        match input {
            None => NamePromptOutcome::Cancelled,
            Some(raw) => {
                let name = raw.trim();
                if name.is_empty() {
                    NamePromptOutcome::Invalid
                } else {
                    NamePromptOutcome::Confirmed(name.to_string())
                }
            }
        }
    }
}

/// Session cache of resolved modes, keyed by `(emulator, path)`
///
/// Only successful resolutions are stored. Nothing survives the process.
#[derive(Debug, Default)]
pub struct ModeCache {
    entries: HashMap<(EmulatorKind, String), EmulatorMode>,
}

impl ModeCache {
    pub fn get(&self, emulator: EmulatorKind, path: &str) -> Option<&EmulatorMode> {
        self.entries.get(&(emulator, path.to_string()))
    }

    pub fn insert(&mut self, emulator: EmulatorKind, path: &str, mode: EmulatorMode) {
        self.entries.insert((emulator, path.to_string()), mode);
    }

    /// Drop every cached mode for `path`, whatever the emulator
    pub fn evict_path(&mut self, path: &str) {
        self.entries.retain(|(_, p), _| p != path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A title in the library listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEntry {
    pub title_id: String,
    pub metadata: GameMetadata,
}

impl GameEntry {
    pub fn display_title(&self) -> String {
        LibraryListing::display_title(&self.metadata.title)
    }
}

/// Everything the game-listing view needs for the active configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryListing {
    pub config: EmulatorConfig,
    pub mode: EmulatorMode,
    pub games: Vec<GameEntry>,
}

impl LibraryListing {
    /// Grid column count: the number of games clamped to 3..=5
    pub fn columns(&self) -> usize {
        self.games.len().clamp(3, 5)
    }

    /// No games yet; the emulator has to launch a title once before it shows up
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Title shortened to [`MAX_TITLE_CHARS`] characters plus `...`
    pub fn display_title(title: &str) -> String {
        if title.chars().count() > MAX_TITLE_CHARS {
            let short: String = title.chars().take(MAX_TITLE_CHARS).collect();
            format!("{short}...")
        } else {
            title.to_string()
        }
    }
}

/// Boxed collaborator ports used by the controller
pub struct Collaborators {
    pub folder_picker: Box<dyn FolderPicker>,
    pub name_prompt: Box<dyn NamePrompt>,
    pub mode_detector: Box<dyn ModeDetector>,
    pub game_catalog: Box<dyn GameCatalog>,
    pub alerts: Box<dyn AlertSink>,
}

impl Collaborators {
    pub fn new(
        folder_picker: impl FolderPicker + 'static,
        name_prompt: impl NamePrompt + 'static,
        mode_detector: impl ModeDetector + 'static,
        game_catalog: impl GameCatalog + 'static,
        alerts: impl AlertSink + 'static,
    ) -> Self {
        Self {
            folder_picker: Box::new(folder_picker),
            name_prompt: Box::new(name_prompt),
            mode_detector: Box::new(mode_detector),
            game_catalog: Box::new(game_catalog),
            alerts: Box::new(alerts),
        }
    }
}

/// Controller wiring configurations, selection and collaborators together
///
/// All mutations take `&mut self`, so there is a single writer. Read
/// accessors are cheap and can be called from any UI handler.
///
/// # Example
/// ```ignore
/// let registry = ConfigRegistry::load(FileStore::open("data")?);
/// let state = StateManager::new(EmulatorKind::Ryu);
/// let mut controller = EmulatorController::new(registry, state, collaborators);
///
/// if let AddOutcome::Added(config) = controller.add_config_interactive()? {
///     println!("Now using {}", config.name);
/// }
/// ```
pub struct EmulatorController<S> {
    registry: ConfigRegistry<S>,
    state: StateManager,
    mode_cache: ModeCache,
    ports: Collaborators,
}

impl<S: KeyValueStore> EmulatorController<S> {
    pub fn new(registry: ConfigRegistry<S>, state: StateManager, ports: Collaborators) -> Self {
        tracing::info!(
            "Emulator controller initialized: {} configuration(s), current emulator {}",
            registry.len(),
            state.current_emu()
        );
        Self {
            registry,
            state,
            mode_cache: ModeCache::default(),
            ports,
        }
    }

    // ===== Read accessors =====

    pub fn configs(&self) -> Vec<&EmulatorConfig> {
        self.registry.list()
    }

    pub fn registry(&self) -> &ConfigRegistry<S> {
        &self.registry
    }

    pub fn selected(&self) -> Option<EmulatorConfig> {
        self.state.selected()
    }

    pub fn current_emu(&self) -> EmulatorKind {
        self.state.current_emu()
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn mode_cache(&self) -> &ModeCache {
        &self.mode_cache
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state.subscribe()
    }

    // ===== Configuration mutations =====

    /// Interactive add flow
    ///
    /// 1. Ask the folder picker for a location; cancelling ends the flow silently
    /// 2. Reject a location that is already configured (alerted)
    /// 3. Ask for a name until one is confirmed or the prompt is dismissed
    ///
    /// Nothing is written before a non-empty name is confirmed. The new
    /// configuration becomes the selection.
    pub fn add_config_interactive(&mut self) -> Result<AddOutcome, ControllerError> {
        let emulator = self.state.current_emu();

        let path = match self.ports.folder_picker.pick_folder(emulator) {
            Ok(Some(path)) if !path.is_empty() => path,
            Ok(Some(_)) => {
                return Err(self.report(
                    CollaboratorError::new(
                        AlertCode::EmulatorBinaryNotFound,
                        "Folder picker returned an empty path",
                    )
                    .into(),
                ));
            }
            Ok(None) => {
                tracing::debug!("Folder selection cancelled");
                return Ok(AddOutcome::Cancelled);
            }
            Err(e) => return Err(self.report(e.into())),
        };

        if self.registry.contains(&path) {
            return Err(self.report(RegistryError::DuplicatePath(path).into()));
        }

        loop {
            match NamePromptOutcome::classify(self.ports.name_prompt.prompt_name()) {
                NamePromptOutcome::Confirmed(name) => {
                    let config = self.add_config_as(&path, &name, emulator)?;
                    self.state.select(Some(&config));
                    return Ok(AddOutcome::Added(config));
                }
                NamePromptOutcome::Cancelled => {
                    tracing::debug!("Naming prompt dismissed, nothing added");
                    return Ok(AddOutcome::Cancelled);
                }
                NamePromptOutcome::Invalid => {
                    tracing::debug!("Empty configuration name, asking again");
                }
            }
        }
    }

    /// Add a configuration for the emulator in focus
    ///
    /// Does not change the selection unless the current one became invalid.
    pub fn add_config(&mut self, path: &str, name: &str) -> Result<EmulatorConfig, ControllerError> {
        let emulator = self.state.current_emu();
        self.add_config_as(path, name, emulator)
    }

    /// Remove the configuration at `path` (no-op when unknown)
    ///
    /// The selection is reset to the first remaining configuration of the
    /// emulator in focus.
    pub fn remove_config(&mut self, path: &str) -> Result<Option<EmulatorConfig>, ControllerError> {
        let removed = self
            .registry
            .remove(path)
            .map_err(|e| self.report(e.into()))?;

        self.mode_cache.evict_path(path);
        self.state.recompute_after_remove(&self.registry.to_vec());

        Ok(removed)
    }

    /// Create a configuration from an installation found by the mode detector
    ///
    /// The new configuration becomes the selection. Duplicate paths are not rejected here. A detector failure or an empty
    /// path aborts without touching the registry.
    pub fn create_default_config(&mut self) -> Result<EmulatorConfig, ControllerError> {
        let emulator = self.state.current_emu();

        let config = self
            .ports
            .mode_detector
            .synthesize_default_config(emulator)
            .map_err(|e| self.report(e.into()))?;

        if config.path.is_empty() || config.emulator != emulator {
            return Err(self.report(
                CollaboratorError::new(
                    AlertCode::DefaultConfigUnavailable,
                    format!("Detector returned an unusable configuration: {:?}", config),
                )
                .into(),
            ));
        }

        let config = self
            .registry
            .append_default(config)
            .map_err(|e| self.report(e.into()))?;

        self.state.adopt(&self.registry.to_vec(), &config);
        Ok(config)
    }

    // ===== Selection =====

    /// Select a configuration; `None` and unknown configurations are ignored
    pub fn select(&self, config: Option<&EmulatorConfig>) -> Vec<StateChange> {
        match config {
            Some(c) if self.registry.get(&c.path) != Some(c) => {
                tracing::warn!("Ignoring selection of unknown configuration at {}", c.path);
                Vec::new()
            }
            other => self.state.select(other),
        }
    }

    /// Select the configuration at `path`, if there is one
    pub fn select_path(&self, path: &str) -> Vec<StateChange> {
        self.state.select(self.registry.get(path))
    }

    pub fn switch_emulator(&self, emulator: EmulatorKind) -> Vec<StateChange> {
        tracing::info!("Switching to {}", emulator.display_name());
        self.state.switch_emulator(emulator)
    }

    // ===== Mode resolution =====

    /// Resolve `(emulator, path)` to a mode, once per session
    ///
    /// Never writes to the registry. Failures are alerted and not cached.
    pub fn resolve_mode(&mut self, emulator: EmulatorKind, path: &str) -> Result<EmulatorMode, ControllerError> {
        if path.is_empty() {
            return Err(ControllerError::EmptyPath);
        }

        if let Some(mode) = self.mode_cache.get(emulator, path) {
            tracing::debug!("Mode cache hit for {} at {}", emulator, path);
            return Ok(mode.clone());
        }

        let mode = self
            .ports
            .mode_detector
            .detect_mode(emulator, path)
            .map_err(|e| self.report(e.into()))?;

        tracing::info!("Resolved {} at {}: {} ({})", emulator, path, mode.mode, mode.data_path);
        self.mode_cache.insert(emulator, path, mode.clone());
        Ok(mode)
    }

    /// Mode of the active configuration; `Ok(None)` without a selection
    pub fn resolve_selected_mode(&mut self) -> Result<Option<EmulatorMode>, ControllerError> {
        let Some(config) = self.state.selected() else {
            return Ok(None);
        };
        if config.path.is_empty() {
            return Ok(None);
        }
        self.resolve_mode(config.emulator, &config.path).map(Some)
    }

    // ===== Library =====

    /// Game listing for the active configuration; `Ok(None)` without a selection
    ///
    /// Titles keep the order the catalog returned them in.
    pub fn load_library(&mut self) -> Result<Option<LibraryListing>, ControllerError> {
        let Some(config) = self.state.selected() else {
            return Ok(None);
        };
        let Some(mode) = self.resolve_selected_mode()? else {
            return Ok(None);
        };

        let title_ids = self
            .ports
            .game_catalog
            .scan_games(&mode.data_path, config.emulator)
            .map_err(|e| self.report(e.into()))?;

        let mut games = Vec::with_capacity(title_ids.len());
        for title_id in title_ids {
            let metadata = self
                .ports
                .game_catalog
                .fetch_game_metadata(&title_id)
                .map_err(|e| self.report(e.into()))?;
            games.push(GameEntry { title_id, metadata });
        }

        tracing::info!("Library for '{}': {} game(s)", config.name, games.len());
        Ok(Some(LibraryListing { config, mode, games }))
    }

    // ===== Internals =====

    fn add_config_as(
        &mut self,
        path: &str,
        name: &str,
        emulator: EmulatorKind,
    ) -> Result<EmulatorConfig, ControllerError> {
        let config = self
            .registry
            .add(path, name, emulator)
            .map_err(|e| self.report(e.into()))?;

        self.state.recompute(&self.registry.to_vec(), emulator);
        Ok(config)
    }

    /// Send `error` to the alert channel when it is user-facing, then hand it back
    fn report(&self, error: ControllerError) -> ControllerError {
        match error.alert_code() {
            Some(code) => {
                tracing::error!("{}", error);
                self.ports
                    .alerts
                    .emit_alert(AlertKind::Error, code, &error.to_string());
            }
            None => tracing::warn!("{}", error),
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModeKind;
    use crate::services::ports::{
        MockAlertSink, MockFolderPicker, MockGameCatalog, MockModeDetector, MockNamePrompt,
    };
    use crate::store::{CONFIG_KEY, MemoryStore};
    use mockall::Sequence;
    use mockall::predicate::eq;

    struct Mocks {
        picker: MockFolderPicker,
        prompt: MockNamePrompt,
        detector: MockModeDetector,
        catalog: MockGameCatalog,
        alerts: MockAlertSink,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                picker: MockFolderPicker::new(),
                prompt: MockNamePrompt::new(),
                detector: MockModeDetector::new(),
                catalog: MockGameCatalog::new(),
                alerts: MockAlertSink::new(),
            }
        }

        fn build(self, store: MemoryStore) -> EmulatorController<MemoryStore> {
            let ports = Collaborators::new(self.picker, self.prompt, self.detector, self.catalog, self.alerts);
            EmulatorController::new(
                ConfigRegistry::load(store),
                StateManager::new(EmulatorKind::Ryu),
                ports,
            )
        }
    }

    fn prompt_answers(prompt: &mut MockNamePrompt, answers: Vec<Option<&'static str>>) {
        let mut seq = Sequence::new();
        for answer in answers {
            prompt
                .expect_prompt_name()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move || answer.map(str::to_string));
        }
    }

    #[test]
    fn test_classify_name_input() {
        assert_eq!(NamePromptOutcome::classify(None), NamePromptOutcome::Cancelled);
        assert_eq!(NamePromptOutcome::classify(Some("  ".into())), NamePromptOutcome::Invalid);
        assert_eq!(
            NamePromptOutcome::classify(Some(" main ".into())),
            NamePromptOutcome::Confirmed("main".into())
        );
    }

    #[test]
    fn test_interactive_add_commits_and_selects() {
        let mut mocks = Mocks::new();
        mocks
            .picker
            .expect_pick_folder()
            .with(eq(EmulatorKind::Ryu))
            .times(1)
            .returning(|_| Ok(Some("/opt/ryu".to_string())));
        prompt_answers(&mut mocks.prompt, vec![Some(""), Some("   "), Some("main")]);
        let mut controller = mocks.build(MemoryStore::new());

        let outcome = controller.add_config_interactive().unwrap();

        let expected = EmulatorConfig::new("/opt/ryu", "main", EmulatorKind::Ryu);
        assert_eq!(outcome, AddOutcome::Added(expected.clone()));
        assert_eq!(controller.configs(), vec![&expected]);
        assert_eq!(controller.selected(), Some(expected));
    }

    #[test]
    fn test_interactive_add_picker_cancel_is_silent() {
        let mut mocks = Mocks::new();
        mocks.picker.expect_pick_folder().times(1).returning(|_| Ok(None));
        mocks.prompt.expect_prompt_name().never();
        mocks.alerts.expect_emit_alert().never();
        let store = MemoryStore::new();
        let mut controller = mocks.build(store.clone());

        assert_eq!(controller.add_config_interactive().unwrap(), AddOutcome::Cancelled);
        assert!(store.get(CONFIG_KEY).unwrap().is_none());
    }

    #[test]
    fn test_interactive_add_name_cancel_leaves_store_untouched() {
        let store = MemoryStore::new();
        {
            let mut registry = ConfigRegistry::load(store.clone());
            registry.add("/existing", "old", EmulatorKind::Ryu).unwrap();
        }
        let before = store.get(CONFIG_KEY).unwrap();

        let mut mocks = Mocks::new();
        mocks
            .picker
            .expect_pick_folder()
            .returning(|_| Ok(Some("/opt/ryu".to_string())));
        prompt_answers(&mut mocks.prompt, vec![Some(""), None]);
        mocks.alerts.expect_emit_alert().never();
        let mut controller = mocks.build(store.clone());

        assert_eq!(controller.add_config_interactive().unwrap(), AddOutcome::Cancelled);
        assert_eq!(store.get(CONFIG_KEY).unwrap(), before);
        assert_eq!(controller.configs().len(), 1);
    }

    #[test]
    fn test_interactive_add_duplicate_is_alerted() {
        let store = MemoryStore::new();
        ConfigRegistry::load(store.clone())
            .add("/opt/ryu", "main", EmulatorKind::Ryu)
            .unwrap();

        let mut mocks = Mocks::new();
        mocks
            .picker
            .expect_pick_folder()
            .returning(|_| Ok(Some("/opt/ryu".to_string())));
        mocks.prompt.expect_prompt_name().never();
        mocks
            .alerts
            .expect_emit_alert()
            .withf(|kind, code, _| {
                *kind == AlertKind::Error && *code == AlertCode::EmulatorPathAlreadyExists
            })
            .times(1)
            .return_const(());
        let mut controller = mocks.build(store);

        let err = controller.add_config_interactive().unwrap_err();

        assert!(matches!(err, ControllerError::Registry(RegistryError::DuplicatePath(_))));
        assert_eq!(controller.configs().len(), 1);
    }

    #[test]
    fn test_interactive_add_picker_failure_is_alerted() {
        let mut mocks = Mocks::new();
        mocks.picker.expect_pick_folder().returning(|_| {
            Err(CollaboratorError::new(AlertCode::EmulatorBinaryNotFound, "no Ryujinx binary"))
        });
        mocks
            .alerts
            .expect_emit_alert()
            .withf(|_, code, _| *code == AlertCode::EmulatorBinaryNotFound)
            .times(1)
            .return_const(());
        let mut controller = mocks.build(MemoryStore::new());

        assert!(matches!(
            controller.add_config_interactive(),
            Err(ControllerError::Collaborator(_))
        ));
        assert!(controller.configs().is_empty());
    }

    #[test]
    fn test_add_config_does_not_select() {
        let mut controller = Mocks::new().build(MemoryStore::new());

        let created = controller.add_config("/opt/ryu", "main").unwrap();

        assert_eq!(created.emulator, EmulatorKind::Ryu);
        assert!(controller.selected().is_none());
    }

    #[test]
    fn test_remove_selected_recomputes() {
        let mut controller = Mocks::new().build(MemoryStore::new());
        let a = controller.add_config("/a", "A").unwrap();
        let b = controller.add_config("/b", "B").unwrap();
        controller.select(Some(&b));

        controller.remove_config("/b").unwrap();

        assert_eq!(controller.configs(), vec![&a]);
        assert_eq!(controller.selected(), Some(a));
    }

    #[test]
    fn test_remove_other_config_resets_to_first() {
        let mut controller = Mocks::new().build(MemoryStore::new());
        let a = controller.add_config("/a", "A").unwrap();
        controller.add_config("/b", "B").unwrap();
        let c = controller.add_config("/c", "C").unwrap();
        controller.select(Some(&c));

        controller.remove_config("/b").unwrap();

        assert_eq!(controller.configs(), vec![&a, &c]);
        assert_eq!(controller.selected(), Some(a));
    }

    #[test]
    fn test_select_unknown_config_is_ignored() {
        let mut controller = Mocks::new().build(MemoryStore::new());
        controller.add_config("/a", "A").unwrap();

        let stranger = EmulatorConfig::new("/zzz", "Z", EmulatorKind::Ryu);
        assert!(controller.select(Some(&stranger)).is_empty());
        assert!(controller.select(None).is_empty());
        assert!(controller.selected().is_none());

        controller.select_path("/a");
        assert_eq!(controller.selected().unwrap().path, "/a");
    }

    #[test]
    fn test_create_default_selects_new_config() {
        let mut mocks = Mocks::new();
        mocks
            .detector
            .expect_synthesize_default_config()
            .with(eq(EmulatorKind::Ryu))
            .times(1)
            .returning(|kind| Ok(EmulatorConfig::new("/home/u/.config/Ryujinx", "Default", kind)));
        let mut controller = mocks.build(MemoryStore::new());

        let config = controller.create_default_config().unwrap();

        assert_eq!(controller.configs(), vec![&config]);
        assert_eq!(controller.selected(), Some(config));
    }

    #[test]
    fn test_create_default_replaces_existing_selection() {
        let mut mocks = Mocks::new();
        mocks
            .detector
            .expect_synthesize_default_config()
            .returning(|kind| Ok(EmulatorConfig::new("/default", "Default", kind)));
        let mut controller = mocks.build(MemoryStore::new());
        controller.add_config("/a", "A").unwrap();
        let b = controller.add_config("/b", "B").unwrap();
        controller.select(Some(&b));

        let config = controller.create_default_config().unwrap();

        assert_eq!(config.path, "/default");
        assert_eq!(controller.selected(), Some(config));
    }

    #[test]
    fn test_create_default_failure_changes_nothing() {
        let mut mocks = Mocks::new();
        mocks.detector.expect_synthesize_default_config().returning(|_| {
            Err(CollaboratorError::new(AlertCode::DefaultConfigUnavailable, "not installed"))
        });
        mocks.alerts.expect_emit_alert().times(1).return_const(());
        let store = MemoryStore::new();
        let mut controller = mocks.build(store.clone());

        assert!(controller.create_default_config().is_err());
        assert!(controller.configs().is_empty());
        assert!(store.get(CONFIG_KEY).unwrap().is_none());
    }

    #[test]
    fn test_create_default_rejects_empty_path() {
        let mut mocks = Mocks::new();
        mocks
            .detector
            .expect_synthesize_default_config()
            .returning(|kind| Ok(EmulatorConfig::new("", "Default", kind)));
        mocks
            .alerts
            .expect_emit_alert()
            .withf(|_, code, _| *code == AlertCode::DefaultConfigUnavailable)
            .times(1)
            .return_const(());
        let mut controller = mocks.build(MemoryStore::new());

        assert!(controller.create_default_config().is_err());
        assert!(controller.configs().is_empty());
    }

    #[test]
    fn test_resolve_mode_is_cached() {
        let mut mocks = Mocks::new();
        mocks
            .detector
            .expect_detect_mode()
            .withf(|kind, path| *kind == EmulatorKind::Ryu && path == "/opt/ryu")
            .times(1)
            .returning(|_, _| Ok(EmulatorMode::new(ModeKind::Portable, "/opt/ryu/portable")));
        let mut controller = mocks.build(MemoryStore::new());

        let first = controller.resolve_mode(EmulatorKind::Ryu, "/opt/ryu").unwrap();
        let second = controller.resolve_mode(EmulatorKind::Ryu, "/opt/ryu").unwrap();

        assert_eq!(first, second);
        assert_eq!(controller.mode_cache().len(), 1);
    }

    #[test]
    fn test_resolve_mode_failure_is_alerted_and_not_cached() {
        let mut mocks = Mocks::new();
        mocks
            .detector
            .expect_detect_mode()
            .times(2)
            .returning(|_, _| Err(CollaboratorError::new(AlertCode::EmulatorBinaryNotFound, "gone")));
        mocks.alerts.expect_emit_alert().times(2).return_const(());
        let mut controller = mocks.build(MemoryStore::new());
        controller.add_config("/opt/ryu", "main").unwrap();

        assert!(controller.resolve_mode(EmulatorKind::Ryu, "/opt/ryu").is_err());
        assert!(controller.resolve_mode(EmulatorKind::Ryu, "/opt/ryu").is_err());
        assert!(controller.mode_cache().is_empty());
        assert_eq!(controller.configs().len(), 1);
    }

    #[test]
    fn test_no_resolution_without_selection_or_path() {
        let mut mocks = Mocks::new();
        mocks.detector.expect_detect_mode().never();
        let mut controller = mocks.build(MemoryStore::new());

        assert_eq!(controller.resolve_selected_mode().unwrap(), None);
        assert!(matches!(
            controller.resolve_mode(EmulatorKind::Ryu, ""),
            Err(ControllerError::EmptyPath)
        ));
        assert!(controller.load_library().unwrap().is_none());
    }

    #[test]
    fn test_remove_evicts_cached_mode() {
        let mut mocks = Mocks::new();
        mocks
            .detector
            .expect_detect_mode()
            .returning(|_, path| Ok(EmulatorMode::new(ModeKind::Installed, format!("{path}/data"))));
        let mut controller = mocks.build(MemoryStore::new());
        controller.add_config("/a", "A").unwrap();
        controller.resolve_mode(EmulatorKind::Ryu, "/a").unwrap();

        controller.remove_config("/a").unwrap();

        assert!(controller.mode_cache().is_empty());
    }

    #[test]
    fn test_load_library() {
        let mut mocks = Mocks::new();
        mocks
            .detector
            .expect_detect_mode()
            .returning(|_, _| Ok(EmulatorMode::new(ModeKind::Portable, "/opt/ryu/portable")));
        mocks
            .catalog
            .expect_scan_games()
            .withf(|path, kind| path.as_str() == "/opt/ryu/portable" && *kind == EmulatorKind::Ryu)
            .times(1)
            .returning(|_, _| Ok(vec!["0100F2C0115B6000".to_string(), "01006A800016E000".to_string()]));
        mocks
            .catalog
            .expect_fetch_game_metadata()
            .times(2)
            .returning(|id| Ok(GameMetadata::unknown(id)));
        let mut controller = mocks.build(MemoryStore::new());
        controller.add_config("/opt/ryu", "main").unwrap();
        controller.select_path("/opt/ryu");

        let listing = controller.load_library().unwrap().unwrap();

        assert_eq!(listing.mode.mode, ModeKind::Portable);
        let ids: Vec<_> = listing.games.iter().map(|g| g.title_id.as_str()).collect();
        assert_eq!(ids, vec!["0100F2C0115B6000", "01006A800016E000"]);
        assert_eq!(listing.columns(), 3);
    }

    #[test]
    fn test_load_library_metadata_failure_aborts() {
        let mut mocks = Mocks::new();
        mocks
            .detector
            .expect_detect_mode()
            .returning(|_, _| Ok(EmulatorMode::new(ModeKind::Installed, "/data")));
        mocks
            .catalog
            .expect_scan_games()
            .returning(|_, _| Ok(vec!["0100F2C0115B6000".to_string()]));
        mocks
            .catalog
            .expect_fetch_game_metadata()
            .returning(|_| Err(CollaboratorError::new(AlertCode::GameScanFailed, "offline")));
        mocks.alerts.expect_emit_alert().times(1).return_const(());
        let mut controller = mocks.build(MemoryStore::new());
        controller.add_config("/opt/ryu", "main").unwrap();
        controller.select_path("/opt/ryu");

        assert!(controller.load_library().is_err());
    }

    #[test]
    fn test_persistence_failure_is_alerted() {
        let mut mocks = Mocks::new();
        mocks
            .alerts
            .expect_emit_alert()
            .withf(|_, code, _| *code == AlertCode::PersistenceFailed)
            .times(1)
            .return_const(());
        let store = MemoryStore::new();
        let mut controller = mocks.build(store.clone());
        store.set_fail_writes(true);

        assert!(controller.add_config("/a", "A").is_err());
        assert!(controller.configs().is_empty());
    }

    #[test]
    fn test_listing_helpers() {
        let mode = EmulatorMode::new(ModeKind::Installed, "/data");
        let config = EmulatorConfig::new("/a", "A", EmulatorKind::Ryu);
        let game = |n: usize| GameEntry {
            title_id: format!("{n:016X}"),
            metadata: GameMetadata::unknown("x"),
        };
        let listing = |count: usize| LibraryListing {
            config: config.clone(),
            mode: mode.clone(),
            games: (0..count).map(game).collect(),
        };

        assert!(listing(0).is_empty());
        assert_eq!(listing(0).columns(), 3);
        assert_eq!(listing(4).columns(), 4);
        assert_eq!(listing(9).columns(), 5);

        assert_eq!(LibraryListing::display_title("Short"), "Short");
        let long = "The Legend of Zelda: Breath of the Wild";
        assert_eq!(LibraryListing::display_title(long), "The Legend of Zelda: Breath o...");
    }
}
