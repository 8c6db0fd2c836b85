// Selection tracking
//
// This module provides the StateManager which wraps SelectionState with thread-safe
// access using Arc<RwLock<T>> and emits change events for views.

use crate::models::{EmulatorConfig, EmulatorKind, SelectionState, first_matching};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the selection state is modified
///
/// Views subscribe to these instead of polling the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The emulator in focus changed
    EmulatorSwitched { emulator: EmulatorKind },

    /// The active configuration changed (`None` = no selection)
    SelectionChanged { selected: Option<EmulatorConfig> },

    /// The configuration collection was mutated
    ConfigurationsChanged { count: usize },
}

/// Thread-safe selection tracker with event emission
///
/// Holds the [`SelectionState`] and is the only place it is written. Every
/// transition keeps the invariant that a present selection matches
/// `current_emu`.
///
/// Transitions:
/// - [`select()`](Self::select): set a concrete configuration (absent input is ignored)
/// - [`switch_emulator()`](Self::switch_emulator): change focus, dropping a selection that no longer matches
/// - [`recompute()`](Self::recompute): after an add, derive the selection
///   from the collection when the current one is no longer valid
/// - [`recompute_after_remove()`](Self::recompute_after_remove): after a removal, the first
///   entry matching `current_emu`
/// - [`adopt()`](Self::adopt): after a default configuration is created, select it
///
/// # Related Types
///
/// - [`crate::registry::ConfigRegistry`]: owner of the collection
/// - [`crate::ui::controller::EmulatorController`]: calls `recompute` after each mutation
pub struct StateManager {
    /// Selection protected by RwLock so subscriber threads can read snapshots
    state: Arc<RwLock<SelectionState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager focused on `current_emu`, with no selection
    ///
    /// The broadcast channel buffers 100 events.
    pub fn new(current_emu: EmulatorKind) -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(SelectionState::new(current_emu))),
            state_tx,
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> SelectionState {
        self.read(|s| s.clone())
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let has_selection = state_manager.read(|state| state.has_selection());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SelectionState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    pub fn current_emu(&self) -> EmulatorKind {
        self.read(|s| s.current_emu)
    }

    pub fn selected(&self) -> Option<EmulatorConfig> {
        self.read(|s| s.selected.clone())
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Select a configuration
    ///
    /// `None` is ignored: the selection can be replaced but never cleared
    /// from here. A configuration of another emulator kind is ignored too,
    /// since it would break the selection invariant.
    pub fn select(&self, config: Option<&EmulatorConfig>) -> Vec<StateChange> {
        let Some(config) = config else {
            tracing::debug!("Ignoring empty selection request");
            return Vec::new();
        };

        self.update(|state| {
            if config.emulator != state.current_emu {
                tracing::warn!(
                    "Ignoring selection of {} configuration '{}' while {} is active",
                    config.emulator,
                    config.name,
                    state.current_emu
                );
                return;
            }
            state.selected = Some(config.clone());
        })
    }

    /// Switch the emulator in focus
    ///
    /// Does not pick a new selection. A selection belonging to the previous
    /// emulator is dropped.
    pub fn switch_emulator(&self, emulator: EmulatorKind) -> Vec<StateChange> {
        self.update(|state| {
            state.current_emu = emulator;
            if state
                .selected
                .as_ref()
                .is_some_and(|sel| sel.emulator != emulator)
            {
                state.selected = None;
            }
        })
    }

    /// Re-derive the selection after the collection changed
    ///
    /// Used after an add. If the current selection is still in `configs` and
    /// matches the emulator in focus, it is kept. Otherwise it becomes the first entry
    /// of `kind` in `configs`, or absent. `kind` is the emulator associated
    /// with the mutation; when it is not the one in focus the selection is
    /// cleared instead, so the invariant holds.
    pub fn recompute(&self, configs: &[EmulatorConfig], kind: EmulatorKind) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            if state.is_consistent_with(configs) {
                return;
            }
            state.selected = if kind == state.current_emu {
                first_matching(configs, kind).cloned()
            } else {
                None
            };
        });
        changes.push(self.announce_collection(configs));
        changes
    }

    /// Re-derive the selection after a removal
    ///
    /// The selection always becomes the first entry matching `current_emu`,
    /// or absent, even when the previous selection is still present.
    pub fn recompute_after_remove(&self, configs: &[EmulatorConfig]) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.selected = first_matching(configs, state.current_emu).cloned();
        });
        changes.push(self.announce_collection(configs));
        changes
    }

    /// Replace the selection with a configuration that was just added
    ///
    /// Used after a default configuration is created. A configuration of
    /// another emulator kind falls back to [`recompute()`](Self::recompute).
    pub fn adopt(&self, configs: &[EmulatorConfig], config: &EmulatorConfig) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            if config.emulator == state.current_emu {
                state.selected = Some(config.clone());
            } else if !state.is_consistent_with(configs) {
                state.selected = first_matching(configs, state.current_emu).cloned();
            }
        });
        changes.push(self.announce_collection(configs));
        changes
    }

    fn announce_collection(&self, configs: &[EmulatorConfig]) -> StateChange {
        let event = StateChange::ConfigurationsChanged {
            count: configs.len(),
        };
        let _ = self.state_tx.send(event.clone());
        event
    }

    /// Apply a mutation and emit events for whatever changed
    fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut SelectionState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    fn detect_changes(old: &SelectionState, new: &SelectionState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.current_emu != new.current_emu {
            changes.push(StateChange::EmulatorSwitched {
                emulator: new.current_emu,
            });
        }

        if old.selected != new.selected {
            changes.push(StateChange::SelectionChanged {
                selected: new.selected.clone(),
            });
        }

        changes
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new(EmulatorKind::Ryu)
    }
}

// Make StateManager cloneable for sharing with subscriber threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
