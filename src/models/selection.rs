use super::emulator::{EmulatorConfig, EmulatorKind};

/// The emulator in focus and the configuration currently active for it.
///
/// # Invariant
///
/// When `selected` is `Some`, its `emulator` equals `current_emu`. The
/// [`StateManager`](crate::state::StateManager) is the only writer and keeps
/// this true across every transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionState {
    pub current_emu: EmulatorKind,
    pub selected: Option<EmulatorConfig>,
}

impl SelectionState {
    pub fn new(current_emu: EmulatorKind) -> Self {
        Self {
            current_emu,
            selected: None,
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selected.is_some()
    }

    /// Whether the current selection is still acceptable for `configs`.
    ///
    /// An absent selection is always consistent. A present one must match
    /// `current_emu` and still be part of the collection unchanged.
    pub fn is_consistent_with<'a, I>(&self, configs: I) -> bool
    where
        I: IntoIterator<Item = &'a EmulatorConfig>,
    {
        match &self.selected {
            None => true,
            Some(sel) => {
                sel.emulator == self.current_emu
                    && configs.into_iter().any(|c| c == sel)
            }
        }
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(EmulatorKind::Ryu)
    }
}

/// First configuration of `kind`, by insertion order.
///
/// This is the whole recomputation rule for the selection.
pub fn first_matching<'a, I>(configs: I, kind: EmulatorKind) -> Option<&'a EmulatorConfig>
where
    I: IntoIterator<Item = &'a EmulatorConfig>,
{
    configs.into_iter().find(|c| c.emulator == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs() -> Vec<EmulatorConfig> {
        vec![
            EmulatorConfig::new("/y", "yuzu", EmulatorKind::Yuzu),
            EmulatorConfig::new("/a", "a", EmulatorKind::Ryu),
            EmulatorConfig::new("/b", "b", EmulatorKind::Ryu),
        ]
    }

    #[test]
    fn test_first_matching_respects_order() {
        let configs = configs();
        assert_eq!(first_matching(&configs, EmulatorKind::Ryu).unwrap().path, "/a");
        assert_eq!(first_matching(&configs, EmulatorKind::Yuzu).unwrap().path, "/y");
        assert!(first_matching(&configs[..1], EmulatorKind::Ryu).is_none());
    }

    #[test]
    fn test_consistency() {
        let configs = configs();
        let mut state = SelectionState::new(EmulatorKind::Ryu);
        assert!(state.is_consistent_with(&configs));

        state.selected = Some(configs[2].clone());
        assert!(state.is_consistent_with(&configs));
        assert!(!state.is_consistent_with(&configs[..2]));

        state.current_emu = EmulatorKind::Yuzu;
        assert!(!state.is_consistent_with(&configs));
    }
}
