use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Emulator families that can be configured.
///
/// Serialized as the short tags used in the persisted configuration record
/// (`"ryu"`, `"yuzu"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmulatorKind {
    Ryu,
    Yuzu,
}

impl EmulatorKind {
    /// All known kinds, in display order.
    pub const ALL: [EmulatorKind; 2] = [EmulatorKind::Ryu, EmulatorKind::Yuzu];

    /// Short tag as persisted (`ryu` / `yuzu`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EmulatorKind::Ryu => "ryu",
            EmulatorKind::Yuzu => "yuzu",
        }
    }

    /// Human readable product name.
    pub fn display_name(&self) -> &'static str {
        match self {
            EmulatorKind::Ryu => "Ryujinx",
            EmulatorKind::Yuzu => "Yuzu",
        }
    }
}

impl fmt::Display for EmulatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown emulator kind: {0}")]
pub struct UnknownEmulator(pub String);

impl FromStr for EmulatorKind {
    type Err = UnknownEmulator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ryu" | "ryujinx" => Ok(EmulatorKind::Ryu),
            "yuzu" => Ok(EmulatorKind::Yuzu),
            other => Err(UnknownEmulator(other.to_string())),
        }
    }
}

/// A named binding of an emulator installation path to an emulator kind.
///
/// `path` is the identity of a configuration: no two entries in the registry
/// share a path. `name` is a free-form label and may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatorConfig {
    pub path: String,
    pub name: String,
    pub emulator: EmulatorKind,
}

impl EmulatorConfig {
    pub fn new(path: impl Into<String>, name: impl Into<String>, emulator: EmulatorKind) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            emulator,
        }
    }
}

/// Runtime layout of an emulator installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Portable,
    Installed,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeKind::Portable => f.write_str("portable"),
            ModeKind::Installed => f.write_str("installed"),
        }
    }
}

/// Resolved mode for a configuration path. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorMode {
    pub mode: ModeKind,
    pub data_path: Utf8PathBuf,
}

impl EmulatorMode {
    pub fn new(mode: ModeKind, data_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            mode,
            data_path: data_path.into(),
        }
    }

    pub fn is_portable(&self) -> bool {
        self.mode == ModeKind::Portable
    }
}
