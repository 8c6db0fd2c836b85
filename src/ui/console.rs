// Terminal front-end collaborators
//
// - RfdFolderPicker: native folder dialog, validated against the emulator binary
// - StdinNamePrompt: reads the configuration name from the terminal
// - LogAlertSink: prints alerts to stderr and the log

use crate::models::EmulatorKind;
use crate::services::find_emulator_binary;
use crate::services::ports::{AlertCode, AlertKind, AlertSink, CollaboratorError, FolderPicker, NamePrompt};
use camino::Utf8PathBuf;
use std::io::{self, BufRead, Write};

/// Input that dismisses the naming prompt
pub const DISMISS_INPUT: &str = ":q";

/// Folder picker using the native dialog from `rfd`
#[derive(Debug, Default, Clone, Copy)]
pub struct RfdFolderPicker;

impl RfdFolderPicker {
    pub fn new() -> Self {
        Self
    }
}

impl FolderPicker for RfdFolderPicker {
    fn pick_folder(&self, emulator: EmulatorKind) -> Result<Option<String>, CollaboratorError> {
        let folder = rfd::FileDialog::new()
            .set_title(format!("Select your {} folder", emulator.display_name()))
            .pick_folder();

        match folder {
            Some(folder) => validate_emulator_folder(emulator, folder).map(Some),
            None => Ok(None),
        }
    }
}

/// Check a picked folder contains the emulator executable
///
/// Returns the folder as a string ready to be used as a configuration path.
pub fn validate_emulator_folder(
    emulator: EmulatorKind,
    folder: std::path::PathBuf,
) -> Result<String, CollaboratorError> {
    let folder = Utf8PathBuf::try_from(folder).map_err(|e| {
        CollaboratorError::new(
            AlertCode::EmulatorBinaryNotFound,
            format!("Folder path is not valid UTF-8: {}", e.into_path_buf().display()),
        )
    })?;

    if find_emulator_binary(emulator, &folder).is_none() {
        return Err(CollaboratorError::new(
            AlertCode::EmulatorBinaryNotFound,
            format!("No {} executable in {}", emulator.display_name(), folder),
        ));
    }

    Ok(folder.into_string())
}

/// Read one name from `reader`
///
/// End of input, a read error or [`DISMISS_INPUT`] dismiss the prompt.
pub fn read_name<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => {
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim() == DISMISS_INPUT {
                None
            } else {
                Some(line.to_string())
            }
        }
        Err(e) => {
            tracing::warn!("Failed to read name from terminal: {}", e);
            None
        }
    }
}

/// Show the naming prompt on `out`
///
/// Returns whether the prompt reached the terminal. A failed write is logged
/// and the name is still read.
pub fn write_prompt<W: Write>(out: &mut W) -> bool {
    let result = write!(out, "Configuration name ({} to cancel): ", DISMISS_INPUT)
        .and_then(|_| out.flush());
    if let Err(e) = &result {
        tracing::debug!("Failed to show naming prompt: {}", e);
    }
    result.is_ok()
}

/// Naming prompt on the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinNamePrompt;

impl StdinNamePrompt {
    pub fn new() -> Self {
        Self
    }
}

impl NamePrompt for StdinNamePrompt {
    fn prompt_name(&self) -> Option<String> {
        write_prompt(&mut io::stdout().lock());
        read_name(&mut io::stdin().lock())
    }
}

/// Alert sink writing to stderr and the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl LogAlertSink {
    pub fn new() -> Self {
        Self
    }
}

/// Single-line rendering of an alert
pub fn format_alert(kind: AlertKind, code: AlertCode, detail: &str) -> String {
    let label = match kind {
        AlertKind::Error => "error",
        AlertKind::Warning => "warning",
        AlertKind::Info => "info",
    };
    format!("[{label}] {code}: {detail}")
}

impl AlertSink for LogAlertSink {
    fn emit_alert(&self, kind: AlertKind, code: AlertCode, detail: &str) {
        match kind {
            AlertKind::Error => tracing::error!(%code, "{}", detail),
            AlertKind::Warning => tracing::warn!(%code, "{}", detail),
            AlertKind::Info => tracing::info!(%code, "{}", detail),
        }
        eprintln!("{}", format_alert(kind, code, detail));
    }
}
