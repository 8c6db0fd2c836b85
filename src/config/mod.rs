use crate::models::EmulatorKind;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// Default environment prefix for settings overrides (`EMUSAK_DEFAULT_EMULATOR=yuzu`).
pub const ENV_PREFIX: &str = "EMUSAK";

/// Environment variable overriding the application directory.
pub const HOME_ENV: &str = "EMUSAK_HOME";

const SETTINGS_FILE: &str = "emusak.yaml";

/// Application settings from `emusak.yaml`.
///
/// Relative directories are resolved against the application directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Emulator in focus at startup
    pub default_emulator: EmulatorKind,

    /// Root of the persistent store holding the configuration record
    pub store_dir: String,

    pub log_dir: String,

    pub debug_mode: bool,

    /// Optional YAML title database used for game metadata
    pub title_database: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_emulator: EmulatorKind::Ryu,
            store_dir: "data".to_string(),
            log_dir: "logs".to_string(),
            debug_mode: false,
            title_database: None,
        }
    }
}

/// Settings manager for loading and saving `emusak.yaml`.
///
/// Loading layers built-in defaults, the YAML file (optional) and environment
/// variables with the [`ENV_PREFIX`] prefix, in that order.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    app_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    env_prefix: String,
}

impl SettingsManager {
    /// Create a new SettingsManager rooted at `app_dir`.
    ///
    /// # Arguments
    /// * `app_dir` - Directory holding `emusak.yaml`, created if missing
    pub fn new<P: AsRef<Utf8Path>>(app_dir: P) -> Result<Self> {
        let app_dir = app_dir.as_ref().to_path_buf();

        if !app_dir.exists() {
            fs::create_dir_all(&app_dir)
                .with_context(|| format!("Failed to create app directory: {}", app_dir))?;
        }

        Ok(Self {
            settings_path: app_dir.join(SETTINGS_FILE),
            app_dir,
            env_prefix: ENV_PREFIX.to_string(),
        })
    }

    /// SettingsManager for the platform app directory.
    ///
    /// `EMUSAK_HOME` wins; otherwise `<config_dir>/emusak`.
    pub fn from_env() -> Result<Self> {
        if let Ok(home) = std::env::var(HOME_ENV) {
            return Self::new(Utf8PathBuf::from(home));
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        let config_dir = Utf8PathBuf::try_from(config_dir)
            .context("Config directory is not valid UTF-8")?;
        Self::new(config_dir.join("emusak"))
    }

    /// Use a different environment prefix for overrides.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load settings.
    ///
    /// # Returns
    /// The layered settings, or defaults if neither file nor environment set anything
    ///
    /// # Errors
    /// Fails when the file or an override does not parse
    pub fn load_settings(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let settings: AppSettings = config::Config::builder()
            .add_source(
                config::File::from(self.settings_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!(
            "Loaded settings: default_emulator={}, store_dir={}, debug={}",
            settings.default_emulator,
            settings.store_dir,
            settings.debug_mode
        );
        Ok(settings)
    }

    /// Save settings to `emusak.yaml`.
    pub fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Resolve a settings directory against the app directory.
    pub fn resolve(&self, dir: &str) -> Utf8PathBuf {
        let path = Utf8Path::new(dir);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.app_dir.join(path)
        }
    }

    pub fn store_dir(&self, settings: &AppSettings) -> Utf8PathBuf {
        self.resolve(&settings.store_dir)
    }

    pub fn log_dir(&self, settings: &AppSettings) -> Utf8PathBuf {
        self.resolve(&settings.log_dir)
    }

    pub fn title_database_path(&self, settings: &AppSettings) -> Option<Utf8PathBuf> {
        settings.title_database.as_deref().map(|p| self.resolve(p))
    }

    pub fn app_dir(&self) -> &Utf8Path {
        &self.app_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}
