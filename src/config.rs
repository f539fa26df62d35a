//! Configuration file handling.
//!
//! The config lives at `<config dir>/zvox/config.toml` unless `ZVOX_CONFIG`
//! points elsewhere. Every field has a default, so a missing file or a
//! partial one loads fine; `zvox config migrate` writes the missing fields
//! back without touching the user's formatting.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use toml_edit::{DocumentMut, Item};

use crate::chunker::VoiceRole;
use crate::error::ConfigError;
use crate::screen::Zone;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "ZVOX_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub narration: NarrationConfig,
    pub voices: VoicesConfig,
    pub echo: EchoConfig,
    pub adapter: AdapterConfig,
    pub logging: LoggingConfig,
}

/// Playback behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Narrate each turn automatically
    pub autoplay: bool,
    /// Window in which a second skip-back goes to the previous chunk
    pub double_tap_ms: u64,
    /// Delay before resuming speech after a seek
    pub settle_ms: u64,
    /// Zones included in narration
    pub zones: Vec<Zone>,
    /// Pacing of the console speech engine
    pub words_per_minute: u32,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            double_tap_ms: 1500,
            settle_ms: 150,
            zones: Zone::ALL.to_vec(),
            words_per_minute: 180,
        }
    }
}

/// Platform voice names per speaking role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicesConfig {
    pub narrator: String,
    pub status: String,
    pub upper: String,
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            narrator: "default".to_string(),
            status: "default".to_string(),
            upper: "default".to_string(),
        }
    }
}

impl VoicesConfig {
    pub fn voice_for(&self, role: VoiceRole) -> &str {
        match role {
            VoiceRole::Narrator => &self.narrator,
            VoiceRole::Status => &self.status,
            VoiceRole::Upper => &self.upper,
        }
    }
}

/// Echo suppression tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// How long spoken text stays eligible for echo matching
    pub retention_ms: u64,
    /// Maximum remembered utterances
    pub max_records: usize,
    /// Edit-distance similarity above which a transcript is an echo
    pub similarity_threshold: f64,
    /// Fraction of shared significant words above which a transcript is an echo
    pub overlap_threshold: f64,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            retention_ms: 8000,
            max_records: 32,
            similarity_threshold: 0.8,
            overlap_threshold: 0.7,
        }
    }
}

/// Display adapter behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Save after line-input turns
    pub autosave: bool,
    /// Line-input turns to skip before the first autosave
    pub autosave_skip_turns: u32,
    /// Delay between restoring a save and the bootstrap input
    pub restore_settle_ms: u64,
    /// Directory for save files (default: platform data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_dir: Option<PathBuf>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            autosave: true,
            autosave_skip_turns: 3,
            restore_settle_ms: 300,
            save_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Path of the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("zvox").join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Write the config file, creating its directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|source| ConfigError::Write { path, source })
    }

    /// Directory for save files.
    pub fn save_dir(&self) -> Option<PathBuf> {
        self.adapter
            .save_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("zvox").join("saves")))
    }
}

/// Outcome of [`migrate_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateResult {
    /// Migrated document
    pub content: String,
    /// Added fields as `section.key`
    pub added_fields: Vec<String>,
    /// Sections that were missing entirely
    pub sections_added: Vec<String>,
}

impl MigrateResult {
    pub fn has_changes(&self) -> bool {
        !self.added_fields.is_empty()
    }
}

/// Add fields present in the default config but missing from `content`.
///
/// Existing values, comments and formatting are preserved.
pub fn migrate_config(content: &str) -> Result<MigrateResult, ConfigError> {
    let mut doc: DocumentMut = content.parse()?;
    let defaults: DocumentMut = toml::to_string_pretty(&Config::default())?.parse()?;

    let mut added_fields = Vec::new();
    let mut sections_added = Vec::new();

    for (section, default_item) in defaults.iter() {
        let Some(default_table) = default_item.as_table() else {
            continue;
        };
        match doc.get_mut(section).and_then(Item::as_table_mut) {
            Some(table) => {
                for (key, value) in default_table.iter() {
                    if !table.contains_key(key) {
                        table.insert(key, value.clone());
                        added_fields.push(format!("{section}.{key}"));
                    }
                }
            }
            None => {
                doc.insert(section, Item::Table(default_table.clone()));
                sections_added.push(section.to_string());
                added_fields.extend(
                    default_table
                        .iter()
                        .map(|(key, _)| format!("{section}.{key}")),
                );
            }
        }
    }

    Ok(MigrateResult {
        content: doc.to_string(),
        added_fields,
        sections_added,
    })
}
