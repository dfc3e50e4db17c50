//! Read-only settings file (`config.toml`)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bearmony_core::{NoteValue, Swing, Tempo, VelocityMode};
use bearmony_services::Reverb;
use serde::{Deserialize, Serialize};

/// Defaults for every command; flags on the command line win
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tempo: Tempo,
    pub volume: u8,
    pub velocity_mode: VelocityMode,
    pub note_value: NoteValue,
    pub swing: Swing,
    pub octave: i32,
    pub instrument: String,
    pub reverb: Reverb,
    pub export: ExportSettings,
    pub tables: TableSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tempo: Tempo::default(),
            volume: 100,
            velocity_mode: VelocityMode::Normal,
            note_value: NoteValue::Quarter,
            swing: Swing::default(),
            octave: 0,
            instrument: "Acoustic Piano".to_string(),
            reverb: Reverb::default(),
            export: ExportSettings::default(),
            tables: TableSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub tacts: u32,
    pub include_velocity_info: bool,
    pub note_value: NoteValue,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { tacts: 4, include_velocity_info: true, note_value: NoteValue::Whole }
    }
}

/// Replacement data tables; the built-in ones are used when unset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub chords: Option<PathBuf>,
    pub progressions: Option<PathBuf>,
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bearmony")
        .join("config.toml")
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from an explicit path (must exist) or the default location
    /// (missing file means defaults). A file that exists but does not parse
    /// is always an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (config_path(), false),
        };
        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }
}
