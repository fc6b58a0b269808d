//! Persistent settings: playback defaults and shortcut bindings
//!
//! Stored as pretty JSON in `settings.json` under the macromaker home
//! (`$MACROMAKER_HOME`, else `$HOME/.macromaker`). Saved macros live in
//! `macros/` next to it.

use macromaker_core::shortcuts::common;
use macromaker_core::{Error, Result, ShortcutBinding, ShortcutRegistry};
use macromaker_recorder::PlaybackOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const HOME_ENV: &str = "MACROMAKER_HOME";

/// Filesystem layout of the macromaker home directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub root: PathBuf,
}

impl Paths {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Result<Self> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(root));
        }
        let home = std::env::var_os("HOME")
            .ok_or_else(|| Error::invalid_state(format!("neither {} nor HOME is set", HOME_ENV)))?;
        Ok(Self::at(PathBuf::from(home).join(".macromaker")))
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    pub fn macros_dir(&self) -> PathBuf {
        self.root.join("macros")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutEntry {
    pub name: String,
    pub keys: ShortcutBinding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_repeats: u32,
    pub speed: f64,
    pub shortcuts: Vec<ShortcutEntry>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut settings = Self {
            default_repeats: 1,
            speed: 1.0,
            shortcuts: Vec::new(),
        };
        settings.set_registry(&macromaker_core::shortcuts::default_registry());
        settings
    }
}

impl Settings {
    /// Defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|e| Error::Io(e.into()))?;
        fs::write(path, text)?;
        tracing::info!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.playback_options().validate()
    }

    pub fn playback_options(&self) -> PlaybackOptions {
        PlaybackOptions::repeats(self.default_repeats).speed(self.speed)
    }

    /// Registry populated in list order. A repeated name keeps its first
    /// position and its last binding.
    pub fn registry(&self) -> ShortcutRegistry {
        let mut registry = ShortcutRegistry::new();
        for entry in &self.shortcuts {
            registry.put(entry.name.clone(), entry.keys.clone());
        }
        registry
    }

    /// Replace the stored shortcuts with a snapshot of `registry`.
    pub fn set_registry(&mut self, registry: &ShortcutRegistry) {
        self.shortcuts = registry
            .iter()
            .map(|(name, keys)| ShortcutEntry {
                name: name.to_string(),
                keys: keys.clone(),
            })
            .collect();
    }

    /// Restore the default binding for every well-known shortcut.
    pub fn reset_shortcuts(&mut self) {
        let defaults = Self::default();
        self.shortcuts
            .retain(|e| !common::DEFAULTS.iter().any(|(name, _)| *name == e.name));
        let mut restored = defaults.shortcuts;
        restored.append(&mut self.shortcuts);
        self.shortcuts = restored;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_repeats, 1);
        assert_eq!(
            settings.registry().names(),
            [common::START_RECORDING, common::STOP, common::PLAY]
        );
    }

    #[test]
    fn save_load_keeps_shortcut_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = Paths::at(dir.path().join("home")).settings_file();

        let mut registry = ShortcutRegistry::new();
        registry.put("zeta", ShortcutBinding::parse("F5").unwrap());
        registry.put("alpha", ShortcutBinding::parse("Cmd+A").unwrap());
        let mut settings = Settings {
            default_repeats: 3,
            speed: 2.0,
            shortcuts: Vec::new(),
        };
        settings.set_registry(&registry);
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.registry().names(), ["zeta", "alpha"]);
        assert_eq!(loaded.playback_options().repeats, 3);
    }

    #[test]
    fn keys_are_stored_as_text() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["shortcuts"][0]["keys"], "Ctrl+Shift+R");
    }

    #[test]
    fn malformed_or_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(Error::Deserialization(_))));

        fs::write(&path, r#"{"default_repeats":0}"#).unwrap();
        assert!(matches!(Settings::load(&path), Err(Error::InvalidState(_))));

        fs::write(&path, r#"{"speed":-1.0}"#).unwrap();
        assert!(matches!(Settings::load(&path), Err(Error::InvalidState(_))));

        fs::write(&path, r#"{"shortcuts":[{"name":"x","keys":"Ctrl+Nope"}]}"#).unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"speed":0.5}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.speed, 0.5);
        assert_eq!(settings.default_repeats, 1);
        assert_eq!(settings.shortcuts.len(), common::DEFAULTS.len());
    }

    #[test]
    fn reset_restores_defaults_and_keeps_custom() {
        let mut settings = Settings::default();
        let mut registry = settings.registry();
        registry.rebind(common::PLAY, "F9").unwrap();
        registry.remove(common::STOP);
        registry.put("custom", ShortcutBinding::parse("F1").unwrap());
        settings.set_registry(&registry);

        settings.reset_shortcuts();
        let registry = settings.registry();
        assert_eq!(
            registry.names(),
            [common::START_RECORDING, common::STOP, common::PLAY, "custom"]
        );
        assert_eq!(registry.get(common::PLAY).unwrap().to_string(), "Ctrl+Shift+P");
    }

    #[test]
    fn paths_layout() {
        let paths = Paths::at("/tmp/mm");
        assert_eq!(paths.settings_file(), PathBuf::from("/tmp/mm/settings.json"));
        assert_eq!(paths.macros_dir(), PathBuf::from("/tmp/mm/macros"));
    }
}
