//! Onboarding preference flag persisted by key

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key of the "show intro on startup" flag
pub const KEY_SHOW_INTRO: &str = "show_intro_on_startup";

/// Boolean preferences stored as a flat JSON object
#[derive(Debug, Clone)]
pub struct IntroPreferences {
    path: PathBuf,
}

impl IntroPreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the intro should be shown; `true` until explicitly disabled
    pub fn show_intro_on_startup(&self) -> Result<bool> {
        self.get_bool(KEY_SHOW_INTRO, true)
    }

    pub fn set_show_intro_on_startup(&self, value: bool) -> Result<()> {
        self.set_bool(KEY_SHOW_INTRO, value)
    }

    /// Read a flag, returning `default` when the file or key is missing
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        let prefs = self.read()?;
        match prefs.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(Error::Preferences(format!(
                "{} is not a boolean: {}",
                key, other
            ))),
        }
    }

    /// Write a flag, keeping other keys intact
    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        let mut prefs = self.read()?;
        prefs.insert(key.to_string(), Value::Bool(value));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&prefs)?)?;
        debug!("Stored {}={} in {}", key, value, self.path.display());
        Ok(())
    }

    fn read(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        let value: Value = serde_json::from_str(&content)?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Preferences(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}
