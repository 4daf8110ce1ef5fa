// ============================================================
// Layer 6 — Config Store
// ============================================================
// Saves and restores the ExperimentConfig as pretty JSON.
//
// Every field has a default, so a hand-written file only
// needs the settings that differ:
//
//   {
//     "dataset":   { "parent_id_column": "parent_id" },
//     "tokenizer": { "max_length": 1024 }
//   }
//
// Loaded configs are validated before they are returned.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::config::ExperimentConfig;

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn save(&self, cfg: &ExperimentConfig) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write config to '{}'", self.path.display()))?;

        tracing::debug!("Saved experiment config to '{}'", self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<ExperimentConfig> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read config from '{}'", self.path.display()))?;
        let cfg: ExperimentConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", self.path.display()))?;
        cfg.validate()
            .with_context(|| format!("Invalid config in '{}'", self.path.display()))?;
        Ok(cfg)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<ExperimentConfig> {
        match path {
            Some(path) => Self::new(path).load(),
            None => {
                tracing::info!("No config file given, using defaults");
                Ok(ExperimentConfig::default())
            }
        }
    }
}
