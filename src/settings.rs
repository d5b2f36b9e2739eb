use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::tutor::{LevelRollover, RewardPolicy};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    pub api_base: String,
    /// Fixed model name; `None` picks the fastest available model at startup.
    pub model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            model: None,
            timeout_secs: 60,
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TutorSettings {
    pub reward_policy: RewardPolicy,
    pub level_rollover: LevelRollover,
    /// Keep failed generation turns in the log for auditing.
    pub log_failed_turns: bool,
    pub default_subject: String,
    pub generation: GenerationSettings,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            reward_policy: RewardPolicy::ExperienceLevel,
            level_rollover: LevelRollover::Cascade,
            log_failed_turns: false,
            default_subject: "math".into(),
            generation: GenerationSettings::default(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<TutorSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`. A missing or unreadable JSON document
    /// yields defaults; nothing is written until the first update.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring invalid settings file {}: {err}",
                    path.display()
                );
                TutorSettings::default()
            })
        } else {
            TutorSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> TutorSettings {
        self.read().clone()
    }

    pub fn update<F>(&self, apply: F) -> Result<TutorSettings>
    where
        F: FnOnce(&mut TutorSettings),
    {
        let mut guard = self.write();
        apply(&mut guard);
        self.persist(&guard)?;
        Ok(guard.clone())
    }

    fn persist(&self, data: &TutorSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, TutorSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, TutorSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// First non-empty API key found in the environment.
pub fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

pub fn debug_enabled() -> bool {
    std::env::var("STUDYMATE_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
