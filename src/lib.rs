pub mod db;
pub mod error;
pub mod generation;
pub mod settings;
pub mod store;
pub mod tutor;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};

use db::Database;
use generation::{GeminiClient, GenerationService, Unavailable};
use settings::SettingsStore;
use store::FsImageStore;
use tutor::{ControllerConfig, TutorController};

pub const DATA_DIR_ENV: &str = "STUDYMATE_DATA_DIR";

/// Everything a front end needs, opened from one data directory.
pub struct App {
    pub data_dir: PathBuf,
    pub db: Database,
    pub settings: SettingsStore,
    pub controller: TutorController,
}

pub fn init_logging() {
    let level = if settings::debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    // RUST_LOG still wins for individual modules
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Falls back to `./studymate-data` when no directory is given.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("studymate-data"))
}

impl App {
    /// Opens the database, settings and image directory under `data_dir`.
    ///
    /// With `connect_generation` unset the controller gets a generator that
    /// refuses every request, so read-only commands never need an API key.
    pub async fn open(data_dir: PathBuf, connect_generation: bool) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let database = Database::new(data_dir.join("studymate.sqlite3"))?;
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let current = settings.current();

        let generator: Arc<dyn GenerationService> = if connect_generation {
            let api_key = settings::api_key_from_env()
                .context("Set GOOGLE_API_KEY or GEMINI_API_KEY to talk to the tutor")?;
            Arc::new(GeminiClient::connect(api_key, &current.generation).await?)
        } else {
            Arc::new(Unavailable::new("generation is not connected for this command"))
        };

        let controller = TutorController::new(
            Arc::new(database.clone()),
            Arc::new(FsImageStore::new(data_dir.join("images"))),
            generator,
            ControllerConfig::from(&current),
        );

        log::info!("studymate ready (database {})", database.path().display());

        Ok(Self {
            data_dir,
            db: database,
            settings,
            controller,
        })
    }
}
