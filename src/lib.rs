// src/lib.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

// --- Declare modules ---
mod api;
mod cache;
mod config;
pub mod history;
pub mod models;
pub mod records;

// --- Expose public types ---
pub use api::ApiClient;
pub use cache::{get_data_path as get_data_path_util, CacheStore, Error as CacheError};
pub use config::{
    get_config_path as get_config_path_util,
    load as load_config_util,
    parse_color,
    save as save_config_util,
    Config,
    Error as ConfigError,
    StandardColor,
    Theme,
    Units,
};
pub use history::{build_history, HistoryView, Occurrence, SetCell, Suggestion, Trend};
pub use models::{
    Exercise, ExerciseSet, PersonalRecord, Routine, RoutineExercise, RoutineFolder, SetType,
    Workout,
};
pub use records::personal_records;

/// Result of a workout sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Workouts that were not in the cache before.
    pub new_workouts: usize,
    /// Cache size after the sync.
    pub total: usize,
    /// True when everything was refetched instead of delta-synced.
    pub full_refresh: bool,
}

/// Owns all application state. Every refresh operation takes the service by
/// exclusive borrow, so two refreshes of the same resource can never overlap
/// or interleave cache writes.
pub struct AppService {
    pub config: Config,
    pub cache: CacheStore,
    pub config_path: PathBuf,
}

impl AppService {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/data path determination or loading fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let data_dir = cache::get_data_path().context("Failed to determine data directory")?;
        let cache = CacheStore::open(data_dir).context("Failed to open local cache")?;

        Ok(Self::new(config, cache, config_path))
    }

    /// Assembles a service from already-loaded parts.
    pub fn new(config: Config, cache: CacheStore, config_path: PathBuf) -> Self {
        Self {
            config,
            cache,
            config_path,
        }
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn data_dir(&self) -> &Path {
        self.cache.data_dir()
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// Sets the measurement units used for display.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_units(&mut self, units: Units) -> Result<(), ConfigError> {
        self.config.units = units;
        self.save_config()
    }

    fn client(&self) -> Result<ApiClient> {
        let api_key = self
            .config
            .resolved_api_key()
            .ok_or_else(|| ConfigError::ApiKeyNotSet(self.config_path.clone()))?;
        Ok(ApiClient::new(&self.config.base_url, api_key))
    }

    /// Replaces the cached routine folders with a fresh fetch.
    /// Returns the folder count. A failed fetch leaves the cache untouched.
    pub async fn refresh_folders(&mut self) -> Result<usize> {
        let folders = self
            .client()?
            .fetch_all_pages::<RoutineFolder>("routine_folders", "routine_folders")
            .await
            .context("Failed to refresh routine folders")?;
        let count = folders.len();
        self.cache
            .set_folders(folders)
            .context("Failed to persist routine folders")?;
        Ok(count)
    }

    /// Replaces the cached routines with a fresh fetch.
    /// Returns the routine count. A failed fetch leaves the cache untouched.
    pub async fn refresh_routines(&mut self) -> Result<usize> {
        let routines = self
            .client()?
            .fetch_all_pages::<Routine>("routines", "routines")
            .await
            .context("Failed to refresh routines")?;
        let count = routines.len();
        self.cache
            .set_routines(routines)
            .context("Failed to persist routines")?;
        Ok(count)
    }

    /// Brings the workout cache up to date. With a watermark present this
    /// fetches only newer workouts and merges them; an empty cache (or
    /// `force_full`) refetches everything. A failed fetch leaves the cache
    /// in its prior state.
    pub async fn sync_workouts(&mut self, force_full: bool) -> Result<SyncOutcome> {
        let client = self.client()?;
        let watermark = self.cache.latest_workout_date();
        let (fetched, full_refresh) = match (force_full, watermark) {
            (false, Some(watermark)) => (
                client
                    .fetch_workouts_since(watermark)
                    .await
                    .context("Failed to fetch workouts")?,
                false,
            ),
            _ => (
                client
                    .fetch_all_pages::<Workout>("workouts", "workouts")
                    .await
                    .context("Failed to fetch workouts")?,
                true,
            ),
        };
        let new_workouts = if full_refresh {
            let count = fetched.len();
            self.cache
                .replace_workouts(fetched)
                .context("Failed to persist workouts")?;
            count
        } else {
            self.cache
                .merge_workouts(fetched)
                .context("Failed to persist workouts")?
        };

        let total = self.cache.workouts.len();
        info!("Workout sync complete: {new_workouts} new, {total} cached");
        Ok(SyncOutcome {
            new_workouts,
            total,
            full_refresh,
        })
    }

    /// Computes personal records from the cached workouts and persists the
    /// result, fully overwriting the previous projection.
    /// # Errors
    /// Returns `anyhow::Error` if persisting fails.
    pub fn personal_records(&self) -> Result<Vec<PersonalRecord>> {
        let records = records::personal_records(&self.cache.workouts);
        self.cache
            .save_records(&records)
            .context("Failed to persist personal records")?;
        Ok(records)
    }

    /// Builds the history view for one exercise from the cached workouts.
    pub fn exercise_history(&self, exercise: &str) -> HistoryView {
        history::build_history(exercise, &self.cache.workouts)
    }

    /// The most recent cached workouts, newest first.
    pub fn recent_workouts(&self, limit: usize) -> Vec<Workout> {
        self.cache.workouts.iter().take(limit).cloned().collect()
    }

    /// The most recent cached workouts performed from the given routine.
    pub fn workouts_for_routine(&self, routine_id: &str, limit: usize) -> Vec<Workout> {
        self.cache
            .workouts
            .iter()
            .filter(|w| w.routine_id.as_deref() == Some(routine_id))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn find_workout(&self, id: &str) -> Option<&Workout> {
        self.cache.workouts.iter().find(|w| w.id == id)
    }
}
