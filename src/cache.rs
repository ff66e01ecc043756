// src/cache.rs
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::models::{PersonalRecord, Routine, RoutineFolder, Workout};

const DATA_ENV_VAR: &str = "LIFTLOG_DATA_DIR";
const APP_DATA_DIR: &str = "liftlog";

const FOLDERS_FILE: &str = "routine_folders.json";
const ROUTINES_FILE: &str = "routines.json";
const WORKOUTS_FILE: &str = "workouts.json";
const RECORDS_FILE: &str = "personal_records.json";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to get application data directory")]
    CannotDetermineDataDir,
    #[error("I/O error accessing cache file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize cache data (JSON): {0}")]
    Json(#[from] serde_json::Error),
}

/// Determines the directory holding the cached JSON documents.
/// Exposed at crate root as `get_data_path_util`.
pub fn get_data_path() -> Result<PathBuf, Error> {
    let data_dir = match std::env::var(DATA_ENV_VAR) {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => dirs::data_dir()
            .ok_or(Error::CannotDetermineDataDir)?
            .join(APP_DATA_DIR),
    };
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }
    Ok(data_dir)
}

/// Local mirror of the remote collections, plus the persisted
/// personal-records projection.
///
/// Folders and routines are replaced wholesale on refresh; workouts are
/// append-only from the client's perspective and merged by id. Every mutation
/// rewrites the corresponding JSON document in full.
pub struct CacheStore {
    data_dir: PathBuf,
    pub folders: Vec<RoutineFolder>,
    pub routines: Vec<Routine>,
    pub workouts: Vec<Workout>,
}

impl CacheStore {
    /// Opens the store, loading whatever documents already exist.
    /// An unreadable document is discarded with a warning rather than
    /// aborting startup.
    pub fn open(data_dir: PathBuf) -> Result<Self, Error> {
        let folders = load_or_default(&data_dir.join(FOLDERS_FILE));
        let routines = load_or_default(&data_dir.join(ROUTINES_FILE));
        let workouts = load_or_default(&data_dir.join(WORKOUTS_FILE));
        Ok(Self {
            data_dir,
            folders,
            routines,
            workouts,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The delta-sync watermark: newest `created_at` across cached workouts.
    pub fn latest_workout_date(&self) -> Option<DateTime<Utc>> {
        self.workouts.iter().map(|w| w.created_at).max()
    }

    pub fn set_folders(&mut self, folders: Vec<RoutineFolder>) -> Result<(), Error> {
        self.folders = folders;
        write_json(&self.data_dir.join(FOLDERS_FILE), &self.folders)
    }

    pub fn set_routines(&mut self, routines: Vec<Routine>) -> Result<(), Error> {
        self.routines = routines;
        write_json(&self.data_dir.join(ROUTINES_FILE), &self.routines)
    }

    /// Replaces the whole workout collection (full refetch path).
    pub fn replace_workouts(&mut self, mut workouts: Vec<Workout>) -> Result<(), Error> {
        workouts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.workouts = workouts;
        self.save_workouts()
    }

    /// Merges freshly fetched workouts into the cache, deduplicating by id.
    /// The newest-fetched copy wins on collisions. Returns how many entries
    /// were new to the cache.
    pub fn merge_workouts(&mut self, fresh: Vec<Workout>) -> Result<usize, Error> {
        if fresh.is_empty() {
            return Ok(0);
        }
        let mut by_id: HashMap<String, Workout> = self
            .workouts
            .drain(..)
            .map(|w| (w.id.clone(), w))
            .collect();
        let mut added = 0;
        for workout in fresh {
            if by_id.insert(workout.id.clone(), workout).is_none() {
                added += 1;
            }
        }
        let mut merged: Vec<Workout> = by_id.into_values().collect();
        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.workouts = merged;
        self.save_workouts()?;
        Ok(added)
    }

    fn save_workouts(&self) -> Result<(), Error> {
        write_json(&self.data_dir.join(WORKOUTS_FILE), &self.workouts)
    }

    /// Persists the personal-records projection, fully overwriting the
    /// previous document. No merge, no versioning.
    pub fn save_records(&self, records: &[PersonalRecord]) -> Result<(), Error> {
        write_json(&self.data_dir.join(RECORDS_FILE), &records)
    }

    pub fn load_records(&self) -> Vec<PersonalRecord> {
        load_or_default(&self.data_dir.join(RECORDS_FILE))
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let parsed = fs::read_to_string(path)
        .map_err(Error::from)
        .and_then(|content| serde_json::from_str(&content).map_err(Error::from));
    match parsed {
        Ok(value) => value,
        Err(err) => {
            warn!("Discarding unreadable cache file {}: {err}", path.display());
            T::default()
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}
