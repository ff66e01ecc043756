// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-defined grouping of routines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineFolder {
    pub id: i64,
    pub title: String,
}

/// A reusable workout template. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercises: Vec<RoutineExercise>,
}

/// One templated exercise inside a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineExercise {
    #[serde(default)]
    pub index: i64,
    pub title: String,
}

/// A completed, timestamped workout. Historical records never change once
/// fetched; the collection only grows by newer entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub routine_id: Option<String>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// One performed exercise within a workout. The title is the grouping key
/// for history and personal records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub title: String,
    #[serde(default)]
    pub sets: Vec<ExerciseSet>,
}

/// One performed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    #[serde(default)]
    pub index: i64,
    #[serde(rename = "type", default)]
    pub set_type: SetType,
    #[serde(default)]
    pub reps: Option<i64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetType {
    Warmup,
    #[default]
    Normal,
    Failure,
    Dropset,
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetType::Warmup => write!(f, "warmup"),
            SetType::Normal => write!(f, "normal"),
            SetType::Failure => write!(f, "failure"),
            SetType::Dropset => write!(f, "dropset"),
        }
    }
}

/// The heaviest set ever logged for an exercise title, with the date of the
/// workout it was performed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub exercise_title: String,
    pub reps: Option<i64>,
    pub weight_kg: f64,
    pub workout_date: DateTime<Utc>,
}

/// Canonical grouping key for exercise titles: trimmed, case-folded.
/// All history/record grouping goes through this.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}
