// src/records.rs
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::models::{title_key, PersonalRecord, Workout};

/// Scans every set of every workout and keeps, per exercise title, the single
/// heaviest set ever logged. Sets without a usable weight are skipped.
/// Replacement only happens on strictly greater weight, so exact ties keep
/// the first set found in scan order. Output is sorted by exercise title.
pub fn personal_records(workouts: &[Workout]) -> Vec<PersonalRecord> {
    let mut best: HashMap<String, PersonalRecord> = HashMap::new();

    for workout in workouts {
        for exercise in &workout.exercises {
            let key = title_key(&exercise.title);
            if key.is_empty() {
                continue;
            }
            for set in &exercise.sets {
                let Some(weight) = set.weight_kg else {
                    continue;
                };
                if !weight.is_finite() {
                    continue;
                }
                let candidate = PersonalRecord {
                    exercise_title: exercise.title.trim().to_string(),
                    reps: set.reps,
                    weight_kg: weight,
                    workout_date: workout.created_at,
                };
                match best.entry(key.clone()) {
                    Entry::Occupied(mut slot) => {
                        if weight > slot.get().weight_kg {
                            slot.insert(candidate);
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(candidate);
                    }
                }
            }
        }
    }

    let mut records: Vec<PersonalRecord> = best.into_values().collect();
    records.sort_by(|a, b| a.exercise_title.cmp(&b.exercise_title));
    records
}
