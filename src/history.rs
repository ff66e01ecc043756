// src/history.rs
use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{title_key, ExerciseSet, Workout};

/// How a set compares to the set at the same position in the previous
/// occurrence of the exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Unchanged,
    SlightImprovement,
    LargeImprovement,
    SlightRegression,
    LargeRegression,
}

impl Trend {
    pub const fn is_improvement(self) -> bool {
        matches!(self, Trend::SlightImprovement | Trend::LargeImprovement)
    }

    pub const fn is_regression(self) -> bool {
        matches!(self, Trend::SlightRegression | Trend::LargeRegression)
    }

    pub const fn is_large(self) -> bool {
        matches!(self, Trend::LargeImprovement | Trend::LargeRegression)
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Unchanged => write!(f, "unchanged"),
            Trend::SlightImprovement => write!(f, "slight improvement"),
            Trend::LargeImprovement => write!(f, "large improvement"),
            Trend::SlightRegression => write!(f, "slight regression"),
            Trend::LargeRegression => write!(f, "large regression"),
        }
    }
}

/// Progression hint attached to the most recent occurrence only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suggestion {
    IncreaseWeight,
    IncreaseReps,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suggestion::IncreaseWeight => write!(f, "increase weight"),
            Suggestion::IncreaseReps => write!(f, "increase reps"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetCell {
    pub set: ExerciseSet,
    pub volume: f64,
    pub percent_change: Option<f64>,
    pub trend: Option<Trend>,
    pub suggestion: Option<Suggestion>,
}

/// One performance of the selected exercise: the containing workout's date
/// plus its annotated sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub date: DateTime<Utc>,
    pub workout_title: String,
    pub cells: Vec<SetCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub exercise_title: String,
    /// Widest set count across occurrences; shorter rows pad to this.
    pub max_sets: usize,
    /// Ascending by workout date, oldest first.
    pub occurrences: Vec<Occurrence>,
}

impl HistoryView {
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

/// Builds the history view for one exercise selection. Matching uses the
/// canonical trimmed, case-folded title key. Each set is compared against
/// the set at the same ordinal position in the immediately preceding
/// occurrence; positions the previous occurrence did not have stay
/// unannotated. Purely derived, recomputed on every call.
pub fn build_history(exercise: &str, workouts: &[Workout]) -> HistoryView {
    let key = title_key(exercise);

    let mut raw: Vec<(DateTime<Utc>, String, Vec<ExerciseSet>)> = Vec::new();
    for workout in workouts {
        for performed in &workout.exercises {
            if title_key(&performed.title) == key {
                raw.push((
                    workout.created_at,
                    workout.title.clone(),
                    performed.sets.clone(),
                ));
            }
        }
    }
    raw.sort_by_key(|(date, _, _)| *date);

    let max_sets = raw.iter().map(|(_, _, sets)| sets.len()).max().unwrap_or(0);
    let last_index = raw.len().saturating_sub(1);

    let mut occurrences = Vec::with_capacity(raw.len());
    for (i, (date, workout_title, sets)) in raw.iter().enumerate() {
        let mut cells = Vec::with_capacity(sets.len());
        for (position, set) in sets.iter().enumerate() {
            let volume = set_volume(set);
            let previous_volume = i
                .checked_sub(1)
                .and_then(|prev| raw[prev].2.get(position))
                .map(set_volume);
            let percent_change = previous_volume
                .filter(|&prev| prev > 0.0)
                .map(|prev| (volume - prev) / prev * 100.0);
            let trend = percent_change.and_then(classify);
            let suggestion = if i == last_index && position > 0 {
                suggest(set.reps)
            } else {
                None
            };
            cells.push(SetCell {
                set: set.clone(),
                volume,
                percent_change,
                trend,
                suggestion,
            });
        }
        occurrences.push(Occurrence {
            date: *date,
            workout_title: workout_title.clone(),
            cells,
        });
    }

    HistoryView {
        exercise_title: exercise.trim().to_string(),
        max_sets,
        occurrences,
    }
}

/// Set volume: reps x weight, zero when either is missing.
#[allow(clippy::cast_precision_loss)]
pub fn set_volume(set: &ExerciseSet) -> f64 {
    match (set.reps, set.weight_kg) {
        (Some(reps), Some(weight)) => reps as f64 * weight,
        _ => 0.0,
    }
}

/// Bands a volume delta. The open interval (0, 5)% carries no annotation.
pub fn classify(percent: f64) -> Option<Trend> {
    if percent == 0.0 {
        Some(Trend::Unchanged)
    } else if percent > 15.0 {
        Some(Trend::LargeImprovement)
    } else if percent >= 5.0 {
        Some(Trend::SlightImprovement)
    } else if percent < -15.0 {
        Some(Trend::LargeRegression)
    } else if percent < 0.0 {
        Some(Trend::SlightRegression)
    } else {
        None
    }
}

fn suggest(reps: Option<i64>) -> Option<Suggestion> {
    match reps {
        Some(r) if r >= 12 => Some(Suggestion::IncreaseWeight),
        Some(r) if r > 8 => Some(Suggestion::IncreaseReps),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_band_edges() {
        assert_eq!(classify(0.0), Some(Trend::Unchanged));
        assert_eq!(classify(16.7), Some(Trend::LargeImprovement));
        assert_eq!(classify(15.0), Some(Trend::SlightImprovement));
        assert_eq!(classify(5.0), Some(Trend::SlightImprovement));
        assert_eq!(classify(4.9), None);
        assert_eq!(classify(-0.1), Some(Trend::SlightRegression));
        assert_eq!(classify(-15.0), Some(Trend::SlightRegression));
        assert_eq!(classify(-15.1), Some(Trend::LargeRegression));
    }

    #[test]
    fn test_suggest_rep_bands() {
        assert_eq!(suggest(Some(12)), Some(Suggestion::IncreaseWeight));
        assert_eq!(suggest(Some(15)), Some(Suggestion::IncreaseWeight));
        assert_eq!(suggest(Some(11)), Some(Suggestion::IncreaseReps));
        assert_eq!(suggest(Some(9)), Some(Suggestion::IncreaseReps));
        assert_eq!(suggest(Some(8)), None);
        assert_eq!(suggest(Some(5)), None);
        assert_eq!(suggest(None), None);
    }

    #[test]
    fn test_volume_needs_both_reps_and_weight() {
        let set = ExerciseSet {
            index: 0,
            set_type: Default::default(),
            reps: Some(10),
            weight_kg: None,
        };
        assert_eq!(set_volume(&set), 0.0);
    }
}
