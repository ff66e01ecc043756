use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use liftlog_lib::{
    build_history, personal_records, AppService, CacheStore, Config, Exercise, ExerciseSet,
    SetType, Suggestion, Trend, Workout,
};

// --- Helpers to build fixture data ---

fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

fn set(reps: Option<i64>, weight_kg: Option<f64>) -> ExerciseSet {
    ExerciseSet {
        index: 0,
        set_type: SetType::Normal,
        reps,
        weight_kg,
    }
}

fn exercise(title: &str, sets: Vec<ExerciseSet>) -> Exercise {
    Exercise {
        title: title.to_string(),
        sets,
    }
}

fn workout(id: &str, date: DateTime<Utc>, exercises: Vec<Exercise>) -> Workout {
    Workout {
        id: id.to_string(),
        title: format!("Workout {id}"),
        created_at: date,
        routine_id: None,
        exercises,
    }
}

fn bench_workouts() -> Vec<Workout> {
    vec![
        workout(
            "w1",
            ts(2024, 1, 1),
            vec![exercise("Bench", vec![set(Some(10), Some(60.0))])],
        ),
        workout(
            "w2",
            ts(2024, 2, 1),
            vec![exercise("Bench", vec![set(Some(8), Some(80.0))])],
        ),
    ]
}

// --- Record aggregation ---

#[test]
fn test_personal_records_keeps_global_max() {
    let records = personal_records(&bench_workouts());
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.exercise_title, "Bench");
    assert_eq!(record.reps, Some(8));
    assert_eq!(record.weight_kg, 80.0);
    assert_eq!(record.workout_date, ts(2024, 2, 1));
}

#[test]
fn test_personal_records_one_entry_per_title() {
    let workouts = vec![
        workout(
            "w1",
            ts(2024, 1, 1),
            vec![
                exercise("Bench Press", vec![set(Some(10), Some(60.0)), set(Some(8), Some(70.0))]),
                exercise("Squat", vec![set(Some(5), Some(100.0))]),
            ],
        ),
        workout(
            "w2",
            ts(2024, 1, 8),
            // Different casing and padding must fold into the same record.
            vec![exercise("  bench press ", vec![set(Some(6), Some(75.0))])],
        ),
    ];
    let records = personal_records(&workouts);
    assert_eq!(records.len(), 2);
    let bench = records
        .iter()
        .find(|r| r.exercise_title.eq_ignore_ascii_case("bench press"))
        .unwrap();
    assert_eq!(bench.weight_kg, 75.0);
    for record in &records {
        for w in &workouts {
            for e in &w.exercises {
                if e.title.trim().eq_ignore_ascii_case(&record.exercise_title) {
                    for s in &e.sets {
                        if let Some(weight) = s.weight_kg {
                            assert!(record.weight_kg >= weight);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_personal_records_tie_keeps_first_found() {
    let workouts = vec![workout(
        "w1",
        ts(2024, 3, 1),
        vec![exercise(
            "Deadlift",
            vec![set(Some(5), Some(120.0)), set(Some(3), Some(120.0))],
        )],
    )];
    let records = personal_records(&workouts);
    assert_eq!(records.len(), 1);
    // Replacement only happens on strictly greater weight.
    assert_eq!(records[0].reps, Some(5));
}

#[test]
fn test_personal_records_skips_weightless_sets() {
    let workouts = vec![workout(
        "w1",
        ts(2024, 3, 1),
        vec![
            exercise("Plank", vec![set(None, None), set(Some(1), None)]),
            exercise("Row", vec![set(Some(10), Some(40.0)), set(Some(12), None)]),
        ],
    )];
    let records = personal_records(&workouts);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].exercise_title, "Row");
    assert_eq!(records[0].weight_kg, 40.0);
}

#[test]
fn test_personal_records_idempotent_and_sorted() {
    let workouts = vec![workout(
        "w1",
        ts(2024, 3, 1),
        vec![
            exercise("Squat", vec![set(Some(5), Some(100.0))]),
            exercise("Bench", vec![set(Some(8), Some(70.0))]),
            exercise("Row", vec![set(Some(10), Some(50.0))]),
        ],
    )];
    let first = personal_records(&workouts);
    let second = personal_records(&workouts);
    assert_eq!(first, second);
    let titles: Vec<&str> = first.iter().map(|r| r.exercise_title.as_str()).collect();
    assert_eq!(titles, vec!["Bench", "Row", "Squat"]);
}

#[test]
fn test_personal_records_empty_input() {
    assert!(personal_records(&[]).is_empty());
}

// --- Cache store ---

#[test]
fn test_merge_workouts_dedupes_newest_fetched_wins() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut store = CacheStore::open(dir.path().to_path_buf())?;
    store.replace_workouts(vec![
        workout("a", ts(2024, 1, 1), vec![]),
        workout("b", ts(2024, 1, 2), vec![]),
    ])?;

    let mut replacement = workout("a", ts(2024, 1, 1), vec![]);
    replacement.title = "Updated".to_string();
    let added = store.merge_workouts(vec![replacement, workout("c", ts(2024, 1, 3), vec![])])?;

    assert_eq!(added, 1);
    assert_eq!(store.workouts.len(), 3);
    let a = store.workouts.iter().find(|w| w.id == "a").unwrap();
    assert_eq!(a.title, "Updated");
    // Kept ordered newest first.
    let ids: Vec<&str> = store.workouts.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
    Ok(())
}

#[test]
fn test_cache_watermark_and_reload() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut store = CacheStore::open(dir.path().to_path_buf())?;
    assert_eq!(store.latest_workout_date(), None);

    store.replace_workouts(vec![
        workout("b", ts(2024, 1, 2), vec![]),
        workout("a", ts(2024, 1, 1), vec![]),
    ])?;
    assert_eq!(store.latest_workout_date(), Some(ts(2024, 1, 2)));

    // A fresh store sees what the previous one persisted.
    let reopened = CacheStore::open(dir.path().to_path_buf())?;
    assert_eq!(reopened.workouts, store.workouts);
    Ok(())
}

// --- Service-level record persistence ---

#[test]
fn test_records_projection_fully_overwritten() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut cache = CacheStore::open(dir.path().to_path_buf())?;
    cache.replace_workouts(bench_workouts())?;
    let mut service = AppService::new(
        Config::default(),
        cache,
        dir.path().join("config.toml"),
    );

    let records = service.personal_records()?;
    assert_eq!(service.cache.load_records(), records);

    // Recomputation replaces the stored projection outright.
    service.cache.replace_workouts(vec![workout(
        "w3",
        ts(2024, 3, 1),
        vec![exercise("Squat", vec![set(Some(5), Some(90.0))])],
    )])?;
    let records = service.personal_records()?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].exercise_title, "Squat");
    assert_eq!(service.cache.load_records(), records);
    Ok(())
}

// --- History view ---

#[test]
fn test_history_large_improvement_between_sessions() {
    let workouts = vec![
        workout(
            "w1",
            ts(2024, 1, 1),
            vec![exercise("Bench", vec![set(Some(10), Some(60.0))])],
        ),
        workout(
            "w2",
            ts(2024, 1, 8),
            vec![exercise("Bench", vec![set(Some(10), Some(70.0))])],
        ),
    ];
    let view = build_history("Bench", &workouts);
    assert_eq!(view.occurrences.len(), 2);

    let first = &view.occurrences[0].cells[0];
    assert_eq!(first.percent_change, None);
    assert_eq!(first.trend, None);

    let second = &view.occurrences[1].cells[0];
    let pct = second.percent_change.unwrap();
    assert!((pct - 100.0 / 6.0).abs() < 0.01);
    assert_eq!(second.trend, Some(Trend::LargeImprovement));
}

#[test]
fn test_history_unchanged_volume() {
    let workouts = vec![
        workout(
            "w1",
            ts(2024, 1, 1),
            vec![exercise("Bench", vec![set(Some(10), Some(60.0))])],
        ),
        workout(
            "w2",
            ts(2024, 1, 8),
            vec![exercise("Bench", vec![set(Some(10), Some(60.0))])],
        ),
    ];
    let view = build_history("Bench", &workouts);
    let second = &view.occurrences[1].cells[0];
    assert_eq!(second.percent_change, Some(0.0));
    assert_eq!(second.trend, Some(Trend::Unchanged));
}

#[test]
fn test_history_sorted_oldest_first_with_padding_width() {
    // Cache order is newest first; the view must come out ascending.
    let workouts = vec![
        workout(
            "w2",
            ts(2024, 1, 8),
            vec![exercise(
                "Bench",
                vec![
                    set(Some(10), Some(60.0)),
                    set(Some(10), Some(60.0)),
                    set(Some(8), Some(60.0)),
                ],
            )],
        ),
        workout(
            "w1",
            ts(2024, 1, 1),
            vec![exercise("Bench", vec![set(Some(10), Some(55.0))])],
        ),
    ];
    let view = build_history("Bench", &workouts);
    assert_eq!(view.max_sets, 3);
    assert_eq!(view.occurrences.len(), 2);
    assert!(view.occurrences[0].date < view.occurrences[1].date);
    assert_eq!(view.occurrences[0].cells.len(), 1);
    assert_eq!(view.occurrences[1].cells.len(), 3);
    // Set 2 of the later session has no earlier counterpart to compare to.
    assert_eq!(view.occurrences[1].cells[1].percent_change, None);
}

#[test]
fn test_history_matches_titles_case_insensitively() {
    let workouts = vec![
        workout(
            "w1",
            ts(2024, 1, 1),
            vec![exercise(" BENCH PRESS ", vec![set(Some(10), Some(60.0))])],
        ),
        workout(
            "w2",
            ts(2024, 1, 8),
            vec![exercise("Bench Press", vec![set(Some(10), Some(62.5))])],
        ),
    ];
    let view = build_history("bench press", &workouts);
    assert_eq!(view.occurrences.len(), 2);
}

#[test]
fn test_history_suggestions_latest_session_nonfirst_sets_only() {
    let high_rep_sets = vec![
        set(Some(12), Some(40.0)),
        set(Some(12), Some(40.0)),
        set(Some(10), Some(40.0)),
        set(Some(8), Some(40.0)),
    ];
    let workouts = vec![
        workout(
            "w1",
            ts(2024, 1, 1),
            vec![exercise("Curl", high_rep_sets.clone())],
        ),
        workout(
            "w2",
            ts(2024, 1, 8),
            vec![exercise("Curl", high_rep_sets)],
        ),
    ];
    let view = build_history("Curl", &workouts);

    // Earlier sessions never carry suggestions.
    assert!(view.occurrences[0].cells.iter().all(|c| c.suggestion.is_none()));

    let latest = &view.occurrences[1].cells;
    assert_eq!(latest[0].suggestion, None); // first set excluded
    assert_eq!(latest[1].suggestion, Some(Suggestion::IncreaseWeight));
    assert_eq!(latest[2].suggestion, Some(Suggestion::IncreaseReps));
    assert_eq!(latest[3].suggestion, None); // 8 reps is below both bands
}

#[test]
fn test_history_no_percent_against_zero_volume() {
    let workouts = vec![
        workout(
            "w1",
            ts(2024, 1, 1),
            vec![exercise("Bench", vec![set(Some(10), None)])],
        ),
        workout(
            "w2",
            ts(2024, 1, 8),
            vec![exercise("Bench", vec![set(Some(10), Some(60.0))])],
        ),
    ];
    let view = build_history("Bench", &workouts);
    let second = &view.occurrences[1].cells[0];
    assert_eq!(second.volume, 600.0);
    assert_eq!(second.percent_change, None);
    assert_eq!(second.trend, None);
}

#[test]
fn test_history_empty_when_exercise_unknown() {
    let view = build_history("Overhead Press", &bench_workouts());
    assert!(view.is_empty());
    assert_eq!(view.max_sets, 0);
}
