// src/main.rs
mod cli;

use anyhow::{Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use liftlog_lib::{
    parse_color, AppService, ExerciseSet, HistoryView, PersonalRecord, Routine, RoutineFolder,
    SetCell, SetType, Units, Workout,
};

const KG_TO_LBS: f64 = 2.204_62;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args();
    let export_csv = cli_args.csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();

        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        cli::Commands::Sync { full } => match service.sync_workouts(full).await {
            Ok(outcome) => {
                if outcome.full_refresh {
                    println!(
                        "Fetched full workout history: {} workout(s) cached.",
                        outcome.total
                    );
                } else {
                    println!(
                        "Synced {} new workout(s) ({} cached).",
                        outcome.new_workouts, outcome.total
                    );
                }
            }
            Err(err) => {
                tracing::error!("Workout sync failed: {err:#}");
                println!(
                    "Sync failed; the local cache was left unchanged ({} workout(s) cached).",
                    service.cache.workouts.len()
                );
            }
        },
        cli::Commands::Folders => {
            if let Err(err) = service.refresh_folders().await {
                tracing::warn!("Could not refresh routine folders: {err:#}");
                println!("Showing cached routine folders (refresh failed).");
            }
            if service.cache.folders.is_empty() {
                println!("No routine folders found.");
            } else if export_csv {
                print_folder_csv(&service.cache.folders)?;
            } else {
                print_folder_table(&service.cache.folders, header_color(&service));
            }
        }
        cli::Commands::Routines { folder } => {
            if let Err(err) = service.refresh_routines().await {
                tracing::warn!("Could not refresh routines: {err:#}");
                println!("Showing cached routines (refresh failed).");
            }
            let routines: Vec<Routine> = service
                .cache
                .routines
                .iter()
                .filter(|r| folder.is_none() || r.folder_id == folder)
                .cloned()
                .collect();
            if routines.is_empty() {
                println!("No routines found.");
            } else if export_csv {
                print_routine_csv(&routines)?;
            } else {
                print_routine_table(&routines, header_color(&service));
            }
        }
        cli::Commands::Workouts { limit, routine } => {
            let workouts = match routine {
                Some(ref id) => service.workouts_for_routine(id, limit),
                None => service.recent_workouts(limit),
            };
            if workouts.is_empty() {
                println!("No cached workouts. Run `liftlog sync` first.");
            } else if export_csv {
                print_workout_csv(&workouts)?;
            } else {
                print_workout_table(&workouts, header_color(&service));
            }
        }
        cli::Commands::Show { id } => match service.find_workout(&id) {
            Some(workout) => {
                print_workout_details(workout, service.config.units, header_color(&service));
            }
            None => println!("No cached workout with id '{id}'. Run `liftlog sync` first."),
        },
        cli::Commands::Records => {
            let records = service
                .personal_records()
                .context("Failed to compute personal records")?;
            if records.is_empty() {
                println!("No personal records yet. Run `liftlog sync` first.");
            } else if export_csv {
                print_records_csv(&records, service.config.units)?;
            } else {
                print_records_table(&records, service.config.units, header_color(&service));
            }
        }
        cli::Commands::History { exercise } => {
            let view = service.exercise_history(&exercise);
            if view.is_empty() {
                println!("No history found for '{}'.", view.exercise_title);
            } else if export_csv {
                print_history_csv(&view, service.config.units)?;
            } else {
                print_history_table(&view, &service);
            }
        }
        cli::Commands::SetUnits { units } => {
            let units = match units {
                cli::UnitsCli::Metric => Units::Metric,
                cli::UnitsCli::Imperial => Units::Imperial,
            };
            service.set_units(units).context("Failed to save units")?;
            let label = match units {
                Units::Metric => "metric (kg)",
                Units::Imperial => "imperial (lbs)",
            };
            println!("Display units set to {label}.");
        }
        cli::Commands::CachePath => println!("{}", service.data_dir().display()),
        cli::Commands::ConfigPath => println!("{}", service.get_config_path().display()),
    }

    Ok(())
}

fn header_color(service: &AppService) -> Color {
    parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green)
}

fn weight_unit(units: Units) -> &'static str {
    match units {
        Units::Metric => "kg",
        Units::Imperial => "lbs",
    }
}

fn display_weight(kg: f64, units: Units) -> f64 {
    match units {
        Units::Metric => kg,
        Units::Imperial => kg * KG_TO_LBS,
    }
}

/// "reps x weight", tagged with the set type when it isn't a normal set.
fn set_summary(set: &ExerciseSet, units: Units) -> String {
    let reps = set.reps.map_or_else(|| "-".to_string(), |r| r.to_string());
    let weight = set
        .weight_kg
        .map_or_else(|| "-".to_string(), |kg| format!("{:.1}", display_weight(kg, units)));
    match set.set_type {
        SetType::Normal => format!("{reps} x {weight}"),
        other => format!("{reps} x {weight} [{other}]"),
    }
}

// --- Table Printing Functions ---

fn print_folder_table(folders: &[RoutineFolder], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(header_color),
            Cell::new("Title").fg(header_color),
        ]);
    for folder in folders {
        table.add_row(vec![
            Cell::new(folder.id.to_string()),
            Cell::new(&folder.title),
        ]);
    }
    println!("{table}");
}

fn print_folder_csv(folders: &[RoutineFolder]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Id", "Title"])?;
    for folder in folders {
        writer.write_record([folder.id.to_string(), folder.title.clone()])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_routine_table(routines: &[Routine], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(header_color),
            Cell::new("Title").fg(header_color),
            Cell::new("Folder").fg(header_color),
            Cell::new("Created").fg(header_color),
            Cell::new("Exercises").fg(header_color),
        ]);
    for routine in routines {
        let exercises = routine
            .exercises
            .iter()
            .map(|e| e.title.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(&routine.id),
            Cell::new(&routine.title),
            Cell::new(
                routine
                    .folder_id
                    .map_or_else(|| "-".to_string(), |id| id.to_string()),
            ),
            Cell::new(routine.created_at.map_or_else(
                || "-".to_string(),
                |ts| ts.with_timezone(&Local).format("%Y-%m-%d").to_string(),
            )),
            Cell::new(exercises),
        ]);
    }
    println!("{table}");
}

fn print_routine_csv(routines: &[Routine]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Id", "Title", "FolderId", "Created"])?;
    for routine in routines {
        writer.write_record([
            routine.id.clone(),
            routine.title.clone(),
            routine
                .folder_id
                .map_or_else(String::new, |id| id.to_string()),
            routine
                .created_at
                .map_or_else(String::new, |ts| ts.to_rfc3339()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_workout_table(workouts: &[Workout], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(header_color),
            Cell::new("Date (Local)").fg(header_color),
            Cell::new("Title").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Sets").fg(header_color),
        ]);
    for workout in workouts {
        let set_count: usize = workout.exercises.iter().map(|e| e.sets.len()).sum();
        table.add_row(vec![
            Cell::new(&workout.id),
            Cell::new(
                workout
                    .created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
            Cell::new(&workout.title),
            Cell::new(workout.exercises.len().to_string()),
            Cell::new(set_count.to_string()),
        ]);
    }
    println!("{table}");
}

fn print_workout_csv(workouts: &[Workout]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Id", "Date", "Title", "Exercises", "Sets"])?;
    for workout in workouts {
        let set_count: usize = workout.exercises.iter().map(|e| e.sets.len()).sum();
        writer.write_record([
            workout.id.clone(),
            workout.created_at.to_rfc3339(),
            workout.title.clone(),
            workout.exercises.len().to_string(),
            set_count.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_workout_details(workout: &Workout, units: Units, header_color: Color) {
    println!(
        "{} - {}",
        workout.title,
        workout
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    );
    if let Some(routine_id) = &workout.routine_id {
        println!("Routine: {routine_id}");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new("Set").fg(header_color),
            Cell::new("Type").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new(format!("Weight ({})", weight_unit(units))).fg(header_color),
        ]);
    for exercise in &workout.exercises {
        for (position, set) in exercise.sets.iter().enumerate() {
            table.add_row(vec![
                Cell::new(&exercise.title),
                Cell::new((position + 1).to_string()),
                Cell::new(set.set_type.to_string()),
                Cell::new(set.reps.map_or_else(|| "-".to_string(), |r| r.to_string())),
                Cell::new(set.weight_kg.map_or_else(
                    || "-".to_string(),
                    |kg| format!("{:.1}", display_weight(kg, units)),
                )),
            ]);
        }
    }
    println!("{table}");
}

fn print_records_table(records: &[PersonalRecord], units: Units, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new(format!("Weight ({})", weight_unit(units))).fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("Date (Local)").fg(header_color),
        ]);
    for record in records {
        table.add_row(vec![
            Cell::new(&record.exercise_title),
            Cell::new(format!("{:.1}", display_weight(record.weight_kg, units))),
            Cell::new(
                record
                    .reps
                    .map_or_else(|| "-".to_string(), |r| r.to_string()),
            ),
            Cell::new(
                record
                    .workout_date
                    .with_timezone(&Local)
                    .format("%Y-%m-%d")
                    .to_string(),
            ),
        ]);
    }
    println!("{table}");
}

fn print_records_csv(records: &[PersonalRecord], units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let weight_header = format!("Weight_{}", weight_unit(units));
    writer.write_record(["Exercise", weight_header.as_str(), "Reps", "Date"])?;
    for record in records {
        writer.write_record([
            record.exercise_title.clone(),
            format!("{:.1}", display_weight(record.weight_kg, units)),
            record.reps.map_or_else(String::new, |r| r.to_string()),
            record.workout_date.to_rfc3339(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_history_table(view: &HistoryView, service: &AppService) {
    let units = service.config.units;
    let theme = &service.config.theme;
    let gain = parse_color(&theme.gain_color)
        .map(Color::from)
        .unwrap_or(Color::Green);
    let loss = parse_color(&theme.loss_color)
        .map(Color::from)
        .unwrap_or(Color::Red);
    let unchanged = parse_color(&theme.unchanged_color)
        .map(Color::from)
        .unwrap_or(Color::Grey);
    let header = header_color(service);

    let mut table = Table::new();
    let mut headers = vec![Cell::new("Date (Local)").fg(header)];
    for position in 1..=view.max_sets {
        headers.push(Cell::new(format!("Set {position}")).fg(header));
    }
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);

    for occurrence in &view.occurrences {
        let mut row = vec![Cell::new(
            occurrence
                .date
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string(),
        )];
        for position in 0..view.max_sets {
            row.push(match occurrence.cells.get(position) {
                Some(cell) => history_cell(cell, units, gain, loss, unchanged),
                None => Cell::new(""),
            });
        }
        table.add_row(row);
    }

    println!("History for {} ({}):", view.exercise_title, weight_unit(units));
    println!("{table}");

    // Progression hints apply to the latest session only.
    if let Some(latest) = view.occurrences.last() {
        for (position, cell) in latest.cells.iter().enumerate() {
            if let Some(suggestion) = cell.suggestion {
                println!("* Set {}: {suggestion}", position + 1);
            }
        }
    }
}

fn history_cell(cell: &SetCell, units: Units, gain: Color, loss: Color, unchanged: Color) -> Cell {
    let mut text = set_summary(&cell.set, units);
    if let Some(pct) = cell.percent_change {
        text.push_str(&format!(" ({pct:+.1}%)"));
    }
    if cell.suggestion.is_some() {
        text.push_str(" *");
    }
    let mut out = Cell::new(text);
    if let Some(trend) = cell.trend {
        let color = if trend.is_improvement() {
            gain
        } else if trend.is_regression() {
            loss
        } else {
            unchanged
        };
        out = out.fg(color);
        if trend.is_large() {
            out = out.add_attribute(Attribute::Bold);
        }
    }
    out
}

fn print_history_csv(view: &HistoryView, units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let mut header = vec!["Date".to_string()];
    for position in 1..=view.max_sets {
        header.push(format!("Set_{position}"));
    }
    writer.write_record(&header)?;

    for occurrence in &view.occurrences {
        let mut row = vec![occurrence.date.to_rfc3339()];
        for position in 0..view.max_sets {
            row.push(match occurrence.cells.get(position) {
                Some(cell) => {
                    let mut text = set_summary(&cell.set, units);
                    if let Some(pct) = cell.percent_change {
                        text.push_str(&format!(" ({pct:+.1}%)"));
                    }
                    if let Some(trend) = cell.trend {
                        text.push_str(&format!(" [{trend}]"));
                    }
                    text
                }
                None => String::new(),
            });
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
