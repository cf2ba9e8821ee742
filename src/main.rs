mod app;
mod domain;
mod error;
mod notifications;
mod persistence;
mod pomodoro;
mod ticker;
mod tracking;

use anyhow::Result;
use app::AppState;
use clap::{Parser, Subcommand};
use domain::{
    cycle_position, format_elapsed, format_hours_minutes, format_session, task_progress_pct,
    PomodoroSettings, TimerMode,
};
use persistence::{import_projects, init_local_dir, save_projects};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use ticker::Ticker;
use tracking::TrackEvent;

#[derive(Parser)]
#[command(name = "todoterm")]
#[command(about = "A terminal task tracker with per-project time and Pomodoro timers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .todoterm directory in the current directory
    Init,
    /// Add a new project
    Add {
        /// Project name. Defaults to the next free "Project N".
        name: Option<String>,
    },
    /// Rename a project
    Rename { old: String, new: String },
    /// Remove a project
    Remove { name: String },
    /// Show all projects, their tasks and accumulated time
    Status,
    /// Manage tasks within a project
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Track time on a project until interrupted
    Track {
        name: String,
        /// Run the Pomodoro timer instead of the plain stopwatch
        #[arg(long)]
        pomodoro: bool,
    },
    /// Show or change a project's Pomodoro settings
    Settings {
        name: String,
        /// Work phase length in minutes
        #[arg(long)]
        work: Option<u32>,
        /// Short break length in minutes
        #[arg(long)]
        short_break: Option<u32>,
        /// Long break length in minutes
        #[arg(long)]
        long_break: Option<u32>,
        /// Work cycles before a long break
        #[arg(long)]
        cycles: Option<u32>,
        /// Start the next phase automatically when one completes
        #[arg(long)]
        auto_start: Option<bool>,
    },
    /// Export all projects as JSON
    Export {
        /// Output file path. Defaults to ./projects.json
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Replace all projects with a previously exported JSON file
    Import { path: String },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a task to a project
    Add { project: String, content: String },
    /// Toggle a task's completed state
    Done { project: String, task_id: String },
    /// Remove a task from a project
    Rm { project: String, task_id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let dir = init_local_dir()?;
            println!("Initialized todoterm directory: {}", dir.display());
            println!();
            println!("todoterm will now use this local directory for project storage.");
            Ok(())
        }
        Commands::Add { name } => {
            let mut app = AppState::load()?;
            let name = app.add_project(name)?;
            app.save()?;
            println!("Added project '{}'", name);
            Ok(())
        }
        Commands::Rename { old, new } => {
            let mut app = AppState::load()?;
            app.rename_project(&old, &new)?;
            app.save()?;
            println!("Renamed '{}' to '{}'", old, new);
            Ok(())
        }
        Commands::Remove { name } => {
            let mut app = AppState::load()?;
            app.remove_project(&name)?;
            app.save()?;
            println!("Removed project '{}'", name);
            Ok(())
        }
        Commands::Status => {
            let app = AppState::load()?;
            print_status(&app);
            Ok(())
        }
        Commands::Task { command } => {
            let mut app = AppState::load()?;
            match command {
                TaskCommands::Add { project, content } => {
                    let id = app.add_task(&project, content)?;
                    println!("Added task {}", id);
                }
                TaskCommands::Done { project, task_id } => {
                    let completed = app.toggle_task(&project, &task_id)?;
                    println!(
                        "Task {} marked {}",
                        task_id,
                        if completed { "done" } else { "not done" }
                    );
                }
                TaskCommands::Rm { project, task_id } => {
                    app.remove_task(&project, &task_id)?;
                    println!("Removed task {}", task_id);
                }
            }
            app.save()?;
            Ok(())
        }
        Commands::Track { name, pomodoro } => {
            let app = AppState::load()?;
            let mode = if pomodoro {
                TimerMode::Pomodoro
            } else {
                TimerMode::Stopwatch
            };
            run_track(app, &name, mode)
        }
        Commands::Settings {
            name,
            work,
            short_break,
            long_break,
            cycles,
            auto_start,
        } => {
            let mut app = AppState::load()?;
            let current = app
                .registry
                .project(&name)
                .ok_or_else(|| error::EngineError::ProjectNotFound(name.clone()))?
                .effective_settings();

            if work.is_none()
                && short_break.is_none()
                && long_break.is_none()
                && cycles.is_none()
                && auto_start.is_none()
            {
                print_settings(&name, &current);
                return Ok(());
            }

            let updated = PomodoroSettings {
                work_duration: work.unwrap_or(current.work_duration),
                short_break_duration: short_break.unwrap_or(current.short_break_duration),
                long_break_duration: long_break.unwrap_or(current.long_break_duration),
                cycles_before_long_break: cycles.unwrap_or(current.cycles_before_long_break),
                auto_start_cycles: auto_start.unwrap_or(current.auto_start_cycles),
            };
            app.update_settings(&name, updated)?;
            app.save()?;
            print_settings(&name, &updated);
            Ok(())
        }
        Commands::Export { output } => {
            let app = AppState::load()?;
            let path = export_path(output);
            save_projects(&path, app.registry.projects())?;
            println!("Exported {} projects to {}", app.registry.projects().len(), path.display());
            Ok(())
        }
        Commands::Import { path } => {
            let mut app = AppState::load()?;
            let projects = import_projects(&path)?;
            let count = projects.len();
            app.replace_all(projects);
            app.save()?;
            println!("Imported {} projects from {}", count, path);
            Ok(())
        }
    }
}

/// Export destination: explicit path, or the same name the snapshot
/// file carries
fn export_path(output: Option<String>) -> PathBuf {
    PathBuf::from(output.unwrap_or_else(|| "projects.json".to_string()))
}

fn print_status(app: &AppState) {
    let total: u64 = app.registry.projects().iter().map(|p| p.time_spent).sum();
    for project in app.registry.projects() {
        let marker = if project.is_tracking { "▶" } else { " " };
        println!(
            "{} {}  {}  tasks {}% done",
            marker,
            project.name,
            format_elapsed(project.time_spent),
            task_progress_pct(&project.tasks)
        );
        for task in &project.tasks {
            let check = if task.completed { "x" } else { " " };
            println!("    [{}] {}  {}", check, task.id, task.content);
        }
        if let Some(state) = &project.pomodoro_state {
            let settings = project.effective_settings();
            let (pos, total) = cycle_position(state, &settings);
            println!(
                "    pomodoro: {} {}  cycle {}/{}{}",
                state.current_phase.label(),
                format_session(state.session_time),
                pos,
                total,
                if state.waiting_for_next_phase {
                    "  (waiting)"
                } else {
                    ""
                }
            );
        }
    }
    println!();
    println!("Total tracked: {}", format_hours_minutes(total));
}

fn print_settings(name: &str, settings: &PomodoroSettings) {
    println!("Settings for '{}':", name);
    println!("  work:        {} min", settings.work_duration);
    println!("  short break: {} min", settings.short_break_duration);
    println!("  long break:  {} min", settings.long_break_duration);
    println!("  cycles:      {}", settings.cycles_before_long_break);
    println!("  auto-start:  {}", settings.auto_start_cycles);
}

/// Interactive tracking loop. One tick per second drives the timers;
/// stdin lines control the session (Enter advances a waiting phase,
/// "q" quits).
fn run_track(mut app: AppState, name: &str, mode: TimerMode) -> Result<()> {
    if let Err(err) = app.start_tracking(name, mode) {
        if err.is_not_found() {
            eprintln!("{}", err);
            eprintln!("Known projects:");
            for project in app.registry.projects() {
                eprintln!("  {}", project.name);
            }
        }
        return Err(err.into());
    }
    app.save()?;

    let (tick_tx, tick_rx) = mpsc::channel();
    let ticker = Ticker::start(tick_tx);

    let (line_tx, line_rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    match mode {
        TimerMode::Stopwatch => println!("Tracking '{}'. Type 'q' to stop.", name),
        TimerMode::Pomodoro => println!(
            "Tracking '{}' (pomodoro). Press Enter to start the next phase when one ends, 'q' to stop.",
            name
        ),
    }

    'outer: while tick_rx.recv().is_ok() {
        if let Some(TrackEvent::PhaseComplete { phase, .. }) = app.handle_tick() {
            println!();
            println!("{} complete.", phase.label());
        }

        while let Ok(line) = line_rx.try_recv() {
            let input = line.trim();
            if input == "q" {
                break 'outer;
            }
            if input.is_empty() && mode == TimerMode::Pomodoro {
                // Enter: advance a waiting phase and resume tracking.
                if app.advance_phase(name).is_ok() && app.registry.is_idle() {
                    app.start_tracking(name, mode)?;
                }
            }
        }

        print_track_line(&app, name);
        app.save()?;
    }

    ticker.stop();
    println!();
    if let Some(since) = app.registry.tracking_since() {
        println!("Session started at {}", since.format("%H:%M:%S"));
    }
    let _ = app.stop_tracking(name);
    app.save_now()?;
    println!("Stopped tracking '{}'.", name);
    Ok(())
}

fn print_track_line(app: &AppState, name: &str) {
    let Some(project) = app.registry.project(name) else {
        return;
    };
    let line = match &project.pomodoro_state {
        Some(state) if project.timer_mode == TimerMode::Pomodoro => {
            let settings = project.effective_settings();
            let (pos, total) = cycle_position(state, &settings);
            if state.waiting_for_next_phase {
                format!(
                    "{} done, cycle {}/{}. Press Enter for the next phase.",
                    state.current_phase.label(),
                    pos,
                    total
                )
            } else {
                format!(
                    "{} {}  cycle {}/{}  total {}",
                    state.current_phase.label(),
                    format_session(state.session_time),
                    pos,
                    total,
                    format_elapsed(project.time_spent)
                )
            }
        }
        _ => format_elapsed(project.time_spent),
    };
    print!("\r\x1b[K{}", line);
    let _ = io::stdout().flush();
}
