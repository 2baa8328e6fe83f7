/// Main entry point for the Habity command line
///
/// This file sets up logging, parses command line arguments, initializes the
/// store and runs one habit operation. It stands in for the mobile screens:
/// input is validated here, and only the `HabitService` boundary is called.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use habity::{
    validate_name, AppError, DatabaseConfig, DomainError, Frequency, HabitChanges, HabitId,
    HabitService, Habity, NewHabit, NewHabitLog,
};

/// Command line arguments for Habity
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the database file
    /// If not provided, uses the platform data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a habit
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        /// daily, weekly or monthly
        #[arg(long)]
        frequency: Option<String>,
        #[arg(long)]
        target_days: Option<u32>,
    },
    /// List active habits, newest first
    List,
    /// Show one habit
    Show { id: HabitId },
    /// Change some fields of a habit
    Update {
        id: HabitId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        frequency: Option<String>,
        #[arg(long)]
        target_days: Option<u32>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Archive a habit
    Deactivate { id: HabitId },
    /// Mark a habit done for a day (today by default)
    Log {
        id: HabitId,
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show the completion log of a habit
    Logs { id: HabitId },
    /// Read or change app settings
    Setting {
        #[command(subcommand)]
        action: SettingAction,
    },
    /// Drop all data and settings and recreate the schema
    Reset,
}

#[derive(Subcommand, Debug)]
enum SettingAction {
    /// Print the value stored under a key
    Get { key: String },
    /// Store a JSON value under a key
    Set { key: String, value: String },
    /// Remove a key
    Delete { key: String },
    /// List every stored key
    Keys,
}

#[derive(Serialize)]
struct Outcome<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

fn parse_frequency(value: Option<String>) -> Result<Option<Frequency>, DomainError> {
    value.map(|f| f.parse()).transpose()
}

fn parse_date(value: Option<String>) -> Result<NaiveDate, DomainError> {
    match value {
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|e| DomainError::InvalidDate(format!("'{}': {}", text, e))),
        None => Ok(Utc::now().date_naive()),
    }
}

fn print<T: Serialize>(success: bool, id: Option<i64>, data: Option<T>) -> Result<(), AppError> {
    let outcome = Outcome { success, id, data };
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn run(app: &Habity, command: Command) -> Result<(), AppError> {
    let habits: &dyn HabitService = app.habits();

    match command {
        Command::Add {
            name,
            description,
            color,
            icon,
            frequency,
            target_days,
        } => {
            validate_name(&name)?;
            let habit = NewHabit {
                name: name.trim().to_string(),
                description,
                color,
                icon,
                frequency: parse_frequency(frequency)?,
                target_days,
                is_active: None,
            };
            let id = habits.add_habit(habit).await?;
            print::<()>(true, Some(id), None)
        }
        Command::List => {
            let active = habits.get_active_habits().await?;
            print(true, None, Some(active))
        }
        Command::Show { id } => {
            let habit = habits.get_habit_by_id(id).await?;
            print(habit.is_some(), Some(id), habit)
        }
        Command::Update {
            id,
            name,
            description,
            color,
            icon,
            frequency,
            target_days,
            active,
        } => {
            if let Some(name) = &name {
                validate_name(name)?;
            }
            let changes = HabitChanges {
                name: name.map(|n| n.trim().to_string()),
                description: description.map(Some),
                color,
                icon: icon.map(Some),
                frequency: parse_frequency(frequency)?,
                target_days,
                is_active: active,
            };
            let updated = habits.update_habit(id, changes).await?;
            print::<()>(updated, Some(id), None)
        }
        Command::Deactivate { id } => {
            let deactivated = habits.deactivate_habit(id).await?;
            print::<()>(deactivated, Some(id), None)
        }
        Command::Log { id, date, notes } => {
            let log = NewHabitLog {
                habit_id: id,
                completed_date: parse_date(date)?,
                notes,
            };
            let log_id = habits.log_completion(log).await?;
            print::<()>(true, Some(log_id), None)
        }
        Command::Logs { id } => {
            let logs = habits.get_logs_for_habit(id).await?;
            print(true, Some(id), Some(logs))
        }
        Command::Setting { action } => {
            let settings = app.settings();
            match action {
                SettingAction::Get { key } => {
                    let value = settings.get::<serde_json::Value>(&key).await?;
                    print(value.is_some(), None, value)
                }
                SettingAction::Set { key, value } => {
                    let value: serde_json::Value = serde_json::from_str(&value)?;
                    settings.set(&key, &value).await?;
                    print::<()>(true, None, None)
                }
                SettingAction::Delete { key } => {
                    let removed = settings.delete(&key).await?;
                    print::<()>(removed, None, None)
                }
                SettingAction::Keys => {
                    let keys = settings.keys().await?;
                    print(true, None, Some(keys))
                }
            }
        }
        Command::Reset => {
            app.initializer().reset().await?;
            print::<()>(true, None, None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("habity={}", log_level))
        .with_writer(std::io::stderr) // Keep stdout for command output
        .init();

    let config = match args.data_dir {
        Some(dir) => DatabaseConfig::new(dir),
        None => DatabaseConfig::default(),
    };
    info!("Using database at: {}", config.path().display());

    let app = Habity::new(config);
    if let Err(e) = app.initialize().await {
        if let Some(reason) = app.initializer().last_error().await {
            eprintln!("Habity could not start: {}", reason);
        }
        return Err(e);
    }

    let result = run(&app, args.command).await;

    // Close even when the command failed so pending work is settled
    app.shutdown().await?;
    result
}
