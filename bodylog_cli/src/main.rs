use bodylog_core::*;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bodylog")]
#[command(about = "Personal workout journal with rolling analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Identity presented to the access check
    #[arg(long, global = true)]
    identity: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log, inspect and edit workout days
    Day {
        #[command(subcommand)]
        command: DayCommand,
    },

    /// Manage reusable workout templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },

    /// Find days whose blocks mention a term
    Search {
        query: String,

        /// Maximum number of days returned
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Summarize the trailing window of days
    Analytics {
        /// Window size in days, ending today
        #[arg(long, allow_hyphen_values = true)]
        days: Option<i64>,
    },
}

#[derive(Subcommand)]
enum DayCommand {
    /// Log a new workout day
    Add {
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Scenario tag, required unless seeded from a template
        #[arg(long)]
        scenario: Option<String>,

        /// Blocks as a JSON array
        #[arg(long)]
        blocks: Option<String>,

        #[arg(long, default_value = "")]
        comment: String,

        /// Seed scenario and blocks from this template
        #[arg(long)]
        template: Option<u64>,
    },

    /// Show one day
    Show { id: u64 },

    /// List the most recent days
    List {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Change some fields of a day, leaving the rest as they are
    Update {
        id: u64,

        #[arg(long)]
        scenario: Option<String>,

        /// Replacement blocks as a JSON array
        #[arg(long)]
        blocks: Option<String>,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a day
    Delete { id: u64 },
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// Save a new template
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        scenario: String,

        /// Blocks as a JSON array
        #[arg(long, default_value = "[]")]
        blocks: String,
    },

    /// List templates, newest first
    List,
}

#[derive(Serialize)]
struct Status {
    status: &'static str,
}

fn main() -> Result<()> {
    // Initialize logging
    bodylog_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    AccessPolicy::from(&config.access).check(cli.identity.as_deref())?;

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = JsonFileStore::in_dir(&data_dir);
    tracing::debug!("Using store at {:?}", store.path());

    match cli.command {
        Commands::Day { command } => cmd_day(&store, &config, command),
        Commands::Template { command } => cmd_template(&store, command),
        Commands::Search { query, limit } => {
            let limit = limit.unwrap_or(config.query.search_limit);
            print_json(&store.search_days(&query, limit)?)
        }
        Commands::Analytics { days } => {
            let days = days.unwrap_or(config.analytics.window_days);
            let today = Local::now().date_naive();
            let summary =
                summarize_window(&store, today, days, &config.analytics.tracked_lifts)?;
            print_json(&summary)
        }
    }
}

fn cmd_day(store: &JsonFileStore, config: &Config, command: DayCommand) -> Result<()> {
    match command {
        DayCommand::Add {
            date,
            scenario,
            blocks,
            comment,
            template,
        } => {
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };

            let mut new_day = match template {
                Some(id) => {
                    let template = store
                        .get_template(id)?
                        .ok_or_else(|| Error::NotFound(format!("template {}", id)))?;
                    NewWorkoutDay::from_template(&template, date)
                }
                None => NewWorkoutDay {
                    date,
                    scenario_type: scenario.clone().ok_or_else(|| {
                        Error::Validation("--scenario is required without --template".into())
                    })?,
                    blocks: Vec::new(),
                    comment: String::new(),
                },
            };

            if let Some(scenario) = scenario {
                new_day.scenario_type = scenario;
            }
            if let Some(raw) = blocks {
                new_day.blocks = parse_blocks(&raw)?;
            }
            new_day.comment = comment;

            print_json(&store.create_day(new_day)?)
        }

        DayCommand::Show { id } => {
            let day = store
                .get_day(id)?
                .ok_or_else(|| Error::NotFound(format!("workout day {}", id)))?;
            print_json(&day)
        }

        DayCommand::List { limit } => {
            let limit = limit.unwrap_or(config.query.list_limit);
            print_json(&store.list_days(limit)?)
        }

        DayCommand::Update {
            id,
            scenario,
            blocks,
            comment,
        } => {
            let update = WorkoutDayUpdate {
                scenario_type: scenario,
                blocks: blocks.as_deref().map(parse_blocks).transpose()?,
                comment,
            };
            let day = store
                .update_day(id, update)?
                .ok_or_else(|| Error::NotFound(format!("workout day {}", id)))?;
            print_json(&day)
        }

        DayCommand::Delete { id } => {
            if !store.delete_day(id)? {
                return Err(Error::NotFound(format!("workout day {}", id)));
            }
            print_json(&Status { status: "ok" })
        }
    }
}

fn cmd_template(store: &JsonFileStore, command: TemplateCommand) -> Result<()> {
    match command {
        TemplateCommand::Add {
            name,
            scenario,
            blocks,
        } => {
            let template = store.create_template(NewTemplate {
                name,
                scenario_type: scenario,
                blocks: parse_blocks(&blocks)?,
            })?;
            print_json(&template)
        }
        TemplateCommand::List => print_json(&store.list_templates()?),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("invalid date {:?}: {}", raw, e)))
}

fn parse_blocks(raw: &str) -> Result<Vec<Block>> {
    serde_json::from_str(raw).map_err(|e| Error::Validation(format!("invalid blocks: {}", e)))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
