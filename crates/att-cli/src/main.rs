use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use att_core::{EventKind, ReportFacade};
use att_db::{Database, HolderUpdate, RecordFilter};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use att_cli::commands::{confirm, holder, records, report, tap, util};
use att_cli::{Cli, Commands, Config, HolderAction, RecordsAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((db, config))
}

fn facade<'a>(db: &'a Database, config: &Config) -> ReportFacade<&'a Database> {
    ReportFacade::new(db)
        .with_business_hours(config.business_hours)
        .with_offset_policy(config.offset_policy)
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();
    let today = Local::now().date_naive();

    match &cli.command {
        Some(Commands::Tap {
            card,
            clock_in,
            clock_out: _,
            at,
        }) => {
            let card_id = util::parse_card(card)?;
            let kind = if *clock_in {
                EventKind::ClockIn
            } else {
                EventKind::ClockOut
            };
            let timestamp = match at {
                Some(at) => util::parse_datetime(at)?,
                None => Local::now().naive_local(),
            };
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            tap::run(&mut stdout, &mut db, &card_id, kind, timestamp)?;
        }
        Some(Commands::Holder(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                HolderAction::Set {
                    card,
                    name,
                    student_number,
                    admin,
                    offset,
                } => {
                    let update = HolderUpdate {
                        name: name.clone(),
                        is_admin: *admin,
                        student_number: student_number.clone(),
                        offset_hours: *offset,
                        ..HolderUpdate::new(util::parse_card(card)?)
                    };
                    holder::set(&mut stdout, &mut db, update)?;
                }
                HolderAction::List { json } => holder::list(&mut stdout, &db, *json)?,
            }
        }
        Some(Commands::Report {
            start,
            end,
            weekly,
            csv,
            json,
        }) => {
            let window = report::resolve_window(*start, *end, today)?;
            let (db, config) = open_database(cli.config.as_deref())?;
            let output = match csv {
                Some(path) => report::Output::Csv(path),
                None if *json => report::Output::Json,
                None => report::Output::Summary { weekly: *weekly },
            };
            report::run(&mut stdout, &facade(&db, &config), &window, output)?;
        }
        Some(Commands::Confirm { card }) => {
            let card_id = util::parse_card(card)?;
            let (db, config) = open_database(cli.config.as_deref())?;
            confirm::run(&mut stdout, &facade(&db, &config), &card_id, today)?;
        }
        Some(Commands::Records(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                RecordsAction::List {
                    card,
                    kind,
                    year,
                    month,
                    json,
                } => {
                    let filter = RecordFilter {
                        card_id: card.as_deref().map(util::parse_card).transpose()?,
                        kind: kind
                            .as_deref()
                            .map(str::parse::<EventKind>)
                            .transpose()
                            .context("invalid --kind")?,
                        year: *year,
                        month: *month,
                    };
                    records::list(&mut stdout, &db, &filter, *json)?;
                }
                RecordsAction::Export {
                    year,
                    month,
                    output,
                } => records::export(&mut stdout, &db, *year, *month, output)?,
                RecordsAction::Delete { id } => records::delete(&mut stdout, &mut db, *id)?,
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
