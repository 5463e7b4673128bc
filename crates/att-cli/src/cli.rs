//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};

/// Card-tap attendance tracker.
///
/// Records clock-in and clock-out taps per card and reports time spent inside
/// and outside business hours.
#[derive(Debug, Parser)]
#[command(name = "att", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a card tap.
    #[command(group(ArgGroup::new("kind").required(true).args(["clock_in", "clock_out"])))]
    Tap {
        /// The card ID.
        card: String,

        /// Record a clock-in.
        #[arg(long = "in")]
        clock_in: bool,

        /// Record a clock-out.
        #[arg(long = "out")]
        clock_out: bool,

        /// Tap time (e.g., "2025-06-02 08:30"). Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Manage registered card holders.
    #[command(subcommand)]
    Holder(HolderAction),

    /// Report business and other hours for every holder.
    Report {
        /// First day of the report (YYYY-MM-DD). Defaults to the start of the current fiscal half.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day of the report (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Show per-weekday detail.
        #[arg(long)]
        weekly: bool,

        /// Write the report as CSV to this path instead of printing it.
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Output as JSON.
        #[arg(long, conflicts_with = "csv")]
        json: bool,
    },

    /// Show one holder's hours for both halves of the current fiscal year.
    Confirm {
        /// The card ID.
        card: String,
    },

    /// Inspect and maintain the raw tap log.
    #[command(subcommand)]
    Records(RecordsAction),
}

/// Holder registry actions.
#[derive(Debug, Subcommand)]
pub enum HolderAction {
    /// Register a holder or update selected fields.
    Set {
        /// The card ID.
        card: String,

        /// Display name. Required when registering a new card.
        #[arg(long)]
        name: Option<String>,

        /// Student number.
        #[arg(long)]
        student_number: Option<String>,

        /// Grant or revoke admin rights.
        #[arg(long)]
        admin: Option<bool>,

        /// Manual correction in hours added to reported business time.
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<f64>,
    },

    /// List registered holders.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Raw tap log actions.
#[derive(Debug, Subcommand)]
pub enum RecordsAction {
    /// List taps matching the given filters.
    List {
        /// Only taps of this card.
        #[arg(long)]
        card: Option<String>,

        /// Only taps of this kind (`in` or `out`).
        #[arg(long)]
        kind: Option<String>,

        /// Only taps in this calendar year.
        #[arg(long)]
        year: Option<i32>,

        /// Only taps in this month of `--year`.
        #[arg(long, requires = "year")]
        month: Option<u32>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export the raw taps of a year or month as CSV.
    Export {
        /// Calendar year to export.
        #[arg(long)]
        year: i32,

        /// Month of `--year` to export. Defaults to the whole year.
        #[arg(long)]
        month: Option<u32>,

        /// Destination file.
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Delete one tap by id.
    Delete {
        /// The record id.
        id: i64,
    },
}
