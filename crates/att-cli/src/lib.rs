//! Card-tap attendance CLI library.
//!
//! This crate provides the CLI interface for recording taps and reporting hours.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, HolderAction, RecordsAction};
pub use config::Config;
