//! CLI subcommand implementations.

pub mod confirm;
pub mod holder;
pub mod records;
pub mod report;
pub mod tap;
pub mod util;
