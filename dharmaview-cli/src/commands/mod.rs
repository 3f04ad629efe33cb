//! CLI subcommands.

pub mod config;
pub mod fetch;
pub mod grade;
pub mod preload;
