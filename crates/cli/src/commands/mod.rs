//! CLI subcommands.

pub mod admin;
pub mod seed;
