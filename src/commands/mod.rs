// src/commands/mod.rs
//! Command handlers for the jakarta-migrate CLI

mod migrate;

pub use migrate::{MigrateOptions, cmd_migrate};
