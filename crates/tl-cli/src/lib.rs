//! Heartbeat timeline CLI library.
//!
//! This crate provides the CLI interface for recording heartbeats and
//! printing project session timelines.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
