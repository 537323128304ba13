//! CLI subcommand implementations.

pub mod import;
pub mod ingest;
pub mod status;
pub mod timeline;
pub mod util;
