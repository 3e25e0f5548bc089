pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "replica")]
#[command(about = "Push and pull archival bags to a replica store")]
pub struct Args {
    /// Path to the replica state directory (defaults to ~/.replica)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
