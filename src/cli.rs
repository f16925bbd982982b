// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `vodpublish`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "vodpublish",
    version,
    about = "Regenerate the VOD playlist and publish it to a git remote.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Publisher.toml` in the current working directory. When the
    /// default file is absent, built-in defaults are used.
    #[arg(long, global = true, value_name = "PATH", default_value = "Publisher.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `VODPUBLISH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the publish pipeline once and exit.
    Run,

    /// Stay resident and run the publish pipeline on the configured schedule.
    Daemon {
        /// Also run once immediately at startup.
        #[arg(long)]
        now: bool,
    },

    /// Fetch the configured sources and write the playlist and metadata
    /// into the current directory.
    Generate,

    /// Parse + validate config and print the plan without executing anything.
    Check,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
