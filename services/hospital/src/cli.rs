//! Command line interface

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hospital")]
#[command(about = "Hospital management REST service and database tooling")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The requested command; `serve` when none is given
    pub fn selected(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Apply migrations and run the HTTP server
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Insert the sample data set into an empty database
    Seed,
    /// Check database connectivity and report table sizes
    CheckDb,
    /// Drop every hospital table
    Drop {
        /// Required; the command refuses to run without it
        #[arg(long)]
        confirm: bool,
    },
}
