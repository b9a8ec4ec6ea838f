//! CLI module for the serial key service
//!
//! Provides subcommands:
//! - `serve`: run the HTTP API
//! - `generate`: print a freshly formatted key without storing it

pub mod generate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Serial Key Service - issue and look up time-bound license keys
#[derive(Parser)]
#[command(name = "serial-key-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve(serve::ServeArgs),

    /// Print a new serial key for a plan
    Generate(generate::GenerateArgs),
}
