//! Command line interface

pub mod serve;

use clap::{Parser, Subcommand};

/// Arena Balancer - routes teams to their own instances
#[derive(Parser)]
#[command(name = "arena-balancer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the balancer HTTP server
    Serve(serve::ServeArgs),
}
