//! Command-line front end for the Taskly task list.
//!
//! # Responsibility
//! - Drive the core coordinator from shell commands.
//! - Enforce presentation-boundary input rules before issuing mutations.

mod cli;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
