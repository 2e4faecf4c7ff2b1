//! Command line interface definition using clap.
//!
//! This file is also compiled by `build.rs` to render the manual page, so it
//! depends on nothing but `clap` and the standard library.

use clap::Parser;
use std::path::PathBuf;

/// Maximum number of jobs accepted by the CLI.
const MAX_JOBS: usize = 64;

fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("{s} is not a valid number"))?;
    if (1..=MAX_JOBS).contains(&value) {
        Ok(value)
    } else {
        Err(format!("jobs must be between 1 and {MAX_JOBS}"))
    }
}

/// A minimal build tool driven by a declarative, Lisp-like specification.
///
/// With no targets, lists the targets the specification defines. With
/// targets, builds them and everything they depend on.
#[derive(Debug, Default, Parser)]
#[command(name = "aa", author, version, about, long_about = None)]
pub struct Cli {
    /// Build specification to read instead of the `:aa` default or `AA`.
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Defaults file to read instead of `~/.config/aa/defaults`.
    #[arg(long, value_name = "FILE")]
    pub defaults: Option<PathBuf>,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Set the number of targets built concurrently.
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Kill any tool that runs longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Log the commands that would run without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// Pretty-print the parsed build specification and exit.
    #[arg(long)]
    pub print_spec: bool,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Targets to build.
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,
}
