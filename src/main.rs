//! Application entry point.
//!
//! Parses command-line arguments, loads the defaults file and the build
//! specification, then lists, prints or builds targets.

use aa::{
    attrs::Attributes,
    cli::Cli,
    config::{self, Settings},
    eden::{Document, pprint},
    rules::{self, LoadReport},
    runner::{Dispatcher, SystemRunner},
};
use anyhow::{Context, Result};
use clap::Parser;
use miette::{Diagnostic, Report};
use std::{
    env,
    io::{self, Write},
    process::ExitCode,
};
use tracing::{Level, debug};
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    fmt()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "aa failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    if let Some(dir) = &cli.directory {
        env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let home = config::home_dir();
    let global = load_global_scope(cli, home.as_deref())?;
    let settings = match Settings::resolve(cli, &global) {
        Ok(settings) => settings,
        Err(err) => return report_fatal(err),
    };
    let spec = match config::read_spec(&settings.spec_path) {
        Ok(spec) => spec,
        Err(err) => {
            report(err)?;
            Document::default()
        }
    };

    if cli.print_spec {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", pprint(&spec)).context("write specification")?;
        return Ok(ExitCode::SUCCESS);
    }

    let LoadReport { registry, errors } = rules::load(&spec, &global);
    for err in errors {
        report(err)?;
    }
    if let Ok(json) = serde_json::to_string(&registry) {
        debug!(registry = %json, "loaded rules");
    }

    if cli.targets.is_empty() {
        let mut stdout = io::stdout().lock();
        for target in registry.targets() {
            writeln!(stdout, "{target}").context("write target list")?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let runner = SystemRunner::new(settings.timeout).with_dry_run(settings.dry_run);
    let outcome = Dispatcher::new(&registry, &runner)
        .with_home(home)
        .with_jobs(settings.jobs)
        .resolve_all(&cli.targets);
    match outcome {
        Ok(artifacts) => {
            debug!(built = artifacts.len(), "all targets resolved");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_fatal(err),
    }
}

/// Load the global scope, reporting and skipping an unusable defaults file.
fn load_global_scope(cli: &Cli, home: Option<&camino::Utf8Path>) -> Result<Attributes> {
    let explicit = match cli.defaults.clone().map(config::utf8_path).transpose() {
        Ok(path) => path,
        Err(err) => {
            report(err)?;
            None
        }
    };
    let Some(path) = config::defaults_path(explicit.as_deref(), home) else {
        debug!("no home directory; using empty defaults");
        return Ok(Attributes::new());
    };
    match config::load_defaults(&path) {
        Ok(global) => Ok(global),
        Err(err) => {
            report(err)?;
            Ok(Attributes::new())
        }
    }
}

fn report<E>(err: E) -> Result<()>
where
    E: Diagnostic + Send + Sync + 'static,
{
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{:?}", Report::new(err)).context("write diagnostic")
}

fn report_fatal<E>(err: E) -> Result<ExitCode>
where
    E: Diagnostic + Send + Sync + 'static,
{
    report(err)?;
    Ok(ExitCode::FAILURE)
}
