//! Phase-by-phase execution of build targets.
//!
//! [`Dispatcher::resolve_all`] schedules the requested targets, then runs
//! each phase to completion before starting the next. Targets within a phase
//! are independent and run concurrently on a `rayon` pool. A failed target
//! does not stop its siblings or later phases; every failure is collected
//! into one [`ResolveError::Failed`] report.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

mod process;

pub use process::{CommandRunner, DEFAULT_TIMEOUT, Invocation, ProcessError, SystemRunner};

use camino::Utf8PathBuf;
use itertools::Itertools;
use miette::Diagnostic;
use rayon::prelude::*;
use std::{collections::BTreeMap, error::Error as _, fmt, num::NonZeroUsize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::actions::{self, ActionError, Artifact, BuildContext};
use crate::rules::Registry;
use crate::schedule::{self, ScheduleError};

/// One target's build failure.
#[derive(Debug)]
pub struct TargetFailure {
    target: String,
    error: ActionError,
}

impl TargetFailure {
    /// Target that failed.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Why it failed.
    #[must_use]
    pub const fn error(&self) -> &ActionError {
        &self.error
    }
}

impl fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[target={}] {}", self.target, self.error)?;
        let mut cause = self.error.source();
        while let Some(err) = cause {
            write!(f, ": {err}")?;
            cause = err.source();
        }
        Ok(())
    }
}

/// Why a resolve run did not fully succeed.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// Nothing ran because the targets could not be scheduled.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schedule(#[from] ScheduleError),
    /// Some targets failed; all others were attempted.
    #[error("{}", .failures.iter().join("\n"))]
    #[diagnostic(code(aa::runner::failed))]
    Failed {
        /// Failures sorted by target name.
        failures: Vec<TargetFailure>,
    },
    /// The worker pool could not be created.
    #[error("failed to start the worker pool")]
    #[diagnostic(code(aa::runner::thread_pool))]
    ThreadPool(#[source] rayon::ThreadPoolBuildError),
}

/// Drives builders over a loaded registry.
pub struct Dispatcher<'a> {
    registry: &'a Registry,
    runner: &'a dyn CommandRunner,
    home: Option<Utf8PathBuf>,
    jobs: Option<NonZeroUsize>,
}

impl<'a> Dispatcher<'a> {
    /// A dispatcher using `runner` for every external tool.
    #[must_use]
    pub const fn new(registry: &'a Registry, runner: &'a dyn CommandRunner) -> Self {
        Self {
            registry,
            runner,
            home: None,
            jobs: None,
        }
    }

    /// Home directory used to derive the default install directory.
    #[must_use]
    pub fn with_home(mut self, home: Option<Utf8PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Maximum number of targets built at once; `None` uses the available
    /// parallelism.
    #[must_use]
    pub const fn with_jobs(mut self, jobs: Option<NonZeroUsize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Build `requested` and everything it depends on.
    ///
    /// Returns the artifact of every target that built successfully.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Schedule`] when the targets cannot be ordered,
    /// in which case nothing runs, and [`ResolveError::Failed`] when at least
    /// one target failed.
    pub fn resolve_all<I, S>(&self, requested: I) -> Result<BTreeMap<String, Artifact>, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phases = schedule::schedule(requested, &self.registry.deps_view())?;
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.jobs {
            builder = builder.num_threads(jobs.get());
        }
        let pool = builder.build().map_err(ResolveError::ThreadPool)?;

        let mut artifacts = BTreeMap::new();
        let mut failures = Vec::new();
        for (index, phase) in phases.iter().enumerate() {
            info!(
                phase = index + 1,
                of = phases.len(),
                targets = %phase.iter().join(" "),
                "starting phase"
            );
            let outcomes: Vec<(String, Result<Artifact, ActionError>)> = pool.install(|| {
                phase
                    .par_iter()
                    .map(|target| (target.clone(), self.build_target(target, &artifacts)))
                    .collect()
            });
            for (target, outcome) in outcomes {
                match outcome {
                    Ok(artifact) => {
                        debug!(rule = %target, ?artifact, "target built");
                        artifacts.insert(target, artifact);
                    }
                    Err(error) => {
                        warn!(rule = %target, %error, "target failed");
                        failures.push(TargetFailure { target, error });
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(artifacts)
        } else {
            failures.sort_by(|a, b| a.target.cmp(&b.target));
            Err(ResolveError::Failed { failures })
        }
    }

    fn build_target(
        &self,
        target: &str,
        artifacts: &BTreeMap<String, Artifact>,
    ) -> Result<Artifact, ActionError> {
        let Some(rule) = self.registry.get(target) else {
            // Scheduling only yields registered targets.
            return Err(ActionError::DependencyMissing {
                dep: target.to_owned(),
            });
        };
        let ctx = BuildContext::new(rule, self.runner, artifacts, self.home.as_deref());
        actions::build(&ctx)
    }
}

#[cfg(test)]
mod tests;
