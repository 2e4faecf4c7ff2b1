//! External tool invocation with per-invocation timeouts.
//!
//! Builders describe each tool run as an [`Invocation`] and hand it to a
//! [`CommandRunner`]. [`SystemRunner`] spawns the program with inherited
//! standard streams, waits for it with a deadline and kills it on expiry.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use std::{
    io::{self, Write},
    process::{Child, Command, ExitStatus, Stdio},
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Timeout applied when neither the rule nor the command line sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Failures from running an external tool.
#[derive(Debug, Error, Diagnostic)]
pub enum ProcessError {
    /// The program could not be started.
    #[error("failed to start `{program}`")]
    #[diagnostic(code(aa::process::spawn))]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The program exited unsuccessfully or was killed by a signal.
    #[error("`{program}` {}", describe_status(*.status))]
    #[diagnostic(code(aa::process::exit))]
    Exit {
        /// Program that failed.
        program: String,
        /// Exit code, `None` when terminated by a signal.
        status: Option<i32>,
    },
    /// The program ran past its deadline and was killed.
    #[error("`{program}` timed out after {}s", .timeout.as_secs())]
    #[diagnostic(code(aa::process::timeout))]
    Timeout {
        /// Program that was killed.
        program: String,
        /// Deadline that expired.
        timeout: Duration,
    },
    /// Waiting on, killing or echoing the program failed.
    #[error("I/O error while running `{program}`")]
    #[diagnostic(code(aa::process::io))]
    Io {
        /// Program being run.
        program: String,
        /// Underlying OS error.
        source: io::Error,
    },
}

fn describe_status(status: Option<i32>) -> String {
    status.map_or_else(
        || "was terminated by a signal".to_owned(),
        |code| format!("exited with status {code}"),
    )
}

/// One external tool run: program, arguments and run options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    echo: bool,
}

impl Invocation {
    /// Start describing a run of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
            echo: false,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override the runner's default timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Print the command line to standard output before running it.
    #[must_use]
    pub const fn echoed(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// The program to run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.args
    }

    /// The timeout set on this invocation, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the command line is echoed before running.
    #[must_use]
    pub const fn echo(&self) -> bool {
        self.echo
    }

    /// Shell-quoted command line for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa::runner::Invocation;
    ///
    /// let inv = Invocation::new("cc").args(["-c", "my file.c"]);
    /// assert_eq!(inv.command_line(), "cc -c 'my file.c'");
    /// ```
    #[must_use]
    pub fn command_line(&self) -> String {
        let words = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str));
        shlex::try_join(words.clone()).unwrap_or_else(|_| words.collect::<Vec<_>>().join(" "))
    }
}

/// Executes invocations on behalf of builders.
///
/// Implementations must be shareable across the worker threads of a phase.
pub trait CommandRunner: Send + Sync {
    /// Run `invocation` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the program cannot be started, fails or
    /// times out.
    fn run(&self, invocation: &Invocation) -> Result<(), ProcessError>;

    /// Whether the runner only reports commands instead of running them.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runs invocations as child processes of the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemRunner {
    default_timeout: Duration,
    dry_run: bool,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SystemRunner {
    /// A runner applying `default_timeout` to invocations without their own.
    #[must_use]
    pub const fn new(default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            dry_run: false,
        }
    }

    /// Log commands instead of spawning them.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ProcessError> {
        let line = invocation.command_line();
        if invocation.echo() {
            echo_command(&line).map_err(|source| ProcessError::Io {
                program: invocation.program().to_owned(),
                source,
            })?;
        }
        if self.dry_run {
            info!(command = %line, "dry run");
            return Ok(());
        }
        debug!(command = %line, "running command");

        let program = invocation.program().to_owned();
        let mut child = Command::new(invocation.program())
            .args(invocation.argv())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;
        let timeout = invocation.timeout().unwrap_or(self.default_timeout);
        let status = wait_for_exit(&mut child, &program, timeout)?;
        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::Exit {
                program,
                status: status.code(),
            })
        }
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

fn echo_command(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()
}

fn wait_for_exit(
    child: &mut Child,
    program: &str,
    timeout: Duration,
) -> Result<ExitStatus, ProcessError> {
    let io_error = |source| ProcessError::Io {
        program: program.to_owned(),
        source,
    };
    if let Some(status) = child.wait_timeout(timeout).map_err(io_error)? {
        Ok(status)
    } else {
        if let Err(err) = child.kill()
            && err.kind() != io::ErrorKind::InvalidInput
        {
            return Err(io_error(err));
        }
        if let Err(err) = child.wait() {
            warn!("failed to reap timed-out command: {err}");
        }
        Err(ProcessError::Timeout {
            program: program.to_owned(),
            timeout,
        })
    }
}
