//! Locating and loading the defaults file and the build specification.
//!
//! The defaults file holds the global attribute scope. It lives at
//! `~/.config/aa/defaults` unless `--defaults` names another file, and a
//! missing file simply means no global attributes. The build specification
//! comes from `--file`, then the global `:aa` attribute, then `AA` in the
//! working directory.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use std::{fs, io, num::NonZeroUsize, path::PathBuf, time::Duration};
use thiserror::Error;
use tracing::debug;

use crate::attrs::{AttrError, Attributes};
use crate::cli::Cli;
use crate::eden::{Document, ReadError, read_named};
use crate::runner::DEFAULT_TIMEOUT;

/// Build specification read when nothing else names one.
pub const DEFAULT_SPEC_FILE: &str = "AA";
/// Global attribute naming the build specification.
pub const SPEC_PATH_KEY: &str = ":aa";
/// Defaults file location relative to the home directory.
pub const DEFAULTS_RELATIVE_PATH: &str = ".config/aa/defaults";

/// Problems locating or reading configuration files.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The build specification does not exist.
    #[error("build specification `{path}` not found")]
    #[diagnostic(
        code(aa::config::spec_not_found),
        help("create `{path}`, pass --file, or set :aa in the defaults file")
    )]
    SpecNotFound {
        /// Path that was tried.
        path: Utf8PathBuf,
    },
    /// A file exists but could not be read.
    #[error("failed to read `{path}`")]
    #[diagnostic(code(aa::config::read))]
    Read {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// A file is not valid notation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ReadError),
    /// The defaults file is not a well-formed attribute map.
    #[error("invalid defaults in `{path}`")]
    #[diagnostic(code(aa::config::defaults))]
    Defaults {
        /// The defaults file.
        path: Utf8PathBuf,
        /// What was wrong with it.
        #[source]
        source: AttrError,
    },
    /// An attribute used for configuration has the wrong type.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Attribute(#[from] AttrError),
    /// A path given on the command line is not valid UTF-8.
    #[error("path `{}` is not valid UTF-8", .0.display())]
    #[diagnostic(code(aa::config::non_utf8_path))]
    NonUtf8Path(PathBuf),
}

/// The current user's home directory, when it is known and valid UTF-8.
#[must_use]
pub fn home_dir() -> Option<Utf8PathBuf> {
    dirs::home_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

/// Convert a command-line path to UTF-8.
///
/// # Errors
///
/// Returns [`ConfigError::NonUtf8Path`] for paths that are not UTF-8.
pub fn utf8_path(path: PathBuf) -> Result<Utf8PathBuf, ConfigError> {
    Utf8PathBuf::from_path_buf(path).map_err(ConfigError::NonUtf8Path)
}

/// Where the defaults file is read from, if anywhere.
#[must_use]
pub fn defaults_path(explicit: Option<&Utf8Path>, home: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
    explicit
        .map(Utf8Path::to_path_buf)
        .or_else(|| home.map(|home| home.join(DEFAULTS_RELATIVE_PATH)))
}

/// Load the global attribute scope from `path`.
///
/// A file that does not exist yields an empty scope.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read, does not parse, or
/// does not hold an attribute map.
pub fn load_defaults(path: &Utf8Path) -> Result<Attributes, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(%path, "no defaults file");
            return Ok(Attributes::new());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            });
        }
    };
    let doc = read_named(path.as_str(), &text)?;
    Attributes::from_defaults(&doc).map_err(|source| ConfigError::Defaults {
        path: path.to_owned(),
        source,
    })
}

/// Path of the build specification.
///
/// # Errors
///
/// Returns [`ConfigError::Attribute`] when `:aa` is set to a non-string.
pub fn spec_path(
    explicit: Option<&Utf8Path>,
    global: &Attributes,
) -> Result<Utf8PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_owned());
    }
    Ok(global
        .path(SPEC_PATH_KEY)?
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_SPEC_FILE)))
}

/// Read and parse the build specification at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::SpecNotFound`] when the file is absent,
/// [`ConfigError::Read`] for other I/O failures and [`ConfigError::Parse`]
/// for malformed notation.
pub fn read_spec(path: &Utf8Path) -> Result<Document, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::SpecNotFound {
                path: path.to_owned(),
            }
        } else {
            ConfigError::Read {
                path: path.to_owned(),
                source,
            }
        }
    })?;
    read_named(path.as_str(), &text).map_err(ConfigError::from)
}

/// Run options resolved from the command line and the global scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Build specification to read.
    pub spec_path: Utf8PathBuf,
    /// Concurrency limit; `None` uses the available parallelism.
    pub jobs: Option<NonZeroUsize>,
    /// Timeout for tools whose rule sets no `:timeout`.
    pub timeout: Duration,
    /// Log commands instead of running them.
    pub dry_run: bool,
}

impl Settings {
    /// Combine `cli` with the global attribute scope.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for non-UTF-8 paths or a mistyped `:aa`.
    pub fn resolve(cli: &Cli, global: &Attributes) -> Result<Self, ConfigError> {
        let explicit = cli.file.clone().map(utf8_path).transpose()?;
        Ok(Self {
            spec_path: spec_path(explicit.as_deref(), global)?,
            jobs: cli.jobs.and_then(NonZeroUsize::new),
            timeout: cli.timeout.map_or(DEFAULT_TIMEOUT, Duration::from_secs),
            dry_run: cli.dry_run,
        })
    }
}
