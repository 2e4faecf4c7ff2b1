//! Builders for the closed set of action kinds.
//!
//! Every rule names an [`ActionKind`]. [`build`] looks up the builder for
//! that kind and runs it against a [`BuildContext`], which carries the rule,
//! the artifacts produced by earlier phases and the [`CommandRunner`] used to
//! invoke external tools.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

mod cpp;
mod install;

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt, fs, io, str::FromStr};
use thiserror::Error;
use tracing::info;

use crate::attrs::{AttrError, Attributes};
use crate::rules::Rule;
use crate::runner::{CommandRunner, Invocation, ProcessError};

/// Default directory for object files.
pub const DEFAULT_OUT_DIR: &str = ".out";
/// Default directory for linked binaries.
pub const DEFAULT_BIN_DIR: &str = ".bin";
/// Install directory relative to the home directory.
pub const DEFAULT_INSTALL_SUBDIR: &str = ".local/bin";

/// Which builder resolves a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Compile sources and link them with dependency objects (`c++bin`).
    CppBin,
    /// Compile sources into an object file (`c++lib`).
    CppLib,
    /// Copy dependency binaries into the install directory (`install`).
    Install,
    /// Do nothing (`noop`).
    Noop,
}

impl ActionKind {
    /// Every action kind.
    pub const ALL: [Self; 4] = [Self::CppBin, Self::CppLib, Self::Install, Self::Noop];

    /// The name used in build specifications.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CppBin => "c++bin",
            Self::CppLib => "c++lib",
            Self::Install => "install",
            Self::Noop => "noop",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action kind `{0}`")]
pub struct UnknownActionKind(String);

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownActionKind(s.to_owned()))
    }
}

impl Serialize for ActionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// What a builder produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// An object file.
    Object(Utf8PathBuf),
    /// A linked binary and the object it was built from.
    Binary {
        /// The target's own object file.
        object: Utf8PathBuf,
        /// The linked executable.
        binary: Utf8PathBuf,
    },
    /// Installed copies of dependency binaries.
    Installed(Vec<Utf8PathBuf>),
    /// No output.
    Nothing,
}

impl Artifact {
    /// The object file to link against, if any.
    #[must_use]
    pub fn object(&self) -> Option<&Utf8Path> {
        match self {
            Self::Object(object) | Self::Binary { object, .. } => Some(object),
            Self::Installed(_) | Self::Nothing => None,
        }
    }

    /// The executable to install, if any.
    #[must_use]
    pub fn binary(&self) -> Option<&Utf8Path> {
        match self {
            Self::Binary { binary, .. } => Some(binary),
            _ => None,
        }
    }
}

/// Build stage reported when an external tool fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Running the compiler.
    Compile,
    /// Running the linker.
    Link,
    /// Copying into the install directory.
    Install,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compile => "compiling",
            Self::Link => "linking",
            Self::Install => "installing",
        })
    }
}

/// Failures of a single target's builder.
#[derive(Debug, Error, Diagnostic)]
pub enum ActionError {
    /// A required attribute is missing or has the wrong type.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Attribute(#[from] AttrError),
    /// An external tool failed.
    #[error("{stage} failed")]
    #[diagnostic(code(aa::actions::tool))]
    Tool {
        /// The stage that failed.
        stage: Stage,
        /// How the tool failed.
        #[source]
        source: ProcessError,
    },
    /// An output directory could not be created.
    #[error("failed to create directory `{path}`")]
    #[diagnostic(code(aa::actions::io))]
    Io {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// A dependency failed or has not been built.
    #[error("dependency `{dep}` has no artifact")]
    #[diagnostic(
        code(aa::actions::dependency_missing),
        help("the dependency failed to build earlier in this run")
    )]
    DependencyMissing {
        /// The dependency without an artifact.
        dep: String,
    },
    /// An install dependency did not produce an executable.
    #[error("dependency `{dep}` did not produce a binary to install")]
    #[diagnostic(code(aa::actions::no_binary))]
    NoBinary {
        /// The dependency without a binary.
        dep: String,
    },
    /// The home directory is needed but unknown.
    #[error("cannot locate the home directory for the install directory")]
    #[diagnostic(
        code(aa::actions::no_home),
        help("set :install-dir explicitly")
    )]
    NoHomeDirectory,
}

/// Where a rule's outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    out_dir: Utf8PathBuf,
    bin_dir: Utf8PathBuf,
}

impl Layout {
    /// Read `:out-dir` and `:bin-dir`, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AttrError::WrongType`] when either is not a string.
    pub fn from_attrs(attrs: &Attributes) -> Result<Self, AttrError> {
        Ok(Self {
            out_dir: attrs
                .path(":out-dir")?
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUT_DIR)),
            bin_dir: attrs
                .path(":bin-dir")?
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_BIN_DIR)),
        })
    }

    /// Object file for `target`.
    #[must_use]
    pub fn object(&self, target: &str) -> Utf8PathBuf {
        self.out_dir.join(format!("{target}.o"))
    }

    /// Linked binary for `target`.
    #[must_use]
    pub fn binary(&self, target: &str) -> Utf8PathBuf {
        self.bin_dir.join(target)
    }
}

/// Everything a builder may read.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    rule: &'a Rule,
    runner: &'a dyn CommandRunner,
    artifacts: &'a BTreeMap<String, Artifact>,
    home: Option<&'a Utf8Path>,
}

impl<'a> BuildContext<'a> {
    /// Bundle the inputs of one builder run.
    #[must_use]
    pub const fn new(
        rule: &'a Rule,
        runner: &'a dyn CommandRunner,
        artifacts: &'a BTreeMap<String, Artifact>,
        home: Option<&'a Utf8Path>,
    ) -> Self {
        Self {
            rule,
            runner,
            artifacts,
            home,
        }
    }

    /// Target being built.
    #[must_use]
    pub fn target(&self) -> &'a str {
        self.rule.target()
    }

    /// The target's merged attributes.
    #[must_use]
    pub const fn attrs(&self) -> &'a Attributes {
        self.rule.attrs()
    }

    /// Artifact of dependency `dep`.
    ///
    /// # Errors
    ///
    /// [`ActionError::DependencyMissing`] when `dep` produced nothing.
    pub fn artifact(&self, dep: &str) -> Result<&'a Artifact, ActionError> {
        self.artifacts
            .get(dep)
            .ok_or_else(|| ActionError::DependencyMissing {
                dep: dep.to_owned(),
            })
    }

    /// Start an invocation of `program` carrying the rule's `:timeout` and
    /// `:mockingly` settings.
    fn invocation(&self, program: &str) -> Result<Invocation, ActionError> {
        Ok(Invocation::new(program)
            .with_timeout(self.attrs().seconds(":timeout")?)
            .echoed(self.attrs().is_set(":mockingly")))
    }

    fn run(&self, stage: Stage, invocation: &Invocation) -> Result<(), ActionError> {
        self.runner
            .run(invocation)
            .map_err(|source| ActionError::Tool { stage, source })
    }

    /// Create `dir` unless running dry.
    fn prepare_dir(&self, dir: &Utf8Path) -> Result<(), ActionError> {
        if self.runner.is_dry_run() || dir.as_str().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|source| ActionError::Io {
            path: dir.to_owned(),
            source,
        })
    }

    fn prepare_parent(&self, file: &Utf8Path) -> Result<(), ActionError> {
        file.parent().map_or(Ok(()), |dir| self.prepare_dir(dir))
    }
}

/// Signature shared by all builders.
pub type Builder = fn(&BuildContext<'_>) -> Result<Artifact, ActionError>;

/// The builder for `kind`.
#[must_use]
pub const fn builder_for(kind: ActionKind) -> Builder {
    match kind {
        ActionKind::CppBin => cpp::build_binary,
        ActionKind::CppLib => cpp::build_library,
        ActionKind::Install => install::install,
        ActionKind::Noop => noop,
    }
}

/// Run the builder registered for the rule's action kind.
///
/// # Errors
///
/// Propagates the builder's [`ActionError`].
pub fn build(ctx: &BuildContext<'_>) -> Result<Artifact, ActionError> {
    builder_for(ctx.rule.action())(ctx)
}

fn noop(ctx: &BuildContext<'_>) -> Result<Artifact, ActionError> {
    info!(rule = ctx.target(), "nothing to do");
    Ok(Artifact::Nothing)
}

#[cfg(test)]
mod tests;
