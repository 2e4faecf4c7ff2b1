//! Test utilities for driving `aa` against real files and processes.
//!
//! Provides fake tools that log their arguments, a scratch project
//! directory, and error formatting helpers.

pub mod error;
pub mod project;

pub use error::display_error_chain;
pub use project::Project;

use std::fs;
use std::path::{Path, PathBuf};

/// File in the tool directory that every fake tool appends its command line to.
pub const TOOL_LOG: &str = "tools.log";

/// Create an executable shell script `dir/name` standing in for a compiler,
/// linker or copy tool.
///
/// The script appends `name` and its arguments to [`TOOL_LOG`] in `dir`,
/// creates the file following `-o` when present, and exits with
/// `exit_code`.
///
/// Returns the path to the script.
pub fn fake_tool(dir: &Path, name: &str, exit_code: i32) -> PathBuf {
    let path = dir.join(name);
    let log = dir.join(TOOL_LOG);
    let script = format!(
        r#"#!/bin/sh
printf '%s\n' "{name} $*" >> '{log}'
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
if [ -n "$out" ]; then : > "$out"; fi
exit {exit_code}
"#,
        log = log.display(),
    );
    fs::write(&path, script).expect("write fake tool");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path).expect("meta").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("perms");
    }
    path
}

/// Command lines recorded by fake tools in `dir`, oldest first.
///
/// Returns an empty list when no tool has run.
pub fn tool_log(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join(TOOL_LOG))
        .map(|text| text.lines().map(str::to_owned).collect())
        .unwrap_or_default()
}
