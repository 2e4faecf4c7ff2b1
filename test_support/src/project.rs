//! Scratch project directories for end-to-end tests.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

use crate::fake_tool;

/// A temporary directory holding a build specification, a defaults file and
/// a `bin/` directory of fake tools.
///
/// Everything is removed when the project is dropped.
#[derive(Debug)]
pub struct Project {
    dir: TempDir,
    root: Utf8PathBuf,
}

impl Project {
    /// Create an empty project.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        fs::create_dir_all(root.join("bin")).expect("bin dir");
        Self { dir, root }
    }

    /// Project root.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory holding fake tools and their log.
    pub fn bin(&self) -> Utf8PathBuf {
        self.root.join("bin")
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir");
        }
        fs::write(&path, contents).expect("write project file");
        path
    }

    /// Write the build specification `AA`.
    pub fn spec(&self, contents: &str) -> Utf8PathBuf {
        self.write("AA", contents)
    }

    /// Write a defaults file and return its path for `--defaults`.
    pub fn defaults(&self, contents: &str) -> Utf8PathBuf {
        self.write("defaults", contents)
    }

    /// Install a fake tool under `bin/` and return its absolute path.
    pub fn tool(&self, name: &str, exit_code: i32) -> Utf8PathBuf {
        let path = fake_tool(self.dir.path().join("bin").as_path(), name, exit_code);
        Utf8PathBuf::from_path_buf(path).expect("utf-8 tool path")
    }

    /// Command lines recorded by the project's fake tools.
    pub fn tool_log(&self) -> Vec<String> {
        crate::tool_log(self.bin().as_std_path())
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}
