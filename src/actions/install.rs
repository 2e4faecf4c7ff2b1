//! `install` builder: copies each dependency's binary into the install
//! directory, `:install-dir` or `~/.local/bin`.

use camino::Utf8PathBuf;
use itertools::Itertools;
use tracing::info;

use super::{ActionError, Artifact, BuildContext, DEFAULT_INSTALL_SUBDIR, Stage};

/// Program used to copy binaries into place.
const COPY_PROGRAM: &str = "cp";

pub(super) fn install(ctx: &BuildContext<'_>) -> Result<Artifact, ActionError> {
    let dir = install_dir(ctx)?;
    ctx.prepare_dir(&dir)?;

    let mut installed = Vec::with_capacity(ctx.rule.deps().len());
    for dep in ctx.rule.deps().iter().unique() {
        let binary = ctx
            .artifact(dep)?
            .binary()
            .ok_or_else(|| ActionError::NoBinary { dep: dep.clone() })?;
        let destination = dir.join(dep);
        let invocation = ctx
            .invocation(COPY_PROGRAM)?
            .arg(binary.as_str())
            .arg(destination.as_str());
        ctx.run(Stage::Install, &invocation)?;
        info!(rule = ctx.target(), destination = %destination, "installed");
        installed.push(destination);
    }
    Ok(Artifact::Installed(installed))
}

fn install_dir(ctx: &BuildContext<'_>) -> Result<Utf8PathBuf, ActionError> {
    if let Some(dir) = ctx.attrs().path(":install-dir")? {
        return Ok(dir);
    }
    ctx.home
        .map(|home| home.join(DEFAULT_INSTALL_SUBDIR))
        .ok_or(ActionError::NoHomeDirectory)
}
