//! `c++lib` and `c++bin` builders.
//!
//! Compile: `<compiler> [-include F]... <cflags-default>... <cflags>... -c
//! <src>... -o <out-dir>/<target>.o`.
//!
//! Link: `<linker> <object> <dep objects>... -o <bin-dir>/<target>
//! [-l<lib>]... <lflags-default>... <lflags>...`.

use camino::Utf8PathBuf;
use itertools::Itertools;
use tracing::info;

use super::{ActionError, Artifact, BuildContext, Layout, Stage};

pub(super) fn build_library(ctx: &BuildContext<'_>) -> Result<Artifact, ActionError> {
    let layout = Layout::from_attrs(ctx.attrs())?;
    compile(ctx, &layout).map(Artifact::Object)
}

pub(super) fn build_binary(ctx: &BuildContext<'_>) -> Result<Artifact, ActionError> {
    let layout = Layout::from_attrs(ctx.attrs())?;
    let linker = ctx.attrs().string(":linker")?;
    let mut objects = Vec::new();
    for dep in ctx.rule.deps().iter().unique() {
        if let Some(object) = ctx.artifact(dep)?.object() {
            objects.push(object.to_string());
        }
    }

    let object = compile(ctx, &layout)?;
    let binary = layout.binary(ctx.target());
    ctx.prepare_parent(&binary)?;

    let attrs = ctx.attrs();
    let invocation = ctx
        .invocation(linker)?
        .arg(object.as_str())
        .args(objects)
        .arg("-o")
        .arg(binary.as_str())
        .args(attrs.strings(":lib")?.into_iter().map(|lib| format!("-l{lib}")))
        .args(attrs.strings(":lflags-default")?)
        .args(attrs.strings(":lflags")?);
    info!(rule = ctx.target(), binary = %binary, "linking");
    ctx.run(Stage::Link, &invocation)?;
    Ok(Artifact::Binary { object, binary })
}

fn compile(ctx: &BuildContext<'_>, layout: &Layout) -> Result<Utf8PathBuf, ActionError> {
    let attrs = ctx.attrs();
    let sources = attrs.required_strings(":src")?;
    let compiler = attrs.string(":compiler")?;
    let object = layout.object(ctx.target());
    ctx.prepare_parent(&object)?;

    let invocation = ctx
        .invocation(compiler)?
        .args(
            attrs
                .strings(":inc")?
                .into_iter()
                .flat_map(|header| ["-include", header]),
        )
        .args(attrs.strings(":cflags-default")?)
        .args(attrs.strings(":cflags")?)
        .arg("-c")
        .args(sources.iter().copied())
        .arg("-o")
        .arg(object.as_str());
    info!(
        rule = ctx.target(),
        sources = %sources.join(", "),
        object = %object,
        "compiling"
    );
    ctx.run(Stage::Compile, &invocation)?;
    Ok(object)
}
