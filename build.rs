//! Build script rendering the `aa(1)` manual page from the clap definition.

use clap::CommandFactory;
use clap_mangen::Man;
use std::{env, fs, path::Path};

#[path = "src/cli.rs"]
#[expect(
    dead_code,
    reason = "Only the argument definitions are needed to render the manual"
)]
mod cli;

/// Directory, relative to the crate root, that receives the manual page.
const MAN_DIR: &str = "target/generated-man";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    for var in [
        "CARGO_PKG_VERSION",
        "CARGO_PKG_NAME",
        "CARGO_BIN_NAME",
        "CARGO_PKG_DESCRIPTION",
        "CARGO_PKG_AUTHORS",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let cmd = cli::Cli::command();
    let name = cmd.get_name().to_owned();
    let bin = env::var("CARGO_BIN_NAME")
        .or_else(|_| env::var("CARGO_PKG_NAME"))
        .unwrap_or_else(|_| name.clone());
    if name != bin {
        return Err(format!("command name '{name}' differs from binary name '{bin}'").into());
    }

    let out_dir = Path::new(MAN_DIR);
    if out_dir.exists() {
        fs::remove_dir_all(out_dir)?;
    }
    fs::create_dir_all(out_dir)?;
    let mut page = Vec::new();
    Man::new(cmd).render(&mut page)?;
    fs::write(out_dir.join(format!("{bin}.1")), page)?;
    Ok(())
}
