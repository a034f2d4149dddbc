//! Build script: render the `loglevel(1)` manual page into `OUT_DIR` for
//! release packaging.

use clap::CommandFactory;
use clap_mangen::Man;
use std::{env, fs, path::PathBuf};

#[path = "src/cli.rs"]
mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_VERSION");

    let cmd = cli::Cli::command();
    let binary_name = cmd.get_name().to_owned();
    let version = env::var("CARGO_PKG_VERSION")
        .map_err(|_| "CARGO_PKG_VERSION must be set by Cargo to render the manual page")?;

    let man = Man::new(cmd)
        .section("1")
        .source(format!("{binary_name} {version}"));
    let mut buf = Vec::new();
    man.render(&mut buf)?;

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or("OUT_DIR must be set by Cargo")?;
    fs::write(out_dir.join(format!("{binary_name}.1")), buf)?;
    Ok(())
}
