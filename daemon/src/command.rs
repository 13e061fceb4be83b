//! External command runner.
//!
//! Every hardware collaborator on the board (radio, OLED, LED) is driven
//! through a small command-line tool, so they all share this helper.

use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

/// Run `argv` to completion and return its stdout.
///
/// A non-zero exit status is an error carrying the tool's stderr.
pub fn run(argv: &[String]) -> Result<String> {
    let (program, args) = argv.split_first().context("empty command line")?;

    log::debug!("==> Executing: {}", argv.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to start {program}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} failed ({}): {}", program, output.status, stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a one-shot setup command, logging instead of failing.
pub fn run_logged(what: &str, argv: &[String]) {
    match run(argv) {
        Ok(_) => log::info!("{what} done"),
        Err(e) => log::error!("{what} failed: {e:#}"),
    }
}
