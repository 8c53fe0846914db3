//! `hartctl run` — reap, build, and boot the kernel under QEMU.

use anyhow::{Context, Result};
use log::debug;

use crate::session::Session;

/// Run the full pipeline. Returns the emulator's exit code.
pub fn run(session: &Session, emulator_args: &[String]) -> Result<i32> {
    let plan = session.plan(emulator_args);
    let report = session
        .pipeline()
        .run(&plan)
        .context("running kernel")?;
    debug!("run finished\n{report}");
    Ok(report.exit.exit_code())
}
