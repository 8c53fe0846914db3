//! `hartctl build` — compile the kernel for the resolved target.

use anyhow::{Context, Result};

use crate::session::Session;

/// Build the kernel image.
pub fn run(session: &Session) -> Result<()> {
    println!("Target: {}", session.config.build_target());
    session
        .pipeline()
        .build_only(&session.config)
        .context("building kernel")?;
    println!("Image:  {}", session.image_path().display());
    Ok(())
}
