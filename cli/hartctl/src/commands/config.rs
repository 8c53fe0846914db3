//! `hartctl config` — show the resolved configuration without side effects.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use hartctl_pipeline::{MachineProfile, ReapPolicy, MACHINE, SERIAL};
use hartctl_targets::{ArchPolicy, RunConfig};
use serde::Serialize;

use crate::session::Session;

/// Serializable snapshot of a session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ConfigView<'a> {
    #[serde(flatten)]
    run: &'a RunConfig,
    policy: ArchPolicy,
    image: PathBuf,
    kernel_dir: &'a PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<&'a PathBuf>,
    machine: &'static str,
    serial: &'static str,
    reap_on_error: ReapPolicy,
    reap_settle_timeout_ms: u64,
    emulator_profile: &'a MachineProfile,
}

impl<'a> ConfigView<'a> {
    fn new(session: &'a Session) -> Self {
        Self {
            run: &session.config,
            policy: session.policy,
            image: session.image_path(),
            kernel_dir: &session.kernel_dir,
            manifest: session.manifest_path.as_ref(),
            machine: MACHINE,
            serial: SERIAL,
            reap_on_error: session.reap_policy,
            reap_settle_timeout_ms: session.settle_timeout.as_millis() as u64,
            emulator_profile: &session.machine,
        }
    }
}

/// Print the resolved configuration.
///
/// `format` is `human` (default), `toml`, or `json`.
pub fn run(session: &Session, format: Option<&str>) -> Result<()> {
    print!("{}", render(session, format)?);
    Ok(())
}

fn render(session: &Session, format: Option<&str>) -> Result<String> {
    let view = ConfigView::new(session);
    match format.unwrap_or("human") {
        "human" => Ok(render_human(session)),
        "toml" => toml::to_string_pretty(&view).context("serializing configuration as TOML"),
        "json" => serde_json::to_string_pretty(&view)
            .map(|s| s + "\n")
            .context("serializing configuration as JSON"),
        other => bail!("unknown format: '{other}'. Choose: human, toml, json"),
    }
}

fn render_human(session: &Session) -> String {
    let config = &session.config;
    let mut out = String::new();
    out.push_str("=== hartctl configuration ===\n");
    match session.manifest_path {
        Some(ref path) => out.push_str(&format!("Manifest: {}\n", path.display())),
        None => out.push_str("Manifest: (none)\n"),
    }
    out.push('\n');

    out.push_str("--- Target ---\n");
    out.push_str(&format!("  Arch:         {}\n", config.arch()));
    out.push_str(&format!("  Build target: {}\n", config.build_target()));
    out.push_str(&format!("  Policy:       {:?}\n", session.policy));
    out.push('\n');

    out.push_str("--- Kernel ---\n");
    out.push_str(&format!("  Crate: {}\n", session.kernel_dir.display()));
    out.push_str(&format!("  Image: {}\n", session.image_path().display()));
    out.push('\n');

    out.push_str("--- Emulator ---\n");
    out.push_str(&format!("  Binary:  {}\n", config.emulator()));
    out.push_str(&format!("  Machine: {MACHINE}\n"));
    out.push_str(&format!("  Harts:   {}\n", config.harts()));
    out.push_str(&format!("  Serial:  {SERIAL}\n"));
    if let Some(ref memory) = session.machine.memory {
        out.push_str(&format!("  Memory:  {memory}\n"));
    }
    if let Some(ref bios) = session.machine.bios {
        out.push_str(&format!("  BIOS:    {bios}\n"));
    }
    if !session.machine.extra_args.is_empty() {
        out.push_str(&format!("  Extra:   {}\n", session.machine.extra_args.join(" ")));
    }
    out
}
