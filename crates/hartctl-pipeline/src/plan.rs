//! Run plan: resolved configuration plus the fixed machine profile.

use std::path::{Path, PathBuf};

use hartctl_targets::{ArtifactLayout, RunConfig};
use serde::{Deserialize, Serialize};

use crate::launch::LaunchRequest;

/// QEMU machine type the kernel is built for.
pub const MACHINE: &str = "virt";

/// Serial backend: guest UART multiplexed with the monitor on the terminal.
pub const SERIAL: &str = "mon:stdio";

/// Tunable parts of the emulated machine. Machine type, graphics and serial
/// wiring are fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MachineProfile {
    /// Guest RAM size (`-m`), QEMU default when unset.
    #[serde(default)]
    pub memory: Option<String>,
    /// Firmware (`-bios`), QEMU default (OpenSBI) when unset.
    #[serde(default)]
    pub bios: Option<String>,
    /// Extra emulator arguments.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Inputs to one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// Resolved architecture, harts, build target and emulator.
    pub config: RunConfig,
    /// Kernel image the build step produces.
    pub image: PathBuf,
    /// Tunable machine settings for the launch.
    pub machine: MachineProfile,
}

impl RunPlan {
    /// Plan for `config`, with the image path taken from `layout`.
    pub fn new(config: RunConfig, layout: &ArtifactLayout, machine: MachineProfile) -> Self {
        let image = layout.image_path(config.build_target());
        Self {
            config,
            image,
            machine,
        }
    }

    /// Kernel image the emulator boots.
    pub fn image(&self) -> &Path {
        &self.image
    }

    /// Launch parameters for this plan.
    pub fn launch_request(&self) -> LaunchRequest {
        LaunchRequest {
            emulator: self.config.emulator().to_string(),
            machine: MACHINE.to_string(),
            harts: self.config.harts().clone(),
            graphics: false,
            serial: SERIAL.to_string(),
            memory: self.machine.memory.clone(),
            bios: self.machine.bios.clone(),
            kernel: self.image.clone(),
            extra_args: self.machine.extra_args.clone(),
        }
    }
}
