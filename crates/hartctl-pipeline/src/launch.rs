//! Emulator launch step.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use hartctl_targets::HartCount;
use log::{debug, info};

use crate::error::PipelineError;

/// Everything needed to start the emulator on a kernel image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Emulator executable.
    pub emulator: String,
    /// QEMU machine type.
    pub machine: String,
    /// Value for `-smp`, forwarded verbatim.
    pub harts: HartCount,
    /// Whether a display window is opened.
    pub graphics: bool,
    /// Serial backend (`mon:stdio` bridges the terminal both ways).
    pub serial: String,
    /// Guest RAM size for `-m`.
    pub memory: Option<String>,
    /// Firmware for `-bios`.
    pub bios: Option<String>,
    /// Kernel image passed to `-kernel`.
    pub kernel: PathBuf,
    /// Appended after all generated arguments.
    pub extra_args: Vec<String>,
}

impl LaunchRequest {
    /// Emulator arguments, in the order they are passed.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-machine".into(),
            self.machine.as_str().into(),
            "-smp".into(),
            self.harts.as_str().into(),
        ];
        if !self.graphics {
            args.push("-nographic".into());
        }
        args.push("-serial".into());
        args.push(self.serial.as_str().into());
        if let Some(ref memory) = self.memory {
            args.push("-m".into());
            args.push(memory.into());
        }
        if let Some(ref bios) = self.bios {
            args.push("-bios".into());
            args.push(bios.into());
        }
        args.push("-kernel".into());
        args.push(self.kernel.as_os_str().to_owned());
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }

    /// Shell-style rendering for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.emulator.clone();
        for arg in self.args() {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// How the emulator process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatorExit {
    /// Exit code; `None` if killed by a signal the platform cannot report.
    pub code: Option<i32>,
}

impl EmulatorExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Code to exit the orchestrator with.
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(1)
    }
}

impl From<ExitStatus> for EmulatorExit {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self {
                    code: Some(128 + signal),
                };
            }
        }
        Self {
            code: status.code(),
        }
    }
}

/// Starts the emulator and blocks until it exits.
pub trait EmulatorLauncher {
    fn launch(&mut self, request: &LaunchRequest) -> Result<EmulatorExit, PipelineError>;
}

/// Host launcher running QEMU in the foreground with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct QemuLauncher;

impl EmulatorLauncher for QemuLauncher {
    fn launch(&mut self, request: &LaunchRequest) -> Result<EmulatorExit, PipelineError> {
        if !request.kernel.is_file() {
            return Err(PipelineError::MissingArtifact {
                path: request.kernel.clone(),
            });
        }

        info!(
            "launching {} ({} harts, machine {})",
            request.emulator, request.harts, request.machine
        );
        debug!("{}", request.command_line());

        let status = Command::new(&request.emulator)
            .args(request.args())
            .status()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => PipelineError::EmulatorNotFound {
                    program: request.emulator.clone(),
                },
                _ => PipelineError::Launch {
                    program: request.emulator.clone(),
                    source,
                },
            })?;

        let exit = EmulatorExit::from(status);
        info!("{} exited with code {}", request.emulator, exit.exit_code());
        Ok(exit)
    }
}
