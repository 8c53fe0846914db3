//! Kernel build step.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::error::PipelineError;

/// Compiles the kernel for a target triple.
///
/// Success means the debug image now exists at the layout's deterministic
/// path; nothing else is returned.
pub trait KernelBuilder {
    fn build(&mut self, build_target: &str) -> Result<(), PipelineError>;
}

/// Host builder that shells out to `cargo build`.
///
/// stdout and stderr are inherited so compiler diagnostics reach the
/// operator unchanged.
#[derive(Debug, Clone)]
pub struct CargoBuilder {
    program: String,
    project_dir: PathBuf,
    target_dir: Option<PathBuf>,
    package: Option<String>,
    binary: Option<String>,
    extra_args: Vec<String>,
}

impl CargoBuilder {
    /// Build the crate in `project_dir` with the `cargo` on PATH.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: "cargo".to_string(),
            project_dir: project_dir.into(),
            target_dir: None,
            package: None,
            binary: None,
            extra_args: Vec::new(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Pin `--target-dir` so the image lands where the layout expects it.
    pub fn with_target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    pub fn with_package(mut self, package: Option<String>) -> Self {
        self.package = package;
        self
    }

    pub fn with_binary(mut self, binary: Option<String>) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Arguments passed to cargo for `build_target`.
    pub fn args(&self, build_target: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["build".into(), "--target".into(), build_target.into()];
        if let Some(ref dir) = self.target_dir {
            args.push("--target-dir".into());
            args.push(dir.into());
        }
        if let Some(ref package) = self.package {
            args.push("--package".into());
            args.push(package.into());
        }
        if let Some(ref binary) = self.binary {
            args.push("--bin".into());
            args.push(binary.into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

impl KernelBuilder for CargoBuilder {
    fn build(&mut self, build_target: &str) -> Result<(), PipelineError> {
        info!("building kernel for {build_target}");
        let args = self.args(build_target);
        debug!(
            "{} {} (in {})",
            self.program,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" "),
            self.project_dir.display()
        );

        let status = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.project_dir)
            .status()
            .map_err(|source| PipelineError::Toolchain {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(PipelineError::BuildFailed {
                target: build_target.to_string(),
                code: status.code(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    #[test]
    fn minimal_args() {
        let builder = CargoBuilder::new(".");
        assert_eq!(
            strings(builder.args("riscv64gc-unknown-none-elf")),
            ["build", "--target", "riscv64gc-unknown-none-elf"]
        );
    }

    #[test]
    fn full_args() {
        let builder = CargoBuilder::new(".")
            .with_target_dir("/tmp/t")
            .with_package(Some("kernel".into()))
            .with_binary(Some("kernel".into()))
            .with_extra_args(vec!["--features".into(), "smp".into()]);
        assert_eq!(
            strings(builder.args("riscv32imac-unknown-none-elf")),
            [
                "build",
                "--target",
                "riscv32imac-unknown-none-elf",
                "--target-dir",
                "/tmp/t",
                "--package",
                "kernel",
                "--bin",
                "kernel",
                "--features",
                "smp",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_build_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = CargoBuilder::new(dir.path()).with_program("false");
        let err = builder.build("riscv64gc-unknown-none-elf").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::BuildFailed { ref target, code: Some(1) } if target == "riscv64gc-unknown-none-elf"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = CargoBuilder::new(dir.path()).with_program("true");
        builder.build("riscv64gc-unknown-none-elf").unwrap();
    }

    #[test]
    fn missing_toolchain_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = CargoBuilder::new(dir.path()).with_program("hartctl-no-such-cargo");
        let err = builder.build("riscv64gc-unknown-none-elf").unwrap_err();
        assert!(matches!(err, PipelineError::Toolchain { .. }));
    }
}
