//! Per-invocation state resolved once at startup.
//!
//! Merges CLI flags, environment bindings (both delivered through clap),
//! the project manifest, and built-in defaults into one [`Session`] that
//! every command borrows.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use hartctl_pipeline::{
    CargoBuilder, MachineProfile, Pipeline, PkillReaper, QemuLauncher, ReapPolicy, RunPlan,
};
use hartctl_targets::{Arch, ArchPolicy, ArtifactLayout, ConfigInputs, HartCount, RunConfig};
use log::{debug, warn};

use crate::manifest::{cargo_package_name, HartctlManifest, MANIFEST_FILE};

/// Pipeline with the host implementations of every step.
pub type HostPipeline = Pipeline<PkillReaper, CargoBuilder, QemuLauncher>;

/// The part of a session the reaper needs: the emulator name and the settle
/// timeout. Resolving it needs no kernel crate and never fails.
#[derive(Debug, Clone)]
pub struct ReapTarget {
    pub config: RunConfig,
    pub settle_timeout: Duration,
}

impl ReapTarget {
    /// Resolve like [`Session::resolve`], degrading instead of failing: an
    /// unreadable manifest is skipped and a strict-mode rejection falls back
    /// to lenient resolution.
    pub fn resolve(cwd: &Path, inputs: ConfigInputs, strict: bool) -> Self {
        let manifest = match HartctlManifest::find_and_load(cwd) {
            Ok(found) => found.map(|(manifest, _)| manifest).unwrap_or_default(),
            Err(e) => {
                warn!("ignoring {MANIFEST_FILE}: {e:#}");
                HartctlManifest::default()
            }
        };

        let policy = ArchPolicy::from_flag(strict || manifest.defaults.strict);
        let inputs = inputs.or(manifest.default_inputs());
        let config = RunConfig::resolve(&inputs, policy).unwrap_or_else(|e| {
            warn!("{e}; resolving leniently");
            RunConfig::new(
                Arch::select(inputs.arch.as_deref()),
                HartCount::from_input(inputs.harts.as_deref()),
            )
        });

        Self {
            config,
            settle_timeout: settle_timeout(&manifest),
        }
    }

    /// Host pkill reaper.
    pub fn reaper(&self) -> PkillReaper {
        PkillReaper::new().with_settle_timeout(self.settle_timeout)
    }
}

fn settle_timeout(manifest: &HartctlManifest) -> Duration {
    manifest
        .reaper
        .settle_timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(PkillReaper::DEFAULT_SETTLE_TIMEOUT)
}

/// Everything a command needs, resolved from every configuration source.
#[derive(Debug, Clone)]
pub struct Session {
    /// Manifest found while searching upward, if any.
    pub manifest_path: Option<PathBuf>,
    /// Kernel crate directory; cargo runs here.
    pub kernel_dir: PathBuf,
    pub config: RunConfig,
    pub policy: ArchPolicy,
    pub layout: ArtifactLayout,
    pub machine: MachineProfile,
    pub reap_policy: ReapPolicy,
    pub settle_timeout: Duration,
    package: Option<String>,
    explicit_binary: Option<String>,
    build_args: Vec<String>,
}

impl Session {
    /// Resolve from the working directory and the flag/environment inputs.
    ///
    /// `cargo_target_dir` is the value of `CARGO_TARGET_DIR`, if set.
    pub fn resolve(
        cwd: &Path,
        inputs: ConfigInputs,
        strict: bool,
        cargo_target_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let (manifest, manifest_path, project_dir) = match HartctlManifest::find_and_load(cwd)? {
            Some((manifest, dir)) => {
                let path = dir.join(MANIFEST_FILE);
                (manifest, Some(path), dir)
            }
            None => (HartctlManifest::default(), None, cwd.to_path_buf()),
        };
        Self::from_manifest(cwd, &project_dir, manifest, manifest_path, inputs, strict, cargo_target_dir)
    }

    fn from_manifest(
        cwd: &Path,
        project_dir: &Path,
        manifest: HartctlManifest,
        manifest_path: Option<PathBuf>,
        inputs: ConfigInputs,
        strict: bool,
        cargo_target_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let kernel_dir = match manifest.kernel.dir {
            Some(ref dir) if dir != Path::new(".") => project_dir.join(dir),
            _ => project_dir.to_path_buf(),
        };

        let policy = ArchPolicy::from_flag(strict || manifest.defaults.strict);
        let inputs = inputs.or(manifest.default_inputs());
        let config = RunConfig::resolve(&inputs, policy).context("resolving run configuration")?;

        // Relative CARGO_TARGET_DIR is relative to where cargo was invoked
        // from; a relative manifest entry is relative to the kernel crate.
        let target_dir = match cargo_target_dir {
            Some(dir) if dir.is_relative() => cwd.join(dir),
            Some(dir) => dir,
            None => kernel_dir.join(
                manifest
                    .kernel
                    .target_dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("target")),
            ),
        };

        let binary = match manifest.kernel.binary {
            Some(ref name) => name.clone(),
            None => match cargo_package_name(&kernel_dir)? {
                Some(name) => name,
                None => bail!(
                    "cannot determine the kernel binary name: no [package] in {}; \
                     set `binary` under [kernel] in {MANIFEST_FILE}",
                    kernel_dir.join("Cargo.toml").display()
                ),
            },
        };

        let settle_timeout = settle_timeout(&manifest);

        let session = Self {
            manifest_path,
            kernel_dir,
            config,
            policy,
            layout: ArtifactLayout::new(target_dir, binary),
            machine: manifest.emulator,
            reap_policy: manifest.reaper.on_error,
            settle_timeout,
            package: manifest.kernel.package,
            explicit_binary: manifest.kernel.binary,
            build_args: manifest.kernel.build_args,
        };
        debug!("resolved {session:?}");
        Ok(session)
    }

    /// Kernel image path for the resolved target.
    pub fn image_path(&self) -> PathBuf {
        self.layout.image_path(self.config.build_target())
    }

    /// Run plan with `extra_args` appended to the emulator command line.
    pub fn plan(&self, extra_args: &[String]) -> RunPlan {
        let mut machine = self.machine.clone();
        machine.extra_args.extend(extra_args.iter().cloned());
        RunPlan::new(self.config.clone(), &self.layout, machine)
    }

    /// Host cargo builder for the kernel crate.
    pub fn builder(&self) -> CargoBuilder {
        CargoBuilder::new(&self.kernel_dir)
            .with_target_dir(&self.layout.target_dir)
            .with_package(self.package.clone())
            .with_binary(self.explicit_binary.clone())
            .with_extra_args(self.build_args.clone())
    }

    /// Pipeline over the host implementations.
    pub fn pipeline(&self) -> HostPipeline {
        let reaper = PkillReaper::new().with_settle_timeout(self.settle_timeout);
        Pipeline::new(reaper, self.builder(), QemuLauncher).with_reap_policy(self.reap_policy)
    }
}
