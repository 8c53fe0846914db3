//! Run orchestrator.
//!
//! Sequences reap -> build -> launch. Every step blocks until its child
//! process exits, and the first fatal step stops the run.

use std::fmt;
use std::path::PathBuf;

use hartctl_targets::RunConfig;
use log::{info, warn};

use crate::build::KernelBuilder;
use crate::error::PipelineError;
use crate::launch::{EmulatorExit, EmulatorLauncher};
use crate::plan::RunPlan;
use crate::reap::{ReapOutcome, ReapPolicy, Reaper};

/// Outcome of the reap step after the error policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapStatus {
    Terminated,
    NotFound,
    /// The reaper failed and the failure was logged and ignored.
    Ignored { reason: String },
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub reap: ReapStatus,
    pub build_target: String,
    pub image: PathBuf,
    pub exit: EmulatorExit,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reap = match &self.reap {
            ReapStatus::Terminated => "stale emulator terminated".to_string(),
            ReapStatus::NotFound => "no stale emulator".to_string(),
            ReapStatus::Ignored { reason } => format!("cleanup failed ({reason})"),
        };
        writeln!(f, "Reap:   {reap}")?;
        writeln!(f, "Build:  {}", self.build_target)?;
        writeln!(f, "Image:  {}", self.image.display())?;
        writeln!(f, "Exit:   {}", self.exit.exit_code())
    }
}

/// The reap -> build -> launch pipeline over three pluggable steps.
#[derive(Debug)]
pub struct Pipeline<R, B, L> {
    reaper: R,
    builder: B,
    launcher: L,
    reap_policy: ReapPolicy,
}

impl<R, B, L> Pipeline<R, B, L>
where
    R: Reaper,
    B: KernelBuilder,
    L: EmulatorLauncher,
{
    pub fn new(reaper: R, builder: B, launcher: L) -> Self {
        Self {
            reaper,
            builder,
            launcher,
            reap_policy: ReapPolicy::default(),
        }
    }

    pub fn with_reap_policy(mut self, policy: ReapPolicy) -> Self {
        self.reap_policy = policy;
        self
    }

    /// Give the steps back, e.g. to inspect stubs after a run.
    pub fn into_parts(self) -> (R, B, L) {
        (self.reaper, self.builder, self.launcher)
    }

    /// Reap only. Never fails: errors are logged and reported as ignored.
    pub fn reap_only(&mut self, config: &RunConfig) -> ReapStatus {
        reap_only(&mut self.reaper, config)
    }

    /// Build only.
    pub fn build_only(&mut self, config: &RunConfig) -> Result<(), PipelineError> {
        self.builder.build(config.build_target())
    }

    /// Reap stale instances, build, then launch and wait for the emulator.
    pub fn run(&mut self, plan: &RunPlan) -> Result<RunReport, PipelineError> {
        let config = &plan.config;

        let reap = reap_stale(&mut self.reaper, config.emulator(), self.reap_policy)?;
        self.builder.build(config.build_target())?;
        let exit = self.launcher.launch(&plan.launch_request())?;

        Ok(RunReport {
            reap,
            build_target: config.build_target().to_string(),
            image: plan.image.clone(),
            exit,
        })
    }
}

/// Reap step on its own, without a builder or launcher. Never fails: errors
/// are logged and reported as ignored.
pub fn reap_only<R: Reaper>(reaper: &mut R, config: &RunConfig) -> ReapStatus {
    match reap_stale(reaper, config.emulator(), ReapPolicy::Continue) {
        Ok(status) => status,
        Err(e) => ReapStatus::Ignored {
            reason: e.to_string(),
        },
    }
}

fn reap_stale<R: Reaper>(
    reaper: &mut R,
    emulator: &str,
    policy: ReapPolicy,
) -> Result<ReapStatus, PipelineError> {
    info!("stopping stale {emulator} instances");
    match reaper.reap(emulator) {
        Ok(ReapOutcome::Terminated) => {
            info!("terminated running {emulator}");
            Ok(ReapStatus::Terminated)
        }
        Ok(ReapOutcome::NotFound) => Ok(ReapStatus::NotFound),
        Err(e) => match policy {
            ReapPolicy::Continue => {
                warn!("{e}; continuing");
                Ok(ReapStatus::Ignored {
                    reason: e.to_string(),
                })
            }
            ReapPolicy::Abort => Err(e.into()),
        },
    }
}
