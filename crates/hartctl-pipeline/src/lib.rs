//! Reap, build, and launch pipeline for hartctl.
//!
//! Boots a bare-metal RISC-V kernel through three blocking steps run in a
//! fixed order: stop stale emulator instances, build the kernel with cargo,
//! launch QEMU on the fresh image. Each step sits behind a trait so the
//! host implementations can be swapped for stubs.

pub mod build;
pub mod error;
pub mod launch;
pub mod pipeline;
pub mod plan;
pub mod reap;

pub use build::{CargoBuilder, KernelBuilder};
pub use error::{PipelineError, ReapError};
pub use launch::{EmulatorExit, EmulatorLauncher, LaunchRequest, QemuLauncher};
pub use pipeline::{reap_only, Pipeline, ReapStatus, RunReport};
pub use plan::{MachineProfile, RunPlan, MACHINE, SERIAL};
pub use reap::{PkillReaper, ReapOutcome, ReapPolicy, Reaper};
