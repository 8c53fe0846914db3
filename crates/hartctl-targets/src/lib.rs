//! Architecture selection and target resolution for hartctl.
//!
//! Everything in this crate is a pure function of its inputs:
//! - **Arch:** the RISC-V family selected for a run (`rv32` or `rv64`)
//! - **HartCount:** the core count forwarded to the emulator, kept as text
//! - **RunConfig:** arch + harts + the derived compiler target and emulator name
//! - **ArtifactLayout:** where cargo leaves the debug kernel image

pub mod arch;
pub mod artifact;
pub mod error;
pub mod harts;
pub mod resolve;

pub use arch::Arch;
pub use artifact::{ArtifactLayout, BUILD_PROFILE};
pub use error::{Result, TargetError};
pub use harts::HartCount;
pub use resolve::{ArchPolicy, ConfigInputs, RunConfig};
