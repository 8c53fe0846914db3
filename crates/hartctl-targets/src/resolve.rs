//! Run configuration resolution.
//!
//! Turns the two raw inputs (architecture selector, hart count) into a
//! [`RunConfig`] once per invocation. The compiler target and emulator name
//! are derived here and cannot be set independently.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::arch::Arch;
use crate::error::Result;
use crate::harts::HartCount;

/// How unrecognized inputs are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchPolicy {
    /// Unknown selectors fall back to rv64 and malformed hart counts pass
    /// through; both are logged.
    #[default]
    Lenient,
    /// Unknown selectors and malformed hart counts are errors.
    Strict,
}

impl ArchPolicy {
    /// `Strict` when `strict` is set, `Lenient` otherwise.
    pub fn from_flag(strict: bool) -> Self {
        if strict {
            ArchPolicy::Strict
        } else {
            ArchPolicy::Lenient
        }
    }
}

/// Raw, unvalidated inputs gathered from flags, environment, or fixtures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInputs {
    /// Architecture selector text.
    pub arch: Option<String>,
    /// Hart count text.
    pub harts: Option<String>,
}

impl ConfigInputs {
    /// Inputs with both values set.
    pub fn new(arch: impl Into<String>, harts: impl Into<String>) -> Self {
        Self {
            arch: Some(arch.into()),
            harts: Some(harts.into()),
        }
    }

    /// Fill unset values from `fallback`.
    pub fn or(self, fallback: ConfigInputs) -> Self {
        Self {
            arch: self.arch.or(fallback.arch),
            harts: self.harts.or(fallback.harts),
        }
    }
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunConfig {
    arch: Arch,
    harts: HartCount,
    build_target: &'static str,
    emulator: &'static str,
}

impl RunConfig {
    /// Build from an already-selected family and hart count.
    pub fn new(arch: Arch, harts: HartCount) -> Self {
        Self {
            arch,
            harts,
            build_target: arch.build_target(),
            emulator: arch.emulator_binary(),
        }
    }

    /// Resolve raw inputs under `policy`.
    pub fn resolve(inputs: &ConfigInputs, policy: ArchPolicy) -> Result<Self> {
        let selector = inputs.arch.as_deref();
        let harts = HartCount::from_input(inputs.harts.as_deref());

        let arch = match policy {
            ArchPolicy::Strict => {
                let arch = Arch::select_strict(selector)?;
                harts.parse()?;
                arch
            }
            ArchPolicy::Lenient => {
                if let Some(s) = selector.filter(|s| !Arch::is_known(s)) {
                    warn!("unrecognized architecture '{s}', using {}", Arch::Rv64);
                }
                if !harts.is_valid() {
                    warn!("hart count '{harts}' is not a positive integer; passing it to the emulator as-is");
                }
                Arch::select(selector)
            }
        };

        Ok(Self::new(arch, harts))
    }

    /// Selected architecture family.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Hart count forwarded to the emulator.
    pub fn harts(&self) -> &HartCount {
        &self.harts
    }

    /// Compiler target triple.
    pub fn build_target(&self) -> &'static str {
        self.build_target
    }

    /// Emulator executable name.
    pub fn emulator(&self) -> &'static str {
        self.emulator
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(Arch::DEFAULT, HartCount::default())
    }
}
