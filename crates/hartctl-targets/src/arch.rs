//! RISC-V architecture families.
//!
//! The compiler target triple and the emulator binary are both pure
//! functions of [`Arch`], so they can never disagree on word width.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// A supported RISC-V architecture family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 32-bit RISC-V (RV32IMAC).
    Rv32,
    /// 64-bit RISC-V (RV64GC).
    Rv64,
}

impl Arch {
    /// Family used when no selector is given.
    pub const DEFAULT: Arch = Arch::Rv64;

    /// Every supported family, narrowest first.
    pub const ALL: [Arch; 2] = [Arch::Rv32, Arch::Rv64];

    /// Selector spelling (`"rv32"` / `"rv64"`).
    pub fn name(self) -> &'static str {
        match self {
            Arch::Rv32 => "rv32",
            Arch::Rv64 => "rv64",
        }
    }

    /// Native register width in bits.
    pub fn word_size(self) -> u32 {
        match self {
            Arch::Rv32 => 32,
            Arch::Rv64 => 64,
        }
    }

    /// Bare-metal rustc target triple for this family.
    pub fn build_target(self) -> &'static str {
        match self {
            Arch::Rv32 => "riscv32imac-unknown-none-elf",
            Arch::Rv64 => "riscv64gc-unknown-none-elf",
        }
    }

    /// QEMU system emulator executable for this family.
    pub fn emulator_binary(self) -> &'static str {
        match self {
            Arch::Rv32 => "qemu-system-riscv32",
            Arch::Rv64 => "qemu-system-riscv64",
        }
    }

    /// Lenient selection: exactly `"rv32"` picks the 32-bit family, and
    /// anything else (absent, `"rv64"`, or unrecognized) picks 64-bit.
    pub fn select(selector: Option<&str>) -> Arch {
        match selector {
            Some("rv32") => Arch::Rv32,
            _ => Arch::Rv64,
        }
    }

    /// Strict selection: absence defaults, unknown selectors are an error.
    pub fn select_strict(selector: Option<&str>) -> Result<Arch> {
        match selector {
            None => Ok(Arch::DEFAULT),
            Some(s) => s.parse(),
        }
    }

    /// Whether `selector` names a family exactly.
    pub fn is_known(selector: &str) -> bool {
        Arch::ALL.iter().any(|a| a.name() == selector)
    }
}

impl Default for Arch {
    fn default() -> Self {
        Arch::DEFAULT
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Arch {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rv32" => Ok(Arch::Rv32),
            "rv64" => Ok(Arch::Rv64),
            other => Err(TargetError::UnknownArch {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rv32_derivations() {
        assert_eq!(Arch::Rv32.build_target(), "riscv32imac-unknown-none-elf");
        assert_eq!(Arch::Rv32.emulator_binary(), "qemu-system-riscv32");
        assert_eq!(Arch::Rv32.word_size(), 32);
    }

    #[test]
    fn rv64_derivations() {
        assert_eq!(Arch::Rv64.build_target(), "riscv64gc-unknown-none-elf");
        assert_eq!(Arch::Rv64.emulator_binary(), "qemu-system-riscv64");
        assert_eq!(Arch::Rv64.word_size(), 64);
    }

    #[test]
    fn target_and_emulator_agree_on_width() {
        for arch in Arch::ALL {
            let width = arch.word_size().to_string();
            assert!(arch.build_target().starts_with(&format!("riscv{width}")));
            assert!(arch.emulator_binary().ends_with(&format!("riscv{width}")));
        }
    }

    #[test]
    fn select_defaults_to_rv64() {
        assert_eq!(Arch::select(None), Arch::Rv64);
        assert_eq!(Arch::select(Some("rv64")), Arch::Rv64);
        assert_eq!(Arch::select(Some("rv32")), Arch::Rv32);
    }

    #[test]
    fn select_unrecognized_falls_through_to_rv64() {
        assert_eq!(Arch::select(Some("RV32")), Arch::Rv64);
        assert_eq!(Arch::select(Some(" rv32")), Arch::Rv64);
        assert_eq!(Arch::select(Some("x86_64")), Arch::Rv64);
        assert_eq!(Arch::select(Some("")), Arch::Rv64);
    }

    #[test]
    fn select_strict_rejects_unknown() {
        assert_eq!(Arch::select_strict(None).unwrap(), Arch::Rv64);
        assert_eq!(Arch::select_strict(Some("rv32")).unwrap(), Arch::Rv32);
        let err = Arch::select_strict(Some("arm")).unwrap_err();
        assert!(matches!(err, TargetError::UnknownArch { ref value } if value == "arm"));
    }

    #[test]
    fn display_matches_selector() {
        for arch in Arch::ALL {
            assert_eq!(arch.to_string().parse::<Arch>().unwrap(), arch);
            assert!(Arch::is_known(arch.name()));
        }
        assert!(!Arch::is_known("rv128"));
    }
}
