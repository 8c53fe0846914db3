//! `hartctl.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hartctl_pipeline::{MachineProfile, ReapPolicy};
use hartctl_targets::ConfigInputs;
use serde::{Deserialize, Serialize};

/// File name searched for from the current directory upward.
pub const MANIFEST_FILE: &str = "hartctl.toml";

/// The top-level manifest structure. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HartctlManifest {
    /// Kernel crate location and build settings.
    #[serde(default)]
    pub kernel: KernelConfig,
    /// Fallbacks for the architecture and hart count inputs.
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Emulated machine tweaks.
    #[serde(default)]
    pub emulator: MachineProfile,
    /// Stale emulator cleanup settings.
    #[serde(default)]
    pub reaper: ReaperConfig,
}

/// Kernel section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KernelConfig {
    /// Kernel executable name (default: the crate's package name).
    #[serde(default)]
    pub binary: Option<String>,
    /// Cargo package to build, for workspaces.
    #[serde(default)]
    pub package: Option<String>,
    /// Kernel crate directory relative to the manifest.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Cargo target directory relative to the kernel crate.
    #[serde(default)]
    pub target_dir: Option<PathBuf>,
    /// Extra arguments for `cargo build`.
    #[serde(default)]
    pub build_args: Vec<String>,
}

/// Defaults section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefaultsConfig {
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub harts: Option<HartsValue>,
    /// Reject unknown architectures and malformed hart counts.
    #[serde(default)]
    pub strict: bool,
}

/// Hart count written either as `harts = 2` or `harts = "2"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HartsValue {
    Number(u64),
    Text(String),
}

impl HartsValue {
    pub fn to_text(&self) -> String {
        match self {
            HartsValue::Number(n) => n.to_string(),
            HartsValue::Text(s) => s.clone(),
        }
    }
}

/// Reaper section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReaperConfig {
    #[serde(default)]
    pub on_error: ReapPolicy,
    /// How long terminated emulators get to exit, in milliseconds.
    #[serde(default)]
    pub settle_timeout_ms: Option<u64>,
}

impl HartctlManifest {
    /// Search upward from `start_dir` for a `hartctl.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: HartctlManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing hartctl.toml")
    }

    /// Architecture and hart count fallbacks as resolver inputs.
    pub fn default_inputs(&self) -> ConfigInputs {
        ConfigInputs {
            arch: self.defaults.arch.clone(),
            harts: self.defaults.harts.as_ref().map(HartsValue::to_text),
        }
    }

    /// Generate the default template for `hartctl init`.
    pub fn template() -> String {
        r#"[kernel]
# binary = "kernel"        # defaults to the [package] name in Cargo.toml
# package = "kernel"
dir = "."
target-dir = "target"

[defaults]
arch = "rv64"
harts = 4
strict = false

[emulator]
# memory = "128M"
# bios = "default"
extra-args = []

[reaper]
on-error = "continue"
settle-timeout-ms = 2000
"#
        .to_string()
    }
}

/// Read `[package] name` from the `Cargo.toml` in `dir`, if there is one.
pub fn cargo_package_name(dir: &Path) -> Result<Option<String>> {
    let path = dir.join("Cargo.toml");
    if !path.is_file() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let value: toml::Table =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(value
        .get("package")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let toml_str = r#"
[kernel]
binary = "os"
package = "os-kernel"
dir = "kernel"
target-dir = "build"
build-args = ["--features", "smp"]

[defaults]
arch = "rv32"
harts = "2"
strict = true

[emulator]
memory = "256M"
bios = "none"
extra-args = ["-s"]

[reaper]
on-error = "abort"
settle-timeout-ms = 500
"#;
        let manifest = HartctlManifest::from_str(toml_str).unwrap();
        assert_eq!(manifest.kernel.binary.as_deref(), Some("os"));
        assert_eq!(manifest.kernel.package.as_deref(), Some("os-kernel"));
        assert_eq!(manifest.kernel.dir.as_deref(), Some(Path::new("kernel")));
        assert_eq!(manifest.kernel.build_args, ["--features", "smp"]);
        assert!(manifest.defaults.strict);
        assert_eq!(manifest.emulator.memory.as_deref(), Some("256M"));
        assert_eq!(manifest.emulator.extra_args, ["-s"]);
        assert_eq!(manifest.reaper.on_error, ReapPolicy::Abort);
        assert_eq!(manifest.reaper.settle_timeout_ms, Some(500));

        let inputs = manifest.default_inputs();
        assert_eq!(inputs.arch.as_deref(), Some("rv32"));
        assert_eq!(inputs.harts.as_deref(), Some("2"));
    }

    #[test]
    fn parse_empty_manifest() {
        let manifest = HartctlManifest::from_str("").unwrap();
        assert!(manifest.kernel.binary.is_none());
        assert!(!manifest.defaults.strict);
        assert_eq!(manifest.reaper.on_error, ReapPolicy::Continue);
        assert_eq!(manifest.default_inputs(), ConfigInputs::default());
    }

    #[test]
    fn numeric_harts_become_text() {
        let manifest = HartctlManifest::from_str("[defaults]\nharts = 8\n").unwrap();
        assert_eq!(manifest.default_inputs().harts.as_deref(), Some("8"));
    }

    #[test]
    fn reject_unknown_reap_policy() {
        assert!(HartctlManifest::from_str("[reaper]\non-error = \"panic\"\n").is_err());
    }

    #[test]
    fn reject_invalid_toml() {
        let bad = "this is not valid toml [[[";
        assert!(HartctlManifest::from_str(bad).is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let manifest = HartctlManifest::from_str(&HartctlManifest::template()).unwrap();
        assert_eq!(manifest.defaults.arch.as_deref(), Some("rv64"));
        assert_eq!(manifest.default_inputs().harts.as_deref(), Some("4"));
        assert_eq!(manifest.reaper.settle_timeout_ms, Some(2000));
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[defaults]\narch = \"rv32\"\n").unwrap();

        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found_dir) = HartctlManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.defaults.arch.as_deref(), Some("rv32"));
        assert_eq!(found_dir, dir.path());
    }

    #[test]
    fn package_name_from_cargo_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"rustos\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        assert_eq!(cargo_package_name(dir.path()).unwrap().as_deref(), Some("rustos"));
    }

    #[test]
    fn package_name_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cargo_package_name(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join("Cargo.toml"), "[workspace]\nmembers = []\n").unwrap();
        assert!(cargo_package_name(dir.path()).unwrap().is_none());
    }
}
