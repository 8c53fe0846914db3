//! Kernel image location.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Cargo profile directory the kernel is built into.
pub const BUILD_PROFILE: &str = "debug";

/// Where cargo leaves the kernel executable.
///
/// The image path is `<target-dir>/<build-target>/debug/<binary>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArtifactLayout {
    /// Cargo target directory.
    pub target_dir: PathBuf,
    /// Kernel executable name.
    pub binary: String,
}

impl ArtifactLayout {
    /// Layout for `binary` under `target_dir`.
    pub fn new(target_dir: impl Into<PathBuf>, binary: impl Into<String>) -> Self {
        Self {
            target_dir: target_dir.into(),
            binary: binary.into(),
        }
    }

    /// Debug image path for `build_target`.
    pub fn image_path(&self, build_target: &str) -> PathBuf {
        self.target_dir
            .join(build_target)
            .join(BUILD_PROFILE)
            .join(&self.binary)
    }

    /// Relocate a relative target directory under `base`.
    pub fn rooted_at(mut self, base: &Path) -> Self {
        if self.target_dir.is_relative() {
            self.target_dir = base.join(&self.target_dir);
        }
        self
    }
}
