//! Pipeline errors.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from the stale-process reaper.
///
/// "Nothing to terminate" is not an error; see [`crate::ReapOutcome::NotFound`].
#[derive(Debug, Error)]
pub enum ReapError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed ({})", describe_exit(.code))]
    Failed { program: String, code: Option<i32> },

    #[error("{name} is running but could not be signalled")]
    NotSignalled { name: String },

    #[error("{name} still running {} ms after termination was requested", .waited.as_millis())]
    StillRunning { name: String, waited: Duration },
}

/// Errors that abort the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stale emulator cleanup failed: {0}")]
    Reap(#[from] ReapError),

    #[error("failed to run build toolchain '{program}': {source}")]
    Toolchain {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("kernel build for {target} failed ({})", describe_exit(.code))]
    BuildFailed { target: String, code: Option<i32> },

    #[error("kernel image not found at {}", .path.display())]
    MissingArtifact { path: PathBuf },

    #[error("emulator '{program}' not found in PATH")]
    EmulatorNotFound { program: String },

    #[error("failed to launch emulator '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
