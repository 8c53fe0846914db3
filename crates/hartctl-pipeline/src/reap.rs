//! Stale emulator cleanup.
//!
//! Terminates emulator instances left over from an earlier run so the new one
//! does not fight them for the terminal. Finding nothing to terminate is a
//! normal outcome, which keeps the step idempotent.

use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ReapError;

/// Result of a successful reap attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapOutcome {
    /// At least one matching process was signalled and has exited.
    Terminated,
    /// No matching process was running.
    NotFound,
}

/// What the pipeline does when the reaper returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReapPolicy {
    /// Log a warning and carry on with the build.
    #[default]
    Continue,
    /// Abort the pipeline.
    Abort,
}

/// Terminates running processes by executable name.
pub trait Reaper {
    /// Request termination of every process whose executable is `name`.
    fn reap(&mut self, name: &str) -> Result<ReapOutcome, ReapError>;
}

/// Host reaper built on procps `pkill`/`pgrep`.
///
/// Matches on the full command line: Linux truncates process names to 15
/// bytes, which is shorter than `qemu-system-riscv64`.
#[derive(Debug, Clone)]
pub struct PkillReaper {
    kill_program: String,
    probe_program: String,
    settle_timeout: Duration,
    poll_interval: Duration,
}

impl PkillReaper {
    /// How long terminated processes get to exit before giving up.
    pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    pub fn new() -> Self {
        Self::with_programs("pkill", "pgrep")
    }

    /// Use other programs with `pkill`/`pgrep` calling conventions.
    pub fn with_programs(kill_program: impl Into<String>, probe_program: impl Into<String>) -> Self {
        Self {
            kill_program: kill_program.into(),
            probe_program: probe_program.into(),
            settle_timeout: Self::DEFAULT_SETTLE_TIMEOUT,
            poll_interval: Self::POLL_INTERVAL,
        }
    }

    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    fn still_running(&self, pattern: &str) -> Result<bool, ReapError> {
        let status = Command::new(&self.probe_program)
            .arg("-f")
            .arg(pattern)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| ReapError::Spawn {
                program: self.probe_program.clone(),
                source,
            })?;
        Ok(status.success())
    }

    fn wait_for_exit(&self, name: &str, pattern: &str) -> Result<(), ReapError> {
        let start = Instant::now();
        while self.still_running(pattern)? {
            let waited = start.elapsed();
            if waited >= self.settle_timeout {
                return Err(ReapError::StillRunning {
                    name: name.to_string(),
                    waited,
                });
            }
            thread::sleep(self.poll_interval);
        }
        Ok(())
    }
}

impl Default for PkillReaper {
    fn default() -> Self {
        Self::new()
    }
}

impl Reaper for PkillReaper {
    fn reap(&mut self, name: &str) -> Result<ReapOutcome, ReapError> {
        let pattern = command_line_pattern(name);
        debug!("{} -f '{pattern}'", self.kill_program);

        let status = Command::new(&self.kill_program)
            .arg("-f")
            .arg(&pattern)
            .stdout(Stdio::null())
            .status()
            .map_err(|source| ReapError::Spawn {
                program: self.kill_program.clone(),
                source,
            })?;

        // pkill: 0 = signalled, 1 = none matched or none could be signalled,
        // 2 = bad pattern, 3 = fatal
        match status.code() {
            Some(0) => {
                self.wait_for_exit(name, &pattern)?;
                Ok(ReapOutcome::Terminated)
            }
            Some(1) => {
                if self.still_running(&pattern)? {
                    Err(ReapError::NotSignalled {
                        name: name.to_string(),
                    })
                } else {
                    Ok(ReapOutcome::NotFound)
                }
            }
            code => Err(ReapError::Failed {
                program: self.kill_program.clone(),
                code,
            }),
        }
    }
}

/// Extended regex matching a command line whose first word is `name`,
/// invoked bare or by path. Arguments never match.
pub fn command_line_pattern(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("^([^ ]*/)?{escaped}( |$)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_anchors_executable_name() {
        assert_eq!(
            command_line_pattern("qemu-system-riscv64"),
            "^([^ ]*/)?qemu-system-riscv64( |$)"
        );
    }

    #[test]
    fn pattern_escapes_metacharacters() {
        assert_eq!(command_line_pattern("a.b+c"), "^([^ ]*/)?a\\.b\\+c( |$)");
    }

    #[cfg(unix)]
    #[test]
    fn no_match_is_not_found_and_idempotent() {
        // `false` exits 1, which is pkill's "no process matched"
        let mut reaper = PkillReaper::with_programs("false", "false");
        assert_eq!(reaper.reap("qemu-system-riscv64").unwrap(), ReapOutcome::NotFound);
        assert_eq!(reaper.reap("qemu-system-riscv64").unwrap(), ReapOutcome::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn signalled_processes_that_exit_are_terminated() {
        let mut reaper = PkillReaper::with_programs("true", "false");
        assert_eq!(reaper.reap("qemu-system-riscv32").unwrap(), ReapOutcome::Terminated);
    }

    #[cfg(unix)]
    #[test]
    fn unsignalled_match_is_an_error() {
        // pkill exits 1 on EPERM too; pgrep still sees the process
        let mut reaper = PkillReaper::with_programs("false", "true");
        let err = reaper.reap("qemu-system-riscv64").unwrap_err();
        assert!(matches!(err, ReapError::NotSignalled { ref name } if name == "qemu-system-riscv64"));
    }

    #[cfg(unix)]
    #[test]
    fn survivors_time_out() {
        let mut reaper = PkillReaper::with_programs("true", "true")
            .with_settle_timeout(Duration::from_millis(100));
        let err = reaper.reap("qemu-system-riscv64").unwrap_err();
        assert!(matches!(err, ReapError::StillRunning { ref name, .. } if name == "qemu-system-riscv64"));
    }

    #[cfg(unix)]
    fn procps_available() -> bool {
        Command::new("pgrep")
            .arg("-V")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[cfg(unix)]
    #[test]
    fn name_in_arguments_is_left_alone() {
        if !procps_available() {
            return;
        }
        let name = "hartctl-reap-bystander";
        let script_name = format!("/opt/{name}");
        let mut bystander = Command::new("sh")
            .args(["-c", "sleep 30", script_name.as_str()])
            .spawn()
            .unwrap();

        let outcome = PkillReaper::new().reap(name);
        let survived = bystander.try_wait().unwrap().is_none();
        bystander.kill().ok();
        bystander.wait().ok();

        assert_eq!(outcome.unwrap(), ReapOutcome::NotFound);
        assert!(survived);
    }

    #[cfg(unix)]
    #[test]
    fn executable_invoked_by_path_is_terminated() {
        use std::os::unix::process::CommandExt;

        if !procps_available() {
            return;
        }
        let name = "hartctl-reap-target";
        let mut target = Command::new("sleep")
            .arg0(format!("/opt/bin/{name}"))
            .arg("30")
            .spawn()
            .unwrap();

        let outcome = PkillReaper::new().reap(name);
        let status = target.wait().unwrap();

        // exited zombies drop out of pgrep -f, so the settle wait ends
        assert_eq!(outcome.unwrap(), ReapOutcome::Terminated);
        assert!(!status.success());
    }

    #[test]
    fn missing_kill_program_is_spawn_error() {
        let mut reaper = PkillReaper::with_programs("hartctl-no-such-pkill", "pgrep");
        let err = reaper.reap("qemu-system-riscv64").unwrap_err();
        assert!(matches!(err, ReapError::Spawn { .. }));
    }

    #[test]
    fn default_policy_continues() {
        assert_eq!(ReapPolicy::default(), ReapPolicy::Continue);
    }
}
