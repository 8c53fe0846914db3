//! `hartctl kill-qemu` — stop stale emulator instances.

use anyhow::Result;
use hartctl_pipeline::{reap_only, ReapStatus, Reaper};

use crate::session::ReapTarget;

/// Terminate running emulators for the resolved architecture. Always succeeds.
pub fn run(target: &ReapTarget) -> Result<()> {
    run_with(target, &mut target.reaper())
}

pub(crate) fn run_with<R: Reaper>(target: &ReapTarget, reaper: &mut R) -> Result<()> {
    let emulator = target.config.emulator();
    match reap_only(reaper, &target.config) {
        ReapStatus::Terminated => println!("Stopped running {emulator}"),
        ReapStatus::NotFound => println!("No running {emulator}"),
        ReapStatus::Ignored { reason } => println!("Could not stop {emulator}: {reason}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hartctl_pipeline::{ReapError, ReapOutcome};
    use hartctl_targets::ConfigInputs;

    struct Fixed(Result<ReapOutcome, ()>);

    impl Reaper for Fixed {
        fn reap(&mut self, name: &str) -> Result<ReapOutcome, ReapError> {
            self.0.map_err(|_| ReapError::StillRunning {
                name: name.to_string(),
                waited: std::time::Duration::from_secs(2),
            })
        }
    }

    /// Records the name it was asked to reap.
    #[derive(Default)]
    struct Named(Vec<String>);

    impl Reaper for Named {
        fn reap(&mut self, name: &str) -> Result<ReapOutcome, ReapError> {
            self.0.push(name.to_string());
            Ok(ReapOutcome::NotFound)
        }
    }

    fn target() -> (tempfile::TempDir, ReapTarget) {
        let dir = tempfile::tempdir().unwrap();
        let target = ReapTarget::resolve(dir.path(), ConfigInputs::default(), false);
        (dir, target)
    }

    #[test]
    fn succeeds_twice_with_nothing_running() {
        let (_dir, target) = target();
        run_with(&target, &mut Fixed(Ok(ReapOutcome::NotFound))).unwrap();
        run_with(&target, &mut Fixed(Ok(ReapOutcome::NotFound))).unwrap();
    }

    #[test]
    fn succeeds_even_when_the_reaper_fails() {
        let (_dir, target) = target();
        run_with(&target, &mut Fixed(Err(()))).unwrap();
    }

    #[test]
    fn works_outside_a_kernel_crate_under_strict() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = ConfigInputs {
            arch: Some("foo".into()),
            harts: None,
        };
        let target = ReapTarget::resolve(dir.path(), inputs, true);

        let mut named = Named::default();
        run_with(&target, &mut named).unwrap();
        assert_eq!(named.0, ["qemu-system-riscv64"]);
    }
}
