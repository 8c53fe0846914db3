//! `hartctl doctor` — toolchain and emulator diagnostics.

use std::path::Path;
use std::process::Command;

use anyhow::Result;
use hartctl_targets::Arch;

use crate::manifest::HartctlManifest;

/// Print toolchain diagnostic information.
pub fn run(project_dir: &Path) -> Result<()> {
    println!("=== hartctl doctor ===");
    println!();

    println!("hartctl version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- Build ---");
    print_tool_status("cargo", &["--version"]);
    print_tool_status("rustc", &["--version"]);
    println!();

    println!("--- Emulators ---");
    for arch in Arch::ALL {
        print_tool_status(arch.emulator_binary(), &["--version"]);
    }
    println!();

    println!("--- Process Control ---");
    print_tool_status("pkill", &["--version"]);
    print_tool_status("pgrep", &["--version"]);
    println!();

    println!("--- Targets ---");
    for arch in Arch::ALL {
        println!(
            "  {:<5} {:<30} {}",
            arch.name(),
            arch.build_target(),
            arch.emulator_binary()
        );
    }
    println!();

    println!("--- Project Status ---");
    match HartctlManifest::find_and_load(project_dir) {
        Ok(Some((manifest, dir))) => {
            println!("  hartctl.toml: found at {}", dir.display());
            if let Some(ref arch) = manifest.defaults.arch {
                println!("  Default arch:  {arch}");
            }
            if let Some(ref binary) = manifest.kernel.binary {
                println!("  Kernel binary: {binary}");
            }
        }
        Ok(None) => {
            println!("  hartctl.toml: not found");
        }
        Err(e) => {
            println!("  hartctl.toml: error: {e:#}");
        }
    }

    Ok(())
}

fn print_tool_status(name: &str, args: &[&str]) {
    match Command::new(name).args(args).output() {
        Ok(output) => {
            let version = String::from_utf8_lossy(&output.stdout);
            let first_line = version.lines().next().unwrap_or("(unknown version)");
            println!("  {name}: {first_line}");
        }
        Err(_) => {
            println!("  {name}: not found");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn doctor_runs_without_error() {
        let dir = tempfile::tempdir().unwrap();
        super::run(dir.path()).unwrap();
    }
}
