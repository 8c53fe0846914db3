//! hartctl — build a bare-metal RISC-V kernel and boot it under QEMU.

mod commands;
mod manifest;
mod session;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use hartctl_targets::ConfigInputs;

use session::{ReapTarget, Session};

#[derive(Parser)]
#[command(name = "hartctl", version, about = "Build and boot a RISC-V kernel under QEMU")]
struct Cli {
    #[command(flatten)]
    selection: Selection,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

/// Architecture and hart inputs, from flags or the environment.
#[derive(Args)]
struct Selection {
    /// Architecture family (rv32, rv64)
    #[arg(long, env = "ARCH", global = true)]
    arch: Option<String>,
    /// Number of harts for the emulated machine
    #[arg(long, env = "HARTS", global = true)]
    harts: Option<String>,
    /// Reject unknown architectures and malformed hart counts
    #[arg(long, global = true)]
    strict: bool,
}

impl Selection {
    fn inputs(&self) -> ConfigInputs {
        ConfigInputs {
            arch: self.arch.clone(),
            harts: self.harts.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the kernel for the selected architecture
    Build,
    /// Stop running emulator instances for the selected architecture
    KillQemu,
    /// Stop stale emulators, build, and boot the kernel
    Run {
        /// Extra emulator arguments (after `--`)
        #[arg(last = true)]
        emulator_args: Vec<String>,
    },
    /// Show the resolved configuration
    Config {
        /// Output format (human, toml, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Check toolchain and emulator availability
    Doctor,
    /// Write a template hartctl.toml in the current directory
    Init,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Build => {
            let session = load_session(&cwd, &cli.selection)?;
            commands::build::run(&session)?;
        }
        Commands::KillQemu => {
            let target = ReapTarget::resolve(&cwd, cli.selection.inputs(), cli.selection.strict);
            commands::kill_qemu::run(&target)?;
        }
        Commands::Run { emulator_args } => {
            let session = load_session(&cwd, &cli.selection)?;
            return commands::run::run(&session, &emulator_args);
        }
        Commands::Config { format } => {
            let session = load_session(&cwd, &cli.selection)?;
            commands::config::run(&session, format.as_deref())?;
        }
        Commands::Doctor => commands::doctor::run(&cwd)?,
        Commands::Init => commands::init::run(&cwd)?,
    }
    Ok(0)
}

/// Resolve the session once for this invocation.
fn load_session(cwd: &Path, selection: &Selection) -> anyhow::Result<Session> {
    let cargo_target_dir = std::env::var_os("CARGO_TARGET_DIR").map(PathBuf::from);
    Session::resolve(cwd, selection.inputs(), selection.strict, cargo_target_dir)
}
