//! Save warden CLI.
//!
//! Launches one game executable per play-through, autosaves its active save
//! into a rotating ring while it runs, and offers to keep changed runs under
//! a new name when it exits.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};

use savewarden::app::{IterationReport, Warden};
use savewarden::exit_codes;
use savewarden::io::clock::SystemClock;
use savewarden::io::config::{DEFAULT_CONFIG_FILE, load_config};
use savewarden::io::monitor::{ProcessMonitor, SystemProcessQuery};
use savewarden::io::process::{SystemLauncher, launch_request};
use savewarden::io::prompt::TerminalPrompt;
use savewarden::logging;
use savewarden::session::SessionEnd;
use savewarden::swap::PersistOutcome;

#[derive(Parser, Debug)]
#[command(
    name = "savewarden",
    version,
    about = "Supervise a game executable and keep rotating autosaves of its save folder"
)]
struct Cli {
    /// Path to the executable to supervise.
    executable: PathBuf,

    /// Config file (defaults to `savewarden.toml` next to the executable).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the saves root from the config file.
    #[arg(long)]
    saves_root: Option<PathBuf>,

    /// Extra arguments passed to the executable.
    #[arg(last = true)]
    args: Vec<OsString>,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
    std::process::exit(exit_codes::OK);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let executable = resolve_executable(&cli.executable)?;
    let process_name = process_name(&executable)?;
    let request = launch_request(&executable, cli.args);

    let config_path = cli
        .config
        .unwrap_or_else(|| request.workdir.join(DEFAULT_CONFIG_FILE));
    let mut config = load_config(&config_path).context("load config")?;
    if let Some(root) = cli.saves_root {
        config.saves_root = root;
        config.validate()?;
    }
    debug!(?config, config_path = %config_path.display(), "config loaded");

    let layout = config.layout(&request.workdir);
    info!(
        executable = %executable.display(),
        saves_root = %layout.root.display(),
        "savewarden ready"
    );

    let warden = Warden {
        layout,
        request,
        process_name,
        monitor: ProcessMonitor::new(SystemProcessQuery {
            timeout: config.process_query_timeout(),
            output_limit_bytes: config.query_output_limit_bytes,
        }),
        clock: SystemClock,
        launcher: SystemLauncher,
        poll_interval: config.poll_interval(),
        limits: config.lifecycle_limits(),
    };

    let mut prompt = TerminalPrompt::new(io::stdin().lock(), io::stdout());
    warden.run(&mut prompt, print_report)
}

/// Canonical path of an existing executable file.
fn resolve_executable(path: &Path) -> Result<PathBuf> {
    let metadata =
        fs::metadata(path).with_context(|| format!("executable {} not found", path.display()))?;
    if !metadata.is_file() {
        bail!("executable {} is not a file", path.display());
    }
    fs::canonicalize(path).with_context(|| format!("resolve {}", path.display()))
}

/// Name the process table reports for `executable`.
fn process_name(executable: &Path) -> Result<String> {
    executable
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("executable {} has no file name", executable.display()))
}

fn print_report(report: &IterationReport) {
    match report.session.end {
        SessionEnd::NeverStarted => {
            println!("The game was not detected; no autosaves were taken for this run.");
        }
        SessionEnd::MonitorFailed => {
            println!("Lost track of the game; autosaves stopped for this run.");
        }
        SessionEnd::Exited => {}
    }
    if report.session.autosaves > 0 {
        println!("Autosaved {} time(s) during the run.", report.session.autosaves);
    }
    match &report.persist {
        PersistOutcome::Saved { name } => println!("Saved run as \"{name}\"."),
        PersistOutcome::Skipped => println!("Run not saved under a new name."),
        PersistOutcome::Unchanged => {}
    }
}
