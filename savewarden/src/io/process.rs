//! Helpers for spawning the supervised executable and running short-lived
//! query commands with timeouts and bounded output.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, info, instrument, warn};
use wait_timeout::ChildExt;

/// Parameters for launching the supervised executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub executable: PathBuf,
    pub args: Vec<OsString>,
    pub workdir: PathBuf,
}

/// Abstraction over fire-and-forget process spawning.
pub trait Launcher {
    /// Spawn the executable without waiting on it. Liveness is observed
    /// separately through a process query.
    fn spawn_detached(&self, request: &LaunchRequest) -> Result<()>;
}

/// Launcher that spawns a real child process.
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    #[instrument(skip_all, fields(executable = %request.executable.display()))]
    fn spawn_detached(&self, request: &LaunchRequest) -> Result<()> {
        let mut child = match Command::new(&request.executable)
            .args(&request.args)
            .current_dir(&request.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!(err = %e, "failed to spawn executable");
                return Err(e)
                    .with_context(|| format!("spawn {}", request.executable.display()));
            }
        };
        info!(pid = child.id(), "executable launched");

        // Reap on a side thread so an exited child does not linger as a
        // zombie that process listers keep reporting.
        thread::spawn(move || match child.wait() {
            Ok(status) => debug!(exit_code = ?status.code(), "launched process reaped"),
            Err(e) => warn!(err = %e, "failed to reap launched process"),
        });
        Ok(())
    }
}

/// Derive the launch request for `executable`: it runs from its own directory.
pub fn launch_request(executable: &Path, args: Vec<OsString>) -> LaunchRequest {
    let workdir = executable
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    LaunchRequest {
        executable: executable.to_path_buf(),
        args,
        workdir,
    }
}

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub timed_out: bool,
}

/// Run a command with a timeout and capture stdout without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout stored in memory (bytes beyond this are discarded while still draining the pipe).
/// Stderr is discarded.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let (stdout, stdout_truncated) = match stdout_handle.join() {
        Ok(result) => result.context("join stdout")?,
        Err(_) => return Err(anyhow!("output reader thread panicked")),
    };
    if stdout_truncated > 0 {
        warn!(stdout_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        timed_out,
    })
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
