//! Subprocess launcher for the `meltano` CLI.
//!
//! Every child is started from the configured project root with the server's
//! inherited environment, `NO_COLOR=1`, and then the caller's
//! [`EnvOverlay`] (overlay wins). [`Launcher::spawn`] returns as soon as the
//! process exists; waiting and output capture live on [`ProcessHandle`].

use std::io::{self, PipeReader};
use std::path::PathBuf;
use std::process::ExitStatus;

use tokio::process::{Child, Command};

use crate::env::{EnvOverlay, NO_COLOR};
use crate::error::CoreError;

/// Program invoked when no command is configured.
pub const DEFAULT_PROGRAM: &str = "meltano";

/// How the child's stdout/stderr are wired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Share the server's stdout/stderr.
    #[default]
    Inherit,
    /// Point stdout and stderr at one pipe and capture the interleaved stream.
    Merged,
}

/// A single invocation: arguments, environment overlay and I/O wiring.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    /// Arguments appended after the launcher's base arguments.
    pub args: Vec<String>,
    /// Applied after the inherited environment and `NO_COLOR=1`.
    pub env: EnvOverlay,
    /// Overrides the launcher's project root for this invocation.
    pub working_directory: Option<PathBuf>,
    pub output: OutputMode,
    /// SIGKILL the process if its handle is dropped before it was reaped.
    pub kill_on_drop: bool,
}

impl LaunchRequest {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn merged_output(mut self) -> Self {
        self.output = OutputMode::Merged;
        self
    }

    pub fn kill_on_drop(mut self) -> Self {
        self.kill_on_drop = true;
        self
    }
}

/// Starts `meltano` (or a configured replacement) child processes.
///
/// Cheap to clone; holds no process state of its own.
#[derive(Debug, Clone)]
pub struct Launcher {
    program: String,
    base_args: Vec<String>,
    project_root: PathBuf,
}

impl Launcher {
    pub fn new(program: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            project_root: project_root.into(),
        }
    }

    /// Build a launcher from a whitespace-separated command line such as
    /// `"uv run meltano"`. The first word is the program, the rest are
    /// prepended to every invocation. A blank command falls back to
    /// [`DEFAULT_PROGRAM`].
    pub fn from_command_line(command: &str, project_root: impl Into<PathBuf>) -> Self {
        let mut words = command.split_whitespace();
        let program = words.next().unwrap_or(DEFAULT_PROGRAM);
        Self::new(program, project_root).with_base_args(words)
    }

    /// Arguments placed before every request's own arguments.
    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Start a child process for `request`.
    ///
    /// Fails with [`CoreError::Launch`] if the program cannot be spawned.
    pub fn spawn(&self, request: LaunchRequest) -> Result<ProcessHandle, CoreError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(&request.args)
            .current_dir(
                request
                    .working_directory
                    .as_deref()
                    .unwrap_or(&self.project_root),
            )
            .env(NO_COLOR, "1")
            .kill_on_drop(request.kill_on_drop);

        for (key, value) in request.env.iter() {
            cmd.env(key, value);
        }

        let output = match request.output {
            OutputMode::Inherit => None,
            OutputMode::Merged => {
                let (reader, writer) = io::pipe()?;
                let stderr_writer = writer.try_clone()?;
                cmd.stdout(writer).stderr(stderr_writer);
                Some(reader)
            }
        };

        let child = cmd.spawn().map_err(|source| CoreError::Launch {
            program: self.program.clone(),
            source,
        })?;

        // The command owns the parent's copies of the pipe's write end; they
        // must be closed or reading the merged output never reaches EOF.
        drop(cmd);

        tracing::debug!(
            program = %self.program,
            args = ?request.args,
            pid = ?child.id(),
            "Spawned process",
        );

        Ok(ProcessHandle { child, output })
    }
}

/// A running (or finished) child process.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    output: Option<PipeReader>,
}

impl ProcessHandle {
    /// OS process id, or `None` once the exit status has been collected.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Exit status if the process has already exited, without blocking.
    pub fn try_status(&mut self) -> Result<Option<ExitStatus>, CoreError> {
        Ok(self.child.try_wait()?)
    }

    /// Wait for the process to exit.
    ///
    /// With [`OutputMode::Merged`] use [`wait_with_output`](Self::wait_with_output)
    /// instead: nobody drains the pipe here, so a chatty child can block.
    pub async fn wait(&mut self) -> Result<ExitStatus, CoreError> {
        Ok(self.child.wait().await?)
    }

    /// Ask the process to shut down gracefully (SIGTERM).
    ///
    /// A process whose exit status was already collected is left alone.
    #[cfg(unix)]
    pub fn terminate(&mut self) -> Result<(), CoreError> {
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = libc::pid_t::try_from(pid).map_err(io::Error::other)?;

        // Safety: `pid` belongs to a child we have not reaped yet.
        let ret = unsafe { libc::kill(pid, libc::SIGTERM) };
        if ret != 0 {
            return Err(io::Error::last_os_error().into());
        }
        Ok(())
    }

    /// Ask the process to shut down. Non-Unix targets have no SIGTERM, so
    /// this kills the process.
    #[cfg(not(unix))]
    pub fn terminate(&mut self) -> Result<(), CoreError> {
        self.child.start_kill()?;
        Ok(())
    }

    /// Wait for exit while draining the merged output pipe, returning the
    /// status and every byte the process (and its descendants) wrote.
    ///
    /// Returns an empty buffer when output was not captured.
    pub async fn wait_with_output(mut self) -> Result<(ExitStatus, Vec<u8>), CoreError> {
        let reader = self.output.take();
        let (status, output) = tokio::try_join!(self.child.wait(), read_output(reader))?;
        Ok((status, output))
    }
}

/// Drain the merged pipe on the runtime's reactor until every writer is gone.
#[cfg(unix)]
async fn read_output(reader: Option<PipeReader>) -> io::Result<Vec<u8>> {
    use std::os::fd::OwnedFd;
    use tokio::io::AsyncReadExt;
    use tokio::net::unix::pipe;

    let mut buf = Vec::new();
    if let Some(reader) = reader {
        let mut receiver = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))?;
        receiver.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Non-Unix targets have no async pipe type, so the read happens on the
/// blocking pool.
#[cfg(not(unix))]
async fn read_output(reader: Option<PipeReader>) -> io::Result<Vec<u8>> {
    use std::io::Read;

    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };
    tokio::task::spawn_blocking(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    })
    .await
    .map_err(io::Error::other)?
}

/// Numeric exit code for logging and error reporting.
///
/// Processes killed by a signal report the negated signal number (`-15` for
/// SIGTERM), or `-1` where no signal information exists.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}
