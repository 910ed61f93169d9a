//! Lifecycle of the Airflow scheduler process.
//!
//! [`Scheduler::start`] launches `meltano invoke airflow scheduler` and waits
//! for that invocation to finish before returning: the server must not accept
//! traffic until it has, and a non-zero exit aborts startup. The handle is
//! then held until [`Scheduler::stop`], which terminates the process if it is
//! somehow still running.

use crate::error::CoreError;
use crate::launcher::{exit_code, LaunchRequest, Launcher, ProcessHandle};

/// Arguments passed to the CLI to start the scheduler.
pub const SCHEDULER_ARGS: [&str; 3] = ["invoke", "airflow", "scheduler"];

/// The tracked scheduler process. Owned by the server for its lifetime.
#[derive(Debug)]
pub struct Scheduler {
    process: ProcessHandle,
}

impl Scheduler {
    /// Launch the scheduler and wait for the bootstrap invocation to exit.
    ///
    /// Fails with [`CoreError::SchedulerStartup`] on a non-zero exit and with
    /// [`CoreError::Launch`] if the CLI cannot be started.
    pub async fn start(launcher: &Launcher) -> Result<Self, CoreError> {
        tracing::info!(program = %launcher.program(), "Starting scheduler");
        let mut process = launcher.spawn(launch_request())?;

        let status = process.wait().await?;
        let exit_code = exit_code(&status);
        tracing::info!(exit_code, "Scheduler exited with code {exit_code}");

        if !status.success() {
            tracing::error!(exit_code, "Scheduler failed to start");
            return Err(CoreError::SchedulerStartup { exit_code });
        }

        Ok(Self { process })
    }

    #[cfg(test)]
    fn is_running(&mut self) -> bool {
        matches!(self.process.try_status(), Ok(None))
    }

    /// Stop the scheduler, waiting as long as it takes for it to exit.
    ///
    /// Consumes the handle, so the process is terminated at most once.
    pub async fn stop(mut self) -> Result<(), CoreError> {
        if self.process.try_status()?.is_some() {
            tracing::debug!("Scheduler already exited, nothing to stop");
            return Ok(());
        }

        tracing::info!(pid = ?self.process.id(), "Stopping scheduler");
        self.process.terminate()?;
        let status = self.process.wait().await?;
        tracing::info!(exit_code = exit_code(&status), "Scheduler stopped");
        Ok(())
    }
}

/// The tracked process is killed if the server drops it without calling
/// [`Scheduler::stop`].
fn launch_request() -> LaunchRequest {
    LaunchRequest::new(SCHEDULER_ARGS).kill_on_drop()
}
