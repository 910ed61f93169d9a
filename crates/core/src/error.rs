/// Errors raised while launching or supervising `meltano` subprocesses.
///
/// A non-zero exit of an app run is *not* an error: it is reported through
/// [`RunResult::success`](crate::runner::RunResult::success) so the HTTP layer
/// can relay the captured output.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The executable could not be found or spawned.
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The scheduler bootstrap process exited with a non-zero status.
    #[error("Scheduler exited with code {exit_code}")]
    SchedulerStartup { exit_code: i32 },

    /// Waiting on, signalling, or reading from a child process failed.
    #[error("Process I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_launch() {
        let err = CoreError::Launch {
            program: "meltano".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "Failed to launch 'meltano': not found");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn display_scheduler_startup() {
        let err = CoreError::SchedulerStartup { exit_code: 2 };
        assert_eq!(err.to_string(), "Scheduler exited with code 2");
    }
}
