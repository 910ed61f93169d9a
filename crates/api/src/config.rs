use std::num::ParseIntError;
use std::path::PathBuf;

use pixbyt_core::launcher::DEFAULT_PROGRAM;

/// Basic auth credentials every request must present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `1234`).
    pub port: u16,
    /// Required Basic auth credentials. `None` disables authentication.
    pub credentials: Option<BasicAuthCredentials>,
    /// Whether to start the Airflow scheduler with the server (default: `true`).
    pub run_scheduler: bool,
    /// Working directory for every `meltano` process.
    pub project_root: PathBuf,
    /// Command line used to invoke the CLI (default: `meltano`).
    pub meltano_command: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SERVER_PORT must be a valid port number, got '{value}': {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                      |
    /// |------------------------|------------------------------|
    /// | `SERVER_HOST`          | `0.0.0.0`                    |
    /// | `SERVER_PORT`          | `1234`                       |
    /// | `SERVER_USERNAME`      | unset                        |
    /// | `SERVER_PASSWORD`      | unset                        |
    /// | `SERVER_RUN_SCHEDULER` | `true`                       |
    /// | `MELTANO_PROJECT_ROOT` | current working directory    |
    /// | `MELTANO_COMMAND`      | `meltano`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset. Authentication is only enabled
    /// when both username and password are present, and the scheduler only
    /// runs when `SERVER_RUN_SCHEDULER` is unset or exactly `true`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let host = var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port: u16 = match var("SERVER_PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => 1234,
        };

        let credentials = match (var("SERVER_USERNAME"), var("SERVER_PASSWORD")) {
            (Some(username), Some(password)) => Some(BasicAuthCredentials { username, password }),
            _ => None,
        };

        let run_scheduler = lookup("SERVER_RUN_SCHEDULER")
            .map(|v| v == "true")
            .unwrap_or(true);

        let project_root = var("MELTANO_PROJECT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let meltano_command = var("MELTANO_COMMAND").unwrap_or_else(|| DEFAULT_PROGRAM.into());

        Ok(Self {
            host,
            port,
            credentials,
            run_scheduler,
            project_root,
            meltano_command,
        })
    }
}
