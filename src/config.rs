use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TASKBOARD_DATA_DIR";
/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "TASKBOARD_LOG";

const DEFAULT_LOG_FILTER: &str = "warn";

/// Runtime settings for the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `tasks.json`, `templates.json` and `tags.json`.
    pub data_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or `taskboard=debug`.
    pub log_filter: String,
}

impl Config {
    /// Resolves settings from the environment.
    ///
    /// The data directory is chosen in the following order:
    /// 1. `data_dir_override` (the `--data-dir` flag).
    /// 2. `TASKBOARD_DATA_DIR` environment variable.
    /// 3. `~/.local/share/taskboard` (on Linux).
    /// 4. `./taskboard` (fallback).
    pub fn resolve(data_dir_override: Option<PathBuf>) -> Self {
        Self::from_vars(
            data_dir_override,
            std::env::var(DATA_DIR_ENV).ok(),
            std::env::var(LOG_ENV).ok(),
        )
    }

    fn from_vars(flag: Option<PathBuf>, env_dir: Option<String>, env_log: Option<String>) -> Self {
        let data_dir = flag
            .or_else(|| env_dir.filter(|s| !s.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| {
                let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
                p.push("taskboard");
                p
            });
        let log_filter = env_log
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Self { data_dir, log_filter }
    }
}
