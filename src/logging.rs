//! `tracing` subscriber setup shared by the binaries.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Env var that forces JSON output regardless of `[logging] json`.
pub const JSON_ENV: &str = "SURGE_LOG_JSON";

/// Output format after environment overrides are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LoggingConfig {
    /// `SURGE_LOG_JSON` (any value) wins over the config file.
    pub fn format(&self, json_env: Option<&str>) -> LogFormat {
        if self.json || json_env.is_some() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    /// Filter directives: `RUST_LOG` when set and non-empty, else `filter`.
    pub fn directives(&self, rust_log: Option<&str>) -> String {
        match rust_log.map(str::trim) {
            Some(directives) if !directives.is_empty() => directives.to_string(),
            _ => self.filter.clone(),
        }
    }
}

/// Initialise the `tracing` subscriber from `[logging]` plus env overrides.
pub fn init_logging(cfg: &LoggingConfig) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let json_env = std::env::var(JSON_ENV).ok();

    let directives = cfg.directives(rust_log.as_deref());
    let env_filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("surge=info"));

    match cfg.format(json_env.as_deref()) {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init(),
        LogFormat::Pretty => fmt()
            .with_env_filter(env_filter)
            .with_target(cfg.show_target)
            .init(),
    }
}
