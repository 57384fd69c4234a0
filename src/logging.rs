//! Run-scoped logging handle
//!
//! `RunLogger` is constructed once per command and passed down to every
//! component, so log lines carry the component and target environment
//! without any process-wide mutable state beyond the `log` backend itself.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::fmt::Display;
use std::io::Write;
use std::time::Instant;

/// Width of the `=` banners and `-` rules around run summaries.
pub const BANNER_WIDTH: usize = 60;

/// Install the `env_logger` backend: stdout, `info` by default, `RUST_LOG` overrides.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%z"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Logging handle for a single run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    target: &'static str,
    environment: Option<String>,
}

impl RunLogger {
    /// Create a logger writing under the given `log` target
    pub fn new(target: &'static str) -> Self {
        Self { target, environment: None }
    }

    /// Same target, with every line tagged `[ENV]`
    pub fn for_environment(&self, environment: impl Display) -> Self {
        Self {
            target: self.target,
            environment: Some(environment.to_string()),
        }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    fn prefix(&self) -> String {
        match &self.environment {
            Some(env) => format!("[{}] ", env),
            None => String::new(),
        }
    }

    pub fn debug(&self, message: impl Display) {
        debug!(target: self.target, "{}{}", self.prefix(), message);
    }

    pub fn info(&self, message: impl Display) {
        info!(target: self.target, "{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: impl Display) {
        warn!(target: self.target, "{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: impl Display) {
        error!(target: self.target, "{}{}", self.prefix(), message);
    }

    /// Log an error together with its full `source()` chain
    pub fn error_chain(&self, message: impl Display, err: &(dyn std::error::Error + 'static)) {
        let mut text = format!("{}: {}", message, err);
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str(&format!("\n  Caused by: {}", cause));
            source = cause.source();
        }
        self.error(text);
    }

    /// Log a titled block of `label : value` lines between `=` rules
    pub fn banner(&self, title: &str, fields: &[(&str, String)]) {
        let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        self.rule('=');
        self.info(title);
        for (label, value) in fields {
            self.info(format!("  {:<width$} : {}", label, value, width = width));
        }
        self.rule('=');
    }

    pub fn rule(&self, ch: char) {
        info!(target: self.target, "{}", ch.to_string().repeat(BANNER_WIDTH));
    }

    /// Log an outgoing request; the bearer token never reaches the log.
    pub fn log_request(&self, method: &str, url: &str) {
        self.debug(format!("HTTP {} {} (Authorization: [REDACTED])", method, url));
    }

    pub fn log_response(&self, method: &str, url: &str, status: u16, started: Instant) {
        let message = format!(
            "HTTP {} {} -> {} in {} ms",
            method,
            url,
            status,
            started.elapsed().as_millis()
        );
        if status >= 400 {
            self.warn(message);
        } else {
            self.debug(message);
        }
    }
}

/// Replacement text for a secret in any log line.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        "<empty>".to_string()
    } else {
        "[REDACTED]".to_string()
    }
}

/// Logs the wall-clock time of a run when dropped, on success and failure alike.
pub struct RunTimer {
    started_at: DateTime<Utc>,
    started: Instant,
    logger: RunLogger,
}

impl RunTimer {
    pub fn start(logger: &RunLogger, label: &str) -> Self {
        let started_at = Utc::now();
        logger.info(format!("{} started at {}", label, started_at.to_rfc3339()));
        Self {
            started_at,
            started: Instant::now(),
            logger: logger.clone(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Drop for RunTimer {
    fn drop(&mut self) {
        self.logger
            .info(format!("Total elapsed time: {:.1} seconds", self.elapsed_secs()));
    }
}
