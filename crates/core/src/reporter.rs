use std::fmt;
use std::sync::Mutex;

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

/// Sink for the messages produced while decoding and downloading.
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        log::info!("{message}");
    }

    fn warning(&self, message: &str) {
        log::warn!("{message}");
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
    }
}

/// Keeps every message in memory; useful for tests.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.lock().clone()
    }

    /// Messages of the given severity, in the order they were reported.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(level, _)| *level == severity)
            .map(|(_, message)| message.clone())
            .collect()
    }

    fn push(&self, severity: Severity, message: &str) {
        self.lock().push((severity, message.to_string()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Severity, String)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, message: &str) {
        self.push(Severity::Info, message);
    }

    fn warning(&self, message: &str) {
        self.push(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(Severity::Error, message);
    }
}
