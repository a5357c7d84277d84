//! Console API.
//!
//! Messages written by page scripts are kept in a bounded buffer and
//! mirrored to `tracing` under the `console` target.

use std::collections::VecDeque;
use std::fmt;
use std::time::SystemTime;

/// Console log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Log => "",
            LogLevel::Info => "[INFO] ",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Error => "[ERROR] ",
            LogLevel::Debug => "[DEBUG] ",
        }
    }
}

/// A console message, optionally styled with a `%c` CSS directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub text: String,
    pub style: Option<String>,
}

impl ConsoleMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Some(style.into()),
        }
    }

    /// The arguments as a page would pass them to `console.log`.
    pub fn to_args(&self) -> Vec<String> {
        match &self.style {
            Some(style) => vec![format!("%c{}", self.text), style.clone()],
            None => vec![self.text.clone()],
        }
    }
}

impl fmt::Display for ConsoleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Console log entry.
#[derive(Clone, Debug)]
pub struct ConsoleLogEntry {
    pub level: LogLevel,
    pub message: ConsoleMessage,
    pub timestamp: SystemTime,
}

impl fmt::Display for ConsoleLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.level.prefix(), self.message)
    }
}

/// Console log buffer.
pub struct ConsoleBuffer {
    entries: VecDeque<ConsoleLogEntry>,
    max_entries: usize,
}

impl ConsoleBuffer {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn log(&mut self, level: LogLevel, message: ConsoleMessage) {
        match level {
            LogLevel::Error => tracing::error!(target: "console", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "console", "{}", message),
            LogLevel::Info | LogLevel::Log => tracing::info!(target: "console", "{}", message),
            LogLevel::Debug => tracing::debug!(target: "console", "{}", message),
        }

        self.entries.push_back(ConsoleLogEntry {
            level,
            message,
            timestamp: SystemTime::now(),
        });

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConsoleLogEntry> {
        self.entries.iter()
    }

    /// Entries at one level.
    pub fn entries_at(&self, level: LogLevel) -> impl Iterator<Item = &ConsoleLogEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
