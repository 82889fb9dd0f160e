//! Accumulates non-fatal export messages.
//!
//! Every entry is forwarded to the `log` facade as it is recorded and also kept, so
//! the caller can present the full list next to the finished document.

use std::fmt;

use crate::error::ExportError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Debug => "debug",
            Level::Warning => "warning",
            Level::Error => "error",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    /// Set when the message came from a typed error.
    pub error: Option<ExportError>,
}

#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(&mut self, text: impl Into<String>) {
        let message = text.into();
        log::debug!("{message}");
        self.entries.push(Diagnostic {
            level: Level::Debug,
            message,
            error: None,
        });
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        let message = text.into();
        log::warn!("{message}");
        self.entries.push(Diagnostic {
            level: Level::Warning,
            message,
            error: None,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let message = text.into();
        log::error!("{message}");
        self.entries.push(Diagnostic {
            level: Level::Error,
            message,
            error: None,
        });
    }

    /// Records a typed error at the given level.
    pub fn report(&mut self, level: Level, err: ExportError) {
        let message = err.to_string();
        match level {
            Level::Debug => log::debug!("{message}"),
            Level::Warning => log::warn!("{message}"),
            Level::Error => log::error!("{message}"),
        }
        self.entries.push(Diagnostic {
            level,
            message,
            error: Some(err),
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, level: Level) -> usize {
        self.entries.iter().filter(|d| d.level == level).count()
    }

    /// True if any recorded typed error satisfies `pred`.
    pub fn any_error(&self, pred: impl Fn(&ExportError) -> bool) -> bool {
        self.entries
            .iter()
            .any(|d| d.error.as_ref().is_some_and(&pred))
    }
}
