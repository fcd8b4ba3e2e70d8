//! Where status lines end up.

use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Info,
    Success,
    Valid,
    Invalid,
    Error,
}

impl StatusClass {
    pub fn label(&self) -> &'static str {
        match self {
            StatusClass::Info => "INFO",
            StatusClass::Success => "OK",
            StatusClass::Valid => "VALID",
            StatusClass::Invalid => "INVALID",
            StatusClass::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub class: StatusClass,
    pub text: String,
}

impl Status {
    pub fn new(class: StatusClass, text: impl Into<String>) -> Self {
        Self {
            class,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusClass::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusClass::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusClass::Error, text)
    }
}

pub trait StatusSink: Send + Sync {
    fn show(&self, status: &Status);
}

/// Prints each status on its own line on stdout.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl StatusSink for ConsoleDisplay {
    fn show(&self, status: &Status) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "[{}] {}", status.class.label(), status.text) {
            tracing::warn!("Failed to write status to stdout: {}", e);
        }
    }
}

/// Keeps every status it is shown.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    shown: Arc<Mutex<Vec<Status>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<Status> {
        match self.shown.lock() {
            Ok(shown) => shown.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<Status> {
        self.statuses().pop()
    }
}

impl StatusSink for RecordingDisplay {
    fn show(&self, status: &Status) {
        match self.shown.lock() {
            Ok(mut shown) => shown.push(status.clone()),
            Err(poisoned) => poisoned.into_inner().push(status.clone()),
        }
    }
}
