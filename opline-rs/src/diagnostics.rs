//! Advisory diagnostics.
//!
//! Diagnostics report registrations and dispatches that work but are probably
//! a mistake. They never change control flow or results, and the registry
//! emits them only when `warn_mode` is on.
//!
//! Where they go is up to the application, through a [`DiagnosticSink`]:
//!
//! [`TracingDiagnosticSink`] (the default) turns each event into a
//! `tracing::warn!`. [`MemoryDiagnosticSink`] keeps the latest events around
//! for inspection.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// What was noticed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Diagnostic {
    /// A root command was registered twice; the later registration won.
    Overwritten { name: String },

    /// Several siblings accepted the same token.
    AmbiguousPriority { command_line: String, token: String },
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::Overwritten { .. } => DiagnosticKind::Overwritten,
            Diagnostic::AmbiguousPriority { .. } => DiagnosticKind::AmbiguousPriority,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Overwritten { name } => write!(f, "Command '{}' was overwritten", name),
            Diagnostic::AmbiguousPriority {
                command_line,
                token,
            } => write!(
                f,
                "Ambiguous argument priority for '{}' in '{}'; register more specific arguments last",
                token, command_line
            ),
        }
    }
}

/// Discriminant of [`Diagnostic`], for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Overwritten,
    AmbiguousPriority,
}

/// A diagnostic as delivered to a sink. Every diagnostic is a warning.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEvent {
    pub timestamp: DateTime<Utc>,
    /// Id of the registry that emitted the event
    pub registry: String,
    pub diagnostic: Diagnostic,
}

impl DiagnosticEvent {
    pub fn new(registry: impl Into<String>, diagnostic: Diagnostic) -> Self {
        Self {
            timestamp: Utc::now(),
            registry: registry.into(),
            diagnostic,
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> String {
        self.diagnostic.to_string()
    }
}

/// Error type for sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Diagnostic sink not available: {0}")]
    Unavailable(String),
}

/// Destination for diagnostic events.
///
/// # Example
///
/// ```rust
/// use opline::diagnostics::{DiagnosticEvent, DiagnosticSink, SinkError};
///
/// struct StderrSink;
///
/// impl DiagnosticSink for StderrSink {
///     fn record(&self, event: DiagnosticEvent) -> Result<(), SinkError> {
///         eprintln!("[{}] {}", event.registry, event.message());
///         Ok(())
///     }
/// }
/// ```
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent) -> Result<(), SinkError>;

    /// Flush any buffered events
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Forwards events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn record(&self, event: DiagnosticEvent) -> Result<(), SinkError> {
        tracing::warn!(
            registry = %event.registry,
            kind = ?event.diagnostic.kind(),
            "{}",
            event.diagnostic
        );
        Ok(())
    }
}

/// Ring buffer of the most recent events.
pub struct MemoryDiagnosticSink {
    events: RwLock<VecDeque<DiagnosticEvent>>,
    capacity: usize,
}

impl MemoryDiagnosticSink {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// A sink holding at most `capacity` events; zero keeps nothing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            capacity,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<DiagnosticEvent>> {
        self.events.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Events oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.read().iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn find_by_kind(&self, kind: DiagnosticKind) -> Vec<DiagnosticEvent> {
        self.read()
            .iter()
            .filter(|e| e.diagnostic.kind() == kind)
            .cloned()
            .collect()
    }
}

impl Default for MemoryDiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for MemoryDiagnosticSink {
    fn record(&self, event: DiagnosticEvent) -> Result<(), SinkError> {
        if self.capacity == 0 {
            return Ok(());
        }
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
        Ok(())
    }
}

impl fmt::Debug for MemoryDiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDiagnosticSink")
            .field("count", &self.count())
            .field("capacity", &self.capacity)
            .finish()
    }
}
