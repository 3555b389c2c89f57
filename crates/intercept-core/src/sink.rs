//! Trace events and the sinks that receive them
//!
//! The interception hook never writes to a console directly. It hands a
//! [`TraceEvent`] to a [`TraceSink`]; production code uses [`TracingSink`],
//! tests capture events with [`MemorySink`].

use crate::config::TraceLevel;
use crate::context::{CallId, InvocationContext};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Result of a delegated call, as seen by the exiting event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallOutcome {
    /// The target returned normally
    Returned,
    /// The target raised a failure with this message
    Failed {
        /// Display text of the failure
        message: String,
    },
}

/// Position of an event relative to the delegated call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TracePhase {
    /// Emitted before the target is called
    Entering,
    /// Emitted after the target returned or failed
    Exiting(CallOutcome),
}

impl TracePhase {
    /// Short label for structured output
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Entering => "entering",
            Self::Exiting(CallOutcome::Returned) => "returned",
            Self::Exiting(CallOutcome::Failed { .. }) => "failed",
        }
    }

    /// Whether this is an entering event
    #[inline]
    #[must_use]
    pub fn is_entering(&self) -> bool {
        matches!(self, Self::Entering)
    }
}

/// One observation emitted by the interception hook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEvent {
    /// Shared by the entering and exiting event of one call
    pub call_id: CallId,
    /// Severity requested by the proxy configuration
    pub level: TraceLevel,
    /// Name of the target type
    pub type_name: &'static str,
    /// Intercepted method
    pub method: String,
    /// Before or after the call
    pub phase: TracePhase,
    /// Call arguments, when the configuration records them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
}

impl TraceEvent {
    pub(crate) fn from_context(
        ctx: &InvocationContext,
        level: TraceLevel,
        phase: TracePhase,
        include_args: bool,
    ) -> Self {
        Self {
            call_id: ctx.call_id,
            level,
            type_name: ctx.type_name,
            method: ctx.method.clone(),
            phase,
            args: include_args.then(|| ctx.args.clone()),
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.phase {
            TracePhase::Entering => write!(f, "entering {}::{}", self.type_name, self.method),
            TracePhase::Exiting(CallOutcome::Returned) => {
                write!(f, "exiting {}::{}", self.type_name, self.method)
            }
            TracePhase::Exiting(CallOutcome::Failed { message }) => {
                write!(f, "exiting {}::{} (failed: {message})", self.type_name, self.method)
            }
        }
    }
}

/// Receiver of trace events
///
/// Implementations must not fail and should return quickly; they run
/// inline on the caller's thread, before and after the target call.
pub trait TraceSink: Send + Sync + fmt::Debug {
    /// Record one event
    fn record(&self, event: &TraceEvent);
}

/// Emits events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

macro_rules! emit_at {
    ($level:expr, $($rest:tt)+) => {
        match $level {
            TraceLevel::Trace => tracing::trace!($($rest)+),
            TraceLevel::Debug => tracing::debug!($($rest)+),
            TraceLevel::Info => tracing::info!($($rest)+),
            TraceLevel::Warn => tracing::warn!($($rest)+),
            TraceLevel::Error => tracing::error!($($rest)+),
        }
    };
}

impl TraceSink for TracingSink {
    fn record(&self, event: &TraceEvent) {
        let outcome = event.phase.label();
        match &event.args {
            Some(args) => {
                let args = Value::Array(args.clone());
                emit_at!(
                    event.level,
                    call_id = %event.call_id,
                    target = event.type_name,
                    method = %event.method,
                    outcome,
                    args = %args,
                    "{}",
                    event
                );
            }
            None => {
                emit_at!(
                    event.level,
                    call_id = %event.call_id,
                    target = event.type_name,
                    method = %event.method,
                    outcome,
                    "{}",
                    event
                );
            }
        }
    }
}

/// Keeps every event in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<Vec<TraceEvent>>,
}

impl MemorySink {
    /// Create empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.inner.lock().clone()
    }

    /// Drain recorded events
    #[must_use]
    pub fn take(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.inner.lock())
    }

    /// Number of recorded events
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Forget all events
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl TraceSink for MemorySink {
    fn record(&self, event: &TraceEvent) {
        self.inner.lock().push(event.clone());
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&self, _event: &TraceEvent) {}
}
