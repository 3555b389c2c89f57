//! Testing utilities for Intercept workspace
//!
//! Shared fixtures, factories, and trace assertions.

#![allow(missing_docs)]

use intercept_core::{Interceptable, MemorySink, MethodTable, ProxyFactory, TraceEvent, TracePhase};
use std::sync::Arc;

pub use intercept_core::demo::{BasicCalculator, CalcError, Calculator};

/// Type that publishes nothing to intercept
#[derive(Debug, Default)]
pub struct Opaque;

impl Interceptable for Opaque {
    fn method_table() -> MethodTable<Self> {
        MethodTable::new()
    }
}

/// Factory recording into a fresh [`MemorySink`]
#[must_use]
pub fn capture_factory() -> (Arc<MemorySink>, ProxyFactory) {
    let sink = Arc::new(MemorySink::new());
    let factory = ProxyFactory::new().with_sink(sink.clone());
    (sink, factory)
}

/// `(method, phase label)` pairs, for readable sequence assertions
#[must_use]
pub fn phases(events: &[TraceEvent]) -> Vec<(String, &'static str)> {
    events
        .iter()
        .map(|e| (e.method.clone(), e.phase.label()))
        .collect()
}

/// Assert `events` is exactly one entering/exiting pair for `method`
///
/// # Panics
/// Panics when the events are not a matched pair.
pub fn assert_bracketed(events: &[TraceEvent], method: &str) {
    assert_eq!(events.len(), 2, "expected one entering and one exiting event: {events:?}");
    assert_eq!(events[0].method, method);
    assert_eq!(events[1].method, method);
    assert_eq!(events[0].phase, TracePhase::Entering);
    assert!(matches!(events[1].phase, TracePhase::Exiting(_)));
    assert_eq!(events[0].call_id, events[1].call_id);
}
