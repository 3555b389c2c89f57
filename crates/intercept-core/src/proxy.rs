//! Proxy factory and the interception hook
//!
//! # Core Concepts
//!
//! - [`ProxyFactory`]: binds a target, validates its method table and hands
//!   out [`Proxy`] instances sharing one trace sink and configuration
//! - [`Proxy`]: routes every call through the hook: entering event,
//!   delegated call, exiting event, unchanged result
//!
//! Two call paths share the hook. Typed calls go through
//! [`Proxy::intercept`] and [`Proxy::intercept_result`], usually generated
//! by [`crate::delegate!`]. Dynamic calls go through [`Proxy::invoke`] and
//! the target's [`MethodTable`].

use crate::config::ProxyConfig;
use crate::context::{InvocationContext, MethodSignature};
use crate::error::{InvocationError, ProxyConstructionError};
use crate::sink::{CallOutcome, TraceEvent, TracePhase, TraceSink, TracingSink};
use crate::table::{Interceptable, MethodTable};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Builds proxies around targets
#[derive(Debug, Clone)]
pub struct ProxyFactory {
    sink: Arc<dyn TraceSink>,
    config: ProxyConfig,
}

impl ProxyFactory {
    /// Factory tracing through `tracing` with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: Arc::new(TracingSink),
            config: ProxyConfig::default(),
        }
    }

    /// With trace sink
    #[inline]
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ProxyConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Proxy a target using its own method table
    ///
    /// # Errors
    /// Returns [`ProxyConstructionError`] if the table is empty or invalid.
    pub fn create<T: Interceptable>(
        &self,
        target: Arc<T>,
    ) -> Result<Proxy<T>, ProxyConstructionError> {
        self.create_with_table(target, T::method_table())
    }

    /// Proxy a target using a caller-supplied method table
    ///
    /// # Errors
    /// Returns [`ProxyConstructionError`] if the table is empty or invalid.
    pub fn create_with_table<T: 'static>(
        &self,
        target: Arc<T>,
        table: MethodTable<T>,
    ) -> Result<Proxy<T>, ProxyConstructionError> {
        let type_name = short_type_name::<T>();
        validate(type_name, &table)?;
        Ok(self.bind(target, type_name, table))
    }

    /// Proxy a target for typed calls only
    ///
    /// The proxy has an empty method table; its surface is whatever trait
    /// has been implemented for `Proxy<T>`, typically with
    /// [`crate::delegate!`]. [`Proxy::invoke`] always reports
    /// [`InvocationError::NoSuchMethod`].
    #[must_use]
    pub fn wrap<T: 'static>(&self, target: Arc<T>) -> Proxy<T> {
        self.bind(target, short_type_name::<T>(), MethodTable::new())
    }

    fn bind<T>(&self, target: Arc<T>, type_name: &'static str, table: MethodTable<T>) -> Proxy<T> {
        tracing::debug!(target = type_name, methods = table.len(), "proxy created");
        Proxy {
            target,
            type_name,
            table: Arc::new(table),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
        }
    }
}

impl Default for ProxyFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn validate<T>(type_name: &str, table: &MethodTable<T>) -> Result<(), ProxyConstructionError> {
    if table.is_empty() {
        return Err(ProxyConstructionError::NoInterceptableMethods {
            type_name: type_name.to_string(),
        });
    }

    let mut seen: HashSet<&MethodSignature> = HashSet::with_capacity(table.len());
    for entry in table.entries() {
        if entry.signature.name.is_empty() {
            return Err(ProxyConstructionError::EmptyMethodName {
                type_name: type_name.to_string(),
            });
        }
        if entry.signature.arity() != entry.arity {
            return Err(ProxyConstructionError::ArityMismatch {
                signature: entry.signature.clone(),
                declared: entry.signature.arity(),
                actual: entry.arity,
            });
        }
        if !seen.insert(&entry.signature) {
            return Err(ProxyConstructionError::DuplicateSignature {
                type_name: type_name.to_string(),
                signature: entry.signature.clone(),
            });
        }
    }
    Ok(())
}

/// Last path segment of `T`'s name
///
/// Only plain paths are shortened. Tuples, references, arrays and generic
/// types keep their full name so no part of it is lost.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let plain_path = full.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ':');
    match full.rfind("::") {
        Some(pos) if plain_path => &full[pos + 2..],
        _ => full,
    }
}

/// Stand-in for a target; every call passes through the interception hook
pub struct Proxy<T> {
    target: Arc<T>,
    type_name: &'static str,
    table: Arc<MethodTable<T>>,
    sink: Arc<dyn TraceSink>,
    config: ProxyConfig,
}

impl<T> Proxy<T> {
    /// The bound target; the same `Arc` for the proxy's whole lifetime
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    /// Name of the target type, as it appears in trace events
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Signatures available to [`Proxy::invoke`]
    #[inline]
    #[must_use]
    pub fn method_table(&self) -> &MethodTable<T> {
        &self.table
    }

    /// Configuration in effect
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Intercept a call whose return value carries no failure
    pub fn intercept<R>(&self, method: &str, args: Vec<Value>, call: impl FnOnce(&T) -> R) -> R {
        let ctx = InvocationContext::new(self.type_name, method, args);
        self.emit(&ctx, TracePhase::Entering);
        let value = call(&*self.target);
        self.emit(&ctx, TracePhase::Exiting(CallOutcome::Returned));
        value
    }

    /// Intercept a call returning `Result`; `Err` is passed back untouched
    ///
    /// # Errors
    /// Returns exactly the error produced by `call`.
    pub fn intercept_result<R, E: fmt::Display>(
        &self,
        method: &str,
        args: Vec<Value>,
        call: impl FnOnce(&T) -> Result<R, E>,
    ) -> Result<R, E> {
        let ctx = InvocationContext::new(self.type_name, method, args);
        self.emit(&ctx, TracePhase::Entering);
        let result = call(&*self.target);
        self.exit(&ctx, result.as_ref().err());
        result
    }

    /// Call a method by name through the method table
    ///
    /// Resolution and argument decoding happen before the entering event;
    /// their failures produce no trace output.
    ///
    /// # Errors
    /// Dispatch failures ([`InvocationError::NoSuchMethod`],
    /// [`InvocationError::NoMatchingOverload`],
    /// [`InvocationError::ArgumentDecode`]) or the target's own failure as
    /// [`InvocationError::Delegated`].
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, InvocationError> {
        let entry = self.table.resolve(self.type_name, method, &args)?;
        let call = entry.prepare(&args)?;

        let ctx = InvocationContext::new(self.type_name, method, args);
        self.emit(&ctx, TracePhase::Entering);
        let result = call(&*self.target);
        self.exit(&ctx, result.as_ref().err());
        result
    }

    fn exit<E: fmt::Display>(&self, ctx: &InvocationContext, failure: Option<&E>) {
        match failure {
            None => self.emit(ctx, TracePhase::Exiting(CallOutcome::Returned)),
            Some(e) if self.config.trace_exit_on_failure => self.emit(
                ctx,
                TracePhase::Exiting(CallOutcome::Failed {
                    message: e.to_string(),
                }),
            ),
            Some(_) => {}
        }
    }

    fn emit(&self, ctx: &InvocationContext, phase: TracePhase) {
        let event = TraceEvent::from_context(ctx, self.config.trace_level, phase, self.config.include_arguments);
        self.sink.record(&event);
    }
}

impl<T> Clone for Proxy<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            type_name: self.type_name,
            table: Arc::clone(&self.table),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
        }
    }
}

impl<T> fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("type_name", &self.type_name)
            .field("methods", &*self.table)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ArgKind;
    use crate::sink::MemorySink;
    use serde_json::json;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct Echo;

    impl Echo {
        fn echo(&self, s: String) -> String {
            s
        }
    }

    fn capture() -> (Arc<MemorySink>, ProxyFactory) {
        let sink = Arc::new(MemorySink::new());
        let factory = ProxyFactory::new().with_sink(sink.clone());
        (sink, factory)
    }

    #[test]
    fn short_names() {
        assert_eq!(short_type_name::<Echo>(), "Echo");
        assert_eq!(short_type_name::<u8>(), "u8");
    }

    #[test]
    fn composite_names_kept_whole() {
        assert_eq!(
            short_type_name::<(u8, String)>(),
            std::any::type_name::<(u8, String)>()
        );
        assert_eq!(
            short_type_name::<Vec<String>>(),
            std::any::type_name::<Vec<String>>()
        );
        assert_eq!(short_type_name::<&Echo>(), std::any::type_name::<&Echo>());
    }

    #[derive(Debug, Default)]
    struct Counter {
        total: Cell<i64>,
    }

    impl Counter {
        fn bump(&self, by: i64) -> i64 {
            self.total.set(self.total.get() + by);
            self.total.get()
        }
    }

    #[test]
    fn single_threaded_target_via_table() {
        let (sink, factory) = capture();
        let table = MethodTable::<Counter>::new().method("bump", &[ArgKind::Int], Counter::bump);
        let proxy = factory.create_with_table(Arc::new(Counter::default()), table).unwrap();

        assert_eq!(proxy.invoke("bump", vec![json!(2)]).unwrap(), json!(2));
        assert_eq!(proxy.invoke("bump", vec![json!(3)]).unwrap(), json!(5));
        assert_eq!(proxy.target().total.get(), 5);
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn single_threaded_target_via_wrap() {
        let (sink, factory) = capture();
        let proxy = factory.wrap(Arc::new(Counter::default()));

        assert_eq!(proxy.intercept("bump", vec![json!(4)], |c| c.bump(4)), 4);
        assert_eq!(proxy.type_name(), "Counter");
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn empty_table_rejected() {
        let (sink, factory) = capture();
        let err = factory.create_with_table(Arc::new(Echo), MethodTable::new()).unwrap_err();

        assert_eq!(
            err,
            ProxyConstructionError::NoInterceptableMethods {
                type_name: "Echo".into()
            }
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn arity_mismatch_rejected() {
        let (_, factory) = capture();
        let table = MethodTable::<Echo>::new().method("echo", &[ArgKind::Str, ArgKind::Str], Echo::echo);
        let err = factory.create_with_table(Arc::new(Echo), table).unwrap_err();

        assert!(matches!(err, ProxyConstructionError::ArityMismatch { declared: 2, actual: 1, .. }));
    }

    #[test]
    fn empty_name_rejected() {
        let (_, factory) = capture();
        let table = MethodTable::<Echo>::new().method("", &[ArgKind::Str], Echo::echo);
        let err = factory.create_with_table(Arc::new(Echo), table).unwrap_err();

        assert!(matches!(err, ProxyConstructionError::EmptyMethodName { .. }));
    }

    #[test]
    fn duplicate_signature_rejected() {
        let (_, factory) = capture();
        let table = MethodTable::<Echo>::new()
            .method("echo", &[ArgKind::Str], Echo::echo)
            .method("echo", &[ArgKind::Str], Echo::echo);
        let err = factory.create_with_table(Arc::new(Echo), table).unwrap_err();

        assert!(matches!(err, ProxyConstructionError::DuplicateSignature { .. }));
    }

    #[test]
    fn dispatch_failure_emits_nothing() {
        let (sink, factory) = capture();
        let table = MethodTable::<Echo>::new().method("echo", &[ArgKind::Str], Echo::echo);
        let proxy = factory.create_with_table(Arc::new(Echo), table).unwrap();

        assert!(proxy.invoke("shout", vec![json!("a")]).is_err());
        assert!(proxy.invoke("echo", vec![json!(1)]).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn wrapped_proxy_has_no_dynamic_surface() {
        let (_, factory) = capture();
        let proxy = factory.wrap(Arc::new(Echo));

        assert!(proxy.method_table().is_empty());
        let err = proxy.invoke("echo", vec![json!("a")]).unwrap_err();
        assert!(matches!(err, InvocationError::NoSuchMethod { .. }));
    }

    #[test]
    fn intercept_pairs_events() {
        let (sink, factory) = capture();
        let proxy = factory.wrap(Arc::new(Echo));

        let out = proxy.intercept("echo", vec![], |t| t.echo("hi".into()));
        assert_eq!(out, "hi");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].call_id, events[1].call_id);
        assert_eq!(events[0].phase, TracePhase::Entering);
        assert_eq!(events[1].phase, TracePhase::Exiting(CallOutcome::Returned));
    }

    #[test]
    fn failure_exit_can_be_suppressed() {
        let sink = Arc::new(MemorySink::new());
        let factory = ProxyFactory::new()
            .with_sink(sink.clone())
            .with_config(ProxyConfig::new().with_exit_on_failure(false));
        let proxy = factory.wrap(Arc::new(Echo));

        let result: Result<(), String> = proxy.intercept_result("fail", vec![], |_| Err("nope".to_string()));
        assert_eq!(result, Err("nope".to_string()));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn clones_share_target() {
        let (_, factory) = capture();
        let proxy = factory.wrap(Arc::new(Echo));
        let copy = proxy.clone();

        assert!(Arc::ptr_eq(proxy.target(), copy.target()));
    }
}
