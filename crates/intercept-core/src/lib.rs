//! Intercept Core
//!
//! Proxies that observe every method call on a target: an entering trace
//! event, the unchanged call, an exiting trace event, the unchanged result.
//!
//! # Core Concepts
//!
//! - [`ProxyFactory`]: binds a target and validates its surface
//! - [`Proxy`]: the stand-in; every call runs the interception hook
//! - [`MethodTable`] / [`Interceptable`]: explicit method tables for calls by name
//! - [`delegate!`]: compile-time trait delegation for typed calls
//! - [`TraceSink`]: where trace events go ([`TracingSink`], [`MemorySink`], [`NullSink`])
//! - [`demo`]: a calculator target wired for both call paths
//!
//! # Example
//!
//! ```rust
//! use intercept_core::{ArgKind, Interceptable, MemorySink, MethodTable, ProxyFactory};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct Calculator;
//!
//! impl Calculator {
//!     fn add(&self, a: i64, b: i64) -> i64 { a + b }
//! }
//!
//! impl Interceptable for Calculator {
//!     fn method_table() -> MethodTable<Self> {
//!         MethodTable::<Self>::new().method("add", &[ArgKind::Int, ArgKind::Int], Calculator::add)
//!     }
//! }
//!
//! let sink = Arc::new(MemorySink::new());
//! let factory = ProxyFactory::new().with_sink(sink.clone());
//! let proxy = factory.create(Arc::new(Calculator)).unwrap();
//!
//! assert_eq!(proxy.invoke("add", vec![json!(2), json!(3)]).unwrap(), json!(5));
//! assert_eq!(sink.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod context;
mod delegation;
pub mod demo;
pub mod error;
pub mod proxy;
pub mod sink;
pub mod table;
pub mod telemetry;

// Re-exports
pub use config::{ProxyConfig, TraceLevel};
pub use context::{to_arg, ArgKind, CallId, InvocationContext, MethodSignature};
pub use error::{ConfigError, DelegatedCallError, InvocationError, ProxyConstructionError};
pub use proxy::{Proxy, ProxyFactory};
pub use sink::{CallOutcome, MemorySink, NullSink, TraceEvent, TracePhase, TraceSink, TracingSink};
pub use table::{DecodeArgs, Interceptable, Method, MethodTable};
pub use telemetry::{init_subscriber, LogFormat, TelemetryError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and using proxies
    pub use crate::{
        delegate, ArgKind, Interceptable, InvocationError, MemorySink, MethodTable, Proxy,
        ProxyConfig, ProxyConstructionError, ProxyFactory, TraceSink,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
