//! Error types for Intercept Core
//!
//! Provides error handling for:
//! - Proxy construction failures (invalid or empty method tables)
//! - Dynamic dispatch failures (unknown methods, unmatched overloads)
//! - Failures raised by the target itself, carried through unchanged
//! - Configuration loading

use crate::context::MethodSignature;
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

/// Raised by the factory when a target cannot be intercepted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyConstructionError {
    /// The method table exposes nothing to intercept
    #[error("type `{type_name}` exposes no interceptable methods")]
    NoInterceptableMethods {
        /// Target type name
        type_name: String,
    },

    /// A method was registered without a name
    #[error("type `{type_name}` registers a method with an empty name")]
    EmptyMethodName {
        /// Target type name
        type_name: String,
    },

    /// Two entries cannot be told apart by their argument kinds
    #[error("type `{type_name}` registers `{signature}` more than once")]
    DuplicateSignature {
        /// Target type name
        type_name: String,
        /// Offending signature
        signature: MethodSignature,
    },

    /// Declared parameter kinds disagree with the handler's arity
    #[error("`{signature}` declares {declared} parameters but its handler takes {actual}")]
    ArityMismatch {
        /// Offending signature
        signature: MethodSignature,
        /// Number of declared parameter kinds
        declared: usize,
        /// Number of arguments the handler accepts
        actual: usize,
    },
}

/// Failure raised by the target's own method implementation
///
/// Display and `source()` are forwarded to the wrapped error, so callers
/// observe the same message and cause chain as a direct call.
#[derive(Debug)]
pub struct DelegatedCallError(Box<dyn StdError + Send + Sync + 'static>);

impl DelegatedCallError {
    /// Wrap a target error
    #[must_use]
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Box::new(error))
    }

    /// Borrow the original error as its concrete type
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Check whether the original error is of type `E`
    #[inline]
    #[must_use]
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.0.is::<E>()
    }

    /// Recover the original error as its concrete type
    ///
    /// # Errors
    /// Returns `self` unchanged when the wrapped error is not an `E`.
    pub fn downcast<E: StdError + 'static>(self) -> Result<E, Self> {
        self.0.downcast::<E>().map(|e| *e).map_err(Self)
    }

    /// Unwrap into the boxed original error
    #[must_use]
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Display for DelegatedCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for DelegatedCallError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Failures of a dynamically dispatched call
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// No method with this name is registered
    #[error("type `{type_name}` has no method `{method}`")]
    NoSuchMethod {
        /// Target type name
        type_name: String,
        /// Requested method
        method: String,
    },

    /// The name exists but no overload accepts these argument kinds
    #[error("no overload of `{type_name}::{method}` accepts ({arguments})")]
    NoMatchingOverload {
        /// Target type name
        type_name: String,
        /// Requested method
        method: String,
        /// Kinds of the supplied arguments, comma separated
        arguments: String,
    },

    /// An argument matched its kind but not the handler's parameter type
    #[error("argument {index} of `{method}` could not be decoded: {source}")]
    ArgumentDecode {
        /// Requested method
        method: String,
        /// Zero-based argument position
        index: usize,
        /// Decoder failure
        #[source]
        source: serde_json::Error,
    },

    /// The return value could not be represented as a JSON value
    #[error("return value of `{method}` could not be encoded: {source}")]
    ReturnEncode {
        /// Requested method
        method: String,
        /// Encoder failure
        #[source]
        source: serde_json::Error,
    },

    /// The target raised this failure
    #[error(transparent)]
    Delegated(#[from] DelegatedCallError),
}

impl InvocationError {
    /// Whether the failure came from the target rather than from dispatch
    #[inline]
    #[must_use]
    pub fn is_delegated(&self) -> bool {
        matches!(self, Self::Delegated(_))
    }

    /// Borrow the target's original error, if this is a delegated failure
    #[must_use]
    pub fn delegated_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Delegated(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File location
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The contents are not a valid configuration
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ArgKind;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct Root;

    #[derive(Debug, thiserror::Error)]
    #[error("write failed")]
    struct WriteFailed(#[source] Root);

    #[test]
    fn delegated_error_is_transparent() {
        let err = DelegatedCallError::new(WriteFailed(Root));

        assert_eq!(err.to_string(), "write failed");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk on fire"));
        assert!(err.is::<WriteFailed>());
    }

    #[test]
    fn delegated_error_downcasts_back() {
        let err = DelegatedCallError::new(Root);
        assert!(err.downcast::<std::fmt::Error>().is_err());

        let err = DelegatedCallError::new(Root);
        assert!(err.downcast::<Root>().is_ok());
    }

    #[test]
    fn invocation_error_forwards_delegated_message() {
        let err = InvocationError::from(DelegatedCallError::new(Root));

        assert!(err.is_delegated());
        assert_eq!(err.to_string(), "disk on fire");
        assert!(err.delegated_ref::<Root>().is_some());
    }

    #[test]
    fn construction_error_names_signature() {
        let err = ProxyConstructionError::DuplicateSignature {
            type_name: "Calc".into(),
            signature: MethodSignature::new("add", vec![ArgKind::Int, ArgKind::Int]),
        };

        assert_eq!(
            err.to_string(),
            "type `Calc` registers `add(int, int)` more than once"
        );
    }
}
