//! Per-call invocation data and method signatures
//!
//! [`InvocationContext`] describes one intercepted call and lives only for
//! the duration of that call. [`MethodSignature`] identifies an entry in a
//! method table, including its parameter kinds so overloads can coexist.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Coarse kind of an argument value, used for overload resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    /// JSON `null`
    Null,
    /// Boolean
    Bool,
    /// Integer (signed or unsigned)
    Int,
    /// Non-integral number
    Float,
    /// String
    Str,
    /// Array
    Array,
    /// Object
    Object,
    /// Accepts any argument
    Any,
}

impl ArgKind {
    /// Kind of a concrete argument value (never `Any`)
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Int,
            Value::Number(_) => Self::Float,
            Value::String(_) => Self::Str,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Whether a parameter of this kind accepts `value`
    #[inline]
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        self == Self::Any || self == Self::of(value)
    }

    /// Lowercase name used in messages
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method name plus parameter kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Parameter kinds, in order
    pub params: Vec<ArgKind>,
}

impl MethodSignature {
    /// Create new signature
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<ArgKind>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Number of parameters
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether every argument is accepted by the parameter in its position
    #[must_use]
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(kind, arg)| kind.accepts(arg))
    }

    /// Number of `Any` parameters; lower is more specific
    #[must_use]
    pub fn wildcard_count(&self) -> usize {
        self.params.iter().filter(|k| **k == ArgKind::Any).count()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, join_kinds(self.params.iter().copied()))
    }
}

/// Render kinds as `int, str, ...`
pub(crate) fn join_kinds(kinds: impl Iterator<Item = ArgKind>) -> String {
    kinds.map(ArgKind::as_str).collect::<Vec<_>>().join(", ")
}

/// Identifier pairing the entering and exiting events of one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    /// Fresh random id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One intercepted call
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationContext {
    /// Pairs this call's trace events
    pub call_id: CallId,
    /// Name of the target type
    pub type_name: &'static str,
    /// Method being called
    pub method: String,
    /// Arguments as supplied by the caller
    pub args: Vec<Value>,
}

impl InvocationContext {
    /// Create context for a new call
    #[must_use]
    pub fn new(type_name: &'static str, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            call_id: CallId::new(),
            type_name,
            method: method.into(),
            args,
        }
    }
}

/// Encode a typed argument for an [`InvocationContext`]
///
/// Values that cannot be represented as JSON are recorded as `null`; the
/// argument itself is still passed to the target untouched.
#[must_use]
pub fn to_arg<A: Serialize + ?Sized>(arg: &A) -> Value {
    serde_json::to_value(arg).unwrap_or(Value::Null)
}
