//! Method tables: the explicit call surface of a target type
//!
//! A [`MethodTable`] maps [`MethodSignature`]s to handlers that decode JSON
//! arguments, call the real method on the target and encode its result.
//! Handlers are ordinary functions or method paths:
//!
//! ```rust
//! use intercept_core::{ArgKind, MethodTable};
//!
//! struct Calc;
//! impl Calc {
//!     fn add(&self, a: i64, b: i64) -> i64 { a + b }
//! }
//!
//! let table = MethodTable::<Calc>::new()
//!     .method("add", &[ArgKind::Int, ArgKind::Int], Calc::add);
//! assert_eq!(table.len(), 1);
//! ```

use crate::context::{join_kinds, ArgKind, MethodSignature};
use crate::error::{DelegatedCallError, InvocationError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Types that publish a method table for dynamic proxying
///
/// No thread-safety bound is placed on the target; a proxy is `Send` and
/// `Sync` when its target is `Send + Sync`.
pub trait Interceptable: Sized + 'static {
    /// The interceptable methods of this type
    fn method_table() -> MethodTable<Self>;
}

/// Target call with decoded arguments, ready to run
pub(crate) type PreparedCall<T> = Box<dyn FnOnce(&T) -> Result<Value, InvocationError>>;

type Handler<T> = Arc<dyn Fn(&str, &[Value]) -> Result<PreparedCall<T>, InvocationError> + Send + Sync>;

/// Callable that can serve as a method handler for targets of type `T`
///
/// Implemented for functions taking `&T` followed by up to four arguments.
/// `Args` is the tuple of argument types.
pub trait Method<T, Args>: Send + Sync + 'static {
    /// Return type of the method
    type Output;

    /// Invoke on `target`
    fn call(&self, target: &T, args: Args) -> Self::Output;
}

/// Argument tuple decodable from JSON values
pub trait DecodeArgs: Sized + 'static {
    /// Number of arguments in the tuple
    const ARITY: usize;

    /// Decode `values`, which the caller has already checked for arity
    ///
    /// # Errors
    /// Returns [`InvocationError::ArgumentDecode`] for the first argument
    /// that does not deserialize into its parameter type.
    fn decode(method: &str, values: &[Value]) -> Result<Self, InvocationError>;
}

fn decode_at<A: DeserializeOwned>(method: &str, values: &[Value], index: usize) -> Result<A, InvocationError> {
    let value = values.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|source| InvocationError::ArgumentDecode {
        method: method.to_string(),
        index,
        source,
    })
}

macro_rules! impl_method {
    ($arity:expr; $($ty:ident $idx:tt),*) => {
        impl<$($ty,)*> DecodeArgs for ($($ty,)*)
        where
            $($ty: DeserializeOwned + 'static,)*
        {
            const ARITY: usize = $arity;

            #[allow(unused_variables)]
            fn decode(method: &str, values: &[Value]) -> Result<Self, InvocationError> {
                Ok(($(decode_at::<$ty>(method, values, $idx)?,)*))
            }
        }

        impl<T, F, R, $($ty,)*> Method<T, ($($ty,)*)> for F
        where
            F: Fn(&T, $($ty,)*) -> R + Send + Sync + 'static,
        {
            type Output = R;

            #[allow(non_snake_case)]
            fn call(&self, target: &T, args: ($($ty,)*)) -> R {
                let ($($ty,)*) = args;
                self(target, $($ty,)*)
            }
        }
    };
}

impl_method!(0;);
impl_method!(1; A 0);
impl_method!(2; A 0, B 1);
impl_method!(3; A 0, B 1, C 2);
impl_method!(4; A 0, B 1, C 2, D 3);

pub(crate) struct MethodEntry<T> {
    pub(crate) signature: MethodSignature,
    pub(crate) arity: usize,
    handler: Handler<T>,
}

impl<T> MethodEntry<T> {
    pub(crate) fn prepare(&self, args: &[Value]) -> Result<PreparedCall<T>, InvocationError> {
        (self.handler)(&self.signature.name, args)
    }
}

impl<T> Clone for MethodEntry<T> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            arity: self.arity,
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Interceptable surface of `T`: signatures and their handlers
pub struct MethodTable<T> {
    entries: Vec<MethodEntry<T>>,
}

impl<T: 'static> MethodTable<T> {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an infallible method
    ///
    /// The return value is encoded as JSON; `()` becomes `null`.
    #[must_use]
    pub fn method<Args, M>(self, name: &str, params: &[ArgKind], method: M) -> Self
    where
        Args: DecodeArgs,
        M: Method<T, Args>,
        M::Output: Serialize,
    {
        self.register(name, params.to_vec(), method, |name, output| encode(name, &output))
    }

    /// Register a method returning `Result`
    ///
    /// `Err` values reach the caller as [`InvocationError::Delegated`].
    #[must_use]
    pub fn fallible<Args, M, V, E>(self, name: &str, params: &[ArgKind], method: M) -> Self
    where
        Args: DecodeArgs,
        M: Method<T, Args, Output = Result<V, E>>,
        V: Serialize,
        E: StdError + Send + Sync + 'static,
    {
        self.register(name, params.to_vec(), method, |name, output| match output {
            Ok(value) => encode(name, &value),
            Err(e) => Err(DelegatedCallError::new(e).into()),
        })
    }

    fn register<Args, M>(
        mut self,
        name: &str,
        params: Vec<ArgKind>,
        method: M,
        finish: fn(&str, M::Output) -> Result<Value, InvocationError>,
    ) -> Self
    where
        Args: DecodeArgs,
        M: Method<T, Args>,
    {
        let method = Arc::new(method);
        let handler: Handler<T> = Arc::new(move |name: &str, values: &[Value]| -> Result<PreparedCall<T>, InvocationError> {
            let args = Args::decode(name, values)?;
            let method = Arc::clone(&method);
            let name = name.to_string();
            let call: PreparedCall<T> = Box::new(move |target: &T| finish(&name, method.call(target, args)));
            Ok(call)
        });

        self.entries.push(MethodEntry {
            signature: MethodSignature::new(name, params),
            arity: Args::ARITY,
            handler,
        });
        self
    }
}

impl<T> MethodTable<T> {
    /// Number of registered entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered signatures, in registration order
    pub fn signatures(&self) -> impl Iterator<Item = &MethodSignature> {
        self.entries.iter().map(|e| &e.signature)
    }

    /// Check if any overload has this name
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.signature.name == name)
    }

    pub(crate) fn entries(&self) -> &[MethodEntry<T>] {
        &self.entries
    }

    /// Pick the overload for a call
    ///
    /// Among entries whose parameter kinds accept `args`, the one with the
    /// fewest `Any` parameters wins; ties go to the earliest registration.
    pub(crate) fn resolve(
        &self,
        type_name: &str,
        method: &str,
        args: &[Value],
    ) -> Result<&MethodEntry<T>, InvocationError> {
        let mut named = self.entries.iter().filter(|e| e.signature.name == method).peekable();
        if named.peek().is_none() {
            return Err(InvocationError::NoSuchMethod {
                type_name: type_name.to_string(),
                method: method.to_string(),
            });
        }

        named
            .filter(|e| e.signature.accepts(args))
            .min_by_key(|e| e.signature.wildcard_count())
            .ok_or_else(|| InvocationError::NoMatchingOverload {
                type_name: type_name.to_string(),
                method: method.to_string(),
                arguments: join_kinds(args.iter().map(ArgKind::of)),
            })
    }
}

impl<T: 'static> Default for MethodTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MethodTable<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> fmt::Debug for MethodTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.signatures().map(ToString::to_string)).finish()
    }
}

fn encode<V: Serialize>(method: &str, value: &V) -> Result<Value, InvocationError> {
    serde_json::to_value(value).map_err(|source| InvocationError::ReturnEncode {
        method: method.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("negative input")]
    struct Negative;

    struct Target;

    impl Target {
        fn twice(&self, n: i64) -> i64 {
            n * 2
        }

        fn twice_str(&self, s: String) -> String {
            format!("{s}{s}")
        }

        fn twice_any(&self, v: Value) -> String {
            format!("any:{v}")
        }

        fn root(&self, n: i64) -> Result<i64, Negative> {
            if n < 0 {
                Err(Negative)
            } else {
                Ok(n)
            }
        }

        fn nothing(&self) {}
    }

    fn table() -> MethodTable<Target> {
        MethodTable::<Target>::new()
            .method("twice", &[ArgKind::Any], Target::twice_any)
            .method("twice", &[ArgKind::Int], Target::twice)
            .method("twice", &[ArgKind::Str], Target::twice_str)
            .fallible("root", &[ArgKind::Int], Target::root)
            .method("nothing", &[], Target::nothing)
    }

    fn run(table: &MethodTable<Target>, method: &str, args: Vec<Value>) -> Result<Value, InvocationError> {
        let entry = table.resolve("Target", method, &args)?;
        let call = entry.prepare(&args)?;
        call(&Target)
    }

    #[test]
    fn arity_is_recorded() {
        let table = table();
        let arities: Vec<_> = table.entries().iter().map(|e| e.arity).collect();
        assert_eq!(arities, vec![1, 1, 1, 1, 0]);
    }

    #[test]
    fn resolve_prefers_specific_overload() {
        let table = table();
        assert_eq!(run(&table, "twice", vec![json!(4)]).unwrap(), json!(8));
        assert_eq!(run(&table, "twice", vec![json!("ab")]).unwrap(), json!("abab"));
        assert_eq!(run(&table, "twice", vec![json!(true)]).unwrap(), json!("any:true"));
    }

    #[test]
    fn unknown_method() {
        let err = run(&table(), "thrice", vec![]).unwrap_err();
        assert!(matches!(err, InvocationError::NoSuchMethod { .. }));
    }

    #[test]
    fn no_matching_overload_lists_kinds() {
        let err = run(&table(), "root", vec![json!("x")]).unwrap_err();
        assert_eq!(err.to_string(), "no overload of `Target::root` accepts (str)");
    }

    #[test]
    fn decode_failure_reports_position() {
        let table = MethodTable::<Target>::new().method("twice", &[ArgKind::Int], Target::twice);
        let err = run(&table, "twice", vec![json!(u64::MAX)]).unwrap_err();
        assert!(matches!(err, InvocationError::ArgumentDecode { index: 0, .. }));
    }

    #[test]
    fn fallible_error_is_delegated() {
        let err = run(&table(), "root", vec![json!(-1)]).unwrap_err();
        assert!(err.delegated_ref::<Negative>().is_some());
        assert_eq!(err.to_string(), "negative input");
    }

    #[test]
    fn unit_return_is_null() {
        assert_eq!(run(&table(), "nothing", vec![]).unwrap(), Value::Null);
    }

    #[test]
    fn debug_lists_signatures() {
        let table = MethodTable::<Target>::new().method("nothing", &[], Target::nothing);
        assert_eq!(format!("{table:?}"), "[\"nothing()\"]");
    }
}
