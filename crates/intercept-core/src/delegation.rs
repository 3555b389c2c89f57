//! Compile-time delegation for interface-based proxies
//!
//! [`delegate!`](crate::delegate) implements a trait for `Proxy<Target>` by
//! forwarding every listed method through the interception hook to the
//! target's own implementation of the same trait.

/// Implement a trait for `Proxy<Target>` by delegating through the hook
///
/// Each method is listed with its signature. Methods returning `Result`
/// are prefixed with `fallible` so a failure is traced as such; it is
/// still returned to the caller unchanged. Argument types must implement
/// `serde::Serialize` so they can appear in the invocation context.
///
/// Only `&self` methods with concrete argument types are accepted. Methods
/// taking `&mut self` or `self`, generic methods, and methods with
/// non-`Serialize` arguments are rejected at compile time; implement the
/// trait for the proxy by hand with [`crate::Proxy::intercept`] for those.
///
/// ```compile_fail
/// use intercept_core::delegate;
///
/// pub trait Counter {
///     fn bump(&mut self);
/// }
///
/// pub struct Tally(u32);
///
/// impl Counter for Tally {
///     fn bump(&mut self) { self.0 += 1; }
/// }
///
/// delegate! {
///     impl Counter for Tally {
///         fn bump(&mut self);
///     }
/// }
/// ```
///
/// ```rust
/// use intercept_core::{delegate, ProxyFactory};
/// use std::sync::Arc;
///
/// pub trait Greeter {
///     fn greet(&self, name: String) -> String;
///     fn check(&self, name: String) -> Result<(), std::fmt::Error>;
///     fn wave(&self);
/// }
///
/// pub struct Polite;
///
/// impl Greeter for Polite {
///     fn greet(&self, name: String) -> String { format!("hello {name}") }
///     fn check(&self, _name: String) -> Result<(), std::fmt::Error> { Ok(()) }
///     fn wave(&self) {}
/// }
///
/// delegate! {
///     impl Greeter for Polite {
///         fn greet(&self, name: String) -> String;
///         fallible fn check(&self, name: String) -> Result<(), std::fmt::Error>;
///         fn wave(&self);
///     }
/// }
///
/// let proxy = ProxyFactory::new().wrap(Arc::new(Polite));
/// assert_eq!(proxy.greet("ada".into()), "hello ada");
/// ```
#[macro_export]
macro_rules! delegate {
    (impl $trait_:ident for $target:ty { $($body:tt)* }) => {
        impl $trait_ for $crate::Proxy<$target> {
            $crate::delegate!(@methods $target, $trait_; $($body)*);
        }
    };

    (@methods $target:ty, $trait_:ident;) => {};

    (@methods $target:ty, $trait_:ident;
        fallible fn $name:ident(&self $(, $arg:ident : $argty:ty)*) -> $ret:ty;
        $($rest:tt)*
    ) => {
        fn $name(&self $(, $arg: $argty)*) -> $ret {
            self.intercept_result(
                ::std::stringify!($name),
                ::std::vec![$($crate::to_arg(&$arg)),*],
                |target| <$target as $trait_>::$name(target $(, $arg)*),
            )
        }
        $crate::delegate!(@methods $target, $trait_; $($rest)*);
    };

    (@methods $target:ty, $trait_:ident;
        fn $name:ident(&self $(, $arg:ident : $argty:ty)*) -> $ret:ty;
        $($rest:tt)*
    ) => {
        fn $name(&self $(, $arg: $argty)*) -> $ret {
            self.intercept(
                ::std::stringify!($name),
                ::std::vec![$($crate::to_arg(&$arg)),*],
                |target| <$target as $trait_>::$name(target $(, $arg)*),
            )
        }
        $crate::delegate!(@methods $target, $trait_; $($rest)*);
    };

    (@methods $target:ty, $trait_:ident;
        fn $name:ident(&self $(, $arg:ident : $argty:ty)*);
        $($rest:tt)*
    ) => {
        fn $name(&self $(, $arg: $argty)*) {
            self.intercept(
                ::std::stringify!($name),
                ::std::vec![$($crate::to_arg(&$arg)),*],
                |target| <$target as $trait_>::$name(target $(, $arg)*),
            )
        }
        $crate::delegate!(@methods $target, $trait_; $($rest)*);
    };
}
