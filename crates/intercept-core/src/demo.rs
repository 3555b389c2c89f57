//! Reference target: a small calculator
//!
//! Used by the `intercept-demo` binary and by the test suite. It exercises
//! both call paths: [`Calculator`] is implemented for
//! `Proxy<BasicCalculator>` with [`crate::delegate!`], and
//! [`BasicCalculator`] publishes a method table that overloads `add` for
//! integers and floats.

use crate::context::ArgKind;
use crate::table::{Interceptable, MethodTable};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

/// Failures raised by [`BasicCalculator`]
#[derive(Debug, thiserror::Error)]
pub enum CalcError {
    /// Divisor was zero
    #[error("division by zero")]
    DivisionByZero,

    /// Result does not fit in an `i64`
    #[error("{op} overflowed")]
    Overflow {
        /// Operation that overflowed
        op: &'static str,
    },

    /// Text operand is not an integer
    #[error("not a number: {input}")]
    NotANumber {
        /// Rejected text
        input: String,
        /// Parser failure
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Capability surface shared by the real calculator and its proxy
pub trait Calculator {
    /// Wrapping sum
    fn add(&self, a: i64, b: i64) -> i64;
    /// Integer quotient
    ///
    /// # Errors
    /// [`CalcError::DivisionByZero`] or [`CalcError::Overflow`].
    fn divide(&self, a: i64, b: i64) -> Result<i64, CalcError>;
    /// Parse `input` and add `b`
    ///
    /// # Errors
    /// [`CalcError::NotANumber`] or [`CalcError::Overflow`].
    fn parse_add(&self, input: String, b: i64) -> Result<i64, CalcError>;
    /// Reset memory to zero
    fn clear(&self);
    /// Last remembered result
    fn memory(&self) -> i64;
}

/// Calculator that remembers its last result and counts real calls
#[derive(Debug, Default)]
pub struct BasicCalculator {
    memory: AtomicI64,
    calls: AtomicUsize,
}

impl BasicCalculator {
    /// Create calculator with empty memory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of method bodies actually executed
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Float overload of `add`, reachable through the method table
    pub fn add_float(&self, a: f64, b: f64) -> f64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        a + b
    }

    fn remember(&self, value: i64) -> i64 {
        self.memory.store(value, Ordering::SeqCst);
        value
    }
}

impl Calculator for BasicCalculator {
    fn add(&self, a: i64, b: i64) -> i64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.remember(a.wrapping_add(b))
    }

    fn divide(&self, a: i64, b: i64) -> Result<i64, CalcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if b == 0 {
            return Err(CalcError::DivisionByZero);
        }
        let quotient = a.checked_div(b).ok_or(CalcError::Overflow { op: "divide" })?;
        Ok(self.remember(quotient))
    }

    fn parse_add(&self, input: String, b: i64) -> Result<i64, CalcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let a: i64 = input
            .trim()
            .parse()
            .map_err(|source| CalcError::NotANumber { input, source })?;
        let sum = a.checked_add(b).ok_or(CalcError::Overflow { op: "parse_add" })?;
        Ok(self.remember(sum))
    }

    fn clear(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.memory.store(0, Ordering::SeqCst);
    }

    fn memory(&self) -> i64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.memory.load(Ordering::SeqCst)
    }
}

crate::delegate! {
    impl Calculator for BasicCalculator {
        fn add(&self, a: i64, b: i64) -> i64;
        fallible fn divide(&self, a: i64, b: i64) -> Result<i64, CalcError>;
        fallible fn parse_add(&self, input: String, b: i64) -> Result<i64, CalcError>;
        fn clear(&self);
        fn memory(&self) -> i64;
    }
}

impl Interceptable for BasicCalculator {
    fn method_table() -> MethodTable<Self> {
        MethodTable::<Self>::new()
            .method("add", &[ArgKind::Int, ArgKind::Int], <Self as Calculator>::add)
            .method("add", &[ArgKind::Float, ArgKind::Float], Self::add_float)
            .fallible("divide", &[ArgKind::Int, ArgKind::Int], <Self as Calculator>::divide)
            .fallible("parse_add", &[ArgKind::Str, ArgKind::Int], <Self as Calculator>::parse_add)
            .method("clear", &[], <Self as Calculator>::clear)
            .method("memory", &[], <Self as Calculator>::memory)
    }
}
