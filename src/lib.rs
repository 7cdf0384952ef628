//! # assert-introspect - Failing Assertions That Explain Themselves
//!
//! An instrumentation pass for C-style `assert(cond)` sites. Given the
//! condition as an expression tree, it produces a replacement whose failure
//! handler prints the expression, the value of every operand the failed
//! evaluation actually reached, and a deduplicated list of the variables and
//! calls involved, before aborting exactly as the original assertion would.
//!
//! ## Features
//!
//! - **Single evaluation** - every variable read and call runs once, however
//!   often the diagnostic mentions it
//! - **Short-circuit fidelity** - operands skipped by `&&`/`||` are never
//!   evaluated or printed
//! - **Fail-open** - anything that prevents instrumentation leaves the
//!   original assertion in place
//! - **Reference runtime** - replacement trees can be executed in-process for
//!   testing
//!
//! ## Quick Start
//!
//! ```rust
//! use assert_introspect::ast::{AssertionSite, CType, CompareOp, Expression, SourceLocation};
//! use assert_introspect::compiler::{InstrumentOptions, Instrumenter, RuntimeRoutines};
//! use assert_introspect::runtime::{Environment, Evaluator, Outcome, Value};
//!
//! # fn main() -> assert_introspect::Result<()> {
//! // assert(1 != n && n != 6)
//! let n = || Expression::var(1, "n", CType::int());
//! let condition = Expression::and(
//!     Expression::compare(CompareOp::Ne, Expression::int(1), n()),
//!     Expression::compare(CompareOp::Ne, n(), Expression::int(6)),
//! );
//! let site = AssertionSite::new(
//!     condition,
//!     "1 != n && n != 6",
//!     SourceLocation::new("demo.c", 7, 5),
//!     "main",
//! );
//!
//! let options = InstrumentOptions {
//!     colors: false,
//!     ..InstrumentOptions::default()
//! };
//! let result = Instrumenter::new(options).instrument(&site, &RuntimeRoutines::libc());
//! assert!(result.instrumented);
//!
//! // Run it with n = 6
//! let env = Environment::new().with_variable(1, Value::Int(6));
//! let outcome = Evaluator::new(env).run(&result.tree)?;
//! let output = outcome.output().unwrap_or_default();
//! assert!(output.contains("  assert((...) && (6 != 6))\n"));
//! assert!(output.contains("  n = 6\n"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  ast          AssertionSite, Expression, CType           │
//! ├──────────────────────────────────────────────────────────┤
//! │  compiler     classify → materialize → lower → emit      │
//! │               registry (identity/color), format, repr    │
//! ├──────────────────────────────────────────────────────────┤
//! │  runtime      Environment, Evaluator, printf             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`ast`] - input expression trees and assertion sites
//! - [`compiler`] - the instrumentation pipeline and replacement trees
//! - [`runtime`] - reference executor for replacement trees
//! - [`error`] - error types and severity classification

#![warn(missing_docs)]
#![allow(clippy::only_used_in_recursion)] // recursive lowering helpers

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod ast;
pub mod compiler;
pub mod error;
pub mod runtime;

// Re-export main types
pub use ast::{AssertionSite, CType, Expression, SourceLocation};
pub use compiler::{
    AssertionTree, InstrumentOptions, InstrumentResult, Instrumenter, RuntimeRoutines, Stmt,
};
pub use error::{Error, ErrorSeverity, Result};
pub use runtime::{Environment, Evaluator, Outcome, Value};
