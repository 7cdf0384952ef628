//! Reference runtime for replacement trees
//!
//! Executes an [`AssertionTree`](crate::compiler::AssertionTree) the way the
//! generated code would run: the condition once, then the failure handler
//! with `printf`/`snprintf`/`abort` semantics. Lets the pipeline be checked
//! without a host compiler.

mod environment;
mod evaluator;
pub mod printf;
mod value;

pub use environment::{Environment, HostFunction};
pub use evaluator::{Evaluator, Outcome};
pub use value::Value;
