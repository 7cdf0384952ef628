//! # Buffer Program IR
//!
//! Lowering turns a materialized assertion into a Buffer Program: text and
//! value appends, branch points matching the short-circuit structure of the
//! expression, and once-only groups for deduplicated subexpression lines.
//! The emitter later turns it into replacement-tree statements.
//!
//! ## Module Structure
//!
//! ```text
//! ir/
//! ├── mod.rs          # This file - module definition and re-exports
//! ├── instruction.rs  # BufferOp, ValueRef
//! ├── program.rs      # BufferProgram container
//! └── generator.rs    # Lowerer (short-circuit tree lowering)
//! ```

mod generator;
mod instruction;
mod program;

pub use generator::{Lowerer, Position, PLACEHOLDER};
pub use instruction::{BufferOp, ValueRef};
pub use program::BufferProgram;
