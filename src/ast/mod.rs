//! # Assertion Expression Trees
//!
//! The input model of the instrumentation pass. A host front-end parses the
//! program, recognises assertion sites, and hands each one over as an
//! [`AssertionSite`] holding an owned [`Expression`] tree.
//!
//! ```text
//! ast/
//! ├── mod.rs     # This file - re-exports
//! ├── ctype.rs   # CType: static leaf types
//! ├── expr.rs    # Expression, Leaf, operators, reconstructed-source Display
//! └── site.rs    # AssertionSite, SourceLocation
//! ```

mod ctype;
mod expr;
mod site;

pub use ctype::CType;
pub use expr::{
    literal_text, quote_bytes, ArithOp, CompareOp, DeclId, Expression, Leaf, OpaqueKind, SlotId,
    Variable,
};
pub use site::{AssertionSite, SourceLocation};
