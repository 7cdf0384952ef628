//! Buffer Program operations

use crate::ast::Expression;
use crate::compiler::format::FormatSpec;
use crate::compiler::registry::{Color, Identity};

use super::program::BufferProgram;

/// Runtime value rendered through the formatted-output routine
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRef {
    /// Materialized node whose stored value is printed
    pub expr: Expression,
    /// Directive chosen from the node's static type
    pub spec: FormatSpec,
    /// Display color of the node's identity
    pub color: Option<Color>,
}

/// One Buffer Program operation
#[derive(Debug, Clone, PartialEq)]
pub enum BufferOp {
    /// Literal text, copied as-is (not yet format-escaped)
    AppendText(String),
    /// Formatted runtime value
    AppendValue(ValueRef),
    /// Runs `then_ops` if `condition` holds, `else_ops` otherwise.
    /// The condition only references materialized leaves.
    Branch {
        /// Re-evaluated operator tree
        condition: Expression,
        /// Taken when the condition holds
        then_ops: BufferProgram,
        /// Taken otherwise
        else_ops: BufferProgram,
    },
    /// Runs `ops` unless another `Once` with the same identity already ran
    Once {
        /// Deduplication key
        identity: Identity,
        /// Guarded operations
        ops: BufferProgram,
    },
}
