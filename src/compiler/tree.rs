//! Replacement tree handed back to the host code generator

use crate::ast::Expression;
use crate::compiler::routines::RoutineHandle;
use serde::{Deserialize, Serialize};

/// Runtime flag guarding a deduplicated subexpression line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlagId(pub u32);

/// Statement of the failure handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `routine(format, args...)` through the output routine
    Print {
        /// Output routine
        routine: RoutineHandle,
        /// Format string, literal `%` escaped
        format: String,
        /// Materialized values, one per directive
        args: Vec<Expression>,
    },
    /// Zero-initialised text buffer and its write offset
    DeclareBuffer {
        /// Size in bytes, terminator included
        capacity: usize,
    },
    /// Bounded append at the current offset. The offset advances by the
    /// would-be length and is clamped to `capacity - 1`.
    Append {
        /// Bounded formatting routine
        routine: RoutineHandle,
        /// Format string, literal `%` escaped
        format: String,
        /// Materialized values, one per directive
        args: Vec<Expression>,
    },
    /// Prints `prefix`, the buffer contents, then `suffix`
    PrintBuffer {
        /// Output routine
        routine: RoutineHandle,
        /// Text before the buffer
        prefix: String,
        /// Text after the buffer
        suffix: String,
    },
    /// `if (condition) { then_body } else { else_body }`
    Branch {
        /// Re-evaluated over materialized values
        condition: Expression,
        /// Taken when the condition holds
        then_body: Vec<Stmt>,
        /// Taken otherwise
        else_body: Vec<Stmt>,
    },
    /// Cleared runtime flag
    DeclareFlag {
        /// Flag
        flag: FlagId,
    },
    /// Runs `body` and sets `flag` unless the flag is already set
    Once {
        /// Flag
        flag: FlagId,
        /// Guarded statements
        body: Vec<Stmt>,
    },
    /// Terminates the process
    Abort {
        /// Abort routine
        routine: RoutineHandle,
    },
    /// The unmodified failure action of the assertion
    AssertFail {
        /// Source text of the condition
        expression: String,
        /// Source file
        file: String,
        /// Source line
        line: u32,
        /// Enclosing function
        function: String,
    },
}

/// `if (!condition) { on_failure }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionTree {
    /// Condition, rewritten so each leaf evaluates once
    pub condition: Expression,
    /// Runs when the condition is false
    pub on_failure: Vec<Stmt>,
}

impl AssertionTree {
    /// Returns true if the failure handler is the unmodified one
    pub fn is_unmodified(&self) -> bool {
        matches!(self.on_failure.as_slice(), [Stmt::AssertFail { .. }])
    }

    /// Number of statements, counting nested ones
    pub fn statement_count(&self) -> usize {
        fn count(body: &[Stmt]) -> usize {
            body.iter()
                .map(|stmt| match stmt {
                    Stmt::Branch {
                        then_body,
                        else_body,
                        ..
                    } => 1 + count(then_body) + count(else_body),
                    Stmt::Once { body, .. } => 1 + count(body),
                    _ => 1,
                })
                .sum()
        }
        count(&self.on_failure)
    }
}
