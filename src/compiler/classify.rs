//! Expression classifier
//!
//! Decides whether a node is an operator the engine breaks down or something
//! it treats as a single leaf.

use crate::ast::{ArithOp, CompareOp, Expression};

/// Operators with a known textual form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// `== != < <= > >=`
    Compare(CompareOp),
    /// `&&`
    And {
        /// False for the strict variant
        short_circuit: bool,
    },
    /// `||`
    Or {
        /// False for the strict variant
        short_circuit: bool,
    },
    /// `+ - * / %`
    Arith(ArithOp),
}

impl OperatorKind {
    /// Source token of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            OperatorKind::Compare(op) => op.symbol(),
            OperatorKind::And { .. } => "&&",
            OperatorKind::Or { .. } => "||",
            OperatorKind::Arith(op) => op.symbol(),
        }
    }

    /// `&&` or `||`
    pub fn is_logical(&self) -> bool {
        matches!(self, OperatorKind::And { .. } | OperatorKind::Or { .. })
    }
}

/// Maps a binary node to its operator. Returns `None` for leaves, opaque
/// constructs and materialized nodes.
pub fn classify(expr: &Expression) -> Option<OperatorKind> {
    match expr {
        Expression::Comparison { op, .. } => Some(OperatorKind::Compare(*op)),
        Expression::LogicalAnd { short_circuit, .. } => Some(OperatorKind::And {
            short_circuit: *short_circuit,
        }),
        Expression::LogicalOr { short_circuit, .. } => Some(OperatorKind::Or {
            short_circuit: *short_circuit,
        }),
        Expression::Arithmetic { op, .. } => Some(OperatorKind::Arith(*op)),
        Expression::Leaf(_) | Expression::Opaque { .. } | Expression::Materialized { .. } => None,
    }
}
