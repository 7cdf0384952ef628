//! Single-evaluation rewriter
//!
//! Wraps every leaf with an observable evaluation in an
//! [`Expression::Materialized`] node. The wrapped value is computed the first
//! time control reaches it and reused by every later reference, so the
//! diagnostic code can mention a call result as often as it likes without
//! calling again.
//!
//! Operator nodes are rebuilt, never wrapped: the lowerer re-evaluates them
//! to decide which short-circuit path was taken, which is cheap and free of
//! side effects once their leaves are materialized.

use crate::ast::{Expression, Leaf, SlotId};
use crate::Error;

/// What a materialization slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// A variable read
    Variable,
    /// A call whose arguments were materialized too
    Call,
    /// An unsupported construct, evaluated as a whole
    Opaque,
    /// A subtree past the depth limit, evaluated as a whole
    Subtree,
}

/// Output of the rewriter
#[derive(Debug, Clone)]
pub struct MaterializedTree {
    /// Rewritten expression
    pub expression: Expression,
    /// Slot table, indexed by [`SlotId`]
    pub slots: Vec<SlotKind>,
    /// Non-fatal problems found while rewriting
    pub diagnostics: Vec<Error>,
}

impl MaterializedTree {
    /// Kind of a slot handed out by this rewrite
    pub fn slot_kind(&self, slot: SlotId) -> SlotKind {
        self.slots[slot.0 as usize]
    }
}

/// Single-evaluation rewriter
pub struct Materializer {
    max_depth: usize,
    slots: Vec<SlotKind>,
    diagnostics: Vec<Error>,
}

impl Materializer {
    /// Create a rewriter that stops descending at `max_depth`
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            slots: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Rewrite `expr` so each of its leaves evaluates at most once
    pub fn materialize(mut self, expr: &Expression) -> MaterializedTree {
        let expression = self.rewrite(expr, 0);
        tracing::debug!(slots = self.slots.len(), "materialized assertion leaves");
        MaterializedTree {
            expression,
            slots: self.slots,
            diagnostics: self.diagnostics,
        }
    }

    fn wrap(&mut self, expr: Expression, kind: SlotKind) -> Expression {
        let slot = SlotId(self.slots.len() as u32);
        self.slots.push(kind);
        Expression::Materialized {
            slot,
            inner: Box::new(expr),
        }
    }

    fn rewrite(&mut self, expr: &Expression, depth: usize) -> Expression {
        if depth >= self.max_depth && has_children(expr) {
            tracing::warn!(
                limit = self.max_depth,
                "assertion nests deeper than the depth limit, evaluating the rest as one unit"
            );
            self.diagnostics.push(Error::DepthLimitExceeded {
                limit: self.max_depth,
            });
            return self.wrap(expr.clone(), SlotKind::Subtree);
        }

        match expr {
            Expression::Comparison { op, left, right } => Expression::Comparison {
                op: *op,
                left: Box::new(self.rewrite(left, depth + 1)),
                right: Box::new(self.rewrite(right, depth + 1)),
            },
            Expression::Arithmetic { op, left, right } => Expression::Arithmetic {
                op: *op,
                left: Box::new(self.rewrite(left, depth + 1)),
                right: Box::new(self.rewrite(right, depth + 1)),
            },
            Expression::LogicalAnd {
                left,
                right,
                short_circuit,
            } => Expression::LogicalAnd {
                left: Box::new(self.rewrite(left, depth + 1)),
                right: Box::new(self.rewrite(right, depth + 1)),
                short_circuit: *short_circuit,
            },
            Expression::LogicalOr {
                left,
                right,
                short_circuit,
            } => Expression::LogicalOr {
                left: Box::new(self.rewrite(left, depth + 1)),
                right: Box::new(self.rewrite(right, depth + 1)),
                short_circuit: *short_circuit,
            },
            Expression::Leaf(Leaf::Call {
                callee,
                args,
                return_type,
            }) => {
                let args = args
                    .iter()
                    .map(|arg| self.rewrite(arg, depth + 1))
                    .collect();
                let call = Expression::Leaf(Leaf::Call {
                    callee: callee.clone(),
                    args,
                    return_type: return_type.clone(),
                });
                self.wrap(call, SlotKind::Call)
            }
            Expression::Leaf(Leaf::Variable(_)) => self.wrap(expr.clone(), SlotKind::Variable),
            Expression::Opaque { .. } if is_side_effect_free(expr) => expr.clone(),
            Expression::Opaque { .. } => self.wrap(expr.clone(), SlotKind::Opaque),
            // Slot ids are only meaningful in the table that issued them
            Expression::Materialized { inner, .. } => self.rewrite(inner, depth),
            Expression::Leaf(_) => expr.clone(),
        }
    }
}

fn has_children(expr: &Expression) -> bool {
    match expr {
        Expression::Leaf(Leaf::Call { args, .. }) => !args.is_empty(),
        Expression::Opaque { operands, .. } => !operands.is_empty(),
        Expression::Leaf(_) | Expression::Materialized { .. } => false,
        _ => true,
    }
}

/// Conservative purity check: true only for nodes whose evaluation cannot be
/// observed and always yields the same value. Anything else gets wrapped.
pub fn is_side_effect_free(expr: &Expression) -> bool {
    fn constant(expr: &Expression) -> bool {
        matches!(
            expr,
            Expression::Leaf(Leaf::Literal { .. })
                | Expression::Leaf(Leaf::StringLiteral(_))
                | Expression::Leaf(Leaf::AddressOf(_))
        )
    }

    match expr {
        Expression::Opaque { operands, .. } => operands.iter().all(constant),
        _ => constant(expr),
    }
}
