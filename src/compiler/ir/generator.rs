//! Short-circuit tree lowerer - transforms a materialized assertion into a
//! Buffer Program
//!
//! The program runs only after the assertion has failed. It re-evaluates
//! operator nodes over the already-stored leaf values to find out which
//! operands the original evaluation reached, and appends text for exactly
//! those.
//!
//! ## Rendering rules
//!
//! | Node | Failing position | Value position |
//! |------|------------------|----------------|
//! | `l && r` | left held: `(...) && (r)`, else `l` | `(l) && (r)`, `r` as `...` if skipped |
//! | `l \|\| r` | `(l) \|\| (r)` | `(l) \|\| (r)`, `r` as `...` if skipped |
//! | `l op r` | `l op r`, binary operands parenthesised | same |
//! | leaf | value or constant text | same |
//!
//! A node is in failing position when the lowerer knows it evaluated to false:
//! the root, the right side of an `&&` whose left side held, either side of a
//! failing `||`. Operands of comparisons and arithmetic are in value position.

use super::instruction::{BufferOp, ValueRef};
use super::program::BufferProgram;
use crate::ast::{Expression, SlotId};
use crate::compiler::classify::classify;
use crate::compiler::format::{format_spec_for, guessed_width, static_repr};
use crate::compiler::materialize::{MaterializedTree, SlotKind};
use crate::compiler::registry::{Color, IdentityRegistry};
use crate::Error;

/// Text rendered for anything the engine cannot show
pub const PLACEHOLDER: &str = "...";

/// What the lowerer knows about a node's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The node evaluated to false
    Failing,
    /// Nothing is known, the node's value is shown
    Value,
}

/// Lowers materialized trees to Buffer Programs
pub struct Lowerer<'a> {
    /// Rewritten tree and its slot table
    tree: &'a MaterializedTree,
    /// Colors of the assertion being lowered
    registry: IdentityRegistry,
    /// Number of placeholder sites emitted
    placeholders: usize,
    /// Non-fatal problems found while lowering
    diagnostics: Vec<Error>,
}

impl<'a> Lowerer<'a> {
    /// Create a lowerer over `tree`
    pub fn new(tree: &'a MaterializedTree, colors: bool) -> Self {
        Self {
            tree,
            registry: IdentityRegistry::new(colors),
            placeholders: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Program reconstructing why `expr`, known to be false, failed
    pub fn lower_failure(&mut self, expr: &Expression) -> BufferProgram {
        let mut out = BufferProgram::new();
        self.lower_into(expr, Position::Failing, &mut out);
        out
    }

    /// Appends the value repr of `expr` to `out`
    pub fn lower_value(&mut self, expr: &Expression, out: &mut BufferProgram) {
        self.lower_into(expr, Position::Value, out);
    }

    /// Color of a materialized node
    pub fn color_of(&mut self, expr: &Expression) -> Option<Color> {
        self.registry.color_of(expr)
    }

    /// Kind of a slot in the tree being lowered
    pub fn slot_kind(&self, slot: SlotId) -> SlotKind {
        self.tree.slot_kind(slot)
    }

    /// Number of placeholder sites emitted so far
    pub fn placeholders(&self) -> usize {
        self.placeholders
    }

    /// Consumes the lowerer, returning the placeholder count, the palette
    /// entries used and the collected diagnostics
    pub fn finish(self) -> (usize, usize, Vec<Error>) {
        (
            self.placeholders,
            self.registry.colors_used(),
            self.diagnostics,
        )
    }

    /// Lowers `expr` in the given position
    pub fn lower_into(&mut self, expr: &Expression, position: Position, out: &mut BufferProgram) {
        match expr {
            Expression::LogicalAnd {
                left,
                right,
                short_circuit,
            } => match position {
                Position::Failing => {
                    let mut else_ops = BufferProgram::new();
                    self.lower_into(left, Position::Failing, &mut else_ops);
                    let mut then_ops = BufferProgram::new();
                    then_ops.push_text("(...) && (");
                    self.lower_into(right, Position::Failing, &mut then_ops);
                    then_ops.push_text(")");
                    out.push(BufferOp::Branch {
                        condition: (**left).clone(),
                        then_ops,
                        else_ops,
                    });
                }
                Position::Value => self.lower_logical_value("&&", left, right, *short_circuit, true, out),
            },
            Expression::LogicalOr {
                left,
                right,
                short_circuit,
            } => match position {
                Position::Failing => {
                    out.push_text("(");
                    self.lower_into(left, Position::Failing, out);
                    out.push_text(") || (");
                    self.lower_into(right, Position::Failing, out);
                    out.push_text(")");
                }
                Position::Value => self.lower_logical_value("||", left, right, *short_circuit, false, out),
            },
            Expression::Comparison { op, left, right } => {
                self.lower_operands(op.symbol(), left, right, out)
            }
            Expression::Arithmetic { op, left, right } => {
                self.lower_operands(op.symbol(), left, right, out)
            }
            Expression::Materialized { slot, inner } => {
                self.lower_materialized(expr, *slot, inner, out)
            }
            Expression::Leaf(leaf) => match static_repr(leaf) {
                Some(text) => out.push_text(&text),
                None => unreachable!("`{}` reached lowering without being materialized", leaf),
            },
            Expression::Opaque { kind, .. } => {
                self.placeholder(Some(Error::unsupported(format!("{:?}", kind))), out)
            }
        }
    }

    fn lower_operands(
        &mut self,
        symbol: &str,
        left: &Expression,
        right: &Expression,
        out: &mut BufferProgram,
    ) {
        self.lower_operand(left, out);
        out.push_text(&format!(" {} ", symbol));
        self.lower_operand(right, out);
    }

    fn lower_operand(&mut self, operand: &Expression, out: &mut BufferProgram) {
        if classify(operand).is_some() {
            out.push_text("(");
            self.lower_value(operand, out);
            out.push_text(")");
        } else {
            self.lower_value(operand, out);
        }
    }

    /// `&&`/`||` whose truth value is shown rather than known. The right
    /// operand is only rendered on the path where it was evaluated.
    fn lower_logical_value(
        &mut self,
        symbol: &str,
        left: &Expression,
        right: &Expression,
        short_circuit: bool,
        right_runs_when_left_holds: bool,
        out: &mut BufferProgram,
    ) {
        out.push_text("(");
        self.lower_value(left, out);
        out.push_text(&format!(") {} (", symbol));

        if !short_circuit {
            self.lower_value(right, out);
            out.push_text(")");
            return;
        }

        let mut evaluated = BufferProgram::new();
        self.lower_value(right, &mut evaluated);
        evaluated.push_text(")");
        let mut skipped = BufferProgram::new();
        skipped.push_text(PLACEHOLDER);
        skipped.push_text(")");

        let (then_ops, else_ops) = if right_runs_when_left_holds {
            (evaluated, skipped)
        } else {
            (skipped, evaluated)
        };
        out.push(BufferOp::Branch {
            condition: left.clone(),
            then_ops,
            else_ops,
        });
    }

    fn lower_materialized(
        &mut self,
        node: &Expression,
        slot: SlotId,
        inner: &Expression,
        out: &mut BufferProgram,
    ) {
        match self.tree.slot_kind(slot) {
            // Already reported by the rewriter
            SlotKind::Subtree => self.placeholder(None, out),
            SlotKind::Opaque => {
                let reason = match inner {
                    Expression::Opaque { kind, .. } => format!("{:?}", kind),
                    other => other.to_string(),
                };
                self.placeholder(Some(Error::unsupported(reason)), out)
            }
            SlotKind::Variable | SlotKind::Call => {
                let ty = inner.static_type();
                match format_spec_for(&ty) {
                    Some(spec) => {
                        if let Some(bits) = guessed_width(&ty) {
                            self.note(Error::unsupported(format!(
                                "unknown {}-bit integer width for `{}`, printed with `{}`",
                                bits,
                                inner,
                                spec.directive()
                            )));
                        }
                        let color = self.color_of(node);
                        out.push_value(ValueRef {
                            expr: node.clone(),
                            spec,
                            color,
                        });
                    }
                    None => self.placeholder(
                        Some(Error::unsupported(format!(
                            "cannot print `{}` of type {}",
                            inner, ty
                        ))),
                        out,
                    ),
                }
            }
        }
    }

    fn placeholder(&mut self, reason: Option<Error>, out: &mut BufferProgram) {
        out.push_text(PLACEHOLDER);
        self.placeholders += 1;
        if let Some(reason) = reason {
            self.note(reason);
        }
    }

    /// Records a degraded render once, however often the leaf is rendered
    fn note(&mut self, reason: Error) {
        if !self.diagnostics.contains(&reason) {
            tracing::warn!(%reason, "degraded render");
            self.diagnostics.push(reason);
        }
    }
}
