//! Call/declaration repr builder
//!
//! Builds the subexpressions section: one `name = value` line per variable
//! and one `callee(args) = value` line per call, in evaluation order. Lines
//! are only emitted on paths where their leaf was evaluated, and each identity
//! is listed at most once per execution.

use crate::ast::{Expression, Leaf, Variable};
use crate::compiler::ir::{BufferOp, BufferProgram, Lowerer};
use crate::compiler::materialize::SlotKind;
use crate::compiler::registry::{paint, Identity};
use std::collections::BTreeSet;

/// One identity listed in the subexpressions section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubexpressionEntry {
    /// Deduplication key
    pub identity: Identity,
    /// Source text of the leaf, e.g. `n` or `f(12, n)`
    pub label: String,
}

/// Builds the subexpressions program for one assertion
pub struct SubexpressionBuilder<'l, 'a> {
    lowerer: &'l mut Lowerer<'a>,
    /// Identities listed on every path reaching the current point
    listed: BTreeSet<Identity>,
    entries: Vec<SubexpressionEntry>,
}

impl<'l, 'a> SubexpressionBuilder<'l, 'a> {
    /// Create a builder sharing `lowerer`'s colors and slot table
    pub fn new(lowerer: &'l mut Lowerer<'a>) -> Self {
        Self {
            lowerer,
            listed: BTreeSet::new(),
            entries: Vec::new(),
        }
    }

    /// Program listing the leaves of `expr` and the entries it can list
    pub fn build(mut self, expr: &Expression) -> (BufferProgram, Vec<SubexpressionEntry>) {
        let mut out = BufferProgram::new();
        self.collect(expr, &mut out);
        (out, self.entries)
    }

    fn collect(&mut self, expr: &Expression, out: &mut BufferProgram) {
        match expr {
            Expression::LogicalAnd {
                left,
                right,
                short_circuit: true,
            } => {
                self.collect(left, out);
                self.branch(left, Some(right), None, out);
            }
            Expression::LogicalOr {
                left,
                right,
                short_circuit: true,
            } => {
                self.collect(left, out);
                self.branch(left, None, Some(right), out);
            }
            Expression::Materialized { slot, inner } => match self.lowerer.slot_kind(*slot) {
                SlotKind::Variable => match inner.as_ref() {
                    Expression::Leaf(Leaf::Variable(var)) => self.variable_line(expr, var, out),
                    other => unreachable!("variable slot holds `{}`", other),
                },
                SlotKind::Call => match inner.as_ref() {
                    Expression::Leaf(Leaf::Call { callee, args, .. }) => {
                        for arg in args {
                            self.collect(arg, out);
                        }
                        self.call_line(expr, callee, args, inner, out);
                    }
                    other => unreachable!("call slot holds `{}`", other),
                },
                SlotKind::Opaque | SlotKind::Subtree => {}
            },
            Expression::Leaf(Leaf::Variable(_)) | Expression::Leaf(Leaf::Call { .. }) => {
                unreachable!("`{}` reached lowering without being materialized", expr)
            }
            Expression::Leaf(_) | Expression::Opaque { .. } => {}
            other => {
                // strict logical operators, comparisons and arithmetic
                if let Some((left, right)) = other.operands() {
                    self.collect(left, out);
                    self.collect(right, out);
                }
            }
        }
    }

    fn branch(
        &mut self,
        condition: &Expression,
        then_expr: Option<&Expression>,
        else_expr: Option<&Expression>,
        out: &mut BufferProgram,
    ) {
        let before = self.listed.clone();
        let mut then_ops = BufferProgram::new();
        if let Some(expr) = then_expr {
            self.collect(expr, &mut then_ops);
        }
        let after_then = std::mem::replace(&mut self.listed, before);
        let mut else_ops = BufferProgram::new();
        if let Some(expr) = else_expr {
            self.collect(expr, &mut else_ops);
        }
        self.listed = after_then.intersection(&self.listed).copied().collect();

        if then_ops.is_empty() && else_ops.is_empty() {
            return;
        }
        out.push(BufferOp::Branch {
            condition: condition.clone(),
            then_ops,
            else_ops,
        });
    }

    fn variable_line(&mut self, node: &Expression, var: &Variable, out: &mut BufferProgram) {
        let identity = Identity::Declaration(var.decl);
        if self.listed.contains(&identity) {
            return;
        }
        let color = self.lowerer.color_of(node);
        let mut line = BufferProgram::new();
        line.push_text(&format!("  {} = ", paint(&var.name, color)));
        self.lowerer.lower_value(node, &mut line);
        line.push_text("\n");
        self.emit_line(identity, var.name.clone(), line, out);
    }

    fn call_line(
        &mut self,
        node: &Expression,
        callee: &str,
        args: &[Expression],
        call: &Expression,
        out: &mut BufferProgram,
    ) {
        let Some(identity) = Identity::of(node) else {
            return;
        };
        if self.listed.contains(&identity) {
            return;
        }
        let color = self.lowerer.color_of(node);
        let mut line = BufferProgram::new();
        line.push_text(&format!("  {}(", paint(callee, color)));
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                line.push_text(", ");
            }
            self.lowerer.lower_value(arg, &mut line);
        }
        line.push_text(") = ");
        self.lowerer.lower_value(node, &mut line);
        line.push_text("\n");
        self.emit_line(identity, call.to_string(), line, out);
    }

    fn emit_line(
        &mut self,
        identity: Identity,
        label: String,
        line: BufferProgram,
        out: &mut BufferProgram,
    ) {
        self.listed.insert(identity);
        if !self.entries.iter().any(|entry| entry.identity == identity) {
            self.entries.push(SubexpressionEntry { identity, label });
        }
        out.push(BufferOp::Once {
            identity,
            ops: line,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CType, CompareOp, DeclId};
    use crate::compiler::materialize::Materializer;

    fn n() -> Expression {
        Expression::var(1, "n", CType::int())
    }

    fn build(expr: &Expression) -> (BufferProgram, Vec<SubexpressionEntry>) {
        let tree = Materializer::new(64).materialize(expr);
        let mut lowerer = Lowerer::new(&tree, false);
        SubexpressionBuilder::new(&mut lowerer).build(&tree.expression)
    }

    fn labels(entries: &[SubexpressionEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn test_variable_listed_once() {
        let expr = Expression::compare(
            CompareOp::Eq,
            Expression::arith(crate::ast::ArithOp::Add, n(), n()),
            n(),
        );
        let (program, entries) = build(&expr);
        assert_eq!(labels(&entries), vec!["n"]);
        assert_eq!(program.ops.len(), 1);
        assert_eq!(
            program.once_sites().get(&Identity::Declaration(DeclId(1))),
            Some(&1)
        );
    }

    #[test]
    fn test_call_arguments_precede_call() {
        let expr = Expression::compare(
            CompareOp::Gt,
            Expression::call("func2", vec![n()], CType::int()),
            Expression::int(43879),
        );
        let (program, entries) = build(&expr);
        assert_eq!(labels(&entries), vec!["n", "func2(n)"]);
        let BufferOp::Once { ops, .. } = &program.ops[1] else {
            panic!("call line must be a once group");
        };
        assert_eq!(ops.ops[0], BufferOp::AppendText("  func2(".into()));
        assert_eq!(ops.ops[2], BufferOp::AppendText(") = ".into()));
        assert_eq!(ops.ops[4], BufferOp::AppendText("\n".into()));
    }

    #[test]
    fn test_short_circuited_right_side_is_guarded() {
        let m = Expression::var(2, "m", CType::int());
        let expr = Expression::and(n(), m);
        let (program, entries) = build(&expr);
        assert_eq!(labels(&entries), vec!["n", "m"]);
        assert!(matches!(program.ops[0], BufferOp::Once { .. }));
        let BufferOp::Branch {
            then_ops, else_ops, ..
        } = &program.ops[1]
        else {
            panic!("right operand of && must be guarded");
        };
        assert_eq!(then_ops.ops.len(), 1);
        assert!(else_ops.is_empty());
    }

    #[test]
    fn test_listing_is_path_sensitive() {
        // (a && n) || n: after the && only `a` is known to be listed, so the
        // second `n` gets its own site and the pair is deduplicated at runtime
        let a = Expression::var(3, "a", CType::int());
        let expr = Expression::or(Expression::and(a, n()), n());
        let (program, entries) = build(&expr);
        assert_eq!(labels(&entries), vec!["a", "n"]);
        assert_eq!(
            program.once_sites().get(&Identity::Declaration(DeclId(1))),
            Some(&2)
        );
    }

    #[test]
    fn test_strict_and_lists_both_sides_unguarded() {
        let expr = Expression::LogicalAnd {
            left: Box::new(n()),
            right: Box::new(Expression::var(2, "m", CType::int())),
            short_circuit: false,
        };
        let (program, _) = build(&expr);
        assert_eq!(program.ops.len(), 2);
        assert!(program
            .ops
            .iter()
            .all(|op| matches!(op, BufferOp::Once { .. })));
    }
}
