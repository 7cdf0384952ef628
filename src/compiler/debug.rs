//! Debug utilities for assertion instrumentation
//!
//! Tools for inspecting Buffer Programs and replacement trees.

use super::ir::{BufferOp, BufferProgram};
use super::tree::{AssertionTree, Stmt};
use std::fmt::Write;

/// Render a Buffer Program as indented text, one operation per line
pub fn dump_program(program: &BufferProgram) -> String {
    let mut out = String::new();
    for op in &program.ops {
        format_op(op, 0, &mut out);
    }
    out
}

/// Format a single Buffer Program operation (and its nested operations)
pub fn format_op(op: &BufferOp, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match op {
        BufferOp::AppendText(text) => {
            let _ = writeln!(out, "{}text {:?}", pad, text);
        }
        BufferOp::AppendValue(value) => {
            let color = value
                .color
                .map(|c| format!(" color={}", c.ansi_code()))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{}value {} as {}{}",
                pad,
                value.expr,
                value.spec.directive(),
                color
            );
        }
        BufferOp::Branch {
            condition,
            then_ops,
            else_ops,
        } => {
            let _ = writeln!(out, "{}if {}", pad, condition);
            for op in &then_ops.ops {
                format_op(op, indent + 1, out);
            }
            if !else_ops.is_empty() {
                let _ = writeln!(out, "{}else", pad);
                for op in &else_ops.ops {
                    format_op(op, indent + 1, out);
                }
            }
        }
        BufferOp::Once { identity, ops } => {
            let _ = writeln!(out, "{}once {:?}", pad, identity);
            for op in &ops.ops {
                format_op(op, indent + 1, out);
            }
        }
    }
}

/// Format a single replacement-tree statement
pub fn format_stmt(stmt: &Stmt, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    let args = |args: &[crate::ast::Expression]| {
        args.iter()
            .map(|a| format!(", {}", a))
            .collect::<String>()
    };
    match stmt {
        Stmt::Print {
            routine,
            format,
            args: a,
        } => {
            let _ = writeln!(out, "{}{}({:?}{})", pad, routine.name, format, args(a));
        }
        Stmt::DeclareBuffer { capacity } => {
            let _ = writeln!(out, "{}char buf[{}]", pad, capacity);
        }
        Stmt::Append {
            routine,
            format,
            args: a,
        } => {
            let _ = writeln!(
                out,
                "{}{}(buf + off, {:?}{})",
                pad,
                routine.name,
                format,
                args(a)
            );
        }
        Stmt::PrintBuffer {
            routine,
            prefix,
            suffix,
        } => {
            let _ = writeln!(out, "{}{}({:?} buf {:?})", pad, routine.name, prefix, suffix);
        }
        Stmt::Branch {
            condition,
            then_body,
            else_body,
        } => {
            let _ = writeln!(out, "{}if ({})", pad, condition);
            for stmt in then_body {
                format_stmt(stmt, indent + 1, out);
            }
            if !else_body.is_empty() {
                let _ = writeln!(out, "{}else", pad);
                for stmt in else_body {
                    format_stmt(stmt, indent + 1, out);
                }
            }
        }
        Stmt::DeclareFlag { flag } => {
            let _ = writeln!(out, "{}flag f{} = 0", pad, flag.0);
        }
        Stmt::Once { flag, body } => {
            let _ = writeln!(out, "{}once f{}", pad, flag.0);
            for stmt in body {
                format_stmt(stmt, indent + 1, out);
            }
        }
        Stmt::Abort { routine } => {
            let _ = writeln!(out, "{}{}()", pad, routine.name);
        }
        Stmt::AssertFail {
            expression,
            file,
            line,
            function,
        } => {
            let _ = writeln!(
                out,
                "{}__assert_fail({:?}, {:?}, {}, {:?})",
                pad, expression, file, line, function
            );
        }
    }
}

/// Render a replacement tree
pub fn dump_tree(tree: &AssertionTree) -> String {
    let mut out = String::new();
    out.push_str("═══════════════════════════════════════════════════════════\n");
    let _ = writeln!(out, "if !({})", tree.condition);
    out.push_str("───────────────────────────────────────────────────────────\n");
    for stmt in &tree.on_failure {
        format_stmt(stmt, 1, &mut out);
    }
    out.push_str("═══════════════════════════════════════════════════════════\n");
    out
}
