//! # Replacement Tree Emitter
//!
//! Turns the lowered Buffer Programs into the statements of the failure
//! handler. Runs of text and values are merged into one formatted call each;
//! branch points and once-groups become nested statements.
//!
//! ## Generated handler
//! - header, source text and (optionally) the reconstructed tree through the
//!   output routine
//! - the short-circuit repr, appended into a fixed-capacity buffer through
//!   the bounded formatting routine, then printed
//! - the subexpression lines, printed directly
//! - the abort routine

use super::format::escape_format;
use super::ir::{BufferOp, BufferProgram};
use super::registry::{Identity, RESET};
use super::routines::{ResolvedRoutines, RoutineHandle};
use super::tree::{AssertionTree, FlagId, Stmt};
use crate::ast::{AssertionSite, Expression};
use std::collections::BTreeMap;

/// Where a run of appends ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    /// Bounded append into the repr buffer
    Buffer,
    /// Direct call of the output routine
    Output,
}

/// Pending format string and its arguments
#[derive(Default)]
struct Run {
    format: String,
    args: Vec<Expression>,
}

/// Replacement tree emitter
pub struct Emitter<'r> {
    routines: &'r ResolvedRoutines,
    buffer_capacity: usize,
    show_ast: bool,
    /// Runtime flags of identities listed from more than one site
    flags: BTreeMap<Identity, FlagId>,
}

impl<'r> Emitter<'r> {
    /// Create an emitter calling `routines`
    pub fn new(routines: &'r ResolvedRoutines, buffer_capacity: usize, show_ast: bool) -> Self {
        Self {
            routines,
            buffer_capacity,
            show_ast,
            flags: BTreeMap::new(),
        }
    }

    /// Builds the replacement tree for `site`.
    ///
    /// `condition` is the rewritten condition; `repr` and `subexpressions`
    /// are the lowered programs for it.
    pub fn emit(
        &mut self,
        site: &AssertionSite,
        condition: Expression,
        repr: &BufferProgram,
        subexpressions: &BufferProgram,
    ) -> AssertionTree {
        self.flags = subexpressions
            .once_sites()
            .into_iter()
            .filter(|(_, sites)| *sites > 1)
            .enumerate()
            .map(|(i, (identity, _))| (identity, FlagId(i as u32)))
            .collect();

        let mut body = vec![
            self.print_text(&format!(
                "{}: {}: assertion failed\n",
                site.location, site.function
            )),
            self.print_text(&format!("> assert({})\n", site.source_text)),
        ];
        if self.show_ast {
            body.push(self.print_text(&format!("> ast: {}\n", condition)));
        }

        body.push(Stmt::DeclareBuffer {
            capacity: self.buffer_capacity,
        });
        body.extend(self.lower(repr, Sink::Buffer));
        body.push(Stmt::PrintBuffer {
            routine: self.routines.output.clone(),
            prefix: "  assert(".to_string(),
            suffix: ")\n".to_string(),
        });

        if !subexpressions.is_empty() {
            body.extend(
                self.flags
                    .values()
                    .map(|flag| Stmt::DeclareFlag { flag: *flag }),
            );
            body.push(self.print_text("> subexpressions:\n"));
            body.extend(self.lower(subexpressions, Sink::Output));
        }

        body.push(Stmt::Abort {
            routine: self.routines.abort.clone(),
        });

        tracing::debug!(
            statements = body.len(),
            flags = self.flags.len(),
            "emitted failure handler"
        );
        AssertionTree {
            condition,
            on_failure: body,
        }
    }

    fn print_text(&self, text: &str) -> Stmt {
        Stmt::Print {
            routine: self.routines.output.clone(),
            format: escape_format(text),
            args: Vec::new(),
        }
    }

    fn lower(&self, program: &BufferProgram, sink: Sink) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        let mut run = Run::default();

        for op in &program.ops {
            match op {
                BufferOp::AppendText(text) => run.format.push_str(&escape_format(text)),
                BufferOp::AppendValue(value) => {
                    match value.color {
                        Some(color) => {
                            run.format.push_str(&color.start());
                            run.format.push_str(&value.spec.directive());
                            run.format.push_str(RESET);
                        }
                        None => run.format.push_str(&value.spec.directive()),
                    }
                    run.args.push(value.expr.clone());
                }
                BufferOp::Branch {
                    condition,
                    then_ops,
                    else_ops,
                } => {
                    self.flush(&mut run, sink, &mut stmts);
                    stmts.push(Stmt::Branch {
                        condition: condition.clone(),
                        then_body: self.lower(then_ops, sink),
                        else_body: self.lower(else_ops, sink),
                    });
                }
                BufferOp::Once { identity, ops } => {
                    self.flush(&mut run, sink, &mut stmts);
                    let body = self.lower(ops, sink);
                    match self.flags.get(identity) {
                        Some(flag) => stmts.push(Stmt::Once { flag: *flag, body }),
                        None => stmts.extend(body),
                    }
                }
            }
        }
        self.flush(&mut run, sink, &mut stmts);
        stmts
    }

    fn flush(&self, run: &mut Run, sink: Sink, stmts: &mut Vec<Stmt>) {
        if run.format.is_empty() {
            return;
        }
        let Run { format, args } = std::mem::take(run);
        stmts.push(match sink {
            Sink::Buffer => Stmt::Append {
                routine: self.routine(sink).clone(),
                format,
                args,
            },
            Sink::Output => Stmt::Print {
                routine: self.routine(sink).clone(),
                format,
                args,
            },
        });
    }

    fn routine(&self, sink: Sink) -> &RoutineHandle {
        match sink {
            Sink::Buffer => &self.routines.format_into,
            Sink::Output => &self.routines.output,
        }
    }
}
