use std::collections::{HashMap, HashSet};

use crate::ast::{Expression, Leaf, OpaqueKind, SlotId};
use crate::compiler::{AssertionTree, FlagId, Stmt};
use crate::error::{Error, Result};
use crate::runtime::{printf, Environment, Value};

/// Result of running an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The condition held; nothing was printed
    Passed,
    /// The failure handler ran and aborted
    Aborted {
        /// Everything the handler printed
        output: String,
    },
}

impl Outcome {
    /// Output of an aborted run
    pub fn output(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Aborted { output } => Some(output.as_str()),
        }
    }
}

enum Flow {
    Continue,
    Abort,
}

/// Fixed-capacity text buffer with `snprintf` offset semantics
struct BoundedBuffer {
    capacity: usize,
    text: String,
}

impl BoundedBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            text: String::new(),
        }
    }

    fn append(&mut self, rendered: &str) {
        let room = self.capacity.saturating_sub(1).saturating_sub(self.text.len());
        let mut end = rendered.len().min(room);
        while !rendered.is_char_boundary(end) {
            end -= 1;
        }
        self.text.push_str(&rendered[..end]);
    }
}

/// Executes replacement trees against an [`Environment`]
pub struct Evaluator {
    env: Environment,
    slots: HashMap<SlotId, Value>,
    flags: HashSet<FlagId>,
    buffer: Option<BoundedBuffer>,
    output: String,
}

impl Evaluator {
    /// Creates an evaluator over `env`
    pub fn new(env: Environment) -> Self {
        Evaluator {
            env,
            slots: HashMap::new(),
            flags: HashSet::new(),
            buffer: None,
            output: String::new(),
        }
    }

    /// The environment
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// The environment, for rebinding variables between runs
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Output of the last run
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Evaluates the condition once and runs the failure handler if it is false
    pub fn run(&mut self, tree: &AssertionTree) -> Result<Outcome> {
        self.slots.clear();
        self.flags.clear();
        self.buffer = None;
        self.output.clear();

        if self.eval(&tree.condition)?.is_truthy() {
            return Ok(Outcome::Passed);
        }
        match self.exec_block(&tree.on_failure)? {
            Flow::Abort => Ok(Outcome::Aborted {
                output: self.output.clone(),
            }),
            Flow::Continue => Err(Error::runtime(
                "failure handler completed without aborting",
            )),
        }
    }

    /// Evaluates an expression, filling materialization slots on first use
    pub fn eval(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Comparison { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                Ok(Value::compare(*op, &l, &r)?.into())
            }
            Expression::Arithmetic { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                Value::arithmetic(*op, &l, &r)
            }
            Expression::LogicalAnd {
                left,
                right,
                short_circuit,
            } => {
                let l = self.eval(left)?.is_truthy();
                if !l && *short_circuit {
                    return Ok(Value::Int(0));
                }
                let r = self.eval(right)?.is_truthy();
                Ok((l && r).into())
            }
            Expression::LogicalOr {
                left,
                right,
                short_circuit,
            } => {
                let l = self.eval(left)?.is_truthy();
                if l && *short_circuit {
                    return Ok(Value::Int(1));
                }
                let r = self.eval(right)?.is_truthy();
                Ok((l || r).into())
            }
            Expression::Leaf(leaf) => self.eval_leaf(leaf),
            Expression::Opaque { kind, operands, .. } => self.eval_opaque(*kind, operands),
            Expression::Materialized { slot, inner } => {
                if let Some(value) = self.slots.get(slot) {
                    return Ok(value.clone());
                }
                let value = self.eval(inner)?;
                self.slots.insert(*slot, value.clone());
                Ok(value)
            }
        }
    }

    fn eval_leaf(&mut self, leaf: &Leaf) -> Result<Value> {
        match leaf {
            Leaf::Variable(var) => self.env.get(var),
            Leaf::Literal { value, ty } => Ok(Value::from_literal(*value, ty)),
            Leaf::StringLiteral(bytes) => Ok(Value::str(String::from_utf8_lossy(bytes))),
            Leaf::AddressOf(var) => Ok(Value::Pointer(self.env.address_of(var.decl))),
            Leaf::Call { callee, args, .. } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                self.env.call(callee, &values)
            }
        }
    }

    fn eval_opaque(&mut self, kind: OpaqueKind, operands: &[Expression]) -> Result<Value> {
        if operands.len() != kind.arity() {
            return Err(Error::InvalidTree(format!(
                "{:?} takes {} operands, got {}",
                kind,
                kind.arity(),
                operands.len()
            )));
        }
        let mut values = Vec::with_capacity(operands.len());
        for operand in operands {
            values.push(self.eval(operand)?.as_int()?);
        }
        let value = match (kind, values.as_slice()) {
            (OpaqueKind::LogicalNot, [v]) => (*v == 0) as i64,
            (OpaqueKind::Negate, [v]) => v.wrapping_neg(),
            (OpaqueKind::BitNot, [v]) => !v,
            (OpaqueKind::BitAnd, [l, r]) => l & r,
            (OpaqueKind::BitOr, [l, r]) => l | r,
            (OpaqueKind::BitXor, [l, r]) => l ^ r,
            (OpaqueKind::ShiftLeft, [l, r]) => l.wrapping_shl(*r as u32),
            (OpaqueKind::ShiftRight, [l, r]) => l.wrapping_shr(*r as u32),
            _ => unreachable!("operand count checked against arity"),
        };
        Ok(Value::Int(value))
    }

    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow> {
        for stmt in body {
            if let Flow::Abort = self.exec(stmt)? {
                return Ok(Flow::Abort);
            }
        }
        Ok(Flow::Continue)
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Print { format, args, .. } => {
                let rendered = self.render(format, args)?;
                self.output.push_str(&rendered);
            }
            Stmt::DeclareBuffer { capacity } => {
                self.buffer = Some(BoundedBuffer::new(*capacity));
            }
            Stmt::Append { format, args, .. } => {
                let rendered = self.render(format, args)?;
                self.buffer
                    .as_mut()
                    .ok_or_else(|| Error::InvalidTree("append before buffer declaration".into()))?
                    .append(&rendered);
            }
            Stmt::PrintBuffer { prefix, suffix, .. } => {
                let buffer = self
                    .buffer
                    .as_ref()
                    .ok_or_else(|| Error::InvalidTree("print of undeclared buffer".into()))?;
                self.output.push_str(prefix);
                self.output.push_str(&buffer.text);
                self.output.push_str(suffix);
            }
            Stmt::Branch {
                condition,
                then_body,
                else_body,
            } => {
                let body = if self.eval(condition)?.is_truthy() {
                    then_body
                } else {
                    else_body
                };
                return self.exec_block(body);
            }
            Stmt::DeclareFlag { flag } => {
                self.flags.remove(flag);
            }
            Stmt::Once { flag, body } => {
                if self.flags.insert(*flag) {
                    return self.exec_block(body);
                }
            }
            Stmt::Abort { .. } => return Ok(Flow::Abort),
            Stmt::AssertFail {
                expression,
                file,
                line,
                function,
            } => {
                self.output.push_str(&format!(
                    "{}:{}: {}: Assertion `{}' failed.\n",
                    file, line, function, expression
                ));
                return Ok(Flow::Abort);
            }
        }
        Ok(Flow::Continue)
    }

    fn render(&mut self, format: &str, args: &[Expression]) -> Result<String> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }
        printf::format(format, &values)
    }
}
