//! Buffer Program container

use super::instruction::{BufferOp, ValueRef};
use crate::compiler::registry::Identity;
use std::collections::BTreeMap;

/// Ordered operations with nested branch points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferProgram {
    /// Operations in execution order
    pub ops: Vec<BufferOp>,
}

impl BufferProgram {
    /// Create an empty program
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Append literal text, merging with a preceding text operation
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(BufferOp::AppendText(last)) = self.ops.last_mut() {
            last.push_str(text);
        } else {
            self.ops.push(BufferOp::AppendText(text.to_string()));
        }
    }

    /// Append a formatted value
    pub fn push_value(&mut self, value: ValueRef) {
        self.ops.push(BufferOp::AppendValue(value));
    }

    /// Append an arbitrary operation
    pub fn push(&mut self, op: BufferOp) {
        match op {
            BufferOp::AppendText(text) => self.push_text(&text),
            op => self.ops.push(op),
        }
    }

    /// Append every operation of `other`
    pub fn extend(&mut self, other: BufferProgram) {
        for op in other.ops {
            self.push(op);
        }
    }

    /// Returns true if the program does nothing
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations, counting nested ones
    pub fn op_count(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                BufferOp::Branch {
                    then_ops, else_ops, ..
                } => 1 + then_ops.op_count() + else_ops.op_count(),
                BufferOp::Once { ops, .. } => 1 + ops.op_count(),
                _ => 1,
            })
            .sum()
    }

    /// Longest run of literal text any execution path appends. Values are not
    /// counted, so this is a lower bound on the rendered length.
    pub fn max_static_len(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                BufferOp::AppendText(text) => text.len(),
                BufferOp::AppendValue(_) => 0,
                BufferOp::Branch {
                    then_ops, else_ops, ..
                } => then_ops.max_static_len().max(else_ops.max_static_len()),
                BufferOp::Once { ops, .. } => ops.max_static_len(),
            })
            .sum()
    }

    /// Number of `Once` sites per identity
    pub fn once_sites(&self) -> BTreeMap<Identity, usize> {
        let mut sites = BTreeMap::new();
        self.count_once(&mut sites);
        sites
    }

    fn count_once(&self, sites: &mut BTreeMap<Identity, usize>) {
        for op in &self.ops {
            match op {
                BufferOp::Branch {
                    then_ops, else_ops, ..
                } => {
                    then_ops.count_once(sites);
                    else_ops.count_once(sites);
                }
                BufferOp::Once { identity, ops } => {
                    *sites.entry(*identity).or_insert(0) += 1;
                    ops.count_once(sites);
                }
                BufferOp::AppendText(_) | BufferOp::AppendValue(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclId, Expression};

    #[test]
    fn test_adjacent_text_merges() {
        let mut program = BufferProgram::new();
        program.push_text("(...) && ");
        program.push_text("(");
        program.push_text("");
        assert_eq!(program.ops, vec![BufferOp::AppendText("(...) && (".into())]);
    }

    #[test]
    fn test_static_length_takes_longest_arm() {
        let mut then_ops = BufferProgram::new();
        then_ops.push_text("abcdef");
        let mut else_ops = BufferProgram::new();
        else_ops.push_text("ab");
        let mut program = BufferProgram::new();
        program.push_text("xy");
        program.push(BufferOp::Branch {
            condition: Expression::int(1),
            then_ops,
            else_ops,
        });
        assert_eq!(program.max_static_len(), 8);
        assert_eq!(program.op_count(), 4);
    }

    #[test]
    fn test_once_sites_counted_through_branches() {
        let identity = Identity::Declaration(DeclId(1));
        let line = || BufferOp::Once {
            identity,
            ops: BufferProgram::new(),
        };
        let mut else_ops = BufferProgram::new();
        else_ops.push(line());
        let mut program = BufferProgram::new();
        program.push(line());
        program.push(BufferOp::Branch {
            condition: Expression::int(0),
            then_ops: BufferProgram::new(),
            else_ops,
        });
        assert_eq!(program.once_sites().get(&identity), Some(&2));
    }
}
