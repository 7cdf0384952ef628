//! Assertion expression tree

use super::ctype::CType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a declaration as assigned by the host front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub u32);

/// Materialization slot (arena index handed out by the single-evaluation rewriter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

/// Relational operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Source token of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Applies the operator to two ordered operands
    pub fn apply<T: PartialOrd>(&self, left: T, right: T) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

impl ArithOp {
    /// Source token of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        }
    }
}

/// Constructs the front-end recognises but the introspection engine does not
/// break down. They still evaluate normally, and render as `...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpaqueKind {
    /// `!x`
    LogicalNot,
    /// `-x`
    Negate,
    /// `~x`
    BitNot,
    /// `x & y`
    BitAnd,
    /// `x | y`
    BitOr,
    /// `x ^ y`
    BitXor,
    /// `x << y`
    ShiftLeft,
    /// `x >> y`
    ShiftRight,
}

impl OpaqueKind {
    /// Number of operands the construct takes
    pub fn arity(&self) -> usize {
        match self {
            OpaqueKind::LogicalNot | OpaqueKind::Negate | OpaqueKind::BitNot => 1,
            _ => 2,
        }
    }
}

/// A named variable reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    /// Declaration this reference resolves to
    pub decl: DeclId,
    /// Source name
    pub name: String,
    /// Declared type
    pub ty: CType,
}

impl Variable {
    /// Creates a variable reference
    pub fn new(decl: DeclId, name: impl Into<String>, ty: CType) -> Self {
        Self {
            decl,
            name: name.into(),
            ty,
        }
    }
}

/// Leaf of the expression tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leaf {
    /// Variable read
    Variable(Variable),
    /// Integer, boolean, character or pointer constant
    Literal {
        /// Constant bits (unsigned types reinterpret them)
        value: i64,
        /// Constant type
        ty: CType,
    },
    /// Function call
    Call {
        /// Callee name
        callee: String,
        /// Arguments in evaluation order
        args: Vec<Expression>,
        /// Declared return type
        return_type: CType,
    },
    /// String literal bytes, without the terminating NUL
    StringLiteral(Vec<u8>),
    /// `&variable`
    AddressOf(Variable),
}

impl Leaf {
    /// Static type of the leaf
    pub fn static_type(&self) -> CType {
        match self {
            Leaf::Variable(var) => var.ty.clone(),
            Leaf::Literal { ty, .. } => ty.clone(),
            Leaf::Call { return_type, .. } => return_type.clone(),
            Leaf::StringLiteral(_) => CType::c_string(),
            Leaf::AddressOf(var) => CType::pointer_to(var.ty.clone()),
        }
    }
}

/// Source text of an integer/pointer constant. Null pointer constants are
/// spelled `NULL`.
pub fn literal_text(value: i64, ty: &CType) -> String {
    match ty {
        CType::Pointer(_) if value == 0 => "NULL".to_string(),
        CType::Pointer(_) => format!("0x{:x}", value as u64),
        ty if ty.is_unsigned() => (value as u64).to_string(),
        _ => value.to_string(),
    }
}

/// Double-quoted, C-escaped rendering of string literal bytes
pub fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push('"');
    out
}

/// Assertion expression tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// `left <op> right` for relational operators
    Comparison {
        /// Operator
        op: CompareOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// `left && right`
    LogicalAnd {
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
        /// False for the strict variant that always evaluates both operands
        short_circuit: bool,
    },
    /// `left || right`
    LogicalOr {
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
        /// False for the strict variant that always evaluates both operands
        short_circuit: bool,
    },
    /// `left <op> right` for arithmetic operators
    Arithmetic {
        /// Operator
        op: ArithOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Variable, constant, call, string or address-of
    Leaf(Leaf),
    /// Recognised but unsupported construct
    Opaque {
        /// Which construct
        kind: OpaqueKind,
        /// Operands in evaluation order
        operands: Vec<Expression>,
        /// Result type
        ty: CType,
    },
    /// Evaluate `inner` once, store it in `slot`, reuse the stored value afterwards.
    /// Only produced by the single-evaluation rewriter.
    Materialized {
        /// Storage slot
        slot: SlotId,
        /// Wrapped expression
        inner: Box<Expression>,
    },
}

impl Expression {
    /// Variable read
    pub fn var(decl: u32, name: impl Into<String>, ty: CType) -> Self {
        Expression::Leaf(Leaf::Variable(Variable::new(DeclId(decl), name, ty)))
    }

    /// `int` constant
    pub fn int(value: i64) -> Self {
        Expression::literal(value, CType::int())
    }

    /// Constant of arbitrary type
    pub fn literal(value: i64, ty: CType) -> Self {
        Expression::Leaf(Leaf::Literal { value, ty })
    }

    /// `NULL`
    pub fn null() -> Self {
        Expression::literal(0, CType::void_pointer())
    }

    /// String literal
    pub fn string(text: &str) -> Self {
        Expression::Leaf(Leaf::StringLiteral(text.as_bytes().to_vec()))
    }

    /// Function call
    pub fn call(callee: impl Into<String>, args: Vec<Expression>, return_type: CType) -> Self {
        Expression::Leaf(Leaf::Call {
            callee: callee.into(),
            args,
            return_type,
        })
    }

    /// `&name`
    pub fn address_of(decl: u32, name: impl Into<String>, ty: CType) -> Self {
        Expression::Leaf(Leaf::AddressOf(Variable::new(DeclId(decl), name, ty)))
    }

    /// Relational comparison
    pub fn compare(op: CompareOp, left: Expression, right: Expression) -> Self {
        Expression::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Arithmetic
    pub fn arith(op: ArithOp, left: Expression, right: Expression) -> Self {
        Expression::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Short-circuit `&&`
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::LogicalAnd {
            left: Box::new(left),
            right: Box::new(right),
            short_circuit: true,
        }
    }

    /// Short-circuit `||`
    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::LogicalOr {
            left: Box::new(left),
            right: Box::new(right),
            short_circuit: true,
        }
    }

    /// Unsupported construct
    pub fn opaque(kind: OpaqueKind, operands: Vec<Expression>, ty: CType) -> Self {
        Expression::Opaque { kind, operands, ty }
    }

    /// Left and right operand of a binary node
    pub fn operands(&self) -> Option<(&Expression, &Expression)> {
        match self {
            Expression::Comparison { left, right, .. }
            | Expression::LogicalAnd { left, right, .. }
            | Expression::LogicalOr { left, right, .. }
            | Expression::Arithmetic { left, right, .. } => Some((left, right)),
            _ => None,
        }
    }

    /// True if any node of the tree is [`Expression::Materialized`]. Input
    /// handed over by a host never should be.
    pub fn contains_materialized(&self) -> bool {
        match self {
            Expression::Materialized { .. } => true,
            Expression::Leaf(Leaf::Call { args, .. }) => {
                args.iter().any(Expression::contains_materialized)
            }
            Expression::Opaque { operands, .. } => {
                operands.iter().any(Expression::contains_materialized)
            }
            Expression::Leaf(_) => false,
            other => other
                .operands()
                .is_some_and(|(l, r)| l.contains_materialized() || r.contains_materialized()),
        }
    }

    /// Copy of the tree with every [`Expression::Materialized`] wrapper
    /// replaced by the node it wraps
    pub fn strip_materialized(&self) -> Expression {
        match self {
            Expression::Materialized { inner, .. } => inner.strip_materialized(),
            Expression::Comparison { op, left, right } => Expression::Comparison {
                op: *op,
                left: Box::new(left.strip_materialized()),
                right: Box::new(right.strip_materialized()),
            },
            Expression::Arithmetic { op, left, right } => Expression::Arithmetic {
                op: *op,
                left: Box::new(left.strip_materialized()),
                right: Box::new(right.strip_materialized()),
            },
            Expression::LogicalAnd {
                left,
                right,
                short_circuit,
            } => Expression::LogicalAnd {
                left: Box::new(left.strip_materialized()),
                right: Box::new(right.strip_materialized()),
                short_circuit: *short_circuit,
            },
            Expression::LogicalOr {
                left,
                right,
                short_circuit,
            } => Expression::LogicalOr {
                left: Box::new(left.strip_materialized()),
                right: Box::new(right.strip_materialized()),
                short_circuit: *short_circuit,
            },
            Expression::Leaf(Leaf::Call {
                callee,
                args,
                return_type,
            }) => Expression::Leaf(Leaf::Call {
                callee: callee.clone(),
                args: args.iter().map(Expression::strip_materialized).collect(),
                return_type: return_type.clone(),
            }),
            Expression::Opaque { kind, operands, ty } => Expression::Opaque {
                kind: *kind,
                operands: operands.iter().map(Expression::strip_materialized).collect(),
                ty: ty.clone(),
            },
            Expression::Leaf(_) => self.clone(),
        }
    }

    /// Static type of the expression's value
    pub fn static_type(&self) -> CType {
        match self {
            Expression::Comparison { .. }
            | Expression::LogicalAnd { .. }
            | Expression::LogicalOr { .. } => CType::int(),
            Expression::Arithmetic { left, .. } => left.static_type(),
            Expression::Leaf(leaf) => leaf.static_type(),
            Expression::Opaque { ty, .. } => ty.clone(),
            Expression::Materialized { inner, .. } => inner.static_type(),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::LogicalOr { .. } => 1,
            Expression::LogicalAnd { .. } => 2,
            Expression::Comparison {
                op: CompareOp::Eq | CompareOp::Ne,
                ..
            } => 3,
            Expression::Comparison { .. } => 4,
            Expression::Arithmetic {
                op: ArithOp::Add | ArithOp::Sub,
                ..
            } => 5,
            Expression::Arithmetic { .. } => 6,
            _ => 7,
        }
    }

    fn fmt_operand(&self, child: &Expression, right: bool, f: &mut fmt::Formatter) -> fmt::Result {
        let parent = self.precedence();
        let inner = child.precedence();
        // && and || are associative, the other binary operators are not
        if inner < parent || (right && inner == parent && parent >= 3) {
            write!(f, "({})", child)
        } else {
            write!(f, "{}", child)
        }
    }

    fn fmt_binary(&self, symbol: &str, f: &mut fmt::Formatter) -> fmt::Result {
        let (left, right) = self
            .operands()
            .unwrap_or_else(|| unreachable!("fmt_binary on a non-binary node"));
        self.fmt_operand(left, false, f)?;
        write!(f, " {} ", symbol)?;
        self.fmt_operand(right, true, f)
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Leaf::Variable(var) => write!(f, "{}", var.name),
            Leaf::Literal { value, ty } => write!(f, "{}", literal_text(*value, ty)),
            Leaf::Call { callee, args, .. } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Leaf::StringLiteral(bytes) => write!(f, "{}", quote_bytes(bytes)),
            Leaf::AddressOf(var) => write!(f, "&{}", var.name),
        }
    }
}

/// Renders the reconstructed source of the tree. Unsupported constructs, and
/// subtrees the rewriter materialized as a whole, print as `...`.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Comparison { op, .. } => self.fmt_binary(op.symbol(), f),
            Expression::Arithmetic { op, .. } => self.fmt_binary(op.symbol(), f),
            Expression::LogicalAnd { .. } => self.fmt_binary("&&", f),
            Expression::LogicalOr { .. } => self.fmt_binary("||", f),
            Expression::Leaf(leaf) => write!(f, "{}", leaf),
            Expression::Opaque { .. } => write!(f, "..."),
            Expression::Materialized { inner, .. } => match inner.as_ref() {
                Expression::Leaf(leaf) => write!(f, "{}", leaf),
                _ => write!(f, "..."),
            },
        }
    }
}
