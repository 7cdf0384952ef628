use std::fmt;

use crate::ast::{ArithOp, CType, CompareOp};
use crate::error::{Error, Result};

/// Runtime value representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed integer of any width, sign-extended
    Int(i64),
    /// Unsigned integer of any width, zero-extended
    UInt(u64),
    /// Address
    Pointer(u64),
    /// Character pointer; `None` is a null pointer
    Str(Option<String>),
}

impl Value {
    /// String value
    pub fn str(text: impl Into<String>) -> Self {
        Value::Str(Some(text.into()))
    }

    /// Value of a constant with the given static type
    pub fn from_literal(value: i64, ty: &CType) -> Self {
        match ty {
            CType::Pointer(_) => Value::Pointer(value as u64),
            ty if ty.is_unsigned() => Value::UInt(value as u64),
            _ => Value::Int(value),
        }
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::UInt(_) => "unsigned",
            Value::Pointer(_) => "pointer",
            Value::Str(_) => "string",
        }
    }

    /// Returns true if the value is non-zero
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::UInt(n) | Value::Pointer(n) => *n != 0,
            Value::Str(s) => s.is_some(),
        }
    }

    /// Integer bits of the value. A null string is 0; other strings have no
    /// integer value.
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::UInt(n) | Value::Pointer(n) => Ok(*n as i64),
            Value::Str(None) => Ok(0),
            Value::Str(Some(_)) => Err(Error::TypeError {
                expected: "integer".to_string(),
                got: self.type_name().to_string(),
            }),
        }
    }

    fn is_unsigned(&self) -> bool {
        matches!(self, Value::UInt(_) | Value::Pointer(_))
    }

    /// Applies a relational operator. Two strings compare by content, a
    /// string and a non-string only for (in)equality of null-ness; other
    /// operands follow the usual conversions, unsigned winning over signed.
    ///
    /// String comparison differs from C, where `==` and `<` on two `char *`
    /// compare addresses. [`Value::Str`] carries no address, so outcomes
    /// involving two non-null strings are not evidence of C behaviour.
    pub fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool> {
        match (left, right) {
            (Value::Str(l), Value::Str(r)) => return Ok(op.apply(l, r)),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                let same = left.is_truthy() == right.is_truthy();
                return match op {
                    CompareOp::Eq => Ok(same),
                    CompareOp::Ne => Ok(!same),
                    _ => Err(Error::TypeError {
                        expected: "pointer".to_string(),
                        got: "string".to_string(),
                    }),
                };
            }
            _ => {}
        }
        let (l, r) = (left.as_int()?, right.as_int()?);
        if left.is_unsigned() || right.is_unsigned() {
            Ok(op.apply(l as u64, r as u64))
        } else {
            Ok(op.apply(l, r))
        }
    }

    /// Applies an arithmetic operator with wrapping semantics
    pub fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> Result<Value> {
        let (l, r) = (left.as_int()?, right.as_int()?);
        if matches!(op, ArithOp::Div | ArithOp::Mod) && r == 0 {
            return Err(Error::DivisionByZero);
        }

        if left.is_unsigned() || right.is_unsigned() {
            let (l, r) = (l as u64, r as u64);
            let result = match op {
                ArithOp::Add => l.wrapping_add(r),
                ArithOp::Sub => l.wrapping_sub(r),
                ArithOp::Mul => l.wrapping_mul(r),
                ArithOp::Div => l / r,
                ArithOp::Mod => l % r,
            };
            return Ok(match left {
                Value::Pointer(_) => Value::Pointer(result),
                _ => Value::UInt(result),
            });
        }

        Ok(Value::Int(match op {
            ArithOp::Add => l.wrapping_add(r),
            ArithOp::Sub => l.wrapping_sub(r),
            ArithOp::Mul => l.wrapping_mul(r),
            ArithOp::Div => l.wrapping_div(r),
            ArithOp::Mod => l.wrapping_rem(r),
        }))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int(b as i64)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Pointer(0) => write!(f, "NULL"),
            Value::Pointer(p) => write!(f, "0x{:x}", p),
            Value::Str(Some(s)) => write!(f, "\"{}\"", s),
            Value::Str(None) => write!(f, "NULL"),
        }
    }
}
