//! Static types attached to leaves by the host front-end

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static C type of a leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CType {
    /// `void`
    Void,
    /// `_Bool`
    Bool,
    /// Plain character type. Pointers to it are string-flagged.
    Char,
    /// Integer of a given width and signedness
    Integer {
        /// Width in bits
        bits: u16,
        /// Whether the integer is signed
        signed: bool,
    },
    /// Pointer to another type
    Pointer(Box<CType>),
    /// A type the front-end could only name
    Named(String),
}

impl CType {
    /// `int`
    pub fn int() -> Self {
        CType::Integer {
            bits: 32,
            signed: true,
        }
    }

    /// `unsigned int`
    pub fn uint() -> Self {
        CType::Integer {
            bits: 32,
            signed: false,
        }
    }

    /// `long` on LP64 targets
    pub fn long() -> Self {
        CType::Integer {
            bits: 64,
            signed: true,
        }
    }

    /// `unsigned long` on LP64 targets
    pub fn ulong() -> Self {
        CType::Integer {
            bits: 64,
            signed: false,
        }
    }

    /// Pointer to `pointee`
    pub fn pointer_to(pointee: CType) -> Self {
        CType::Pointer(Box::new(pointee))
    }

    /// `char *`
    pub fn c_string() -> Self {
        CType::pointer_to(CType::Char)
    }

    /// `void *`
    pub fn void_pointer() -> Self {
        CType::pointer_to(CType::Void)
    }

    /// Returns true for any pointer type
    pub fn is_pointer(&self) -> bool {
        matches!(self, CType::Pointer(_))
    }

    /// Returns true for pointers whose pointee is string-flagged
    pub fn is_string(&self) -> bool {
        matches!(self, CType::Pointer(pointee) if **pointee == CType::Char)
    }

    /// Returns true when values of this type are interpreted as unsigned
    pub fn is_unsigned(&self) -> bool {
        match self {
            CType::Integer { signed, .. } => !signed,
            CType::Bool => true,
            _ => false,
        }
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CType::Void => write!(f, "void"),
            CType::Bool => write!(f, "_Bool"),
            CType::Char => write!(f, "char"),
            CType::Integer { bits, signed: true } => write!(f, "i{}", bits),
            CType::Integer {
                bits,
                signed: false,
            } => write!(f, "u{}", bits),
            CType::Pointer(pointee) => write!(f, "{} *", pointee),
            CType::Named(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_flag_only_on_char_pointers() {
        assert!(CType::c_string().is_string());
        assert!(!CType::void_pointer().is_string());
        assert!(!CType::pointer_to(CType::c_string()).is_string());
        assert!(!CType::Char.is_string());
    }

    #[test]
    fn test_display() {
        assert_eq!(CType::int().to_string(), "i32");
        assert_eq!(CType::ulong().to_string(), "u64");
        assert_eq!(CType::c_string().to_string(), "char *");
    }
}
