//! Value formatter
//!
//! Picks the formatted-output directive for a leaf from its static type, and
//! renders constants directly so they never reach the runtime formatter.

use crate::ast::{literal_text, quote_bytes, CType, Leaf};

/// Integer width as spelled by a length modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// `hh`
    Char,
    /// `h`
    Short,
    /// no modifier
    Int,
    /// `ll`
    LongLong,
}

impl IntWidth {
    fn modifier(&self) -> &'static str {
        match self {
            IntWidth::Char => "hh",
            IntWidth::Short => "h",
            IntWidth::Int => "",
            IntWidth::LongLong => "ll",
        }
    }

    fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(IntWidth::Char),
            16 => Some(IntWidth::Short),
            32 => Some(IntWidth::Int),
            64 => Some(IntWidth::LongLong),
            _ => None,
        }
    }
}

/// Format specifier of one rendered value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatSpec {
    /// `%d` family
    Signed(IntWidth),
    /// `%u` family
    Unsigned(IntWidth),
    /// `%p`
    Pointer,
    /// `"%s"`, quotes included. Assumes a NUL-terminated string.
    QuotedString,
}

impl FormatSpec {
    /// Directive text placed in the generated format string
    pub fn directive(&self) -> String {
        match self {
            FormatSpec::Signed(width) => format!("%{}d", width.modifier()),
            FormatSpec::Unsigned(width) => format!("%{}u", width.modifier()),
            FormatSpec::Pointer => "%p".to_string(),
            FormatSpec::QuotedString => "\"%s\"".to_string(),
        }
    }
}

/// Format specifier for a value of static type `ty`.
///
/// Integers of an unexpected width degrade to the closest directive (see
/// [`guessed_width`]). Types that cannot be printed at all return `None` and
/// the caller renders a placeholder.
pub fn format_spec_for(ty: &CType) -> Option<FormatSpec> {
    match ty {
        CType::Bool => Some(FormatSpec::Signed(IntWidth::Int)),
        CType::Char => Some(FormatSpec::Signed(IntWidth::Char)),
        CType::Integer { bits, signed } => {
            let width = IntWidth::from_bits(*bits).unwrap_or(if *bits <= 32 {
                IntWidth::Int
            } else {
                IntWidth::LongLong
            });
            if *signed {
                Some(FormatSpec::Signed(width))
            } else {
                Some(FormatSpec::Unsigned(width))
            }
        }
        CType::Pointer(_) if ty.is_string() => Some(FormatSpec::QuotedString),
        CType::Pointer(_) => Some(FormatSpec::Pointer),
        CType::Void | CType::Named(_) => None,
    }
}

/// Bit width of an integer type whose directive [`format_spec_for`] had to
/// guess
pub fn guessed_width(ty: &CType) -> Option<u16> {
    match ty {
        CType::Integer { bits, .. } if IntWidth::from_bits(*bits).is_none() => Some(*bits),
        _ => None,
    }
}

/// Text of a leaf that needs no runtime formatting: literals, string literals
/// and `&name`. Returns `None` for variables and calls.
pub fn static_repr(leaf: &Leaf) -> Option<String> {
    match leaf {
        Leaf::Literal { value, ty } => Some(literal_text(*value, ty)),
        Leaf::StringLiteral(bytes) => Some(quote_bytes(bytes)),
        Leaf::AddressOf(var) => Some(format!("&{}", var.name)),
        Leaf::Variable(_) | Leaf::Call { .. } => None,
    }
}

/// Escapes literal text for use inside a format string
pub fn escape_format(text: &str) -> String {
    text.replace('%', "%%")
}
