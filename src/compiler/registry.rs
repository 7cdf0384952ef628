//! Identity and color registry
//!
//! Gives each distinct value shown in a diagnostic a stable identity and,
//! while the palette lasts, a display color. Scoped to one assertion.

use crate::ast::{DeclId, Expression, Leaf, SlotId};
use std::collections::HashMap;

/// Equivalence key for leaf occurrences showing the same value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identity {
    /// Every read of one declaration
    Declaration(DeclId),
    /// One materialized computation (a call site, an opaque node)
    Computation(SlotId),
}

impl Identity {
    /// Identity of a materialized node, `None` for anything else
    pub fn of(expr: &Expression) -> Option<Identity> {
        match expr {
            Expression::Materialized { inner, .. } if is_variable(inner) => match inner.as_ref() {
                Expression::Leaf(Leaf::Variable(var)) => Some(Identity::Declaration(var.decl)),
                _ => None,
            },
            Expression::Materialized { slot, .. } => Some(Identity::Computation(*slot)),
            _ => None,
        }
    }
}

fn is_variable(expr: &Expression) -> bool {
    matches!(expr, Expression::Leaf(Leaf::Variable(_)))
}

/// ANSI display colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// 31
    Red,
    /// 32
    Green,
    /// 33
    Yellow,
    /// 34
    Blue,
    /// 35
    Magenta,
    /// 36
    Cyan,
    /// 91
    BrightRed,
    /// 92
    BrightGreen,
}

/// Escape sequence ending a colored segment
pub const RESET: &str = "\x1b[0m";

impl Color {
    /// Allocation order
    pub const PALETTE: [Color; 8] = [
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::BrightRed,
        Color::BrightGreen,
    ];

    /// SGR parameter
    pub fn ansi_code(&self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
            Color::Magenta => 35,
            Color::Cyan => 36,
            Color::BrightRed => 91,
            Color::BrightGreen => 92,
        }
    }

    /// Escape sequence starting a segment in this color
    pub fn start(&self) -> String {
        format!("\x1b[{}m", self.ansi_code())
    }

    /// Wraps `text` in this color
    pub fn paint(&self, text: &str) -> String {
        format!("{}{}{}", self.start(), text, RESET)
    }
}

/// Wraps `text` in `color`, or returns it unchanged
pub fn paint(text: &str, color: Option<Color>) -> String {
    match color {
        Some(color) => color.paint(text),
        None => text.to_string(),
    }
}

/// First-come color allocation over [`Color::PALETTE`]
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    enabled: bool,
    assigned: HashMap<Identity, Option<Color>>,
    next: usize,
}

impl IdentityRegistry {
    /// Create a registry. A disabled registry never hands out colors.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            assigned: HashMap::new(),
            next: 0,
        }
    }

    /// Color of `identity`. The first request for a new identity takes the next
    /// palette entry; once the palette is used up new identities stay uncolored.
    /// Repeated requests always return the same answer.
    pub fn color_for(&mut self, identity: Identity) -> Option<Color> {
        if !self.enabled {
            return None;
        }
        if let Some(color) = self.assigned.get(&identity) {
            return *color;
        }
        let color = Color::PALETTE.get(self.next).copied();
        if color.is_some() {
            self.next += 1;
        }
        self.assigned.insert(identity, color);
        color
    }

    /// Color of a materialized node, if it has an identity
    pub fn color_of(&mut self, expr: &Expression) -> Option<Color> {
        Identity::of(expr).and_then(|identity| self.color_for(identity))
    }

    /// Number of palette entries handed out
    pub fn colors_used(&self) -> usize {
        self.next
    }
}
