//! # Assertion Instrumenter
//!
//! Rewrites one assertion so that, when it fails, it prints what the
//! condition evaluated to before aborting.
//!
//! ## Architecture
//!
//! ```text
//! AssertionSite → Materialize → Lower (repr + subexpressions) → Emit → AssertionTree
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use assert_introspect::compiler::{InstrumentOptions, Instrumenter, RuntimeRoutines};
//!
//! let instrumenter = Instrumenter::new(InstrumentOptions::default());
//! let result = instrumenter.instrument(&site, &RuntimeRoutines::libc());
//! host.replace_assertion(result.tree);
//! ```

pub mod classify;
pub mod codegen;
pub mod debug;
pub mod format;
pub mod ir;
pub mod materialize;
pub mod registry;
pub mod repr;
pub mod routines;
pub mod tree;

pub use classify::{classify, OperatorKind};
pub use codegen::Emitter;
pub use debug::{dump_program, dump_tree, format_op, format_stmt};
pub use format::{format_spec_for, static_repr, FormatSpec, IntWidth};
pub use ir::{BufferOp, BufferProgram, Lowerer, Position, ValueRef};
pub use materialize::{is_side_effect_free, MaterializedTree, Materializer, SlotKind};
pub use registry::{Color, Identity, IdentityRegistry};
pub use repr::{SubexpressionBuilder, SubexpressionEntry};
pub use routines::{DeclarationTable, ResolvedRoutines, RoutineHandle, RuntimeRoutines};
pub use tree::{AssertionTree, FlagId, Stmt};

use crate::ast::AssertionSite;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Instrumentation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentOptions {
    /// Color values by identity
    pub colors: bool,
    /// Size of the generated repr buffer, terminator included
    pub buffer_capacity: usize,
    /// Nesting depth past which subtrees are evaluated as one unit
    pub max_depth: usize,
    /// Print the reconstructed tree
    pub show_ast: bool,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        Self {
            colors: true,
            buffer_capacity: 1024,
            max_depth: 64,
            show_ast: true,
        }
    }
}

impl InstrumentOptions {
    /// Decode options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject options that cannot produce a usable handler
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity < 2 {
            return Err(Error::InvalidOptions(format!(
                "buffer_capacity must be at least 2, got {}",
                self.buffer_capacity
            )));
        }
        if self.max_depth == 0 {
            return Err(Error::InvalidOptions(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Instrumentation result with metadata
#[derive(Debug, Clone)]
pub struct InstrumentResult {
    /// Replacement for the assertion
    pub tree: AssertionTree,
    /// False when the assertion was left unmodified
    pub instrumented: bool,
    /// Build-time diagnostics about this assertion
    pub warnings: Vec<String>,
    /// Number of `...` sites in the generated repr and subexpression lines
    pub placeholders: usize,
    /// Number of materialization slots
    pub slot_count: usize,
    /// Identities the subexpressions section can list, in listing order
    pub subexpressions: Vec<SubexpressionEntry>,
}

/// Assertion instrumenter
pub struct Instrumenter {
    options: InstrumentOptions,
}

impl Instrumenter {
    /// Create a new instrumenter with options
    pub fn new(options: InstrumentOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> &InstrumentOptions {
        &self.options
    }

    /// Instrument one assertion.
    ///
    /// Never fails: if the handler cannot be generated the assertion comes
    /// back unmodified, with the reason in `warnings`.
    pub fn instrument(&self, site: &AssertionSite, routines: &RuntimeRoutines) -> InstrumentResult {
        match self.try_instrument(site, routines) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    location = %site.location,
                    error = %err,
                    "leaving assertion unmodified"
                );
                InstrumentResult {
                    tree: unmodified(site),
                    instrumented: false,
                    warnings: vec![err.to_string()],
                    placeholders: 0,
                    slot_count: 0,
                    subexpressions: Vec::new(),
                }
            }
        }
    }

    /// Instrument one assertion, reporting structural failures as errors
    pub fn try_instrument(
        &self,
        site: &AssertionSite,
        routines: &RuntimeRoutines,
    ) -> Result<InstrumentResult> {
        self.options.validate()?;
        let resolved = routines.require()?;
        if site.condition.contains_materialized() {
            return Err(Error::InvalidTree(
                "condition already contains materialized nodes".to_string(),
            ));
        }

        // Phase 1: single-evaluation rewrite
        let materialized = Materializer::new(self.options.max_depth).materialize(&site.condition);

        // Phase 2: lowering
        let mut lowerer = Lowerer::new(&materialized, self.options.colors);
        let repr = lowerer.lower_failure(&materialized.expression);
        let (subexpressions, entries) =
            SubexpressionBuilder::new(&mut lowerer).build(&materialized.expression);
        let (placeholders, colors_used, lowering_diagnostics) = lowerer.finish();
        tracing::debug!(
            repr_ops = repr.op_count(),
            subexpression_ops = subexpressions.op_count(),
            colors_used,
            "lowered assertion"
        );
        tracing::trace!("repr program:\n{}", dump_program(&repr));
        tracing::trace!("subexpressions program:\n{}", dump_program(&subexpressions));

        let mut warnings: Vec<String> = materialized
            .diagnostics
            .iter()
            .chain(lowering_diagnostics.iter())
            .map(|d| d.to_string())
            .collect();
        if repr.max_static_len() >= self.options.buffer_capacity {
            tracing::warn!(
                capacity = self.options.buffer_capacity,
                "reconstructed text cannot fit the repr buffer, output will be truncated"
            );
            warnings.push(format!(
                "reconstructed text exceeds buffer capacity of {} bytes and will be truncated",
                self.options.buffer_capacity
            ));
        }

        // Phase 3: emission
        let mut emitter = Emitter::new(&resolved, self.options.buffer_capacity, self.options.show_ast);
        let tree = emitter.emit(
            site,
            materialized.expression.clone(),
            &repr,
            &subexpressions,
        );
        tracing::trace!("replacement tree:\n{}", dump_tree(&tree));

        Ok(InstrumentResult {
            tree,
            instrumented: true,
            warnings,
            placeholders,
            slot_count: materialized.slots.len(),
            subexpressions: entries,
        })
    }
}

/// The assertion as the host would have compiled it
pub fn unmodified(site: &AssertionSite) -> AssertionTree {
    AssertionTree {
        condition: site.condition.strip_materialized(),
        on_failure: vec![Stmt::AssertFail {
            expression: site.source_text.clone(),
            file: site.location.file.clone(),
            line: site.location.line,
            function: site.function.clone(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CType, CompareOp, Expression, SlotId, SourceLocation};

    fn site() -> AssertionSite {
        AssertionSite::new(
            Expression::compare(
                CompareOp::Eq,
                Expression::var(1, "n", CType::int()),
                Expression::int(5),
            ),
            "n == 5",
            SourceLocation::new("t.c", 9, 5),
            "main",
        )
    }

    #[test]
    fn test_default_options() {
        let options = InstrumentOptions::default();
        assert!(options.colors);
        assert_eq!(options.buffer_capacity, 1024);
        assert_eq!(options.max_depth, 64);
    }

    #[test]
    fn test_options_from_json() {
        let options = InstrumentOptions::from_json(r#"{"colors": false}"#).unwrap();
        assert!(!options.colors);
        assert!(options.show_ast);
        assert!(matches!(
            InstrumentOptions::from_json(r#"{"buffer_capacity": 1}"#),
            Err(Error::InvalidOptions(_))
        ));
        assert!(matches!(
            InstrumentOptions::from_json("{"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_missing_routine_leaves_assertion_unmodified() {
        let routines = RuntimeRoutines {
            abort: None,
            ..RuntimeRoutines::libc()
        };
        let result = Instrumenter::new(InstrumentOptions::default()).instrument(&site(), &routines);
        assert!(!result.instrumented);
        assert!(result.tree.is_unmodified());
        assert_eq!(result.tree.condition, site().condition);
        assert_eq!(
            result.warnings,
            vec!["Missing runtime routine: no abort routine (expected `abort`)".to_string()]
        );
    }

    #[test]
    fn test_instrumented_condition_is_materialized() {
        let result =
            Instrumenter::new(InstrumentOptions::default()).instrument(&site(), &RuntimeRoutines::libc());
        assert!(result.instrumented);
        assert_eq!(result.slot_count, 1);
        assert_ne!(result.tree.condition, site().condition);
        assert_eq!(result.tree.condition.to_string(), "n == 5");
        assert_eq!(result.subexpressions.len(), 1);
        assert!(matches!(
            result.tree.on_failure.last(),
            Some(Stmt::Abort { .. })
        ));
    }

    #[test]
    fn test_premarked_condition_is_rejected() {
        let mut premarked = site();
        let Expression::Comparison { left, .. } = &mut premarked.condition else {
            unreachable!()
        };
        let n = std::mem::replace(left.as_mut(), Expression::int(0));
        **left = Expression::Materialized {
            slot: SlotId(5),
            inner: Box::new(n),
        };

        assert!(matches!(
            Instrumenter::new(InstrumentOptions::default())
                .try_instrument(&premarked, &RuntimeRoutines::libc()),
            Err(Error::InvalidTree(_))
        ));
        let result = Instrumenter::new(InstrumentOptions::default())
            .instrument(&premarked, &RuntimeRoutines::libc());
        assert!(!result.instrumented);
        assert!(result.tree.is_unmodified());
        assert_eq!(result.tree.condition, site().condition);
    }

    #[test]
    fn test_small_buffer_warns() {
        let options = InstrumentOptions {
            buffer_capacity: 4,
            ..InstrumentOptions::default()
        };
        let result = Instrumenter::new(options).instrument(&site(), &RuntimeRoutines::libc());
        assert!(result.instrumented);
        assert!(result.warnings.iter().any(|w| w.contains("truncated")));
    }
}
