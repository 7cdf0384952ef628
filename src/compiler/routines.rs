//! Runtime routine table
//!
//! The generated code calls three routines of the target's C library. The
//! host records declarations as it finishes them; the table is consulted once
//! per assertion and is scoped to one compilation unit.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Conventional name of the variadic output routine
pub const OUTPUT_ROUTINE: &str = "printf";
/// Conventional name of the bounded formatted-string routine
pub const FORMAT_INTO_ROUTINE: &str = "snprintf";
/// Conventional name of the process-abort routine
pub const ABORT_ROUTINE: &str = "abort";

/// Reference to a declared routine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutineHandle {
    /// Symbol name
    pub name: String,
}

impl RoutineHandle {
    /// Handle for the routine named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Routines available to generated code, any of which may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeRoutines {
    /// `printf`-like output routine
    pub output: Option<RoutineHandle>,
    /// `snprintf`-like bounded formatting routine
    pub format_into: Option<RoutineHandle>,
    /// `abort`-like routine
    pub abort: Option<RoutineHandle>,
}

/// All three routines, resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoutines {
    /// Output routine
    pub output: RoutineHandle,
    /// Bounded formatting routine
    pub format_into: RoutineHandle,
    /// Abort routine
    pub abort: RoutineHandle,
}

impl RuntimeRoutines {
    /// The standard C library routines
    pub fn libc() -> Self {
        Self {
            output: Some(RoutineHandle::new(OUTPUT_ROUTINE)),
            format_into: Some(RoutineHandle::new(FORMAT_INTO_ROUTINE)),
            abort: Some(RoutineHandle::new(ABORT_ROUTINE)),
        }
    }

    /// Returns all three handles, or the first missing one as an error
    pub fn require(&self) -> Result<ResolvedRoutines> {
        fn get(handle: &Option<RoutineHandle>, role: &str, expected: &str) -> Result<RoutineHandle> {
            handle.clone().ok_or_else(|| Error::MissingRoutine {
                role: role.to_string(),
                expected: expected.to_string(),
            })
        }

        Ok(ResolvedRoutines {
            output: get(&self.output, "output", OUTPUT_ROUTINE)?,
            format_into: get(&self.format_into, "formatted-string", FORMAT_INTO_ROUTINE)?,
            abort: get(&self.abort, "abort", ABORT_ROUTINE)?,
        })
    }
}

/// Declarations seen in one compilation unit
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    declared: HashSet<String>,
}

impl DeclarationTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished top-level declaration
    pub fn record(&mut self, name: impl Into<String>) {
        self.declared.insert(name.into());
    }

    /// Returns true if `name` was declared
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    /// Look up the conventional routine names
    pub fn resolve(&self) -> RuntimeRoutines {
        let lookup = |name: &str| self.is_declared(name).then(|| RoutineHandle::new(name));
        RuntimeRoutines {
            output: lookup(OUTPUT_ROUTINE),
            format_into: lookup(FORMAT_INTO_ROUTINE),
            abort: lookup(ABORT_ROUTINE),
        }
    }
}
