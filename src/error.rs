//! Error types for assertion instrumentation

use thiserror::Error;

/// Instrumentation and reference-runtime errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Build-time errors
    /// A routine the generated code must call is not declared
    ///
    /// **Triggered by:** instrumenting a translation unit that never declared
    /// the output, formatted-string or abort routine
    /// **Effect:** the assertion is left unmodified
    #[error("Missing runtime routine: no {role} routine (expected `{expected}`)")]
    MissingRoutine {
        /// What the routine is used for
        role: String,
        /// Conventional name looked up
        expected: String,
    },

    /// A node the engine cannot break down
    ///
    /// **Effect:** the node renders as `...`; the rest of the assertion is
    /// still introspected
    #[error("Unsupported construct: {0}")]
    Unsupported(String),

    /// Expression nesting deeper than the configured limit
    ///
    /// **Effect:** the deeper subtree is evaluated as one unit and renders as `...`
    #[error("Expression nesting exceeds depth limit of {limit}")]
    DepthLimitExceeded {
        /// Configured limit
        limit: usize,
    },

    /// Options that cannot produce valid generated code
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Malformed input or generated tree
    #[error("Invalid tree: {0}")]
    InvalidTree(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Runtime errors (reference runtime)
    /// Read of a variable the environment does not bind
    #[error("Undefined variable: {name}")]
    UndefinedVariable {
        /// Variable name
        name: String,
    },

    /// Call of a function the environment does not provide
    #[error("Undefined function: {name}")]
    UndefinedFunction {
        /// Function name
        name: String,
    },

    /// Operand of the wrong kind
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected kind
        expected: String,
        /// Actual kind
        got: String,
    },

    /// Division by zero
    ///
    /// **Triggered by:** `/` or `%` with a zero right operand
    #[error("Division by zero")]
    DivisionByZero,

    /// Format string and arguments disagree
    #[error("Format error: {0}")]
    FormatError(String),

    /// General runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Abandons the current assertion or run
    Fatal,
    /// Degrades one node's rendering, instrumentation proceeds
    Warning,
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Create an unsupported-construct error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::Unsupported(_) => ErrorSeverity::Warning,
            Error::DepthLimitExceeded { .. } => ErrorSeverity::Warning,

            Error::MissingRoutine { .. }
            | Error::InvalidOptions(_)
            | Error::InvalidTree(_)
            | Error::Serialization(_)
            | Error::UndefinedVariable { .. }
            | Error::UndefinedFunction { .. }
            | Error::TypeError { .. }
            | Error::DivisionByZero
            | Error::FormatError(_)
            | Error::RuntimeError(_) => ErrorSeverity::Fatal,
        }
    }

    /// Returns true if only part of an assertion is affected
    pub fn is_local(&self) -> bool {
        self.classify() == ErrorSeverity::Warning
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type for instrumentation operations
pub type Result<T> = std::result::Result<T, Error>;
