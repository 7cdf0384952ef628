//! Assertion sites handed over by the front-end classifier

use super::expr::Expression;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position of an assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File name as spelled by the front-end
    pub file: String,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl SourceLocation {
    /// Creates a location
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One recognised assertion: its condition tree plus everything needed to
/// print a header for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionSite {
    /// The asserted condition
    pub condition: Expression,
    /// Original source text of the condition
    pub source_text: String,
    /// Where the assertion is
    pub location: SourceLocation,
    /// Enclosing function name
    pub function: String,
}

impl AssertionSite {
    /// Creates a site
    pub fn new(
        condition: Expression,
        source_text: impl Into<String>,
        location: SourceLocation,
        function: impl Into<String>,
    ) -> Self {
        Self {
            condition,
            source_text: source_text.into(),
            location,
            function: function.into(),
        }
    }

    /// Decodes a site serialized by a host front-end
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Encodes the site as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
