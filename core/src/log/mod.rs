//! Telemetry log parsing.
//!
//! The simulator writes debriefings in one of two shapes. Fully resolved
//! missions produce a nested table document; multiplayer sessions produce text
//! that only holds together line by line. [`parse_log`] tries the nested
//! grammar first and falls back to the line grammar.

mod flat;
mod structured;
pub mod table;

pub use flat::parse_flat;
pub use structured::parse_structured;
pub use table::{Key, Table, Value};

use crate::error::{GrammarError, StructuralParseError};

/// Which grammar produced a [`ParsedLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    Structured,
    FlatMultiplayer,
}

impl SchemaVariant {
    pub fn parse(self, input: &str) -> Result<Table, GrammarError> {
        match self {
            SchemaVariant::Structured => parse_structured(input),
            SchemaVariant::FlatMultiplayer => parse_flat(input),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub variant: SchemaVariant,
    pub table: Table,
}

/// Parse raw log text, structured grammar first.
pub fn parse_log(input: &str) -> Result<ParsedLog, StructuralParseError> {
    let structured = match SchemaVariant::Structured.parse(input) {
        Ok(table) => {
            return Ok(ParsedLog {
                variant: SchemaVariant::Structured,
                table,
            });
        }
        Err(e) => e,
    };

    tracing::debug!(error = %structured, "Structured grammar rejected log, trying flat grammar");

    match SchemaVariant::FlatMultiplayer.parse(input) {
        Ok(table) => Ok(ParsedLog {
            variant: SchemaVariant::FlatMultiplayer,
            table,
        }),
        Err(flat) => Err(StructuralParseError {
            input: input.to_string(),
            structured,
            flat,
        }),
    }
}
