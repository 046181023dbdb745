//! Literal tokens used in step lines
//!
//! Each enum that appears in configuration text has an explicit lookup table
//! from its token to its value. Matching is case-insensitive; the canonical
//! spelling is what gets written back out.

use crate::{Error, Result};

/// An enum that is spelled as a fixed token in configuration text
pub trait Token: Sized + Copy + PartialEq + 'static {
    /// Human-readable name of the enum, used in error messages
    const KIND: &'static str;

    /// Canonical token for every value
    const TABLE: &'static [(&'static str, Self)];

    /// Look up a token (case-insensitive)
    fn from_token(token: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token.trim()))
            .map(|(_, value)| *value)
    }

    /// Canonical token for this value
    fn token(&self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, value)| value == self)
            .map(|(name, _)| *name)
            .unwrap_or("")
    }
}

/// Parse a token, reporting the offending literal and the line it came from
pub fn parse_token<T: Token>(value: &str, context: &str) -> Result<T> {
    T::from_token(value).ok_or_else(|| Error::InvalidValue {
        kind: T::KIND,
        value: value.to_string(),
        context: context.to_string(),
    })
}

/// Parse a `true`/`false` literal (case-insensitive)
pub fn parse_bool(value: &str, context: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::InvalidValue {
            kind: "boolean",
            value: value.to_string(),
            context: context.to_string(),
        }),
    }
}

/// Parse a decimal number
pub fn parse_number(value: &str, line: &str) -> Result<f32> {
    value.trim().parse::<f32>().map_err(|_| Error::InvalidNumber {
        value: value.to_string(),
        line: line.to_string(),
    })
}

/// Split a step line into exactly `expected` semicolon-separated fields
pub fn split_fields(line: &str, expected: usize) -> Result<Vec<&str>> {
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() != expected {
        return Err(Error::FieldCount {
            expected,
            received: fields.len(),
            line: line.to_string(),
        });
    }
    Ok(fields)
}
