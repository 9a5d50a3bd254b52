//! Tuple Filename Parser
//!
//! The inverse of the encoder in [`types`](super::types): given a directory
//! basename, decide whether it denotes a tuple and extract its fields.
//!
//! ## How the Parser Works
//!
//! The tuple directory is shared with the engine's own bookkeeping files, so
//! the parser is also the gatekeeper that keeps non-tuples out of match
//! results:
//!
//! - names beginning with `.` are engine-private (sequence counters, lock
//!   sentinels on sequence counters),
//! - `<path>.lock` and `<path>.tmp.<pid>.<hex>` sidecars fail the expiry
//!   field check (their suffix is not a decimal timestamp),
//! - anything else that does not fit the grammar is rejected with a precise
//!   reason.
//!
//! Callers that enumerate the directory treat any [`ParseError`] as "not a
//! tuple, skip it"; the error detail exists for diagnostics and tests.

use thiserror::Error;

use crate::name::types::{EXPIRY_SEP, FIELD_SEP, RAND_WIDTH, SEQ_WIDTH};

/// Errors describing why a basename is not a tuple filename.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The basename is empty
    #[error("empty filename")]
    Empty,

    /// The basename starts with `.` and is engine bookkeeping, not a tuple
    #[error("engine-private file")]
    EnginePrivate,

    /// The basename has no name field before the separators
    #[error("missing tuple name")]
    MissingName,

    /// The suffix after `.` is not a decimal expiry timestamp
    #[error("invalid expiry field: {0:?}")]
    InvalidExpiry(String),

    /// A `-` field is neither an 8-digit sequence nor an 8-hex disambiguator
    #[error("invalid field: {0:?}")]
    InvalidField(String),

    /// More fields than the grammar allows
    #[error("too many fields: {0}")]
    TooManyFields(usize),
}

/// A tuple filename decoded into its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTuple {
    /// Logical tuple name (match key)
    pub name: String,
    /// FIFO sequence counter, if the tuple was published in seq mode
    pub seq: Option<u64>,
    /// Random disambiguator, absent for replacement-mode tuples
    pub rand: Option<String>,
    /// Absolute expiry in seconds since the epoch; `None` = never expires
    pub expiry: Option<u64>,
}

impl ParsedTuple {
    /// Returns true if the tuple's encoded expiry is at or before `now`.
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiry.map(|exp| now >= exp).unwrap_or(false)
    }
}

/// Returns true for a sequence field: exactly 8 decimal digits.
fn is_seq_field(s: &str) -> bool {
    s.len() == SEQ_WIDTH && s.bytes().all(|b| b.is_ascii_digit())
}

/// Returns true for a disambiguator field: exactly 8 lowercase hex digits.
fn is_rand_field(s: &str) -> bool {
    s.len() == RAND_WIDTH
        && s.bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Parses a directory basename into tuple fields.
///
/// # Returns
///
/// - `Ok(parsed)` - the basename denotes a tuple
/// - `Err(e)` - the basename is bookkeeping, a sidecar, or malformed;
///   matchers skip such entries
pub fn parse_basename(basename: &str) -> Result<ParsedTuple, ParseError> {
    if basename.is_empty() {
        return Err(ParseError::Empty);
    }
    if basename.starts_with(EXPIRY_SEP) {
        return Err(ParseError::EnginePrivate);
    }

    // The name itself can never contain `.`, so the first dot starts the
    // expiry field. A non-numeric remainder (".lock", ".tmp.1234.beef")
    // marks a sidecar, not a tuple.
    let (head, expiry) = match basename.split_once(EXPIRY_SEP) {
        Some((head, rest)) => {
            if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseError::InvalidExpiry(rest.to_string()));
            }
            let secs = rest
                .parse::<u64>()
                .map_err(|_| ParseError::InvalidExpiry(rest.to_string()))?;
            (head, Some(secs))
        }
        None => (basename, None),
    };

    let mut fields = head.split(FIELD_SEP);
    let name = fields.next().unwrap_or_default();
    if name.is_empty() {
        return Err(ParseError::MissingName);
    }

    let rest: Vec<&str> = fields.collect();
    let (seq, rand) = match rest.as_slice() {
        [] => (None, None),
        [field] => {
            if is_seq_field(field) {
                (Some(parse_seq(field)), None)
            } else if is_rand_field(field) {
                (None, Some(field.to_string()))
            } else {
                return Err(ParseError::InvalidField(field.to_string()));
            }
        }
        [seq_field, rand_field] => {
            if !is_seq_field(seq_field) {
                return Err(ParseError::InvalidField(seq_field.to_string()));
            }
            if !is_rand_field(rand_field) {
                return Err(ParseError::InvalidField(rand_field.to_string()));
            }
            (Some(parse_seq(seq_field)), Some(rand_field.to_string()))
        }
        more => return Err(ParseError::TooManyFields(more.len())),
    };

    Ok(ParsedTuple {
        name: name.to_string(),
        seq,
        rand,
        expiry,
    })
}

fn parse_seq(field: &str) -> u64 {
    // is_seq_field guarantees 8 ASCII digits, which always fit in u64.
    field.parse::<u64>().unwrap_or(0)
}

/// Extracts the logical name from a basename: the substring before the
/// first `-` or `.`. Used by `ls` for grouping.
pub fn logical_name(basename: &str) -> &str {
    let end = basename
        .find(|c| c == FIELD_SEP || c == EXPIRY_SEP)
        .unwrap_or(basename.len());
    &basename[..end]
}
