//! Tuple Filename Encoding
//!
//! Every tuple is a regular file whose name carries the tuple's identity,
//! ordering, and expiry. The filename is the entire metadata protocol:
//! payload files contain nothing but payload bytes.
//!
//! ## Filename Grammar
//!
//! ```text
//! name ( "-" seq )? ( "-" rand )? ( "." expiry )?
//! ```
//!
//! - `name`: the logical tuple identity. Must not contain `-` or `.`
//!   (those are the field separators).
//! - `seq`: exactly 8 decimal digits, zero-padded. Present in FIFO mode.
//! - `rand`: exactly 8 lowercase hex digits. Present unless the tuple was
//!   published in replacement mode.
//! - `expiry`: seconds since the Unix epoch, present only when the tuple
//!   has a TTL.
//!
//! ## Examples
//!
//! ```text
//! job-7f3a91c2              plain publication, never expires
//! job-00000042-7f3a91c2     FIFO publication, sequence 42
//! job-7f3a91c2.1735689600   plain publication expiring at 1735689600
//! config                    replacement-mode singleton slot
//! ```
//!
//! Because `seq` is fixed-width, lexicographic filename order among tuples
//! that share a `name` and carry a sequence token is FIFO insertion order.

use rand::Rng;
use std::fmt;
use thiserror::Error;

/// Width of the zero-padded sequence field.
pub const SEQ_WIDTH: usize = 8;

/// Width of the random disambiguator field.
pub const RAND_WIDTH: usize = 8;

/// Separator introducing the `seq` and `rand` fields.
pub const FIELD_SEP: char = '-';

/// Separator introducing the `expiry` field.
pub const EXPIRY_SEP: char = '.';

/// Errors raised while validating a tuple name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The tuple name is empty
    #[error("tuple name is empty")]
    Empty,

    /// The tuple name contains a reserved or unsafe character
    #[error("tuple name {name:?} contains reserved character {ch:?}")]
    ReservedChar { name: String, ch: char },
}

/// Validates a logical tuple name.
///
/// A name must be non-empty and must not contain the field separators
/// (`-`, `.`) or path-hostile characters (`/`, NUL).
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if let Some(ch) = name
        .chars()
        .find(|&c| c == FIELD_SEP || c == EXPIRY_SEP || c == '/' || c == '\0')
    {
        return Err(NameError::ReservedChar {
            name: name.to_string(),
            ch,
        });
    }
    Ok(())
}

/// Generates a fresh random disambiguator: 8 lowercase hex digits.
///
/// Collisions are tolerated by the protocol (the atomic rename would simply
/// overwrite an improbable duplicate), so a fast thread-local generator is
/// sufficient.
pub fn random_token() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}

/// Builder for an encoded tuple filename.
///
/// # Example
///
/// ```
/// use lindafs::name::TupleName;
///
/// let file = TupleName::new("job")
///     .unwrap()
///     .with_seq(42)
///     .with_rand("7f3a91c2".to_string())
///     .encode();
/// assert_eq!(file, "job-00000042-7f3a91c2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleName {
    name: String,
    seq: Option<u64>,
    rand: Option<String>,
    expiry: Option<u64>,
}

impl TupleName {
    /// Creates a builder for a validated tuple name.
    pub fn new(name: &str) -> Result<Self, NameError> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            seq: None,
            rand: None,
            expiry: None,
        })
    }

    /// Attaches a FIFO sequence token.
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    /// Attaches a random disambiguator (see [`random_token`]).
    pub fn with_rand(mut self, rand: String) -> Self {
        self.rand = Some(rand);
        self
    }

    /// Attaches an absolute expiry timestamp (seconds since the epoch).
    pub fn with_expiry(mut self, expiry: u64) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Returns the logical tuple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encodes the filename.
    pub fn encode(&self) -> String {
        let mut out = self.name.clone();
        if let Some(seq) = self.seq {
            out.push(FIELD_SEP);
            out.push_str(&format!("{:0width$}", seq, width = SEQ_WIDTH));
        }
        if let Some(rand) = &self.rand {
            out.push(FIELD_SEP);
            out.push_str(rand);
        }
        if let Some(expiry) = self.expiry {
            out.push(EXPIRY_SEP);
            out.push_str(&expiry.to_string());
        }
        out
    }
}

impl fmt::Display for TupleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_bare_name() {
        let name = TupleName::new("config").unwrap();
        assert_eq!(name.encode(), "config");
    }

    #[test]
    fn test_encode_with_rand() {
        let name = TupleName::new("job")
            .unwrap()
            .with_rand("deadbeef".to_string());
        assert_eq!(name.encode(), "job-deadbeef");
    }

    #[test]
    fn test_encode_with_seq_and_rand() {
        let name = TupleName::new("job")
            .unwrap()
            .with_seq(7)
            .with_rand("deadbeef".to_string());
        assert_eq!(name.encode(), "job-00000007-deadbeef");
    }

    #[test]
    fn test_encode_with_expiry() {
        let name = TupleName::new("job")
            .unwrap()
            .with_rand("deadbeef".to_string())
            .with_expiry(1735689600);
        assert_eq!(name.encode(), "job-deadbeef.1735689600");
    }

    #[test]
    fn test_encode_replacement_with_expiry() {
        let name = TupleName::new("slot").unwrap().with_expiry(99);
        assert_eq!(name.encode(), "slot.99");
    }

    #[test]
    fn test_seq_is_zero_padded() {
        let name = TupleName::new("q").unwrap().with_seq(123);
        assert_eq!(name.encode(), "q-00000123");
    }

    #[test]
    fn test_seq_beyond_width_still_encodes() {
        // Counter overflow past 10^8 is undefined for ordering but must not
        // corrupt the filename itself.
        let name = TupleName::new("q").unwrap().with_seq(123_456_789);
        assert_eq!(name.encode(), "q-123456789");
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert_eq!(validate_name(""), Err(NameError::Empty));
    }

    #[test]
    fn test_validate_rejects_separators() {
        assert!(matches!(
            validate_name("a-b"),
            Err(NameError::ReservedChar { ch: '-', .. })
        ));
        assert!(matches!(
            validate_name("a.b"),
            Err(NameError::ReservedChar { ch: '.', .. })
        ));
        assert!(matches!(
            validate_name("a/b"),
            Err(NameError::ReservedChar { ch: '/', .. })
        ));
    }

    #[test]
    fn test_validate_accepts_underscores_and_digits() {
        assert!(validate_name("job_42").is_ok());
        assert!(validate_name("UPPER").is_ok());
    }

    #[test]
    fn test_random_token_shape() {
        for _ in 0..100 {
            let token = random_token();
            assert_eq!(token.len(), RAND_WIDTH);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_random_tokens_differ() {
        // Not a uniformity test, just a sanity check that the source is live.
        let a = random_token();
        let b = random_token();
        let c = random_token();
        assert!(a != b || b != c);
    }
}
