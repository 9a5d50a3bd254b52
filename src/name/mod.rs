//! Tuple Naming Protocol
//!
//! Filenames are the entire coordination protocol of the tuple space: a
//! tuple's identity, FIFO position, uniqueness, and expiry all live in its
//! basename, and the payload file holds nothing but payload bytes.
//!
//! ## Modules
//!
//! - `types`: the [`TupleName`] encoder, name validation, and the random
//!   disambiguator source
//! - `parser`: the decoder that turns directory basenames back into fields
//!   and screens out the engine's own bookkeeping files
//!
//! ## Example
//!
//! ```
//! use lindafs::name::{parse_basename, TupleName};
//!
//! let encoded = TupleName::new("job")
//!     .unwrap()
//!     .with_seq(1)
//!     .with_rand("0badcafe".to_string())
//!     .encode();
//!
//! let parsed = parse_basename(&encoded).unwrap();
//! assert_eq!(parsed.name, "job");
//! assert_eq!(parsed.seq, Some(1));
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used items for convenience
pub use parser::{logical_name, parse_basename, ParseError, ParsedTuple};
pub use types::{random_token, validate_name, NameError, TupleName, RAND_WIDTH, SEQ_WIDTH};
