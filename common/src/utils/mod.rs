//! Utility functions and helpers.
//!
//! Every routine is stateless. The file and date-from-today helpers read the
//! filesystem or clock; everything else is a pure function of its arguments.

pub mod date;
pub mod file;
pub mod hash;
pub mod id_generator;
pub mod iterable;
pub mod number;
pub mod sql_validator;
pub mod string;

// Re-export commonly used types
pub use hash::{hash_str, HashAlgorithm};
pub use id_generator::IdGenerator;
pub use iterable::{chunk, dedupe, dedupe_by_key, flatten, partition};
pub use number::{dround, parse_decimal, parse_float, parse_int};
pub use sql_validator::{value_placeholders, SqlValidator};
pub use string::titlecase;
