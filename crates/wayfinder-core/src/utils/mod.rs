//! Utility types shared across wayfinder crates.
//!
//! - [`MultiValueDict`]: an insertion-ordered dictionary holding several values per key.

mod multi_value_dict;

pub use multi_value_dict::{MultiValueDict, MultiValueIter};
