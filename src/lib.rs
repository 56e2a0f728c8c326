//! # refract
//!
//! CSS parsing and transformation with lazy refinement and phased passes.
//!
//! This crate is a thin facade over [`rcss`], the engine crate. It
//! re-exports the engine's API so that hosts depend on a single crate.
//!
//! ```rust
//! let sheet = refract::parse_stylesheet(".a, #b { color: red }").unwrap();
//! assert_eq!(sheet.rules().count(), 1);
//! ```

pub use rcss::*;
