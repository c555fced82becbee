// crates/bbf-format/src/lib.rs

//! Textual program encoding and JSON/CBOR result I/O (`spec.md` §6's
//! "out of scope but fixed" program textual form, plus `SPEC_FULL.md` §1's
//! ambient serialization stack).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod io;
pub mod program;
pub mod result;

pub use io::{read_versioned_auto, write_versioned_auto, Versioned, FORMAT_VERSION};
pub use result::{HistogramBucket, ResumeVectorRecord, SearchResultRecord};
