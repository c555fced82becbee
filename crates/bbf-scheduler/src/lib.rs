// crates/bbf-scheduler/src/lib.rs

//! Exhaustive DFS search over busy beaver programs (`spec.md` §4.10), with
//! resume-vector fast-forwarding and a step-count histogram report
//! (`SPEC_FULL.md` §2's supplemented features).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod histogram;
pub mod resume;
pub mod searcher;

pub use histogram::StepHistogram;
pub use resume::{all_ops, resumed_ops, ResumeCursor};
pub use searcher::{run_search, SearchReport};
