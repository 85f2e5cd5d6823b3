//! Terminal reports for the pipelines.

pub mod format;

pub use format::*;
