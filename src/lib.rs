//! `bart-post` library crate.
//!
//! The binary (`bartpost`) is a thin wrapper around this library so that:
//!
//! - the pipelines are testable without spawning processes
//! - readers, models, and plots are reusable from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod band;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod posterior;
pub mod report;
