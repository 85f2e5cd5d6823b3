//! Domain types used throughout the pipelines.
//!
//! This module defines:
//!
//! - configuration enums (`Geometry`, `PtModelKind`) and the TOML `RunConfig`
//! - explicit `PhysicalConstants`
//! - parsed MCMC results (`BestFitRecord`, `SplitParameters`)

pub mod types;

pub use types::*;
