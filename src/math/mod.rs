//! Numerical utilities: interpolation/integration, order statistics, and the
//! exponential integral.

pub mod expint;
pub mod interp;
pub mod stats;

pub use expint::*;
pub use interp::*;
pub use stats::*;
