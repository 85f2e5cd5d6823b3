//! Model layer of the reconstruction.
//!
//! - parameter expansion and splitting (`params`)
//! - parametric PT profiles (`pt`)
//! - abundance scaling and mean molecular mass (`abundance`)
//! - hydrostatic layer radii (`hydrostatic`)

pub mod abundance;
pub mod hydrostatic;
pub mod params;
pub mod pt;

pub use abundance::*;
pub use hydrostatic::*;
pub use params::*;
pub use pt::*;
