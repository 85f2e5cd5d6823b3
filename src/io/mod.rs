//! Input/output helpers.
//!
//! - run configuration (`config`)
//! - retrieval inputs: MCMC log, sampler output, atmosphere, TEP, pressure grid
//! - spectrum, filter, and stellar-model readers (`spectrum`)
//! - best-fit outputs: atmosphere/transit config rewriting, CSV and JSON exports

pub mod atm;
pub mod config;
pub mod export;
pub mod mcmc_log;
pub mod pressure;
pub mod sampler;
pub mod spectrum;
pub mod summary;
pub mod tconfig;
pub mod tep;

pub use atm::*;
pub use config::*;
pub use export::*;
pub use mcmc_log::*;
pub use pressure::*;
pub use sampler::*;
pub use spectrum::*;
pub use summary::*;
pub use tconfig::*;
pub use tep::*;
