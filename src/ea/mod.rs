//! Parent-child evolutionary algorithm.
//!
//! The population owns μ parents and λ children; every iteration the
//! children copy a parent, mutate through their parameters' adaptors
//! and compete for the parent slots under the configured selection
//! scheme.
//!
//! # Key Types
//!
//! - [`EaConfig`]: algorithm parameters (population split, selection,
//!   halting, check-pointing), with file/CLI binding
//! - [`Population`]: the individuals plus the optimization loop
//! - [`SortingMode`] / [`RecombinationMode`]: selection and parent-pick
//!   schemes
//! - [`EaResult`]: final outcome with halt reason and history
//!
//! # References
//!
//! - Rechenberg (1973), *Evolutionsstrategie*
//! - Beyer & Schwefel (2002), "Evolution strategies — A comprehensive
//!   introduction"

mod config;
mod population;
mod types;

pub use config::{EaConfig, GaussSettings};
pub use population::Population;
pub use types::{EaResult, RecombinationMode, SortingMode};
