//! Parallel evolutionary optimization of heterogeneous parameter
//! vectors.
//!
//! A candidate solution is an ordered set of typed parameters (real,
//! bounded-real, integer, bounded-integer, boolean, character), each
//! carrying its own self-adaptive mutation operators. A population of μ
//! parents and λ children iterates recombine → adapt → evaluate →
//! select against a user-supplied objective, with pluggable evaluation
//! strategies (serial, thread-pool, external dispatch), composable halt
//! predicates and checkpoint/resume in three interchangeable encodings.
//!
//! # Usage
//!
//! Build a prototype [`Individual`] out of parameters and adaptors,
//! hand it to a [`ea::Population`] together with an objective, and run:
//!
//! ```
//! use parevo::adaptor::{GaussAdaptor, RealAdaptor};
//! use parevo::ea::{EaConfig, Population};
//! use parevo::parameter::{BoundedRealParameter, Parameter, ParameterSet};
//! use parevo::Individual;
//!
//! let mut set = ParameterSet::new();
//! for _ in 0..3 {
//!     let mut p = BoundedRealParameter::new(2.0, -10.0, 10.0).unwrap();
//!     p.add_adaptor(RealAdaptor::Gauss(GaussAdaptor::new()));
//!     set.push(Parameter::BoundedReal(p));
//! }
//!
//! let config = EaConfig::default()
//!     .with_population_size(20)
//!     .with_n_parents(3)
//!     .with_max_iterations(50)
//!     .with_report_iteration(0)
//!     .with_seed(42);
//! let mut population = Population::new(config, |params| {
//!     Ok(params.real_values().iter().map(|x| x * x).sum())
//! });
//! population.push(Individual::new(set));
//!
//! let result = population.optimize().unwrap();
//! assert!(result.best_fitness < 12.0);
//! ```

pub mod adaptor;
pub mod checkpoint;
pub mod ea;
pub mod error;
pub mod evaluate;
pub mod halt;
pub mod individual;
pub mod options;
pub mod parameter;
pub mod random;

pub use error::{Error, Result};
pub use evaluate::CancelToken;
pub use halt::HaltReason;
pub use individual::{Individual, Personality};
