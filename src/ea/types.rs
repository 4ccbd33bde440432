//! Enums and result types for the evolutionary algorithm.

use crate::halt::HaltReason;
use crate::individual::Individual;
use serde::{Deserialize, Serialize};

/// How the next generation's parents are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortingMode {
    /// μ+λ: parents compete with children; quality is monotone
    /// non-decreasing but the search stalls more easily.
    #[default]
    MuPlusNu,
    /// μ,λ: parents are always replaced by the best children; quality
    /// may decrease, which helps against stalls.
    MuCommaNu,
    /// μ,λ with elitism: the best parent survives unless a child beats
    /// it. Falls back to μ+λ for μ = 1 and in the first iteration.
    MuNuPretain,
}

impl std::str::FromStr for SortingMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mu_plus_nu" | "mu+nu" | "plus" => Ok(SortingMode::MuPlusNu),
            "mu_comma_nu" | "mu,nu" | "comma" => Ok(SortingMode::MuCommaNu),
            "mu_nu_pretain" | "mu+1" | "pretain" | "retain" => Ok(SortingMode::MuNuPretain),
            other => Err(crate::Error::invalid(format!(
                "unknown sorting mode {other:?} (expected mu_plus_nu, mu_comma_nu or mu_nu_pretain)"
            ))),
        }
    }
}

impl std::fmt::Display for SortingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SortingMode::MuPlusNu => "mu_plus_nu",
            SortingMode::MuCommaNu => "mu_comma_nu",
            SortingMode::MuNuPretain => "mu_nu_pretain",
        };
        f.write_str(s)
    }
}

/// How children pick the parent they are copied from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecombinationMode {
    /// The library default (behaves like [`RecombinationMode::Random`]).
    #[default]
    Default,
    /// Uniform over parents.
    Random,
    /// Rank-weighted: parent `i` (best first) is picked with
    /// probability proportional to `1/(i+2)`. Falls back to random
    /// whenever parents lack valid fitness.
    Value,
}

impl std::str::FromStr for RecombinationMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(RecombinationMode::Default),
            "random" => Ok(RecombinationMode::Random),
            "value" => Ok(RecombinationMode::Value),
            other => Err(crate::Error::invalid(format!(
                "unknown recombination mode {other:?} (expected default, random or value)"
            ))),
        }
    }
}

impl std::fmt::Display for RecombinationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecombinationMode::Default => "default",
            RecombinationMode::Random => "random",
            RecombinationMode::Value => "value",
        };
        f.write_str(s)
    }
}

/// Outcome of an optimization run.
#[derive(Clone, Debug)]
pub struct EaResult {
    /// The best individual at the end of the run.
    pub best: Individual,

    /// Raw fitness of the best individual.
    pub best_fitness: f64,

    /// Completed iterations (absolute, including resumed ones).
    pub iterations: u32,

    /// Which predicate ended the run.
    pub halt: HaltReason,

    /// Best raw fitness at the end of each completed iteration of this
    /// run.
    pub fitness_history: Vec<f64>,
}
