//! EA configuration.
//!
//! [`EaConfig`] holds all parameters that control the evolutionary
//! loop, in the builder-with-validate shape used throughout the crate.
//! Beyond the builder, the full configuration surface is exposed as a
//! typed option registry, so runs can be configured from a `key =
//! value` file or command-line tokens with defaults, comments and
//! validation in one place.
//!
//! # Defaults
//!
//! ```
//! use parevo::ea::EaConfig;
//!
//! let config = EaConfig::default();
//! assert_eq!(config.population_size, 100);
//! assert_eq!(config.n_parents, 5);
//! assert_eq!(config.max_iterations, 1000);
//! ```
//!
//! # Builder Pattern
//!
//! ```
//! use parevo::ea::{EaConfig, SortingMode};
//!
//! let config = EaConfig::default()
//!     .with_population_size(200)
//!     .with_n_parents(10)
//!     .with_sorting_mode(SortingMode::MuCommaNu)
//!     .with_seed(42);
//! assert!(config.validate().is_ok());
//! ```

use super::types::{RecombinationMode, SortingMode};
use crate::adaptor::{
    GaussAdaptor, DEFAULT_ADAPTION_PROBABILITY, DEFAULT_ADAPTION_THRESHOLD, DEFAULT_MAX_SIGMA,
    DEFAULT_MIN_SIGMA, DEFAULT_SIGMA, DEFAULT_SIGMA_SIGMA,
};
use crate::checkpoint::SerializationMode;
use crate::error::{Error, Result};
use crate::options::{OptionRegistry, OptionValue};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shape defaults handed to gaussian adaptors built from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussSettings {
    pub sigma: f64,
    pub sigma_sigma: f64,
    pub sigma_min: f64,
    pub sigma_max: f64,
    pub adaption_probability: f64,
    pub adaption_threshold: u32,
}

impl Default for GaussSettings {
    fn default() -> Self {
        GaussSettings {
            sigma: DEFAULT_SIGMA,
            sigma_sigma: DEFAULT_SIGMA_SIGMA,
            sigma_min: DEFAULT_MIN_SIGMA,
            sigma_max: DEFAULT_MAX_SIGMA,
            adaption_probability: DEFAULT_ADAPTION_PROBABILITY,
            adaption_threshold: DEFAULT_ADAPTION_THRESHOLD,
        }
    }
}

impl GaussSettings {
    /// Builds a gaussian adaptor from these settings.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when any shape invariant is violated.
    pub fn build_adaptor(&self) -> Result<GaussAdaptor> {
        let mut adaptor = GaussAdaptor::with_shape(
            self.sigma,
            self.sigma_sigma,
            self.sigma_min,
            self.sigma_max,
        )?;
        adaptor.set_adaption_probability(self.adaption_probability)?;
        adaptor.set_adaption_threshold(self.adaption_threshold);
        Ok(adaptor)
    }
}

/// Configuration for the parent-child evolutionary algorithm.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EaConfig {
    /// Number of individuals in the population (μ + λ).
    pub population_size: usize,

    /// Number of parents μ; the remaining `population_size - μ`
    /// individuals are children.
    pub n_parents: usize,

    /// Iteration budget. 0 disables the predicate.
    pub max_iterations: u32,

    /// Consecutive non-improving iterations before halting. 0 disables.
    pub max_stall_iterations: u32,

    /// Wall-clock budget. Zero disables.
    pub max_duration: Duration,

    /// Emit a progress report every n-th iteration. 0 silences reports.
    pub report_iteration: u32,

    /// Checkpoint cadence: `n > 0` every n-th iteration, `-1` on every
    /// improvement, `0` disables.
    pub checkpoint_interval: i64,

    /// Directory checkpoint files are written to.
    pub checkpoint_directory: PathBuf,

    /// Base name of checkpoint files.
    pub checkpoint_basename: String,

    /// On-disk encoding of checkpoint bodies.
    pub checkpoint_mode: SerializationMode,

    /// How children pick their parent.
    pub recombination_mode: RecombinationMode,

    /// How the next generation's parents are selected.
    pub sorting_mode: SortingMode,

    /// Optimization direction; `false` minimizes.
    pub maximize: bool,

    /// Halt as soon as the best fitness reaches this value (under the
    /// active direction). `None` disables.
    pub quality_threshold: Option<f64>,

    /// Individuals added per iteration when population growth is
    /// enabled. 0 disables growth.
    pub growth_rate: usize,

    /// Ceiling for population growth; required when `growth_rate > 0`.
    pub max_population_size: usize,

    /// Run seed; `None` draws one from OS entropy.
    pub seed: Option<u64>,

    /// Shape defaults for gaussian adaptors built from configuration.
    pub gauss: GaussSettings,
}

impl Default for EaConfig {
    fn default() -> Self {
        EaConfig {
            population_size: 100,
            n_parents: 5,
            max_iterations: 1000,
            max_stall_iterations: 0,
            max_duration: Duration::ZERO,
            report_iteration: 1,
            checkpoint_interval: 0,
            checkpoint_directory: PathBuf::from("checkpoints"),
            checkpoint_basename: String::from("parevo.cp"),
            checkpoint_mode: SerializationMode::default(),
            recombination_mode: RecombinationMode::default(),
            sorting_mode: SortingMode::default(),
            maximize: false,
            quality_threshold: None,
            growth_rate: 0,
            max_population_size: 0,
            seed: None,
            gauss: GaussSettings::default(),
        }
    }
}

impl EaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of parents μ.
    pub fn with_n_parents(mut self, n: usize) -> Self {
        self.n_parents = n;
        self
    }

    /// Sets the iteration budget (0 disables).
    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the stall budget (0 disables).
    pub fn with_max_stall_iterations(mut self, n: u32) -> Self {
        self.max_stall_iterations = n;
        self
    }

    /// Sets the wall-clock budget (zero disables).
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = duration;
        self
    }

    /// Sets the report cadence (0 silences reports).
    pub fn with_report_iteration(mut self, n: u32) -> Self {
        self.report_iteration = n;
        self
    }

    /// Sets the checkpoint cadence.
    pub fn with_checkpoint_interval(mut self, interval: i64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Sets where and under which name checkpoints are written.
    pub fn with_checkpoint_location(
        mut self,
        directory: impl Into<PathBuf>,
        basename: impl Into<String>,
    ) -> Self {
        self.checkpoint_directory = directory.into();
        self.checkpoint_basename = basename.into();
        self
    }

    /// Sets the checkpoint encoding.
    pub fn with_checkpoint_mode(mut self, mode: SerializationMode) -> Self {
        self.checkpoint_mode = mode;
        self
    }

    /// Sets the recombination mode.
    pub fn with_recombination_mode(mut self, mode: RecombinationMode) -> Self {
        self.recombination_mode = mode;
        self
    }

    /// Sets the sorting mode.
    pub fn with_sorting_mode(mut self, mode: SortingMode) -> Self {
        self.sorting_mode = mode;
        self
    }

    /// Sets the optimization direction.
    pub fn with_maximize(mut self, maximize: bool) -> Self {
        self.maximize = maximize;
        self
    }

    /// Sets the quality threshold (`None` disables).
    pub fn with_quality_threshold(mut self, threshold: Option<f64>) -> Self {
        self.quality_threshold = threshold;
        self
    }

    /// Enables population growth of `rate` individuals per iteration up
    /// to `max_population_size`.
    pub fn with_growth(mut self, rate: usize, max_population_size: usize) -> Self {
        self.growth_rate = rate;
        self.max_population_size = max_population_size;
        self
    }

    /// Sets the run seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the gaussian adaptor defaults.
    pub fn with_gauss(mut self, gauss: GaussSettings) -> Self {
        self.gauss = gauss;
        self
    }

    /// The number of children λ implied by this configuration.
    pub fn n_children(&self) -> usize {
        self.population_size.saturating_sub(self.n_parents)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] with a description of the first
    /// violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::invalid("population_size must be at least 1"));
        }
        if self.n_parents == 0 {
            return Err(Error::invalid("n_parents must be at least 1"));
        }
        if self.n_parents > self.population_size {
            return Err(Error::invalid(format!(
                "n_parents ({}) exceeds population_size ({})",
                self.n_parents, self.population_size
            )));
        }
        if matches!(
            self.sorting_mode,
            SortingMode::MuCommaNu | SortingMode::MuNuPretain
        ) && self.n_children() < self.n_parents
        {
            return Err(Error::invalid(format!(
                "sorting mode {} needs at least as many children as parents ({} < {})",
                self.sorting_mode,
                self.n_children(),
                self.n_parents
            )));
        }
        if self.growth_rate > 0 && self.max_population_size < self.population_size {
            return Err(Error::invalid(
                "population growth requires max_population_size >= population_size",
            ));
        }
        if self.checkpoint_interval < -1 {
            return Err(Error::invalid(format!(
                "checkpoint_interval must be -1, 0 or positive, got {}",
                self.checkpoint_interval
            )));
        }
        // Building the adaptor exercises every sigma invariant.
        self.gauss.build_adaptor()?;
        Ok(())
    }

    /// Reads a configuration from a `key = value` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<EaConfig> {
        let slot = RefCell::new(EaConfig::default());
        let mut registry = OptionRegistry::new();
        bind_options(&slot, &mut registry);
        registry.parse_file(path)?;
        drop(registry);
        Ok(slot.into_inner())
    }

    /// Reads a configuration from `--key=value` command-line tokens.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<EaConfig> {
        let slot = RefCell::new(EaConfig::default());
        let mut registry = OptionRegistry::new();
        bind_options(&slot, &mut registry);
        registry.parse_args(args)?;
        drop(registry);
        Ok(slot.into_inner())
    }

    /// Writes a commented config-file template with every recognized
    /// option at its default.
    pub fn write_template(path: impl AsRef<Path>) -> Result<()> {
        let slot = RefCell::new(EaConfig::default());
        let mut registry = OptionRegistry::new();
        bind_options(&slot, &mut registry);
        registry.write_template(path)
    }
}

fn to_usize(name: &str, v: &OptionValue) -> Result<usize> {
    let n = v
        .as_int()
        .ok_or_else(|| Error::invalid(format!("option {name:?} must be an int")))?;
    usize::try_from(n).map_err(|_| Error::invalid(format!("option {name:?} must be >= 0, got {n}")))
}

fn to_u32(name: &str, v: &OptionValue) -> Result<u32> {
    let n = v
        .as_int()
        .ok_or_else(|| Error::invalid(format!("option {name:?} must be an int")))?;
    u32::try_from(n).map_err(|_| Error::invalid(format!("option {name:?} must be >= 0, got {n}")))
}

/// Registers the recognized option names against a config slot.
fn bind_options<'a>(slot: &'a RefCell<EaConfig>, registry: &mut OptionRegistry<'a>) {
    registry
        .register(
            "population_size",
            OptionValue::Int(100),
            "number of individuals in the population",
            true,
            move |v| {
                slot.borrow_mut().population_size = to_usize("population_size", v)?;
                Ok(())
            },
        )
        .register(
            "n_parents",
            OptionValue::Int(5),
            "number of parents; the rest of the population are children",
            true,
            move |v| {
                slot.borrow_mut().n_parents = to_usize("n_parents", v)?;
                Ok(())
            },
        )
        .register(
            "max_iterations",
            OptionValue::Int(1000),
            "iteration budget; 0 disables",
            true,
            move |v| {
                slot.borrow_mut().max_iterations = to_u32("max_iterations", v)?;
                Ok(())
            },
        )
        .register(
            "max_stall_iterations",
            OptionValue::Int(0),
            "consecutive non-improving iterations before halting; 0 disables",
            false,
            move |v| {
                slot.borrow_mut().max_stall_iterations = to_u32("max_stall_iterations", v)?;
                Ok(())
            },
        )
        .register(
            "max_duration",
            OptionValue::Real(0.0),
            "wall-clock budget in seconds; 0 disables",
            false,
            move |v| {
                let secs = v.as_real().unwrap_or(0.0);
                if !(secs >= 0.0) {
                    return Err(Error::invalid(format!(
                        "option \"max_duration\" must be >= 0, got {secs}"
                    )));
                }
                slot.borrow_mut().max_duration = Duration::from_secs_f64(secs);
                Ok(())
            },
        )
        .register(
            "report_iteration",
            OptionValue::Int(1),
            "emit a progress report every n-th iteration; 0 silences",
            false,
            move |v| {
                slot.borrow_mut().report_iteration = to_u32("report_iteration", v)?;
                Ok(())
            },
        )
        .register(
            "checkpoint_interval",
            OptionValue::Int(0),
            "checkpoint every n-th iteration; -1 on improvement, 0 disables",
            false,
            move |v| {
                slot.borrow_mut().checkpoint_interval =
                    v.as_int().ok_or_else(|| Error::invalid("expected int"))?;
                Ok(())
            },
        )
        .register(
            "checkpoint_directory",
            OptionValue::Str("checkpoints".into()),
            "directory checkpoint files are written to",
            false,
            move |v| {
                slot.borrow_mut().checkpoint_directory =
                    PathBuf::from(v.as_str().unwrap_or_default());
                Ok(())
            },
        )
        .register(
            "checkpoint_basename",
            OptionValue::Str("parevo.cp".into()),
            "base name of checkpoint files",
            false,
            move |v| {
                slot.borrow_mut().checkpoint_basename = v.as_str().unwrap_or_default().to_string();
                Ok(())
            },
        )
        .register(
            "checkpoint_mode",
            OptionValue::Str("text".into()),
            "checkpoint encoding: text, markup or binary",
            false,
            move |v| {
                slot.borrow_mut().checkpoint_mode = v.as_str().unwrap_or_default().parse()?;
                Ok(())
            },
        )
        .register(
            "recombination_mode",
            OptionValue::Str("default".into()),
            "how children pick their parent: default, random or value",
            false,
            move |v| {
                slot.borrow_mut().recombination_mode = v.as_str().unwrap_or_default().parse()?;
                Ok(())
            },
        )
        .register(
            "sorting_mode",
            OptionValue::Str("mu_plus_nu".into()),
            "selection scheme: mu_plus_nu, mu_comma_nu or mu_nu_pretain",
            false,
            move |v| {
                slot.borrow_mut().sorting_mode = v.as_str().unwrap_or_default().parse()?;
                Ok(())
            },
        )
        .register(
            "maximize",
            OptionValue::Bool(false),
            "optimization direction; false minimizes",
            false,
            move |v| {
                slot.borrow_mut().maximize = v.as_bool().unwrap_or(false);
                Ok(())
            },
        )
        .register(
            "growth_rate",
            OptionValue::Int(0),
            "individuals added per iteration; 0 disables growth",
            false,
            move |v| {
                slot.borrow_mut().growth_rate = to_usize("growth_rate", v)?;
                Ok(())
            },
        )
        .register(
            "max_population_size",
            OptionValue::Int(0),
            "ceiling for population growth",
            false,
            move |v| {
                slot.borrow_mut().max_population_size = to_usize("max_population_size", v)?;
                Ok(())
            },
        )
        .register(
            "seed",
            OptionValue::Int(-1),
            "run seed; negative draws one from OS entropy",
            false,
            move |v| {
                let n = v.as_int().unwrap_or(-1);
                slot.borrow_mut().seed = u64::try_from(n).ok();
                Ok(())
            },
        )
        .register(
            "sigma",
            OptionValue::Real(DEFAULT_SIGMA),
            "gaussian adaptor step width",
            false,
            move |v| {
                slot.borrow_mut().gauss.sigma = v.as_real().unwrap_or(DEFAULT_SIGMA);
                Ok(())
            },
        )
        .register(
            "sigma_sigma",
            OptionValue::Real(DEFAULT_SIGMA_SIGMA),
            "width of the gaussian used for sigma self-adaptation",
            false,
            move |v| {
                slot.borrow_mut().gauss.sigma_sigma = v.as_real().unwrap_or(DEFAULT_SIGMA_SIGMA);
                Ok(())
            },
        )
        .register_with_validator(
            "adaption_probability",
            OptionValue::Real(DEFAULT_ADAPTION_PROBABILITY),
            "probability that one adapt call perturbs the value",
            false,
            |v| {
                let p = v.as_real().unwrap_or(0.0);
                if p > 0.0 && p <= 1.0 {
                    Ok(())
                } else {
                    Err(Error::invalid(format!("must lie in (0, 1], got {p}")))
                }
            },
            move |v| {
                slot.borrow_mut().gauss.adaption_probability =
                    v.as_real().unwrap_or(DEFAULT_ADAPTION_PROBABILITY);
                Ok(())
            },
        )
        .register(
            "adaption_threshold",
            OptionValue::Int(i64::from(DEFAULT_ADAPTION_THRESHOLD)),
            "applications between self-adaptations; 0 disables",
            false,
            move |v| {
                slot.borrow_mut().gauss.adaption_threshold = to_u32("adaption_threshold", v)?;
                Ok(())
            },
        )
        .register_pair(
            "sigma_min",
            OptionValue::Real(DEFAULT_MIN_SIGMA),
            "sigma_max",
            OptionValue::Real(DEFAULT_MAX_SIGMA),
            "allowed range for the self-adapting sigma",
            false,
            move |min, max| {
                let (min, max) = (
                    min.as_real().unwrap_or(DEFAULT_MIN_SIGMA),
                    max.as_real().unwrap_or(DEFAULT_MAX_SIGMA),
                );
                if !(min > 0.0 && min <= max) {
                    return Err(Error::invalid(format!(
                        "sigma range [{min}, {max}] must satisfy 0 < min <= max"
                    )));
                }
                let mut config = slot.borrow_mut();
                config.gauss.sigma_min = min;
                config.gauss.sigma_max = max;
                Ok(())
            },
        )
        .register_pair(
            "has_quality_threshold",
            OptionValue::Bool(false),
            "quality_threshold",
            OptionValue::Real(0.0),
            "halt once the best fitness reaches the threshold",
            false,
            move |has, threshold| {
                slot.borrow_mut().quality_threshold = if has.as_bool().unwrap_or(false) {
                    Some(threshold.as_real().unwrap_or(0.0))
                } else {
                    None
                };
                Ok(())
            },
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EaConfig::default()
            .with_population_size(200)
            .with_n_parents(10)
            .with_max_iterations(500)
            .with_max_stall_iterations(50)
            .with_sorting_mode(SortingMode::MuCommaNu)
            .with_recombination_mode(RecombinationMode::Value)
            .with_maximize(true)
            .with_quality_threshold(Some(100.0))
            .with_seed(42);

        assert_eq!(config.population_size, 200);
        assert_eq!(config.n_parents, 10);
        assert_eq!(config.n_children(), 190);
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.sorting_mode, SortingMode::MuCommaNu);
        assert_eq!(config.recombination_mode, RecombinationMode::Value);
        assert!(config.maximize);
        assert_eq!(config.quality_threshold, Some(100.0));
        assert_eq!(config.seed, Some(42));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_population_size_zero() {
        let config = EaConfig::default().with_population_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_parents_exceed_population() {
        let config = EaConfig::default()
            .with_population_size(10)
            .with_n_parents(11);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_parents() {
        let config = EaConfig::default().with_n_parents(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_comma_mode_needs_enough_children() {
        let config = EaConfig::default()
            .with_population_size(10)
            .with_n_parents(6)
            .with_sorting_mode(SortingMode::MuCommaNu);
        assert!(config.validate().is_err());

        let config = config.with_n_parents(5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_growth_needs_ceiling() {
        let config = EaConfig::default().with_growth(5, 0);
        assert!(config.validate().is_err());
        let config = EaConfig::default().with_growth(5, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_gauss_settings() {
        let mut config = EaConfig::default();
        config.gauss.sigma_min = -1.0;
        config.gauss.sigma_max = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_args() {
        let config = EaConfig::from_args(&[
            "--population_size=64",
            "--n_parents",
            "4",
            "--sorting_mode=mu_comma_nu",
            "--maximize=true",
            "--has_quality_threshold=true",
            "--quality_threshold=1e-6",
            "--sigma=0.25",
            "--seed=7",
        ])
        .unwrap();
        assert_eq!(config.population_size, 64);
        assert_eq!(config.n_parents, 4);
        assert_eq!(config.sorting_mode, SortingMode::MuCommaNu);
        assert!(config.maximize);
        assert_eq!(config.quality_threshold, Some(1e-6));
        assert_eq!(config.gauss.sigma, 0.25);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# core settings").unwrap();
        writeln!(file, "population_size = 32").unwrap();
        writeln!(file, "n_parents = 2").unwrap();
        writeln!(file, "recombination_mode = value").unwrap();
        writeln!(file, "checkpoint_interval = -1").unwrap();
        writeln!(file, "checkpoint_mode = binary").unwrap();
        writeln!(file, "sigma_min = 0.001").unwrap();
        file.flush().unwrap();

        let config = EaConfig::from_file(file.path()).unwrap();
        assert_eq!(config.population_size, 32);
        assert_eq!(config.n_parents, 2);
        assert_eq!(config.recombination_mode, RecombinationMode::Value);
        assert_eq!(config.checkpoint_interval, -1);
        assert_eq!(config.checkpoint_mode, SerializationMode::Binary);
        assert_eq!(config.gauss.sigma_min, 0.001);
        // The untouched half of the linked pair keeps its default.
        assert_eq!(config.gauss.sigma_max, DEFAULT_MAX_SIGMA);
    }

    #[test]
    fn test_from_args_rejects_bad_values() {
        assert!(EaConfig::from_args(&["--population_size=-5"]).is_err());
        assert!(EaConfig::from_args(&["--adaption_probability=0"]).is_err());
        assert!(EaConfig::from_args(&["--sigma_min=-1", "--sigma_max=1"]).is_err());
        assert!(EaConfig::from_args(&["--sorting_mode=bogus"]).is_err());
        assert!(EaConfig::from_args(&["--no_such_option=1"]).is_err());
    }

    #[test]
    fn test_seed_sentinel() {
        assert_eq!(EaConfig::from_args(&["--seed=-1"]).unwrap().seed, None);
        assert_eq!(
            EaConfig::from_args(&["--seed=123"]).unwrap().seed,
            Some(123)
        );
    }

    #[test]
    fn test_write_template_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parevo.conf");
        EaConfig::write_template(&path).unwrap();
        // A pristine template parses back to the defaults.
        let config = EaConfig::from_file(&path).unwrap();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.n_parents, 5);
        assert_eq!(config.quality_threshold, None);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("population_size = 100"));
        assert!(text.contains("# iteration budget; 0 disables"));
    }
}
