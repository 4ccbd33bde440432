//! Self-adaptive mutation operators.
//!
//! An adaptor perturbs values of one concrete type in place and owns the
//! control parameters of that perturbation (for gaussian adaptors the
//! step width sigma). Control parameters are themselves adapted over
//! time, so mutation strength co-evolves with the population.
//!
//! # Core Types
//!
//! - [`AdaptionControl`]: the probability/threshold state machine shared
//!   by every adaptor
//! - [`GaussAdaptor`] / [`IntGaussAdaptor`]: gaussian perturbation with
//!   log-normal sigma self-adaptation
//! - [`BoolFlipAdaptor`], [`IntFlipAdaptor`], [`CharFlipAdaptor`]:
//!   discrete symbol flips
//! - [`RealAdaptor`], [`IntAdaptor`], [`BoolAdaptor`], [`CharAdaptor`]:
//!   closed per-type adaptor sets, so parameters can own ordered adaptor
//!   lists that serialize without a plugin registry
//!
//! # References
//!
//! - Beyer & Schwefel (2002), "Evolution strategies — A comprehensive
//!   introduction" (self-adaptation of strategy parameters)

mod flip;
mod gauss;

pub use flip::{BoolFlipAdaptor, CharFlipAdaptor, IntFlipAdaptor};
pub use gauss::{GaussAdaptor, IntGaussAdaptor};

/// The symbol set character parameters default to.
pub(crate) fn default_alphabet() -> Vec<char> {
    flip::DEFAULT_ALPHABET.chars().collect()
}

use crate::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default start value for sigma.
pub const DEFAULT_SIGMA: f64 = 1.0;
/// Default width of the gaussian used for sigma self-adaptation.
pub const DEFAULT_SIGMA_SIGMA: f64 = 0.001;
/// Default minimum allowed value for sigma.
pub const DEFAULT_MIN_SIGMA: f64 = 1e-7;
/// Default maximum allowed value for sigma.
pub const DEFAULT_MAX_SIGMA: f64 = 5.0;
/// Default adaption probability for boolean flips.
pub const DEFAULT_BIT_ADAPTION_PROBABILITY: f64 = 0.05;
/// Default adaption probability for all other adaptors.
pub const DEFAULT_ADAPTION_PROBABILITY: f64 = 1.0;
/// Default number of applications between self-adaptations.
pub const DEFAULT_ADAPTION_THRESHOLD: u32 = 1;

/// Probability/threshold state machine shared by all adaptors.
///
/// Each call to an adaptor's `adapt` first rolls the adaption
/// probability `p`; only a successful roll perturbs the value. The
/// application counter drives self-adaptation: every `threshold`
/// applications the adaptor updates its own shape parameters *before*
/// perturbing (the self-adaptation does not consume the roll).
/// A threshold of 0 disables self-adaptation, 1 self-adapts on every
/// application.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdaptionControl {
    probability: f64,
    threshold: u32,
    count: u32,
}

impl AdaptionControl {
    /// Creates a control block with the given probability and the
    /// default threshold.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] unless `0 < probability <= 1`.
    pub fn new(probability: f64) -> Result<Self> {
        let mut ctl = AdaptionControl {
            probability: DEFAULT_ADAPTION_PROBABILITY,
            threshold: DEFAULT_ADAPTION_THRESHOLD,
            count: 0,
        };
        ctl.set_probability(probability)?;
        Ok(ctl)
    }

    /// Builds a control block from compile-time constants, bypassing
    /// validation.
    pub(crate) const fn from_parts(probability: f64, threshold: u32) -> Self {
        AdaptionControl {
            probability,
            threshold,
            count: 0,
        }
    }

    /// Sets the adaption probability.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] unless `0 < p <= 1`.
    pub fn set_probability(&mut self, p: f64) -> Result<()> {
        if !(p > 0.0 && p <= 1.0) {
            return Err(Error::invalid(format!(
                "adaption probability must lie in (0, 1], got {p}"
            )));
        }
        self.probability = p;
        Ok(())
    }

    /// The current adaption probability.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Sets the number of applications between self-adaptations
    /// (0 disables self-adaptation).
    pub fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
    }

    /// The current adaption threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Rolls the adaption probability.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> bool {
        self.probability >= 1.0 || rng.random_bool(self.probability)
    }

    /// Counts one application and reports whether a self-adaptation is
    /// due. Resets the counter when it is.
    pub fn due(&mut self) -> bool {
        if self.threshold == 0 {
            return false;
        }
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Structural equality with a tolerance on the probability.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        (self.probability - other.probability).abs() <= tol
            && self.threshold == other.threshold
            && self.count == other.count
    }
}

impl Default for AdaptionControl {
    fn default() -> Self {
        AdaptionControl {
            probability: DEFAULT_ADAPTION_PROBABILITY,
            threshold: DEFAULT_ADAPTION_THRESHOLD,
            count: 0,
        }
    }
}

/// Adaptors applicable to real-valued parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RealAdaptor {
    /// Gaussian perturbation with self-adaptive sigma.
    Gauss(GaussAdaptor),
}

impl RealAdaptor {
    /// Applies the adaptor to `value` in place.
    pub fn adapt<R: Rng>(&mut self, value: &mut f64, rng: &mut R) {
        match self {
            RealAdaptor::Gauss(a) => a.adapt(value, rng),
        }
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        match (self, other) {
            (RealAdaptor::Gauss(a), RealAdaptor::Gauss(b)) => a.approx_eq(b, tol),
        }
    }
}

/// Adaptors applicable to integer parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum IntAdaptor {
    /// Rounded gaussian perturbation with self-adaptive sigma.
    Gauss(IntGaussAdaptor),
    /// ±1 flip with equal probability.
    Flip(IntFlipAdaptor),
}

impl IntAdaptor {
    /// Applies the adaptor to `value` in place.
    pub fn adapt<R: Rng>(&mut self, value: &mut i32, rng: &mut R) {
        match self {
            IntAdaptor::Gauss(a) => a.adapt(value, rng),
            IntAdaptor::Flip(a) => a.adapt(value, rng),
        }
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        match (self, other) {
            (IntAdaptor::Gauss(a), IntAdaptor::Gauss(b)) => a.approx_eq(b, tol),
            (IntAdaptor::Flip(a), IntAdaptor::Flip(b)) => a.approx_eq(b, tol),
            _ => false,
        }
    }
}

/// Adaptors applicable to boolean parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BoolAdaptor {
    /// Bit flip.
    Flip(BoolFlipAdaptor),
}

impl BoolAdaptor {
    /// Applies the adaptor to `value` in place.
    pub fn adapt<R: Rng>(&mut self, value: &mut bool, rng: &mut R) {
        match self {
            BoolAdaptor::Flip(a) => a.adapt(value, rng),
        }
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        match (self, other) {
            (BoolAdaptor::Flip(a), BoolAdaptor::Flip(b)) => a.approx_eq(b, tol),
        }
    }
}

/// Adaptors applicable to character parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CharAdaptor {
    /// Uniform pick among the alphabet's other symbols.
    Flip(CharFlipAdaptor),
}

impl CharAdaptor {
    /// Applies the adaptor to `value` in place.
    pub fn adapt<R: Rng>(&mut self, value: &mut char, rng: &mut R) {
        match self {
            CharAdaptor::Flip(a) => a.adapt(value, rng),
        }
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        match (self, other) {
            (CharAdaptor::Flip(a), CharAdaptor::Flip(b)) => a.approx_eq(b, tol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_probability_validation() {
        assert!(AdaptionControl::new(0.0).is_err());
        assert!(AdaptionControl::new(-0.1).is_err());
        assert!(AdaptionControl::new(1.0001).is_err());
        assert!(AdaptionControl::new(1.0).is_ok());
        assert!(AdaptionControl::new(1e-9).is_ok());
    }

    #[test]
    fn test_threshold_zero_never_due() {
        let mut ctl = AdaptionControl::default();
        ctl.set_threshold(0);
        for _ in 0..100 {
            assert!(!ctl.due());
        }
    }

    #[test]
    fn test_threshold_one_always_due() {
        let mut ctl = AdaptionControl::default();
        ctl.set_threshold(1);
        for _ in 0..10 {
            assert!(ctl.due());
        }
    }

    #[test]
    fn test_threshold_counts_applications() {
        let mut ctl = AdaptionControl::default();
        ctl.set_threshold(3);
        let due: Vec<bool> = (0..9).map(|_| ctl.due()).collect();
        assert_eq!(
            due,
            vec![false, false, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn test_roll_respects_probability() {
        let mut rng = create_rng(42);
        let ctl = AdaptionControl::new(0.25).unwrap();
        let hits = (0..10_000).filter(|_| ctl.roll(&mut rng)).count();
        assert!(
            (2000..3000).contains(&hits),
            "expected ~2500 hits at p=0.25, got {hits}"
        );
    }

    #[test]
    fn test_roll_certain_at_p_one() {
        let mut rng = create_rng(42);
        let ctl = AdaptionControl::default();
        assert!((0..1000).all(|_| ctl.roll(&mut rng)));
    }
}
