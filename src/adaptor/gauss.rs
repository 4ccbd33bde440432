//! Gaussian adaptors with self-adaptive step width.
//!
//! Both the real and the integer variant add a normally distributed
//! increment to the value. The step width sigma is itself adapted with a
//! log-normal multiplier `exp(N(0, sigma_sigma))` and clamped to a
//! configurable range. The multiplier's expectation exceeds 1 for any
//! positive `sigma_sigma`, so the upper clamp is what keeps sigma from
//! drifting off.

use super::{
    AdaptionControl, DEFAULT_MAX_SIGMA, DEFAULT_MIN_SIGMA, DEFAULT_SIGMA, DEFAULT_SIGMA_SIGMA,
};
use crate::error::{Error, Result};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Sigma plus the parameters of its own adaptation.
///
/// Invariants: `0 < sigma_min <= sigma <= sigma_max`, `sigma_sigma > 0`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SigmaSelfAdaption {
    sigma: f64,
    sigma_sigma: f64,
    sigma_min: f64,
    sigma_max: f64,
}

impl SigmaSelfAdaption {
    fn new(sigma: f64, sigma_sigma: f64, sigma_min: f64, sigma_max: f64) -> Result<Self> {
        let mut s = SigmaSelfAdaption {
            sigma: DEFAULT_SIGMA,
            sigma_sigma: DEFAULT_SIGMA_SIGMA,
            sigma_min: DEFAULT_MIN_SIGMA,
            sigma_max: DEFAULT_MAX_SIGMA,
        };
        s.set_range(sigma_min, sigma_max)?;
        s.set_sigma_sigma(sigma_sigma)?;
        s.set_sigma(sigma)?;
        Ok(s)
    }

    fn set_sigma(&mut self, sigma: f64) -> Result<()> {
        if !(sigma >= self.sigma_min && sigma <= self.sigma_max) {
            return Err(Error::invalid(format!(
                "sigma {sigma} outside the allowed range [{}, {}]",
                self.sigma_min, self.sigma_max
            )));
        }
        self.sigma = sigma;
        Ok(())
    }

    fn set_range(&mut self, min: f64, max: f64) -> Result<()> {
        if !(min > 0.0) {
            return Err(Error::invalid(format!(
                "minimum sigma must be > 0, got {min}"
            )));
        }
        if !(max >= min) {
            return Err(Error::invalid(format!(
                "sigma range [{min}, {max}] is inverted"
            )));
        }
        self.sigma_min = min;
        self.sigma_max = max;
        // An existing sigma is pulled into the new range.
        self.sigma = self.sigma.clamp(min, max);
        Ok(())
    }

    fn set_sigma_sigma(&mut self, sigma_sigma: f64) -> Result<()> {
        if !(sigma_sigma > 0.0) {
            return Err(Error::invalid(format!(
                "sigma_sigma must be > 0, got {sigma_sigma}"
            )));
        }
        self.sigma_sigma = sigma_sigma;
        Ok(())
    }

    /// One self-adaptation step: log-normal multiplier, then clamp.
    fn step<R: Rng>(&mut self, rng: &mut R) {
        let draw: f64 = rng.sample(StandardNormal);
        self.sigma =
            (self.sigma * (draw * self.sigma_sigma).exp()).clamp(self.sigma_min, self.sigma_max);
    }

    fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        (self.sigma - other.sigma).abs() <= tol
            && (self.sigma_sigma - other.sigma_sigma).abs() <= tol
            && (self.sigma_min - other.sigma_min).abs() <= tol
            && (self.sigma_max - other.sigma_max).abs() <= tol
    }
}

impl Default for SigmaSelfAdaption {
    fn default() -> Self {
        SigmaSelfAdaption {
            sigma: DEFAULT_SIGMA,
            sigma_sigma: DEFAULT_SIGMA_SIGMA,
            sigma_min: DEFAULT_MIN_SIGMA,
            sigma_max: DEFAULT_MAX_SIGMA,
        }
    }
}

/// Gaussian adaptor for real values: `value += N(0, sigma)`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GaussAdaptor {
    control: AdaptionControl,
    shape: SigmaSelfAdaption,
}

impl GaussAdaptor {
    /// Creates an adaptor with the default shape parameters.
    pub fn new() -> Self {
        GaussAdaptor::default()
    }

    /// Creates an adaptor with explicit shape parameters.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when any invariant is violated
    /// (`sigma_min > 0`, `sigma_min <= sigma <= sigma_max`,
    /// `sigma_sigma > 0`).
    pub fn with_shape(sigma: f64, sigma_sigma: f64, sigma_min: f64, sigma_max: f64) -> Result<Self> {
        Ok(GaussAdaptor {
            control: AdaptionControl::default(),
            shape: SigmaSelfAdaption::new(sigma, sigma_sigma, sigma_min, sigma_max)?,
        })
    }

    /// Sets the adaption probability (`0 < p <= 1`).
    pub fn set_adaption_probability(&mut self, p: f64) -> Result<()> {
        self.control.set_probability(p)
    }

    /// Sets the number of applications between sigma self-adaptations.
    pub fn set_adaption_threshold(&mut self, threshold: u32) {
        self.control.set_threshold(threshold);
    }

    /// The current step width.
    pub fn sigma(&self) -> f64 {
        self.shape.sigma
    }

    /// Sets the step width; must lie inside the sigma range.
    pub fn set_sigma(&mut self, sigma: f64) -> Result<()> {
        self.shape.set_sigma(sigma)
    }

    /// The allowed `[min, max]` range for sigma.
    pub fn sigma_range(&self) -> (f64, f64) {
        (self.shape.sigma_min, self.shape.sigma_max)
    }

    /// Sets the allowed sigma range; requires `0 < min <= max`. The
    /// current sigma is clamped into the new range.
    pub fn set_sigma_range(&mut self, min: f64, max: f64) -> Result<()> {
        self.shape.set_range(min, max)
    }

    /// Sets the width of the gaussian used for sigma self-adaptation.
    pub fn set_sigma_sigma(&mut self, sigma_sigma: f64) -> Result<()> {
        self.shape.set_sigma_sigma(sigma_sigma)
    }

    /// Perturbs `value` in place.
    ///
    /// With probability `p` adds `N(0, sigma)`; every `threshold`
    /// applications sigma is self-adapted first.
    pub fn adapt<R: Rng>(&mut self, value: &mut f64, rng: &mut R) {
        if !self.control.roll(rng) {
            return;
        }
        if self.control.due() {
            self.shape.step(rng);
        }
        let draw: f64 = rng.sample(StandardNormal);
        *value += draw * self.shape.sigma;
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.control.approx_eq(&other.control, tol) && self.shape.approx_eq(&other.shape, tol)
    }
}

/// Gaussian adaptor for integers.
///
/// The sampled real increment is rounded; when adding it would leave the
/// representable `i32` range, the increment's sign is flipped instead of
/// saturating, preserving the perturbation's zero mean. Range
/// enforcement for *bounded* integer parameters is not this adaptor's
/// concern; the owning parameter's transfer function folds the value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IntGaussAdaptor {
    control: AdaptionControl,
    shape: SigmaSelfAdaption,
}

impl IntGaussAdaptor {
    /// Creates an adaptor with the default shape parameters.
    pub fn new() -> Self {
        IntGaussAdaptor::default()
    }

    /// Creates an adaptor with explicit shape parameters.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when any sigma invariant is violated.
    pub fn with_shape(sigma: f64, sigma_sigma: f64, sigma_min: f64, sigma_max: f64) -> Result<Self> {
        Ok(IntGaussAdaptor {
            control: AdaptionControl::default(),
            shape: SigmaSelfAdaption::new(sigma, sigma_sigma, sigma_min, sigma_max)?,
        })
    }

    /// Sets the adaption probability (`0 < p <= 1`).
    pub fn set_adaption_probability(&mut self, p: f64) -> Result<()> {
        self.control.set_probability(p)
    }

    /// Sets the number of applications between sigma self-adaptations.
    pub fn set_adaption_threshold(&mut self, threshold: u32) {
        self.control.set_threshold(threshold);
    }

    /// The current step width.
    pub fn sigma(&self) -> f64 {
        self.shape.sigma
    }

    /// Sets the step width; must lie inside the sigma range.
    pub fn set_sigma(&mut self, sigma: f64) -> Result<()> {
        self.shape.set_sigma(sigma)
    }

    /// Sets the allowed sigma range; requires `0 < min <= max`.
    pub fn set_sigma_range(&mut self, min: f64, max: f64) -> Result<()> {
        self.shape.set_range(min, max)
    }

    /// Perturbs `value` in place by a rounded gaussian increment.
    pub fn adapt<R: Rng>(&mut self, value: &mut i32, rng: &mut R) {
        if !self.control.roll(rng) {
            return;
        }
        if self.control.due() {
            self.shape.step(rng);
        }
        let draw: f64 = rng.sample(StandardNormal);
        // The `as i32` cast saturates, bounding the increment before the
        // overflow check below.
        let mut addition = ((draw * self.shape.sigma).round()) as i32 as i64;
        let v = *value as i64;
        if v + addition > i32::MAX as i64 || v + addition < i32::MIN as i64 {
            addition = -addition;
        }
        *value = (v + addition) as i32;
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.control.approx_eq(&other.control, tol) && self.shape.approx_eq(&other.shape, tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_shape_validation() {
        assert!(GaussAdaptor::with_shape(1.0, 0.001, 1e-7, 5.0).is_ok());
        // Negative minimum sigma.
        assert!(GaussAdaptor::with_shape(1.0, 0.001, -1.0, 1.0).is_err());
        // Zero sigma_sigma.
        assert!(GaussAdaptor::with_shape(1.0, 0.0, 1e-7, 5.0).is_err());
        // Sigma outside its own range.
        assert!(GaussAdaptor::with_shape(10.0, 0.001, 1e-7, 5.0).is_err());
        // Inverted range.
        assert!(GaussAdaptor::with_shape(1.0, 0.001, 2.0, 1.0).is_err());
    }

    #[test]
    fn test_set_sigma_range_clamps_current_sigma() {
        let mut a = GaussAdaptor::with_shape(1.0, 0.001, 1e-7, 5.0).unwrap();
        a.set_sigma_range(2.0, 3.0).unwrap();
        assert_eq!(a.sigma(), 2.0);
    }

    #[test]
    fn test_adapt_perturbs_value() {
        let mut a = GaussAdaptor::new();
        let mut rng = create_rng(42);
        let mut value = 0.0;
        a.adapt(&mut value, &mut rng);
        assert_ne!(value, 0.0);
    }

    #[test]
    fn test_sigma_stays_in_range_after_self_adaptation() {
        let mut a = GaussAdaptor::with_shape(0.5, 0.8, 0.1, 1.0).unwrap();
        a.set_adaption_threshold(1);
        let mut rng = create_rng(42);
        let mut value = 0.0;
        for _ in 0..10_000 {
            a.adapt(&mut value, &mut rng);
            let s = a.sigma();
            assert!((0.1..=1.0).contains(&s), "sigma {s} escaped its range");
        }
    }

    #[test]
    fn test_threshold_zero_freezes_sigma() {
        let mut a = GaussAdaptor::new();
        a.set_adaption_threshold(0);
        let sigma_before = a.sigma();
        let mut rng = create_rng(42);
        let mut value = 0.0;
        for _ in 0..1000 {
            a.adapt(&mut value, &mut rng);
        }
        assert_eq!(a.sigma(), sigma_before);
    }

    #[test]
    fn test_adaption_is_deterministic_under_equal_seeds() {
        let mut a1 = GaussAdaptor::new();
        let mut a2 = GaussAdaptor::new();
        let mut r1 = create_rng(7);
        let mut r2 = create_rng(7);
        let mut v1 = 1.5;
        let mut v2 = 1.5;
        for _ in 0..100 {
            a1.adapt(&mut v1, &mut r1);
            a2.adapt(&mut v2, &mut r2);
        }
        assert_eq!(v1, v2);
        assert_eq!(a1.sigma(), a2.sigma());
    }

    #[test]
    fn test_int_adapt_rounds_increment() {
        let mut a = IntGaussAdaptor::with_shape(3.0, 0.001, 1e-7, 5.0).unwrap();
        let mut rng = create_rng(42);
        let mut value = 0i32;
        let mut moved = false;
        for _ in 0..100 {
            a.adapt(&mut value, &mut rng);
            if value != 0 {
                moved = true;
            }
        }
        assert!(moved, "integer gauss adaptor never moved the value");
    }

    #[test]
    fn test_int_adapt_flips_sign_instead_of_overflowing() {
        let mut a = IntGaussAdaptor::with_shape(5.0, 0.001, 1e-7, 5.0).unwrap();
        let mut rng = create_rng(42);
        // Sitting at the ceiling, any positive increment must be turned
        // into a step down rather than saturating.
        for _ in 0..1000 {
            let mut value = i32::MAX;
            a.adapt(&mut value, &mut rng);
            assert!(value <= i32::MAX);
        }
        for _ in 0..1000 {
            let mut value = i32::MIN;
            a.adapt(&mut value, &mut rng);
            assert!(value >= i32::MIN);
        }
    }

    #[test]
    fn test_adaptor_round_trips_in_all_encodings() {
        let mut a = GaussAdaptor::with_shape(0.75, 0.01, 1e-6, 2.0).unwrap();
        a.set_adaption_threshold(3);
        let mut rng = create_rng(9);
        let mut v = 0.0;
        for _ in 0..7 {
            a.adapt(&mut v, &mut rng);
        }

        let json: GaussAdaptor =
            serde_json::from_str(&serde_json::to_string(&a).unwrap()).unwrap();
        assert!(a.approx_eq(&json, 1e-12));

        let yaml: GaussAdaptor =
            serde_yaml::from_str(&serde_yaml::to_string(&a).unwrap()).unwrap();
        assert!(a.approx_eq(&yaml, 1e-12));

        let binary: GaussAdaptor =
            bincode::deserialize(&bincode::serialize(&a).unwrap()).unwrap();
        assert!(a.approx_eq(&binary, 0.0));
    }

    #[test]
    fn test_probability_setter_rejects_zero() {
        let mut a = GaussAdaptor::new();
        assert!(a.set_adaption_probability(0.0).is_err());
        assert!(a.set_adaption_probability(0.5).is_ok());
    }

    #[test]
    fn test_approx_eq_tolerance() {
        let a = GaussAdaptor::with_shape(1.0, 0.001, 1e-7, 5.0).unwrap();
        let mut b = a.clone();
        assert!(a.approx_eq(&b, 1e-10));
        b.set_sigma(1.0 + 1e-6).unwrap();
        assert!(!a.approx_eq(&b, 1e-10));
        assert!(a.approx_eq(&b, 1e-3));
    }
}
