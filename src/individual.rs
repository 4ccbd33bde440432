//! Candidate solutions.
//!
//! An [`Individual`] owns one [`ParameterSet`], a cached fitness value
//! guarded by a dirty flag, and a [`Personality`], the per-algorithm
//! scratch data (parent/child role, parent id, position, iteration)
//! the population propagates for user hooks.
//!
//! The dirty-flag protocol is strict: any mutation of any parameter
//! raises the flag, [`Individual::fitness`] is the only call that may
//! implicitly trigger evaluation, and a non-triggering read of a dirty
//! individual is an invariant violation (checked in debug builds).
//! Evaluation failures never abort anything; the failed individual
//! keeps its dirty flag, records the message in its error slot and
//! carries the worst-case fitness sentinel so selection pushes it to
//! the back.

use crate::parameter::ParameterSet;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The injected objective: pure with respect to core state.
pub type Objective = dyn Fn(&ParameterSet) -> std::result::Result<f64, String> + Send + Sync;

/// Serde representation for fitness slots.
///
/// Fitness values are legitimately infinite (the evaluation-failure
/// sentinel, the initial best-past watermark), and JSON has no literal
/// for that: plain `f64` fields silently become `null`. A tagged
/// representation survives all three checkpoint encodings, bincode's
/// non-self-describing format included.
pub(crate) mod fitness_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    enum Repr {
        Finite(f64),
        PlusInf,
        MinusInf,
        NotANumber,
    }

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        let repr = if v.is_nan() {
            Repr::NotANumber
        } else if *v == f64::INFINITY {
            Repr::PlusInf
        } else if *v == f64::NEG_INFINITY {
            Repr::MinusInf
        } else {
            Repr::Finite(*v)
        };
        repr.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(match Repr::deserialize(d)? {
            Repr::Finite(v) => v,
            Repr::PlusInf => f64::INFINITY,
            Repr::MinusInf => f64::NEG_INFINITY,
            Repr::NotANumber => f64::NAN,
        })
    }
}

/// The worst possible raw fitness under the given direction.
pub fn worst_fitness(maximize: bool) -> f64 {
    if maximize {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    }
}

/// Per-algorithm scratch data attached to each individual.
///
/// Linkage to the population is by value (position index), never by
/// back-pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Whether this individual currently serves as a parent.
    pub is_parent: bool,
    /// The parent this individual was recombined from, if any.
    pub parent_id: Option<usize>,
    /// Position inside the population, re-derived every iteration.
    pub position: usize,
    /// The iteration this snapshot belongs to.
    pub iteration: u32,
    /// Best fitness the population had seen when this was last marked.
    #[serde(with = "fitness_serde")]
    pub best_past_fitness: f64,
    /// The population's stall counter when this was last marked.
    pub stall_counter: u32,
}

/// One candidate solution: parameters, cached fitness, dirty flag and
/// personality.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Individual {
    params: ParameterSet,
    #[serde(with = "fitness_serde")]
    cached_fitness: f64,
    dirty: bool,
    eval_error: Option<String>,
    personality: Personality,
}

impl Individual {
    /// Wraps a parameter set into a dirty (unevaluated) individual.
    pub fn new(params: ParameterSet) -> Self {
        Individual {
            params,
            cached_fitness: f64::INFINITY,
            dirty: true,
            eval_error: None,
            personality: Personality::default(),
        }
    }

    /// Read access to the parameters.
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Mutable access to the parameters. Conservatively raises the
    /// dirty flag: the caller may change any value.
    pub fn params_mut(&mut self) -> &mut ParameterSet {
        self.dirty = true;
        &mut self.params
    }

    /// Whether the cached fitness is stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Invalidates the cached fitness.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// The message of the last failed evaluation, if the individual is
    /// currently carrying one.
    pub fn eval_error(&self) -> Option<&str> {
        self.eval_error.as_deref()
    }

    /// Returns the fitness, evaluating the objective first when the
    /// cache is stale. This is the only implicit evaluation trigger.
    ///
    /// On evaluation failure the worst-case sentinel under the active
    /// direction is returned and the individual stays dirty with the
    /// error recorded in its slot.
    pub fn fitness(&mut self, objective: &Objective, maximize: bool) -> f64 {
        if self.dirty {
            let _ = self.evaluate(objective, maximize);
        }
        self.cached_fitness
    }

    /// Recomputes the fitness if (and only if) the cache is stale.
    ///
    /// # Errors
    /// [`crate::Error::Evaluation`] when the objective fails; the
    /// individual then carries the sentinel fitness and the message in
    /// its error slot, and remains dirty.
    pub fn evaluate(&mut self, objective: &Objective, maximize: bool) -> crate::Result<f64> {
        if !self.dirty {
            return Ok(self.cached_fitness);
        }
        match objective(&self.params) {
            Ok(fitness) => {
                self.cached_fitness = fitness;
                self.dirty = false;
                self.eval_error = None;
                Ok(fitness)
            }
            Err(message) => {
                self.cached_fitness = worst_fitness(maximize);
                self.eval_error = Some(message.clone());
                Err(crate::Error::Evaluation(message))
            }
        }
    }

    /// Applies the outcome of an externally dispatched evaluation.
    pub(crate) fn apply_external(
        &mut self,
        outcome: std::result::Result<f64, String>,
        maximize: bool,
    ) {
        match outcome {
            Ok(fitness) => {
                self.cached_fitness = fitness;
                self.dirty = false;
                self.eval_error = None;
            }
            Err(message) => {
                self.cached_fitness = worst_fitness(maximize);
                self.eval_error = Some(message);
            }
        }
    }

    /// The cached raw fitness, without any evaluation.
    ///
    /// Reading a dirty individual here is an invariant violation unless
    /// it carries an evaluation-error sentinel; debug builds abort.
    pub fn raw_fitness(&self) -> f64 {
        debug_assert!(
            !self.dirty || self.eval_error.is_some(),
            "fitness read on a dirty individual at position {}",
            self.personality.position
        );
        self.cached_fitness
    }

    /// Minimization-normalized sort key: smaller is better regardless
    /// of the optimization direction.
    pub fn key(&self, maximize: bool) -> f64 {
        if maximize {
            -self.raw_fitness()
        } else {
            self.raw_fitness()
        }
    }

    /// Adapts every parameter in order and raises the dirty flag.
    ///
    /// Returns the number of adaptor applications.
    pub fn adapt<R: Rng>(&mut self, rng: &mut R) -> usize {
        let n = self.params.adapt_all(rng);
        self.dirty = true;
        n
    }

    /// Re-initializes every parameter and raises the dirty flag.
    pub fn random_init<R: Rng>(&mut self, rng: &mut R) {
        self.params.random_init_all(rng);
        self.dirty = true;
    }

    /// Deep copy of `other` into `self`, personality and dirty flag
    /// included. Used by recombination.
    pub fn load_from(&mut self, other: &Individual) {
        *self = other.clone();
    }

    /// Read access to the personality.
    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    /// Mutable access to the personality. Does not touch the dirty
    /// flag: personality is bookkeeping, not genome.
    pub fn personality_mut(&mut self) -> &mut Personality {
        &mut self.personality
    }

    /// Marks this individual as a parent.
    pub fn mark_as_parent(&mut self) {
        self.personality.is_parent = true;
    }

    /// Marks this individual as a child recombined from `parent_id`.
    pub fn mark_as_child(&mut self, parent_id: Option<usize>) {
        self.personality.is_parent = false;
        if parent_id.is_some() {
            self.personality.parent_id = parent_id;
        }
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        // A stale cache carries no comparable information; identical
        // sentinels (both infinite) compare equal before the tolerance.
        let fitness_eq = self.dirty
            || self.cached_fitness == other.cached_fitness
            || (self.cached_fitness - other.cached_fitness).abs() <= tol;
        self.params.approx_eq(&other.params, tol)
            && self.dirty == other.dirty
            && fitness_eq
            && self.eval_error == other.eval_error
            && self.personality == other.personality
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptor::{GaussAdaptor, RealAdaptor};
    use crate::parameter::{BoundedRealParameter, Parameter, ParameterSet};
    use crate::random::create_rng;

    fn sphere_individual(values: &[f64]) -> Individual {
        let set: ParameterSet = values
            .iter()
            .map(|&v| {
                let mut p = BoundedRealParameter::new(v, -100.0, 100.0).unwrap();
                p.add_adaptor(RealAdaptor::Gauss(GaussAdaptor::new()));
                Parameter::BoundedReal(p)
            })
            .collect();
        Individual::new(set)
    }

    fn sphere(params: &ParameterSet) -> std::result::Result<f64, String> {
        Ok(params.real_values().iter().map(|x| x * x).sum())
    }

    #[test]
    fn test_new_individual_is_dirty() {
        assert!(sphere_individual(&[1.0, 2.0]).is_dirty());
    }

    #[test]
    fn test_fitness_clears_dirty_and_caches() {
        let mut ind = sphere_individual(&[3.0, 4.0]);
        let f = ind.fitness(&sphere, false);
        assert_eq!(f, 25.0);
        assert!(!ind.is_dirty());
        // Second read hits the cache.
        assert_eq!(ind.fitness(&sphere, false), 25.0);
        assert_eq!(ind.raw_fitness(), 25.0);
    }

    #[test]
    fn test_adapt_sets_dirty() {
        let mut ind = sphere_individual(&[1.0]);
        ind.fitness(&sphere, false);
        assert!(!ind.is_dirty());
        let mut rng = create_rng(42);
        ind.adapt(&mut rng);
        assert!(ind.is_dirty());
    }

    #[test]
    fn test_params_mut_sets_dirty() {
        let mut ind = sphere_individual(&[1.0]);
        ind.fitness(&sphere, false);
        let _ = ind.params_mut();
        assert!(ind.is_dirty());
    }

    #[test]
    fn test_evaluate_only_recomputes_when_dirty() {
        let mut ind = sphere_individual(&[2.0]);
        assert_eq!(ind.evaluate(&sphere, false).unwrap(), 4.0);
        // A second evaluate must not re-run the objective; observable
        // here through an objective that would now disagree.
        let other = |_: &ParameterSet| -> std::result::Result<f64, String> { Ok(999.0) };
        assert_eq!(ind.evaluate(&other, false).unwrap(), 4.0);
    }

    #[test]
    fn test_evaluation_error_leaves_sentinel_and_dirty() {
        let failing = |_: &ParameterSet| -> std::result::Result<f64, String> {
            Err("bad geometry".into())
        };
        let mut ind = sphere_individual(&[1.0]);
        assert!(ind.evaluate(&failing, false).is_err());
        assert!(ind.is_dirty());
        assert_eq!(ind.eval_error(), Some("bad geometry"));
        assert_eq!(ind.raw_fitness(), f64::INFINITY);

        let mut ind = sphere_individual(&[1.0]);
        let _ = ind.evaluate(&failing, true);
        assert_eq!(ind.raw_fitness(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_error_slot_clears_on_successful_reevaluation() {
        let failing = |_: &ParameterSet| -> std::result::Result<f64, String> {
            Err("transient".into())
        };
        let mut ind = sphere_individual(&[1.0]);
        let _ = ind.evaluate(&failing, false);
        assert!(ind.eval_error().is_some());
        ind.evaluate(&sphere, false).unwrap();
        assert!(ind.eval_error().is_none());
        assert!(!ind.is_dirty());
    }

    #[test]
    fn test_key_normalizes_direction() {
        let mut ind = sphere_individual(&[3.0]);
        ind.fitness(&sphere, false);
        assert_eq!(ind.key(false), 9.0);
        assert_eq!(ind.key(true), -9.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "fitness read on a dirty individual")]
    fn test_dirty_read_aborts_in_debug() {
        let ind = sphere_individual(&[1.0]);
        let _ = ind.raw_fitness();
    }

    #[test]
    fn test_load_from_copies_everything() {
        let mut a = sphere_individual(&[1.0, 2.0]);
        a.fitness(&sphere, false);
        a.mark_as_parent();
        a.personality_mut().position = 7;

        let mut b = sphere_individual(&[9.0, 9.0]);
        b.load_from(&a);
        assert!(b.approx_eq(&a, 0.0));
        assert!(!b.is_dirty());
        assert!(b.personality().is_parent);
        assert_eq!(b.personality().position, 7);
    }

    #[test]
    fn test_serde_round_trip_preserves_dirty() {
        let mut ind = sphere_individual(&[1.5, -2.5]);
        ind.fitness(&sphere, false);
        ind.adapt(&mut create_rng(3));
        assert!(ind.is_dirty());

        let json = serde_json::to_string(&ind).unwrap();
        let back: Individual = serde_json::from_str(&json).unwrap();
        assert!(back.is_dirty());
        assert!(ind.approx_eq(&back, 1e-12));
    }
}
