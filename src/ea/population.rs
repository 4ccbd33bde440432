//! The parent-child evolutionary loop.
//!
//! [`Population`] owns μ parents and λ children and drives the
//! iteration body: grow → recombine → adapt children → evaluate →
//! select → mark → report/checkpoint → halt check. Parents are never
//! adapted; children copy a parent, mutate and compete for the parent
//! slots under the configured [`SortingMode`].
//!
//! Randomness is drawn from a per-iteration stream derived from the run
//! seed, so a run resumed from a checkpoint replays the exact draws of
//! an uninterrupted one.

use super::config::EaConfig;
use super::types::{EaResult, RecombinationMode, SortingMode};
use crate::checkpoint::{CheckpointData, CheckpointStore};
use crate::error::{Error, Result};
use crate::evaluate::{CancelToken, Evaluate, SerialEvaluator};
use crate::halt::{HaltController, HaltReason};
use crate::individual::{worst_fitness, Individual, Objective};
use crate::parameter::ParameterSet;
use crate::random::iteration_rng;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

/// Cumulative pick thresholds for value recombination.
///
/// Parent `i` (best first) gets weight `1/(i+2)`, normalized; the last
/// threshold is pinned to 1 against rounding.
fn value_thresholds(mu: usize) -> Vec<f64> {
    let sum: f64 = (0..mu).map(|i| 1.0 / (i as f64 + 2.0)).sum();
    let mut thresholds = vec![0.0; mu];
    let mut cumulative = 0.0;
    for (i, slot) in thresholds.iter_mut().enumerate().take(mu - 1) {
        cumulative += (1.0 / (i as f64 + 2.0)) / sum;
        *slot = cumulative;
    }
    thresholds[mu - 1] = 1.0;
    thresholds
}

fn key_cmp(maximize: bool) -> impl Fn(&Individual, &Individual) -> Ordering {
    move |a, b| {
        a.key(maximize)
            .partial_cmp(&b.key(maximize))
            .unwrap_or(Ordering::Equal)
    }
}

/// A population of μ parents and λ children plus the optimization loop
/// driving them.
pub struct Population {
    config: EaConfig,
    objective: Arc<Objective>,
    evaluator: Box<dyn Evaluate>,
    user_halt: Option<Arc<dyn Fn(u32, f64) -> bool + Send + Sync>>,
    individuals: Vec<Individual>,
    iteration: u32,
    stall_counter: u32,
    best_past_fitness: f64,
    seed: u64,
}

impl Population {
    /// Creates a population around an objective. Individuals are added
    /// with [`Population::push`]; missing slots are filled with clones
    /// when `optimize` starts.
    pub fn new<F>(config: EaConfig, objective: F) -> Self
    where
        F: Fn(&ParameterSet) -> std::result::Result<f64, String> + Send + Sync + 'static,
    {
        let seed = config.seed.unwrap_or_else(crate::random::random_seed);
        let best_past_fitness = worst_fitness(config.maximize);
        Population {
            objective: Arc::new(objective),
            evaluator: Box::new(SerialEvaluator),
            user_halt: None,
            individuals: Vec::new(),
            iteration: 0,
            stall_counter: 0,
            best_past_fitness,
            seed,
            config,
        }
    }

    /// Replaces the evaluation strategy (serial by default).
    pub fn with_evaluator(mut self, evaluator: impl Evaluate + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// Installs a user halt predicate over `(completed iterations,
    /// best raw fitness)`.
    pub fn with_halt_predicate(
        mut self,
        predicate: impl Fn(u32, f64) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.user_halt = Some(Arc::new(predicate));
        self
    }

    /// Adds a candidate individual.
    pub fn push(&mut self, individual: Individual) {
        self.individuals.push(individual);
    }

    /// The individuals in population order (best first after a
    /// completed iteration).
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Mutable access to one individual.
    pub fn individual_mut(&mut self, index: usize) -> Option<&mut Individual> {
        self.individuals.get_mut(index)
    }

    /// The best individual, once an iteration has completed.
    pub fn best(&self) -> Option<&Individual> {
        self.individuals.first()
    }

    /// Completed iterations (absolute, including resumed ones).
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Consecutive iterations without improvement.
    pub fn stall_counter(&self) -> u32 {
        self.stall_counter
    }

    /// The improvement watermark under the active direction.
    pub fn best_past_fitness(&self) -> f64 {
        self.best_past_fitness
    }

    /// The resolved run seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &EaConfig {
        &self.config
    }

    /// Mutable access to the configuration, for adjustments between
    /// `optimize` calls.
    pub fn config_mut(&mut self) -> &mut EaConfig {
        &mut self.config
    }

    /// The checkpoint store implied by the configuration.
    pub fn checkpoint_store(&self) -> Result<CheckpointStore> {
        CheckpointStore::new(
            self.config.checkpoint_directory.clone(),
            self.config.checkpoint_basename.clone(),
        )
        .with_mode(self.config.checkpoint_mode)
        .with_interval(self.config.checkpoint_interval)
    }

    /// Restores the population from a checkpoint file.
    ///
    /// The saved parents overwrite the front of the population; the
    /// remaining slots are filled with clones. Positions are re-derived,
    /// and the loop bookkeeping (iteration, watermark, stall counter)
    /// continues where the checkpoint left off.
    ///
    /// Returns the iteration the next `optimize` call starts at.
    pub fn resume_from(&mut self, path: impl AsRef<Path>) -> Result<u32> {
        let store = self.checkpoint_store()?;
        let data = store.load(path)?;
        if data.individuals.is_empty() {
            return Err(Error::invalid("checkpoint contains no individuals"));
        }
        let target = self.config.population_size.max(data.individuals.len());
        self.individuals.clear();
        for i in 0..target {
            self.individuals
                .push(data.individuals[i % data.individuals.len()].clone());
        }
        for (pos, ind) in self.individuals.iter_mut().enumerate() {
            ind.personality_mut().position = pos;
        }
        self.iteration = data.iteration + 1;
        self.best_past_fitness = data.best_past_fitness;
        self.stall_counter = data.stall_counter;
        Ok(self.iteration)
    }

    /// Restores from the most recent checkpoint for the configured
    /// directory and basename.
    pub fn resume_latest(&mut self) -> Result<u32> {
        let store = self.checkpoint_store()?;
        let path = store
            .latest()?
            .ok_or_else(|| Error::invalid("no checkpoint found to resume from"))?;
        self.resume_from(path)
    }

    /// Runs the optimization until a halt predicate fires.
    pub fn optimize(&mut self) -> Result<EaResult> {
        self.optimize_with_cancel(&CancelToken::new())
    }

    /// Runs the optimization, observing a cancellation token at every
    /// iteration boundary and inside the evaluator. On cancellation the
    /// last fully completed iteration is what the result reflects.
    pub fn optimize_with_cancel(&mut self, cancel: &CancelToken) -> Result<EaResult> {
        self.config.validate()?;
        if self.individuals.is_empty() {
            return Err(Error::invalid(
                "no individuals were added to the population",
            ));
        }
        let maximize = self.config.maximize;
        let mut halt = HaltController::new(maximize)
            .with_max_iterations(self.config.max_iterations)
            .with_max_stall(self.config.max_stall_iterations)
            .with_max_duration(self.config.max_duration)
            .with_quality_threshold(self.config.quality_threshold);
        if let Some(user) = &self.user_halt {
            let user = Arc::clone(user);
            halt = halt.with_user_predicate(move |iterations, best| user(iterations, best));
        }
        halt.start_clock();

        let store = self.checkpoint_store()?;
        self.adjust_population_size();

        let mut history = Vec::new();
        let reason = loop {
            if cancel.is_cancelled() {
                break HaltReason::Cancelled;
            }
            match self.cycle(cancel) {
                Ok(()) => {}
                Err(Error::Cancelled) => break HaltReason::Cancelled,
                Err(other) => return Err(other),
            }

            let best_raw = self.individuals[0].raw_fitness();
            let improved = halt.is_better(best_raw, self.best_past_fitness);
            if improved {
                self.best_past_fitness = best_raw;
                self.stall_counter = 0;
            } else {
                self.stall_counter += 1;
            }
            history.push(best_raw);

            self.mark();
            self.report(best_raw);
            if store.is_due(self.iteration, improved) {
                self.save_checkpoint(&store, best_raw);
            }

            let completed = self.iteration + 1;
            self.iteration = completed;
            if let Some(reason) = halt.check(completed, self.stall_counter, self.best_past_fitness)
            {
                break reason;
            }
        };

        let best = self.individuals[0].clone();
        let best_fitness = if best.is_dirty() && best.eval_error().is_none() {
            worst_fitness(maximize)
        } else {
            best.raw_fitness()
        };
        Ok(EaResult {
            best,
            best_fitness,
            iterations: self.iteration,
            halt: reason,
            fitness_history: history,
        })
    }

    /// Fills missing population slots with clones of the added
    /// individuals (cycling) or trims surplus ones.
    fn adjust_population_size(&mut self) {
        let target = self.config.population_size;
        if self.individuals.len() > target {
            self.individuals.truncate(target);
            return;
        }
        let present = self.individuals.len();
        for i in present..target {
            self.individuals.push(self.individuals[i % present].clone());
        }
    }

    /// One pass of the iteration body, minus bookkeeping.
    fn cycle(&mut self, cancel: &CancelToken) -> Result<()> {
        let mut rng = iteration_rng(self.seed, self.iteration);
        if self.iteration > 0 {
            self.grow();
        }
        self.recombine(&mut rng);
        self.adapt_children(&mut rng);
        let objective = Arc::clone(&self.objective);
        self.evaluator.evaluate(
            &mut self.individuals,
            objective.as_ref(),
            self.config.maximize,
            cancel,
        )?;
        self.select();
        Ok(())
    }

    /// Scheduled population growth: clones of the current best, while
    /// the ceiling allows.
    fn grow(&mut self) {
        let rate = self.config.growth_rate;
        if rate == 0 {
            return;
        }
        if self.individuals.len() + rate <= self.config.max_population_size {
            let template = self.individuals[0].clone();
            for _ in 0..rate {
                self.individuals.push(template.clone());
            }
        }
    }

    /// Copies a parent into every child slot according to the
    /// recombination mode.
    fn recombine(&mut self, rng: &mut ChaCha8Rng) {
        let mu = self.config.n_parents;
        // Value recombination needs valid parent fitness ranks; in the
        // first iteration (and whenever a parent is dirty) it falls
        // back to random picks rather than trigger evaluation here.
        let use_value = matches!(self.config.recombination_mode, RecombinationMode::Value)
            && mu > 1
            && self.iteration > 0
            && self.individuals[..mu]
                .iter()
                .all(|parent| !parent.is_dirty());
        let thresholds = if use_value {
            value_thresholds(mu)
        } else {
            Vec::new()
        };

        let (parents, children) = self.individuals.split_at_mut(mu);
        for child in children.iter_mut() {
            let parent_pos = if use_value {
                let roll: f64 = rng.random();
                thresholds
                    .iter()
                    .position(|&threshold| roll < threshold)
                    .unwrap_or(mu - 1)
            } else if mu == 1 {
                0
            } else {
                rng.random_range(0..mu)
            };
            child.load_from(&parents[parent_pos]);
            child.mark_as_child(Some(parent_pos));
        }
    }

    /// Adapts the children in position order. Parents are never
    /// adapted.
    fn adapt_children(&mut self, rng: &mut ChaCha8Rng) {
        let mu = self.config.n_parents;
        for child in self.individuals[mu..].iter_mut() {
            child.adapt(rng);
        }
    }

    fn select(&mut self) {
        match self.config.sorting_mode {
            SortingMode::MuPlusNu => self.sort_mu_plus_nu(),
            SortingMode::MuCommaNu => self.sort_mu_comma_nu(),
            SortingMode::MuNuPretain => self.sort_mu_nu_pretain(),
        }
    }

    /// Guards against selection silently triggering evaluation: from
    /// `from` on, every individual must be clean or carry an
    /// evaluation-error sentinel.
    fn debug_check_clean(&self, from: usize) {
        #[cfg(debug_assertions)]
        for (pos, ind) in self.individuals.iter().enumerate().skip(from) {
            debug_assert!(
                !ind.is_dirty() || ind.eval_error().is_some(),
                "iteration {}: individual at position {pos} entered selection dirty",
                self.iteration
            );
        }
        #[cfg(not(debug_assertions))]
        let _ = from;
    }

    /// μ+λ: parents compete with children over the whole population.
    fn sort_mu_plus_nu(&mut self) {
        self.debug_check_clean(0);
        self.individuals.sort_by(key_cmp(self.config.maximize));
    }

    /// μ,λ: the best μ children overwrite the parents, whatever the
    /// parents scored.
    fn sort_mu_comma_nu(&mut self) {
        let mu = self.config.n_parents;
        self.debug_check_clean(mu);
        self.individuals[mu..].sort_by(key_cmp(self.config.maximize));
        for i in 0..mu {
            self.individuals.swap(i, mu + i);
        }
    }

    /// μ,λ with elitism: parent 0 survives unless the best child beats
    /// it. Falls back to μ+λ for μ = 1 and in the first iteration.
    fn sort_mu_nu_pretain(&mut self) {
        let mu = self.config.n_parents;
        if mu == 1 || self.iteration == 0 {
            return self.sort_mu_plus_nu();
        }
        let maximize = self.config.maximize;
        self.debug_check_clean(mu);
        self.individuals[mu..].sort_by(key_cmp(maximize));
        let best_child = self.individuals[mu].key(maximize);
        let best_parent = self.individuals[0].key(maximize);
        if best_child < best_parent {
            for i in 0..mu {
                self.individuals.swap(i, mu + i);
            }
        } else {
            for i in 1..mu {
                self.individuals.swap(i, mu + i - 1);
            }
        }
    }

    /// Tags parents and children, re-derives positions and propagates
    /// the loop bookkeeping into every personality.
    fn mark(&mut self) {
        let mu = self.config.n_parents;
        let iteration = self.iteration;
        let best_past = self.best_past_fitness;
        let stall = self.stall_counter;
        for (pos, ind) in self.individuals.iter_mut().enumerate() {
            let personality = ind.personality_mut();
            personality.is_parent = pos < mu;
            personality.position = pos;
            personality.iteration = iteration;
            personality.best_past_fitness = best_past;
            personality.stall_counter = stall;
        }
    }

    fn report(&self, best: f64) {
        let cadence = self.config.report_iteration;
        if cadence > 0 && self.iteration % cadence == 0 {
            tracing::info!(
                iteration = self.iteration,
                best,
                stall = self.stall_counter,
                "iteration complete"
            );
        }
    }

    /// Serializes the best μ parents; failures are reported and
    /// swallowed, the run continues.
    fn save_checkpoint(&self, store: &CheckpointStore, best_fitness: f64) {
        let mu = self.config.n_parents.min(self.individuals.len());
        let data = CheckpointData {
            iteration: self.iteration,
            best_past_fitness: self.best_past_fitness,
            stall_counter: self.stall_counter,
            individuals: self.individuals[..mu].to_vec(),
        };
        if let Err(err) = store.save(best_fitness, &data) {
            tracing::warn!(%err, "checkpoint skipped");
        }
    }
}
