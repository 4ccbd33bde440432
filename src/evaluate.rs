//! Evaluation strategies.
//!
//! The population hands one batch of individuals per iteration to an
//! [`Evaluate`] implementation; the batch is the unit of parallelism.
//! An evaluator must leave every dirty individual in the batch either
//! clean or dirty-with-error before returning; per-individual failures
//! are recorded in the individual's error slot and never abort the
//! batch. The cancellation token is observed before and after each work
//! item.
//!
//! Three strategies are provided:
//!
//! - [`SerialEvaluator`]: in-order, single thread
//! - [`ThreadPoolEvaluator`]: rayon worker threads, long-lived across
//!   iterations
//! - [`ExternalEvaluator`]: boundary to an external dispatcher; work
//!   items that exceed the configured timeout are marked
//!   dirty-with-error and deprioritized through the fitness sentinel

use crate::error::{Error, Result};
use crate::individual::{Individual, Objective};
use crate::parameter::ParameterSet;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Cooperative cancellation flag, cloneable across threads.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Strategy for bringing a batch of individuals up to date.
pub trait Evaluate: Send + Sync {
    /// Evaluates every dirty individual in `individuals`.
    ///
    /// Returns the number of objective invocations. Individuals whose
    /// objective fails keep their dirty flag, carry the failure message
    /// and the worst-case fitness sentinel.
    ///
    /// # Errors
    /// [`Error::Cancelled`] when the token trips mid-batch; already
    /// finished work items keep their results.
    fn evaluate(
        &self,
        individuals: &mut [Individual],
        objective: &Objective,
        maximize: bool,
        cancel: &CancelToken,
    ) -> Result<usize>;
}

/// Evaluates individuals one after the other on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialEvaluator;

impl Evaluate for SerialEvaluator {
    fn evaluate(
        &self,
        individuals: &mut [Individual],
        objective: &Objective,
        maximize: bool,
        cancel: &CancelToken,
    ) -> Result<usize> {
        let mut evaluated = 0;
        for (pos, ind) in individuals.iter_mut().enumerate() {
            if !ind.is_dirty() {
                continue;
            }
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if let Err(err) = ind.evaluate(objective, maximize) {
                tracing::debug!(position = pos, %err, "objective failed");
            }
            evaluated += 1;
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }
        Ok(evaluated)
    }
}

/// Evaluates individuals on a pool of worker threads.
///
/// With a pinned thread count the evaluator owns its pool; otherwise it
/// borrows rayon's global one. Either way the workers live across
/// iterations. Evaluation order between workers is unspecified, but
/// each individual is touched by exactly one worker and its outcome is
/// deterministic for a deterministic objective.
#[derive(Debug, Default)]
pub struct ThreadPoolEvaluator {
    pool: Option<rayon::ThreadPool>,
}

impl ThreadPoolEvaluator {
    /// Uses rayon's global pool.
    pub fn new() -> Self {
        ThreadPoolEvaluator { pool: None }
    }

    /// Builds an evaluator with its own pool of `threads` workers.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when `threads` is 0 or the pool
    /// cannot be constructed.
    pub fn with_threads(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::invalid("thread count must be at least 1"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::invalid(format!("thread pool: {e}")))?;
        Ok(ThreadPoolEvaluator { pool: Some(pool) })
    }

    fn run_batch(
        individuals: &mut [Individual],
        objective: &Objective,
        maximize: bool,
        cancel: &CancelToken,
    ) -> Result<usize> {
        let evaluated = AtomicUsize::new(0);
        individuals
            .par_iter_mut()
            .enumerate()
            .filter(|(_, ind)| ind.is_dirty())
            .for_each(|(pos, ind)| {
                if cancel.is_cancelled() {
                    return;
                }
                if let Err(err) = ind.evaluate(objective, maximize) {
                    tracing::debug!(position = pos, %err, "objective failed");
                }
                evaluated.fetch_add(1, Ordering::Relaxed);
            });
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(evaluated.into_inner())
    }
}

impl Evaluate for ThreadPoolEvaluator {
    fn evaluate(
        &self,
        individuals: &mut [Individual],
        objective: &Objective,
        maximize: bool,
        cancel: &CancelToken,
    ) -> Result<usize> {
        match &self.pool {
            Some(pool) => {
                pool.install(|| Self::run_batch(individuals, objective, maximize, cancel))
            }
            None => Self::run_batch(individuals, objective, maximize, cancel),
        }
    }
}

/// One unit of externally dispatched work.
#[derive(Clone, Debug)]
pub struct WorkItem {
    /// Position of the individual inside the submitted batch.
    pub id: usize,
    /// A snapshot of the individual's parameters.
    pub params: ParameterSet,
}

/// The outcome an external dispatcher reports for one work item.
#[derive(Clone, Debug)]
pub struct WorkResult {
    pub id: usize,
    pub fitness: std::result::Result<f64, String>,
}

/// Transport boundary for distributed evaluation.
///
/// The crate specifies nothing about the wire; implementations queue
/// items somewhere and hand results back as they arrive.
pub trait Dispatch: Send + Sync {
    /// Queues one work item.
    fn submit(&self, item: WorkItem) -> Result<()>;

    /// Waits up to `timeout` for the next result; `None` when nothing
    /// arrived in time.
    fn collect(&self, timeout: Duration) -> Option<WorkResult>;
}

/// Evaluator that forwards work items to an external [`Dispatch`].
///
/// Results are awaited with a per-batch deadline; items that never come
/// back are marked dirty-with-error so selection deprioritizes them
/// without aborting the run.
pub struct ExternalEvaluator<D: Dispatch> {
    dispatcher: D,
    timeout: Duration,
}

impl<D: Dispatch> ExternalEvaluator<D> {
    pub fn new(dispatcher: D, timeout: Duration) -> Self {
        ExternalEvaluator {
            dispatcher,
            timeout,
        }
    }

    /// The dispatcher this evaluator feeds.
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }
}

impl<D: Dispatch> Evaluate for ExternalEvaluator<D> {
    fn evaluate(
        &self,
        individuals: &mut [Individual],
        objective: &Objective,
        maximize: bool,
        cancel: &CancelToken,
    ) -> Result<usize> {
        // The injected objective is not consulted here; evaluation
        // happens wherever the dispatcher sends the work.
        let _ = objective;

        let mut pending: Vec<usize> = Vec::new();
        for (pos, ind) in individuals.iter().enumerate() {
            if !ind.is_dirty() {
                continue;
            }
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.dispatcher.submit(WorkItem {
                id: pos,
                params: ind.params().clone(),
            })?;
            pending.push(pos);
        }

        let submitted = pending.len();
        let deadline = Instant::now() + self.timeout;
        while !pending.is_empty() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.dispatcher.collect(remaining) {
                Some(result) => {
                    if let Some(slot) = pending.iter().position(|&p| p == result.id) {
                        pending.swap_remove(slot);
                        individuals[result.id].apply_external(result.fitness, maximize);
                    }
                }
                None => break,
            }
        }

        for pos in pending {
            tracing::debug!(position = pos, "external evaluation timed out");
            individuals[pos]
                .apply_external(Err("external evaluation timed out".into()), maximize);
        }
        Ok(submitted)
    }
}

/// In-process dispatcher running work items through a stored objective.
///
/// Closes the external-evaluation loop without any transport; intended
/// for wiring tests. A drop predicate can swallow chosen items to
/// exercise the timeout path.
pub struct LoopbackDispatch {
    objective: Arc<dyn Fn(&ParameterSet) -> std::result::Result<f64, String> + Send + Sync>,
    drop_if: Option<Box<dyn Fn(&WorkItem) -> bool + Send + Sync>>,
    queue: Mutex<Vec<WorkItem>>,
}

impl LoopbackDispatch {
    pub fn new(
        objective: Arc<dyn Fn(&ParameterSet) -> std::result::Result<f64, String> + Send + Sync>,
    ) -> Self {
        LoopbackDispatch {
            objective,
            drop_if: None,
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Silently drops submitted items matching the predicate.
    pub fn with_drop_predicate(
        mut self,
        drop_if: impl Fn(&WorkItem) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.drop_if = Some(Box::new(drop_if));
        self
    }
}

impl Dispatch for LoopbackDispatch {
    fn submit(&self, item: WorkItem) -> Result<()> {
        if let Some(drop_if) = &self.drop_if {
            if drop_if(&item) {
                return Ok(());
            }
        }
        self.queue
            .lock()
            .map_err(|_| Error::invalid("dispatch queue poisoned"))?
            .push(item);
        Ok(())
    }

    fn collect(&self, _timeout: Duration) -> Option<WorkResult> {
        let item = self.queue.lock().ok()?.pop()?;
        let fitness = (self.objective)(&item.params);
        Some(WorkResult {
            id: item.id,
            fitness,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{Parameter, ParameterSet};

    fn batch(values: &[f64]) -> Vec<Individual> {
        values
            .iter()
            .map(|&v| {
                let set: ParameterSet = [Parameter::real(v)].into_iter().collect();
                Individual::new(set)
            })
            .collect()
    }

    fn square(params: &ParameterSet) -> std::result::Result<f64, String> {
        let x = params.real_value(0).ok_or("missing parameter")?;
        Ok(x * x)
    }

    fn failing_on_zero(params: &ParameterSet) -> std::result::Result<f64, String> {
        let x = params.real_value(0).ok_or("missing parameter")?;
        if x == 0.0 {
            Err("zero is not evaluable".into())
        } else {
            Ok(x * x)
        }
    }

    #[test]
    fn test_serial_evaluates_all_dirty() {
        let mut inds = batch(&[1.0, 2.0, 3.0]);
        let n = SerialEvaluator
            .evaluate(&mut inds, &square, false, &CancelToken::new())
            .unwrap();
        assert_eq!(n, 3);
        assert!(inds.iter().all(|i| !i.is_dirty()));
        assert_eq!(inds[2].raw_fitness(), 9.0);
    }

    #[test]
    fn test_serial_skips_clean_individuals() {
        let mut inds = batch(&[1.0, 2.0]);
        SerialEvaluator
            .evaluate(&mut inds, &square, false, &CancelToken::new())
            .unwrap();
        let n = SerialEvaluator
            .evaluate(&mut inds, &square, false, &CancelToken::new())
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_serial_isolates_failures() {
        let mut inds = batch(&[2.0, 0.0, 3.0]);
        let n = SerialEvaluator
            .evaluate(&mut inds, &failing_on_zero, false, &CancelToken::new())
            .unwrap();
        assert_eq!(n, 3);
        assert!(!inds[0].is_dirty());
        assert!(inds[1].is_dirty());
        assert_eq!(inds[1].eval_error(), Some("zero is not evaluable"));
        assert_eq!(inds[1].raw_fitness(), f64::INFINITY);
        assert!(!inds[2].is_dirty());
    }

    #[test]
    fn test_serial_cancellation() {
        let mut inds = batch(&[1.0, 2.0]);
        let token = CancelToken::new();
        token.cancel();
        let err = SerialEvaluator
            .evaluate(&mut inds, &square, false, &token)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(inds[0].is_dirty());
    }

    #[test]
    fn test_thread_pool_matches_serial() {
        let mut serial = batch(&[1.0, -2.0, 3.5, 0.25]);
        let mut pooled = serial.clone();
        SerialEvaluator
            .evaluate(&mut serial, &square, false, &CancelToken::new())
            .unwrap();
        ThreadPoolEvaluator::with_threads(4)
            .unwrap()
            .evaluate(&mut pooled, &square, false, &CancelToken::new())
            .unwrap();
        for (a, b) in serial.iter().zip(pooled.iter()) {
            assert_eq!(a.raw_fitness(), b.raw_fitness());
        }
    }

    #[test]
    fn test_thread_pool_isolates_failures() {
        let mut inds = batch(&[0.0, 1.0, 0.0, 2.0]);
        ThreadPoolEvaluator::new()
            .evaluate(&mut inds, &failing_on_zero, false, &CancelToken::new())
            .unwrap();
        assert!(inds[0].is_dirty() && inds[2].is_dirty());
        assert!(!inds[1].is_dirty() && !inds[3].is_dirty());
    }

    #[test]
    fn test_thread_pool_rejects_zero_threads() {
        assert!(ThreadPoolEvaluator::with_threads(0).is_err());
    }

    #[test]
    fn test_external_loopback_round_trip() {
        let dispatcher = LoopbackDispatch::new(Arc::new(square));
        let evaluator = ExternalEvaluator::new(dispatcher, Duration::from_secs(5));
        let mut inds = batch(&[2.0, 4.0]);
        let n = evaluator
            .evaluate(&mut inds, &square, false, &CancelToken::new())
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(inds[0].raw_fitness(), 4.0);
        assert_eq!(inds[1].raw_fitness(), 16.0);
    }

    #[test]
    fn test_external_timeout_marks_dirty_with_error() {
        let dispatcher = LoopbackDispatch::new(Arc::new(square))
            .with_drop_predicate(|item| item.id == 1);
        let evaluator = ExternalEvaluator::new(dispatcher, Duration::from_millis(50));
        let mut inds = batch(&[2.0, 4.0, 6.0]);
        evaluator
            .evaluate(&mut inds, &square, false, &CancelToken::new())
            .unwrap();
        assert!(!inds[0].is_dirty());
        assert!(inds[1].is_dirty());
        assert_eq!(
            inds[1].eval_error(),
            Some("external evaluation timed out")
        );
        assert_eq!(inds[1].raw_fitness(), f64::INFINITY);
        assert!(!inds[2].is_dirty());
    }

    #[test]
    fn test_external_propagates_objective_errors() {
        let dispatcher = LoopbackDispatch::new(Arc::new(failing_on_zero));
        let evaluator = ExternalEvaluator::new(dispatcher, Duration::from_secs(5));
        let mut inds = batch(&[0.0, 3.0]);
        evaluator
            .evaluate(&mut inds, &failing_on_zero, false, &CancelToken::new())
            .unwrap();
        assert!(inds[0].is_dirty());
        assert_eq!(inds[0].eval_error(), Some("zero is not evaluable"));
        assert!(!inds[1].is_dirty());
    }
}
