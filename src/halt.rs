//! Termination control.
//!
//! A [`HaltController`] composes the standard termination predicates
//! (iteration budget, stall budget, wall-clock budget, quality
//! threshold and an optional user predicate) and reports which one
//! fired. Each
//! predicate is disabled by its zero/absent sentinel, so an empty
//! controller never halts on its own.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Which termination predicate ended the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// The configured iteration budget was spent.
    MaxIterations,
    /// Too many consecutive iterations without improvement.
    Stall,
    /// The wall-clock budget was spent.
    Timeout,
    /// The quality threshold was reached.
    Quality,
    /// The user predicate asked for termination.
    User,
    /// The cancellation token tripped.
    Cancelled,
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HaltReason::MaxIterations => "iterations",
            HaltReason::Stall => "stall",
            HaltReason::Timeout => "timeout",
            HaltReason::Quality => "quality",
            HaltReason::User => "user",
            HaltReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Composes termination predicates over a monotonic clock.
pub struct HaltController {
    max_iterations: u32,
    max_stall: u32,
    max_duration: Duration,
    quality_threshold: Option<f64>,
    maximize: bool,
    started: Instant,
    user: Option<Box<dyn Fn(u32, f64) -> bool + Send + Sync>>,
}

impl HaltController {
    /// Creates a controller with every predicate disabled.
    pub fn new(maximize: bool) -> Self {
        HaltController {
            max_iterations: 0,
            max_stall: 0,
            max_duration: Duration::ZERO,
            quality_threshold: None,
            maximize,
            started: Instant::now(),
            user: None,
        }
    }

    /// Iteration budget; 0 disables.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Stall budget; 0 disables.
    pub fn with_max_stall(mut self, max_stall: u32) -> Self {
        self.max_stall = max_stall;
        self
    }

    /// Wall-clock budget; [`Duration::ZERO`] disables.
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Quality threshold under the active direction; `None` disables.
    pub fn with_quality_threshold(mut self, threshold: Option<f64>) -> Self {
        self.quality_threshold = threshold;
        self
    }

    /// User predicate over `(completed iterations, best raw fitness)`.
    pub fn with_user_predicate(
        mut self,
        predicate: impl Fn(u32, f64) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.user = Some(Box::new(predicate));
        self
    }

    /// Restarts the wall clock; called when `optimize()` begins.
    pub fn start_clock(&mut self) {
        self.started = Instant::now();
    }

    /// Strict direction-aware comparison: is `a` better than `b`?
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        if self.maximize {
            a > b
        } else {
            a < b
        }
    }

    /// Whether `best` reaches the configured quality threshold.
    fn quality_reached(&self, best: f64) -> bool {
        match self.quality_threshold {
            None => false,
            Some(threshold) => {
                if self.maximize {
                    best >= threshold
                } else {
                    best <= threshold
                }
            }
        }
    }

    /// Evaluates all predicates after an iteration completed.
    ///
    /// `iterations` counts completed iterations, `stall` the current
    /// stall streak, `best` the best raw fitness seen so far. Returns
    /// the first firing predicate, if any.
    pub fn check(&self, iterations: u32, stall: u32, best: f64) -> Option<HaltReason> {
        if let Some(user) = &self.user {
            if user(iterations, best) {
                return Some(HaltReason::User);
            }
        }
        if self.quality_reached(best) {
            return Some(HaltReason::Quality);
        }
        if self.max_iterations > 0 && iterations >= self.max_iterations {
            return Some(HaltReason::MaxIterations);
        }
        if self.max_stall > 0 && stall >= self.max_stall {
            return Some(HaltReason::Stall);
        }
        if !self.max_duration.is_zero() && self.started.elapsed() >= self.max_duration {
            return Some(HaltReason::Timeout);
        }
        None
    }
}

impl std::fmt::Debug for HaltController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HaltController")
            .field("max_iterations", &self.max_iterations)
            .field("max_stall", &self.max_stall)
            .field("max_duration", &self.max_duration)
            .field("quality_threshold", &self.quality_threshold)
            .field("maximize", &self.maximize)
            .field("user", &self.user.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}
