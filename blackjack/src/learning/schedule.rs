use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives the observable events of a training run.
///
/// `on_suspend` is called after every batch of episodes; it is the only point
/// at which the host gets control back during `Agent::train`, and the only
/// point at which training can stop early.
pub trait TrainingHandler {
    fn on_progress(&mut self, episode: u64, total: u64, epsilon: f64);

    fn on_suspend(&mut self, _episodes_done: u64) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl TrainingHandler for () {
    fn on_progress(&mut self, _: u64, _: u64, _: f64) {}
}

/// Adapts a plain `(episode, total, epsilon)` closure into a handler.
pub struct ProgressFn<F>(pub F);

impl<F: FnMut(u64, u64, f64)> TrainingHandler for ProgressFn<F> {
    fn on_progress(&mut self, episode: u64, total: u64, epsilon: f64) {
        (self.0)(episode, total, epsilon)
    }
}

/// A cloneable flag a host sets to stop training at the next suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainingSummary {
    pub episodes_run: u64,
    pub cancelled: bool,
    /// Exploration rate after the last episode.
    pub epsilon: f64,
    /// Number of distinct states in the value table.
    pub states: usize,
    /// Mean terminal reward over the episodes of this run.
    pub mean_reward: f64,
}
