//! Iteration logging.

use log::Level;

use stride_core::Observer;

use crate::traits::{HasIteration, HasObjective};

/// Logs the objective every `every` iterations. Never acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    every: usize,
    level: Level,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            every: 1,
            level: Level::Info,
        }
    }
}

impl Progress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs only every `every`-th iteration. Zero is treated as one.
    #[must_use]
    pub fn every(mut self, every: usize) -> Self {
        self.every = every.max(1);
        self
    }

    #[must_use]
    pub fn at_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Whether `iteration` is logged.
    #[must_use]
    pub fn logs(&self, iteration: usize) -> bool {
        iteration % self.every == 0
    }
}

impl<E, A> Observer<E, A> for Progress
where
    E: HasIteration + HasObjective,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        let iteration = event.iteration();
        if self.logs(iteration) {
            log::log!(
                self.level,
                "iteration {iteration:>4}: objective {:.6e}",
                event.objective()
            );
        }
        None
    }
}
