//! Objective histories and target-based stopping.

use stride_core::Observer;

use crate::traits::{CanStopEarly, HasIteration, HasObjective};

/// Records `(iteration, objective)` for every event. Never acts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    points: Vec<(usize, f64)>,
}

impl Trace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn points(&self) -> &[(usize, f64)] {
        &self.points
    }

    /// The lowest finite objective seen so far.
    #[must_use]
    pub fn best(&self) -> Option<(usize, f64)> {
        self.points
            .iter()
            .copied()
            .filter(|(_, objective)| objective.is_finite())
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl<E, A> Observer<E, A> for Trace
where
    E: HasIteration + HasObjective,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self.points.push((event.iteration(), event.objective()));
        None
    }
}

/// Stops the solver once the objective drops below `target`, but not before
/// `min_iterations`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveBelow {
    pub target: f64,
    pub min_iterations: usize,
}

impl ObjectiveBelow {
    #[must_use]
    pub fn new(target: f64) -> Self {
        Self {
            target,
            min_iterations: 0,
        }
    }

    #[must_use]
    pub fn after(mut self, min_iterations: usize) -> Self {
        self.min_iterations = min_iterations;
        self
    }
}

impl<E, A> Observer<E, A> for ObjectiveBelow
where
    E: HasIteration + HasObjective,
    A: CanStopEarly,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        let reached = event.objective() < self.target;
        (reached && event.iteration() >= self.min_iterations).then(A::stop_early)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::Array1;
    use stride_solvers::nlp::{Action, Event};

    fn events(objectives: &[f64]) -> Vec<Event> {
        objectives
            .iter()
            .enumerate()
            .map(|(iteration, &objective)| Event {
                iteration,
                objective,
                x: Array1::zeros(2),
            })
            .collect()
    }

    #[test]
    fn trace_records_every_event() {
        let mut trace = Trace::new();

        for event in events(&[4.0, f64::NAN, 1.5, 2.0]) {
            let action: Option<Action> = trace.observe(&event);
            assert_eq!(action, None);
        }

        assert_eq!(trace.points().len(), 4);
        let (iteration, best) = trace.best().unwrap();
        assert_eq!(iteration, 2);
        assert_relative_eq!(best, 1.5);
    }

    #[test]
    fn stops_once_the_target_is_reached() {
        let mut rule = ObjectiveBelow::new(1.0);

        let stopped = events(&[5.0, 2.0, 0.5, 0.1])
            .iter()
            .position(|event| rule.observe(event) == Some(Action::StopEarly));

        assert_eq!(stopped, Some(2));
    }

    #[test]
    fn waits_for_the_minimum_iterations() {
        let mut rule = ObjectiveBelow::new(1.0).after(3);

        let stopped = events(&[0.5, 0.5, 0.5, 0.5])
            .iter()
            .position(|event| rule.observe(event) == Some(Action::StopEarly));

        assert_eq!(stopped, Some(3));
    }
}
