/// Receives solver progress events and may steer the solve.
///
/// Solver adapters report each iterate of an external solver through an
/// observer. Returning `Some(action)` asks the solver for an adapter-specific
/// action (for example stopping early), `None` lets the solve continue.
///
/// Closures `FnMut(&E) -> Option<A>` are observers, and `()` is the observer
/// that never acts.
pub trait Observer<E, A> {
    /// Observes one event and optionally requests an action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
