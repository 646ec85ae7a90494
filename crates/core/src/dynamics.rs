/// Continuous-time dynamics of a phase.
///
/// Maps the node-agnostic state, control and parameter symbols to the
/// symbolic state derivative. The transcription layer treats it as opaque:
/// it only calls it once to hand the resulting expression to a solver.
///
/// Closures with the matching signature implement this trait.
pub trait Dynamics<E> {
    /// Returns the state derivative expression.
    fn derivative(&self, state: &E, control: &E, parameters: &E) -> E;
}

impl<E, F> Dynamics<E> for F
where
    F: Fn(&E, &E, &E) -> E,
{
    fn derivative(&self, state: &E, control: &E, parameters: &E) -> E {
        self(state, control, parameters)
    }
}
