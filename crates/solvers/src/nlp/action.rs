/// Actions an observer can take during an NLP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the backend and return the current iterate.
    StopEarly,
}
