use ndarray::Array1;

/// One iterate of the NLP backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Zero-based iteration number.
    pub iteration: usize,

    /// Objective value at `x`.
    pub objective: f64,

    /// The decision vector.
    pub x: Array1<f64>,
}
