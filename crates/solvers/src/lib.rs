//! Transcription of Stride optimal control programs for external solvers.
//!
//! One [`Ocp`](stride_core::Ocp) description can be handed to two very
//! different solver families:
//!
//! - [`nlp`]: a generic nonlinear-programming solver that takes one flat
//!   decision vector, one scalar objective and one flat constraint vector
//! - [`multiple_shooting`]: a structure-exploiting solver that takes the
//!   problem per shooting node, with least-squares costs and per-node bounds
//!
//! Both adapters implement [`SolverInterface`] and are built on the same
//! pieces: the [`assemble`] utilities, the objective and constraint
//! [`aggregate`]s, and [`Options`].
//!
//! Solvers themselves are external. Each adapter talks to its solver through
//! a narrow backend trait ([`nlp::NlpBackend`], [`multiple_shooting::OcpBackend`])
//! so the transcription can be exercised without a numerical library.

pub mod aggregate;
pub mod assemble;
pub mod multiple_shooting;
pub mod nlp;

mod error;
mod interface;
mod options;
mod solution;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::ConfigurationError;
pub use interface::SolverInterface;
pub use options::{OptionValue, Options};
pub use solution::{Multipliers, PhaseTrajectory, SolutionRecord, Status};
