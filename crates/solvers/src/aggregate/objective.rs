//! Objective aggregation.
//!
//! # Flat form
//!
//! Every instance of every term becomes one scalar,
//! `weight · Σ (value − target)²`, stacked in declaration order: parameter
//! objectives first, then each phase's terms. The generic solver minimizes
//! the sum of that vector.
//!
//! # Least-squares form
//!
//! Single-phase only. Running (Lagrange) terms feed a running [`CostLedger`]
//! with one reference per shooting node; terminal (Mayer) terms and parameter
//! objectives feed a terminal ledger with one reference.
//!
//! A Lagrange term declared on [`Node::All`] that also has an instance on the
//! terminal node is end-folded: its first `N` instances are running costs and
//! its last instance becomes a terminal cost. This matches the flat form,
//! which evaluates the term at every node it claims.

use ndarray::Array1;

use stride_core::{Expr, Instance, Node, ObjectiveKind, ObjectiveTerm, Ocp, Phase, Quantity};

use crate::{
    ConfigurationError,
    assemble::selection_rows,
    aggregate::{CostBlock, CostLedger, Selection, at_model_state, single_phase},
};

/// How least-squares residuals are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CostFamily {
    /// Residuals are selections `Vx·x + Vu·u` of states and controls.
    LinearLs,

    /// Residuals are arbitrary expressions.
    #[default]
    NonlinearLs,
}

/// The requested objective representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostMode {
    Flat,
    LeastSquares(CostFamily),
}

/// An aggregated objective.
#[derive(Debug, Clone)]
pub enum CostRepresentation<E> {
    Flat(FlatCost<E>),
    LeastSquares(LeastSquaresCost<E>),
}

/// One scalar cost per term instance.
#[derive(Debug, Clone)]
pub struct FlatCost<E> {
    pub terms: E,
}

impl<E: Expr> FlatCost<E> {
    /// The scalar objective, the sum of every term.
    #[must_use]
    pub fn total(&self) -> E {
        self.terms.sum()
    }
}

/// Running and terminal least-squares costs of a single phase.
#[derive(Debug, Clone)]
pub struct LeastSquaresCost<E> {
    pub family: CostFamily,
    pub running: CostLedger<E>,
    pub terminal: CostLedger<E>,
}

/// Aggregates the objective of `ocp` in the requested representation.
///
/// # Errors
///
/// See [`least_squares`]. The flat form never fails.
pub fn aggregate<E: Expr>(
    ocp: &Ocp<E>,
    mode: CostMode,
) -> Result<CostRepresentation<E>, ConfigurationError> {
    match mode {
        CostMode::Flat => Ok(CostRepresentation::Flat(flat(ocp))),
        CostMode::LeastSquares(family) => {
            least_squares(ocp, family).map(CostRepresentation::LeastSquares)
        }
    }
}

/// Stacks one weighted scalar per instance, parameter objectives first.
#[must_use]
pub fn flat<E: Expr>(ocp: &Ocp<E>) -> FlatCost<E> {
    let terms = ocp
        .parameter_objectives()
        .iter()
        .chain(ocp.phases().iter().flat_map(|phase| phase.objectives()))
        .flat_map(|term| {
            term.instances()
                .iter()
                .map(move |instance| weighted_value(term.weight(), instance))
        })
        .collect::<Vec<_>>();

    log::debug!("flat objective has {} terms", terms.len());
    FlatCost {
        terms: E::vertcat(&terms),
    }
}

fn weighted_value<E: Expr>(weight: f64, instance: &Instance<E>) -> E {
    let error = match &instance.target {
        Some(target) => instance.value.offset(&target.to_vec()),
        None => instance.value.clone(),
    };
    error.sum_squares().scale(weight)
}

/// Builds the running and terminal least-squares ledgers of a single-phase
/// problem.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if the problem does not have exactly one
/// phase, if a term is declared on nodes the structured form cannot place, if
/// a phase holds a parameter objective, or if the linear family meets a term
/// that is not a pure selection (or free parameters).
pub fn least_squares<E: Expr>(
    ocp: &Ocp<E>,
    family: CostFamily,
) -> Result<LeastSquaresCost<E>, ConfigurationError> {
    let phase = single_phase(ocp)?;
    let has_parameters = ocp.parameter_count() > 0 || !ocp.parameter_objectives().is_empty();
    if family == CostFamily::LinearLs && has_parameters {
        return Err(ConfigurationError::ParametersWithLinearLs);
    }

    let shooting_nodes = phase.shooting_nodes();
    let builder = BlockBuilder { phase, family };
    let mut running = CostLedger::new(phase.nx(), phase.nu(), shooting_nodes);
    let mut terminal = CostLedger::new(phase.nx(), phase.nu(), 1);

    for (index, term) in phase.objectives().iter().enumerate() {
        match (term.kind(), term.node()) {
            (ObjectiveKind::Lagrange, node @ (Node::All | Node::AllShooting)) => {
                let instances = term.instances();
                let folds = *node == Node::All && instances.len() > shooting_nodes;
                let (path, last) = if folds {
                    instances.split_at(shooting_nodes)
                } else {
                    (instances, &[][..])
                };
                running.push(builder.running(index, term, path)?)?;
                if let Some(last) = last.last() {
                    terminal.push(builder.folded(index, term, last)?)?;
                }
            }
            (ObjectiveKind::Mayer, Node::End) => {
                terminal.push(builder.terminal(index, term)?)?;
            }
            (ObjectiveKind::Parameter, _) => {
                return Err(ConfigurationError::UnclassifiedObjective {
                    phase: 0,
                    term: index,
                });
            }
            (kind, node) => {
                return Err(ConfigurationError::UnsupportedObjectiveNode {
                    phase: 0,
                    term: index,
                    kind,
                    node: node.clone(),
                });
            }
        }
    }

    for term in ocp.parameter_objectives() {
        let references = vec![reference(term.instances().last(), term.residual().numel())];
        terminal.push(CostBlock::new(
            term.residual().clone(),
            term.weight(),
            references,
        ))?;
    }

    log::debug!(
        "least-squares objective: {} running rows in {} blocks, {} terminal rows in {} blocks",
        running.rows(),
        running.blocks().len(),
        terminal.rows(),
        terminal.blocks().len(),
    );
    Ok(LeastSquaresCost {
        family,
        running,
        terminal,
    })
}

struct BlockBuilder<'a, E> {
    phase: &'a Phase<E>,
    family: CostFamily,
}

impl<E: Expr> BlockBuilder<'_, E> {
    fn running(
        &self,
        index: usize,
        term: &ObjectiveTerm<E>,
        instances: &[Instance<E>],
    ) -> Result<CostBlock<E>, ConfigurationError> {
        let rows = term.residual().numel();
        let references = instances
            .iter()
            .map(|instance| reference(Some(instance), rows))
            .collect();
        let block = CostBlock::new(term.residual().clone(), term.weight(), references);
        self.select(index, term, block, true)
    }

    fn terminal(
        &self,
        index: usize,
        term: &ObjectiveTerm<E>,
    ) -> Result<CostBlock<E>, ConfigurationError> {
        let rows = term.residual().numel();
        let block = CostBlock::new(
            term.residual().clone(),
            term.weight(),
            vec![reference(term.instances().last(), rows)],
        );
        self.select(index, term, block, false)
    }

    /// The terminal block of an end-folded running term.
    fn folded(
        &self,
        index: usize,
        term: &ObjectiveTerm<E>,
        last: &Instance<E>,
    ) -> Result<CostBlock<E>, ConfigurationError> {
        let residual = at_model_state(self.phase, &last.value);
        let rows = residual.numel();
        let block = CostBlock::new(residual, term.weight(), vec![reference(Some(last), rows)]);
        self.select(index, term, block, false)
    }

    /// Attaches selection rows under the linear family.
    fn select(
        &self,
        index: usize,
        term: &ObjectiveTerm<E>,
        block: CostBlock<E>,
        running: bool,
    ) -> Result<CostBlock<E>, ConfigurationError> {
        if self.family == CostFamily::NonlinearLs {
            return Ok(block);
        }

        let (nx, nu) = (self.phase.nx(), self.phase.nu());
        let rows = block.rows();
        let selection = match term.quantity() {
            Quantity::States => Selection {
                vx: selection_rows(nx, term.index())?,
                vu: ndarray::Array2::zeros((rows, nu)),
            },
            Quantity::Controls if running => Selection {
                vx: ndarray::Array2::zeros((rows, nx)),
                vu: selection_rows(nu, term.index())?,
            },
            Quantity::Controls => {
                return Err(ConfigurationError::IncompatibleObjective {
                    phase: 0,
                    term: index,
                    reason: "terminal costs can only select states",
                });
            }
            Quantity::Expression => {
                return Err(ConfigurationError::IncompatibleObjective {
                    phase: 0,
                    term: index,
                    reason: "custom expressions are not a selection of states or controls",
                });
            }
        };
        Ok(block.with_selection(selection))
    }
}

/// The target of `instance`, or zeros when untargeted.
fn reference<E>(instance: Option<&Instance<E>>, rows: usize) -> Array1<f64> {
    instance
        .and_then(|instance| instance.target.clone())
        .unwrap_or_else(|| Array1::zeros(rows))
}

#[cfg(test)]
mod tests;
