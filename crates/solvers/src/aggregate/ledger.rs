use ndarray::{Array1, Array2, s};

use stride_core::Expr;

use crate::{
    ConfigurationError,
    assemble::{block_diagonal_append, broadcast_weight},
};

/// The selection rows of a linear least-squares block.
///
/// `vx` has one column per state and `vu` one per control; a block that acts
/// on states has zero `vu` rows and vice versa.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub vx: Array2<f64>,
    pub vu: Array2<f64>,
}

/// The least-squares contribution of one objective term.
///
/// The residual rows, weight and references of a block are always appended
/// together, so weight rows cannot drift from reference rows.
#[derive(Debug, Clone)]
pub struct CostBlock<E> {
    residual: E,
    selection: Option<Selection>,
    weight: f64,
    references: Vec<Array1<f64>>,
}

impl<E: Expr> CostBlock<E> {
    /// A block with one reference per node of its ledger.
    #[must_use]
    pub fn new(residual: E, weight: f64, references: Vec<Array1<f64>>) -> Self {
        Self {
            residual,
            selection: None,
            weight,
            references,
        }
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.residual.numel()
    }

    #[must_use]
    pub fn residual(&self) -> &E {
        &self.residual
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[must_use]
    pub fn references(&self) -> &[Array1<f64>] {
        &self.references
    }
}

/// An ordered list of cost blocks over `nodes` nodes.
///
/// The running ledger of a phase has `N` nodes, the terminal ledger one.
/// Every matrix and reference it hands out is assembled from the same block
/// order.
#[derive(Debug, Clone)]
pub struct CostLedger<E> {
    nx: usize,
    nu: usize,
    nodes: usize,
    blocks: Vec<CostBlock<E>>,
}

impl<E: Expr> CostLedger<E> {
    #[must_use]
    pub fn new(nx: usize, nu: usize, nodes: usize) -> Self {
        Self {
            nx,
            nu,
            nodes,
            blocks: Vec::new(),
        }
    }

    /// Appends `block` after checking it has one reference per node, each
    /// as long as its residual.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MisalignedCostBlock`] otherwise.
    pub(crate) fn push(&mut self, block: CostBlock<E>) -> Result<(), ConfigurationError> {
        if block.references.len() != self.nodes {
            return Err(ConfigurationError::MisalignedCostBlock {
                what: "references",
                expected: self.nodes,
                found: block.references.len(),
            });
        }
        if let Some(bad) = block.references.iter().find(|r| r.len() != block.rows()) {
            return Err(ConfigurationError::MisalignedCostBlock {
                what: "reference rows",
                expected: block.rows(),
                found: bad.len(),
            });
        }
        self.blocks.push(block);
        Ok(())
    }

    #[must_use]
    pub fn blocks(&self) -> &[CostBlock<E>] {
        &self.blocks
    }

    #[must_use]
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total number of residual rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.blocks.iter().map(CostBlock::rows).sum()
    }

    /// Row count of each block, in ledger order.
    #[must_use]
    pub fn block_sizes(&self) -> Vec<usize> {
        self.blocks.iter().map(CostBlock::rows).collect()
    }

    /// The stacked residual.
    #[must_use]
    pub fn residual(&self) -> E {
        let parts: Vec<E> = self.blocks.iter().map(|b| b.residual.clone()).collect();
        E::vertcat(&parts)
    }

    /// The block-diagonal weight matrix.
    #[must_use]
    pub fn weights(&self) -> Array2<f64> {
        self.blocks
            .iter()
            .fold(Array2::zeros((0, 0)), |weights, block| {
                block_diagonal_append(&weights, &broadcast_weight(block.weight, block.rows()))
            })
    }

    /// The stacked state selection, `None` unless every block is a selection.
    #[must_use]
    pub fn vx(&self) -> Option<Array2<f64>> {
        self.stack_selection(self.nx, |selection| &selection.vx)
    }

    /// The stacked control selection, `None` unless every block is a
    /// selection.
    #[must_use]
    pub fn vu(&self) -> Option<Array2<f64>> {
        self.stack_selection(self.nu, |selection| &selection.vu)
    }

    fn stack_selection(
        &self,
        columns: usize,
        part: impl Fn(&Selection) -> &Array2<f64>,
    ) -> Option<Array2<f64>> {
        let mut stacked = Array2::zeros((self.rows(), columns));
        let mut row = 0;
        for block in &self.blocks {
            let rows = part(block.selection.as_ref()?);
            stacked
                .slice_mut(s![row..row + rows.nrows(), ..])
                .assign(rows);
            row += rows.nrows();
        }
        Some(stacked)
    }

    /// The stacked reference at `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not below [`CostLedger::nodes`].
    #[must_use]
    pub fn reference(&self, node: usize) -> Array1<f64> {
        self.blocks
            .iter()
            .flat_map(|block| block.references[node].iter().copied())
            .collect()
    }
}
