use std::fmt;

use crate::{
    Defect, Error, Expr, Instance, Interval, Objective, ObjectiveKind, ObjectiveTerm, Parameter,
    Penalty, Phase, Quantity,
};

/// A multi-phase optimal control program.
///
/// The program is the read-only input of every solver adapter. Adapters
/// re-read it on each solve, so targets and initial guesses may be changed
/// between solves through [`Ocp::phases_mut`].
pub struct Ocp<E> {
    phases: Vec<Phase<E>>,
    parameters: Vec<Parameter<E>>,
    parameter_objectives: Vec<ObjectiveTerm<E>>,
    defects: Vec<Defect<E>>,
}

impl<E: Expr> Ocp<E> {
    /// # Errors
    ///
    /// Returns [`Error::NoPhase`] if `phases` is empty.
    pub fn new(phases: Vec<Phase<E>>) -> Result<Self, Error> {
        if phases.is_empty() {
            return Err(Error::NoPhase);
        }
        Ok(Self {
            phases,
            parameters: Vec::new(),
            parameter_objectives: Vec::new(),
            defects: Vec::new(),
        })
    }

    /// Appends a free parameter. Parameters are stacked in insertion order.
    pub fn add_parameter(&mut self, parameter: Parameter<E>) {
        self.parameters.push(parameter);
    }

    /// Appends an objective on the free parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MisplacedObjective`] for Lagrange or Mayer objectives,
    /// and a shape error for a mismatched target.
    pub fn add_parameter_objective(&mut self, objective: Objective<E>) -> Result<(), Error> {
        let residual = match (&objective.kind, &objective.penalty) {
            (ObjectiveKind::Parameter, Penalty::Custom(residual)) => residual.clone(),
            (ObjectiveKind::Lagrange, _) => return Err(Error::MisplacedObjective("Lagrange")),
            (ObjectiveKind::Mayer, _) => return Err(Error::MisplacedObjective("Mayer")),
            (ObjectiveKind::Parameter, _) => {
                return Err(Error::MisplacedObjective("state or control"));
            }
        };
        let instance = Instance {
            node: 0,
            value: residual.clone(),
            target: None,
        };
        let term = ObjectiveTerm::new(objective, Quantity::Expression, residual, vec![instance])?;
        self.parameter_objectives.push(term);
        Ok(())
    }

    /// Appends a transcription defect consumed by the generic NLP path.
    pub fn add_defect(&mut self, defect: Defect<E>) {
        self.defects.push(defect);
    }

    #[must_use]
    pub fn phases(&self) -> &[Phase<E>] {
        &self.phases
    }

    pub fn phases_mut(&mut self) -> &mut [Phase<E>] {
        &mut self.phases
    }

    #[must_use]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter<E>] {
        &self.parameters
    }

    /// Total number of parameter rows `np`.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.parameters.iter().map(Parameter::size).sum()
    }

    /// The stacked parameter symbols (empty without parameters).
    #[must_use]
    pub fn parameter_symbol(&self) -> E {
        let symbols: Vec<E> = self.parameters.iter().map(|p| p.symbol().clone()).collect();
        E::vertcat(&symbols)
    }

    /// The stacked parameter bounds.
    #[must_use]
    pub fn parameter_bounds(&self) -> Interval {
        self.parameters
            .iter()
            .fold(Interval::empty(), |acc, p| acc.concatenate(p.bounds()))
    }

    #[must_use]
    pub fn parameter_objectives(&self) -> &[ObjectiveTerm<E>] {
        &self.parameter_objectives
    }

    pub fn parameter_objectives_mut(&mut self) -> &mut [ObjectiveTerm<E>] {
        &mut self.parameter_objectives
    }

    #[must_use]
    pub fn defects(&self) -> &[Defect<E>] {
        &self.defects
    }
}

impl<E: Expr> fmt::Debug for Ocp<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ocp")
            .field("phases", &self.phases)
            .field("parameters", &self.parameter_count())
            .field("parameter_objectives", &self.parameter_objectives.len())
            .field("defects", &self.defects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    use crate::testing::{self, Sx};

    fn mass() -> Parameter<Sx> {
        Parameter::new(
            "mass",
            Sx::sym("mass", 1),
            Interval::new(vec![1.0], vec![5.0]).unwrap(),
            vec![2.0],
        )
        .unwrap()
    }

    #[test]
    fn needs_a_phase() {
        assert_eq!(Ocp::<Sx>::new(Vec::new()).unwrap_err(), Error::NoPhase);
    }

    #[test]
    fn parameters_stack_in_insertion_order() {
        let mut ocp = Ocp::new(vec![testing::phase(2, 1, 2)]).unwrap();
        ocp.add_parameter(mass());
        ocp.add_parameter(
            Parameter::new(
                "stiffness",
                Sx::sym("k", 2),
                Interval::new(vec![0.0, 0.0], vec![9.0, 8.0]).unwrap(),
                vec![1.0, 1.0],
            )
            .unwrap(),
        );

        assert_eq!(ocp.parameter_count(), 3);
        assert_eq!(ocp.parameter_symbol().numel(), 3);
        assert_eq!(ocp.parameter_bounds().upper(), &array![5.0, 9.0, 8.0]);
    }

    #[test]
    fn parameter_objective_has_one_targetable_instance() {
        let mut ocp = Ocp::new(vec![testing::phase(2, 1, 2)]).unwrap();
        ocp.add_parameter(mass());
        let objective = Objective::parameter(Sx::sym("mass", 1))
            .with_weight(10.0)
            .with_target(array![[3.0]]);
        ocp.add_parameter_objective(objective).unwrap();

        let term = &ocp.parameter_objectives()[0];
        assert_eq!(term.kind(), ObjectiveKind::Parameter);
        assert_eq!(term.instances()[0].target, Some(array![3.0]));
    }

    #[test]
    fn phase_objectives_are_not_parameter_objectives() {
        let mut ocp = Ocp::new(vec![testing::phase(2, 1, 2)]).unwrap();
        let objective = Objective::lagrange(Penalty::MinimizeControls);
        assert_eq!(
            ocp.add_parameter_objective(objective),
            Err(Error::MisplacedObjective("Lagrange"))
        );
    }

    #[test]
    fn phase_time_parameters_are_recognized() {
        let time = Parameter::new(
            "time_phase_0",
            Sx::sym("t", 1),
            Interval::new(vec![0.1], vec![2.0]).unwrap(),
            vec![1.0],
        )
        .unwrap();
        assert!(time.is_phase_time());
        assert!(!mass().is_phase_time());
    }
}
