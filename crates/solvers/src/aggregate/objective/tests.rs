use approx::assert_relative_eq;
use ndarray::{Array2, array};

use stride_core::{
    Node, Objective, Ocp, Parameter, Penalty,
    testing::{self, Env, Sx},
};

use super::*;

fn ocp(phase: Phase<Sx>) -> Ocp<Sx> {
    Ocp::new(vec![phase]).unwrap()
}

#[test]
fn running_term_on_all_nodes_is_end_folded() {
    let mut phase = testing::phase(4, 2, 3);
    let target = array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]];
    phase
        .add_objective(
            Objective::lagrange(Penalty::MinimizeStates)
                .with_index(vec![0, 2])
                .with_weight(2.0)
                .with_target(target),
        )
        .unwrap();
    let ocp = ocp(phase);

    for family in [CostFamily::LinearLs, CostFamily::NonlinearLs] {
        let cost = least_squares(&ocp, family).unwrap();

        assert_eq!(cost.running.blocks().len(), 1);
        assert_eq!(cost.running.blocks()[0].references().len(), 3);
        assert_eq!(cost.running.reference(2), array![3.0, 7.0]);

        assert_eq!(cost.terminal.blocks().len(), 1);
        let folded = &cost.terminal.blocks()[0];
        assert_eq!(folded.residual(), &Sx::sym("x", 4).select(&[0, 2]));
        assert_eq!(folded.weight(), 2.0);
        assert_eq!(cost.terminal.reference(0), array![4.0, 8.0]);
    }
}

#[test]
fn folded_expression_is_the_value_at_the_terminal_state() {
    let mut phase = testing::phase(2, 1, 2);
    let x = phase.symbols().state.clone();
    let residual = x.select(&[0]).mul(&x.select(&[1]));
    phase
        .add_objective(Objective::lagrange(Penalty::Custom(residual.clone())))
        .unwrap();

    let cost = least_squares(&ocp(phase), CostFamily::NonlinearLs).unwrap();

    assert_eq!(cost.running.blocks()[0].references().len(), 2);
    assert_eq!(cost.terminal.blocks()[0].residual(), &residual);
}

#[test]
fn control_dependent_running_term_is_not_folded() {
    let mut phase = testing::phase(2, 1, 2);
    let x = phase.symbols().state.clone();
    let u = phase.symbols().control.clone();
    phase
        .add_objective(Objective::lagrange(Penalty::Custom(x.select(&[0]).mul(&u))))
        .unwrap();

    let cost = least_squares(&ocp(phase), CostFamily::NonlinearLs).unwrap();

    assert_eq!(cost.running.blocks()[0].references().len(), 2);
    assert!(cost.terminal.is_empty());
}

#[test]
fn running_term_on_shooting_nodes_is_not_folded() {
    let mut phase = testing::phase(2, 1, 4);
    phase
        .add_objective(Objective::lagrange(Penalty::MinimizeStates).at(Node::AllShooting))
        .unwrap();

    let cost = least_squares(&ocp(phase), CostFamily::NonlinearLs).unwrap();

    assert_eq!(cost.running.blocks()[0].references().len(), 4);
    assert!(cost.terminal.is_empty());
}

#[test]
fn linear_least_squares_end_to_end_layout() {
    let mut phase = testing::phase(4, 2, 3);
    phase
        .add_objective(Objective::lagrange(Penalty::MinimizeControls))
        .unwrap();
    phase
        .add_objective(
            Objective::mayer(Penalty::MinimizeStates)
                .with_index(vec![0, 1])
                .with_target(array![[0.0], [0.0]]),
        )
        .unwrap();

    let cost = least_squares(&ocp(phase), CostFamily::LinearLs).unwrap();

    assert_eq!(cost.running.vu().unwrap(), Array2::<f64>::eye(2));
    assert_eq!(cost.running.vx().unwrap(), Array2::<f64>::zeros((2, 4)));
    assert_eq!(cost.running.weights(), Array2::<f64>::eye(2));
    for node in 0..3 {
        assert_eq!(cost.running.reference(node), array![0.0, 0.0]);
    }

    assert_eq!(
        cost.terminal.vx().unwrap(),
        array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]]
    );
    assert_eq!(cost.terminal.weights(), array![[1.0, 0.0], [0.0, 1.0]]);
    assert_eq!(cost.terminal.reference(0), array![0.0, 0.0]);
}

#[test]
fn weight_blocks_follow_declaration_order() {
    let mut phase = testing::phase(3, 2, 2);
    let x = phase.symbols().state.clone();
    phase
        .add_objective(
            Objective::lagrange(Penalty::MinimizeControls)
                .with_index(vec![1])
                .with_weight(5.0)
                .with_target(array![[10.0, 11.0]]),
        )
        .unwrap();
    phase
        .add_objective(Objective::lagrange(Penalty::Custom(x.clone())).at(Node::AllShooting))
        .unwrap();
    phase
        .add_objective(Objective::lagrange(Penalty::MinimizeControls).with_weight(0.1))
        .unwrap();

    let cost = least_squares(&ocp(phase), CostFamily::NonlinearLs).unwrap();
    let weights = cost.running.weights();

    assert_eq!(cost.running.block_sizes(), vec![1, 3, 2]);
    assert_eq!(weights.dim(), (6, 6));
    assert_relative_eq!(weights[[0, 0]], 5.0);
    assert_relative_eq!(weights[[3, 3]], 1.0);
    assert_relative_eq!(weights[[5, 5]], 0.1);
    assert_relative_eq!(weights[[0, 5]], 0.0);
    assert_eq!(
        cost.running.reference(1),
        array![11.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    );
    assert_eq!(cost.running.residual().numel(), 6);
}

#[test]
fn linear_family_rejects_custom_expressions() {
    let mut phase = testing::phase(2, 1, 2);
    let x = phase.symbols().state.clone();
    phase
        .add_objective(Objective::lagrange(Penalty::Custom(x.scale(2.0))))
        .unwrap();

    assert!(matches!(
        least_squares(&ocp(phase), CostFamily::LinearLs),
        Err(ConfigurationError::IncompatibleObjective { term: 0, .. })
    ));
}

#[test]
fn terminal_terms_must_be_on_the_last_node() {
    let mut phase = testing::phase(2, 1, 2);
    phase
        .add_objective(Objective::mayer(Penalty::MinimizeControls).at(Node::Specific(vec![1])))
        .unwrap();

    assert_eq!(
        least_squares(&ocp(phase), CostFamily::LinearLs).unwrap_err(),
        ConfigurationError::UnsupportedObjectiveNode {
            phase: 0,
            term: 0,
            kind: ObjectiveKind::Mayer,
            node: Node::Specific(vec![1]),
        }
    );
}

#[test]
fn linear_family_rejects_parameters() {
    let mut ocp = ocp(testing::phase(2, 1, 2));
    ocp.add_parameter(
        Parameter::new(
            "mass",
            Sx::sym("m", 1),
            stride_core::Interval::new(vec![1.0], vec![2.0]).unwrap(),
            vec![1.5],
        )
        .unwrap(),
    );

    assert_eq!(
        least_squares(&ocp, CostFamily::LinearLs).unwrap_err(),
        ConfigurationError::ParametersWithLinearLs
    );
    assert!(least_squares(&ocp, CostFamily::NonlinearLs).is_ok());
}

#[test]
fn running_terms_on_specific_nodes_are_rejected() {
    let mut phase = testing::phase(2, 1, 3);
    phase
        .add_objective(Objective::lagrange(Penalty::MinimizeStates).at(Node::Specific(vec![1, 2])))
        .unwrap();

    assert!(matches!(
        least_squares(&ocp(phase), CostFamily::NonlinearLs),
        Err(ConfigurationError::UnsupportedObjectiveNode {
            kind: ObjectiveKind::Lagrange,
            ..
        })
    ));
}

#[test]
fn parameter_objective_inside_a_phase_is_unclassified() {
    let mut phase = testing::phase(2, 1, 2);
    phase
        .add_objective(Objective::parameter(Sx::sym("m", 1)))
        .unwrap();

    assert_eq!(
        least_squares(&ocp(phase), CostFamily::NonlinearLs).unwrap_err(),
        ConfigurationError::UnclassifiedObjective { phase: 0, term: 0 }
    );
}

#[test]
fn parameter_objectives_follow_phase_terminal_rows() {
    let mut phase = testing::phase(2, 1, 2);
    phase
        .add_objective(Objective::mayer(Penalty::MinimizeStates))
        .unwrap();
    let mut ocp = ocp(phase);
    let mass = Sx::sym("m", 1);
    ocp.add_parameter_objective(
        Objective::parameter(mass.clone())
            .with_weight(3.0)
            .with_target(array![[70.0]]),
    )
    .unwrap();

    let cost = least_squares(&ocp, CostFamily::NonlinearLs).unwrap();

    assert_eq!(cost.terminal.block_sizes(), vec![2, 1]);
    assert_eq!(cost.terminal.blocks()[1].residual(), &mass);
    assert_eq!(cost.terminal.reference(0), array![0.0, 0.0, 70.0]);
    assert_relative_eq!(cost.terminal.weights()[[2, 2]], 3.0);
}

#[test]
fn least_squares_needs_a_single_phase() {
    let ocp = Ocp::new(vec![testing::phase(2, 1, 2), testing::phase(2, 1, 2)]).unwrap();

    assert_eq!(
        least_squares(&ocp, CostFamily::NonlinearLs).unwrap_err(),
        ConfigurationError::PhaseCount {
            supported: 1,
            found: 2
        }
    );
    assert!(matches!(
        aggregate(&ocp, CostMode::Flat),
        Ok(CostRepresentation::Flat(_))
    ));
}

#[test]
fn flat_cost_sums_weighted_squared_errors() {
    let mut phase = testing::phase(2, 1, 2);
    phase
        .add_objective(
            Objective::mayer(Penalty::MinimizeStates)
                .with_weight(2.0)
                .with_target(array![[1.0], [1.0]]),
        )
        .unwrap();
    phase
        .add_objective(Objective::lagrange(Penalty::MinimizeControls).with_weight(0.5))
        .unwrap();

    let cost = flat(&ocp(phase));
    let env = Env::new()
        .bind(&Sx::sym("X2", 2), &[2.0, 3.0])
        .bind(&Sx::sym("U0", 1), &[1.0])
        .bind(&Sx::sym("U1", 1), &[2.0]);

    assert_eq!(cost.terms.numel(), 3);
    let terms = cost.terms.eval(&env).unwrap();
    assert_relative_eq!(terms[0], 10.0);
    assert_relative_eq!(terms[1], 0.5);
    assert_relative_eq!(terms[2], 2.0);
    assert_relative_eq!(cost.total().eval(&env).unwrap()[0], 12.5);
}

#[test]
fn flat_cost_accepts_any_node_set() {
    let mut phase = testing::phase(2, 1, 4);
    phase
        .add_objective(Objective::lagrange(Penalty::MinimizeStates).at(Node::Specific(vec![1, 3])))
        .unwrap();

    let cost = flat(&ocp(phase));

    assert_eq!(cost.terms.numel(), 2);
}
