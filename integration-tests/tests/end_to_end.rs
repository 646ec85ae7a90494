//! Both adapters on the same problem.

use approx::assert_relative_eq;
use ndarray::{Array1, Array2, array};

use integration_tests::{Stage, ledger_cost, reference_ocp, trajectory};
use stride_core::Observer;
use stride_observers::{ObjectiveBelow, Progress, Trace};
use stride_solvers::{
    Options, SolverInterface, Status,
    aggregate::objective::{self, CostFamily},
    multiple_shooting::{self, CostDefinition},
    nlp::{self, Action, Event},
    testing::{FakeNlp, FakeOcpBackend, Push},
};

/// The decision vector of a single-phase problem without parameters: node
/// states, then node controls.
fn decision_vector(states: &Array2<f64>, controls: &Array2<f64>) -> Array1<f64> {
    states.t().iter().chain(controls.t().iter()).copied().collect()
}

fn scratch_dir() -> std::path::PathBuf {
    std::env::temp_dir().join("stride-integration-tests")
}

#[test]
fn reference_problem_in_linear_least_squares_form() {
    let ocp = reference_ocp();

    let cost = objective::least_squares(&ocp, CostFamily::LinearLs).unwrap();

    assert_eq!(cost.running.vu().unwrap(), Array2::<f64>::eye(2));
    assert_eq!(cost.running.vx().unwrap(), Array2::<f64>::zeros((2, 4)));
    assert_eq!(
        cost.terminal.vx().unwrap(),
        array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]]
    );
    assert_eq!(cost.terminal.weights(), Array2::<f64>::eye(2));
    assert_eq!(cost.terminal.reference(0), Array1::<f64>::zeros(2));
    assert_eq!(cost.running.nodes(), 3);
    assert!((0..3).all(|node| cost.running.reference(node).len() == 2));
}

#[test]
fn generic_objective_matches_the_structured_costs() {
    let ocp = reference_ocp();
    let phase = &ocp.phases()[0];
    let (states, controls) = trajectory(phase);
    let mut adapter = nlp::Adapter::new(
        FakeNlp::new().with_script(vec![decision_vector(&states, &controls)]),
    )
    .with_scratch_dir(scratch_dir());

    let record = adapter.solve(&ocp).unwrap().clone();

    assert_eq!(record.status, Status::Success);
    assert_eq!(record.phases[0].states, states);
    assert_eq!(record.phases[0].controls, controls);

    let cost = objective::least_squares(&ocp, CostFamily::LinearLs).unwrap();
    let family = CostFamily::LinearLs;
    let structured = ledger_cost(&cost.running, Stage::Running, family, phase, &states, &controls)
        + ledger_cost(&cost.terminal, Stage::Terminal, family, phase, &states, &controls);
    assert_relative_eq!(record.objective, structured, max_relative = 1e-12);
}

#[test]
fn both_adapters_return_trajectories_of_the_same_shape() {
    let ocp = reference_ocp();
    let mut generic = nlp::Adapter::new(FakeNlp::new()).with_scratch_dir(scratch_dir());
    let backend = FakeOcpBackend::new();
    let mut structured = multiple_shooting::Adapter::new(
        backend.clone(),
        Options::new().with("cost_type", "LINEAR_LS"),
    )
    .unwrap();

    let generic_record = generic.solve(&ocp).unwrap().clone();
    let structured_record = structured.solve(&ocp).unwrap().clone();

    for record in [&generic_record, &structured_record] {
        assert_eq!(record.status, Status::Success);
        assert_eq!(record.phases.len(), 1);
        assert_eq!(record.phases[0].states.dim(), (4, 4));
        assert_eq!(record.phases[0].controls.dim(), (2, 3));
        assert_eq!(record.parameters.len(), 0);
    }
    assert!(generic_record.multipliers.is_some());
    assert!(structured_record.multipliers.is_none());

    let journal = backend.journal.borrow();
    let definition = &journal.definitions[0];
    assert!(matches!(definition.cost, CostDefinition::LinearLs { .. }));
    assert_eq!(definition.dimensions.ny, 2);
    assert_eq!(definition.dimensions.ny_e, 2);
    assert_eq!(definition.dimensions.shooting_nodes, 3);
    assert_eq!(journal.pushes.last(), Some(&Push::Solve));
}

#[test]
fn retargeting_between_solves_reaches_both_adapters() {
    let mut ocp = reference_ocp();
    let mut generic = nlp::Adapter::new(FakeNlp::new()).with_scratch_dir(scratch_dir());
    let backend = FakeOcpBackend::new();
    let mut structured = multiple_shooting::Adapter::new(backend.clone(), Options::new()).unwrap();
    structured.solve(&ocp).unwrap();

    ocp.phases_mut()[0].objectives_mut()[1]
        .retarget(array![[1.0], [2.0]])
        .unwrap();
    let record = generic.solve(&ocp).unwrap();
    structured.solve(&ocp).unwrap();

    // Zero start: only the terminal target contributes, 1² + 2².
    assert_relative_eq!(record.objective, 5.0);
    let journal = backend.journal.borrow();
    let terminal_references: Vec<_> = journal
        .pushes
        .iter()
        .filter_map(|push| match push {
            Push::Reference { node: 3, values } => Some(values.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        terminal_references,
        vec![Array1::<f64>::zeros(2), array![1.0, 2.0]]
    );
    assert_eq!(journal.definitions.len(), 1);
}

#[test]
fn observers_trace_and_stop_a_generic_solve() {
    let ocp = reference_ocp();
    let phase = &ocp.phases()[0];
    let (states, controls) = trajectory(phase);
    let far = decision_vector(&states, &controls);
    let script = vec![far.clone() * 2.0, far.clone(), far.clone() * 0.01, far * 0.001];
    let mut adapter = nlp::Adapter::new(FakeNlp::new().with_script(script))
        .with_scratch_dir(scratch_dir());

    let mut trace = Trace::new();
    let mut progress = Progress::new().every(2).at_level(log::Level::Debug);
    // The zero start is already optimal, so only stop once the solve moved.
    let mut good_enough = ObjectiveBelow::new(1.0).after(1);

    let record = adapter
        .solve_observed(&ocp, |event: &Event| -> Option<Action> {
            let _: Option<Action> = trace.observe(event);
            let _: Option<Action> = progress.observe(event);
            good_enough.observe(event)
        })
        .unwrap();

    assert_eq!(record.iterations, 3);
    assert_eq!(trace.points().len(), 4);
    assert_eq!(trace.best().map(|(iteration, _)| iteration), Some(0));
    assert!(trace.points()[1].1 > trace.points()[2].1);
}

#[test]
fn options_load_from_json() {
    let options: Options =
        serde_json::from_str(r#"{"max_iter": 20, "return_iterations": true, "tol": 1e-8}"#)
            .unwrap();
    let mut adapter = nlp::Adapter::new(FakeNlp::new()).with_scratch_dir(scratch_dir());

    adapter.configure(options).unwrap();
    adapter.solve(&reference_ocp()).unwrap();

    let forwarded = &adapter.backend().calls[0].options;
    assert_eq!(forwarded.get("ipopt.max_iter").and_then(|v| v.as_f64()), Some(20.0));
    assert_eq!(forwarded.get("ipopt.tol").and_then(|v| v.as_f64()), Some(1e-8));
    assert_eq!(adapter.iterations().unwrap().len(), 1);
}
