use approx::assert_relative_eq;
use ndarray::{Array1, array};

use stride_core::{
    Constraint, Expr, Node, Objective, Ocp, Penalty,
    testing::{self, Sx},
};

use crate::{
    ConfigurationError, Multipliers, OptionValue, Options, SolverInterface, Status,
    testing::{FakeError, FakeNlp},
};

use super::{Action, Adapter, Error, Event};

/// `nx = 2, nu = 1, N = 2`: controls penalized on every shooting node and
/// the final state penalized at the end.
fn ocp() -> Ocp<Sx> {
    let mut phase = testing::phase(2, 1, 2);
    phase
        .add_objective(Objective::lagrange(Penalty::MinimizeControls))
        .unwrap();
    phase
        .add_objective(Objective::mayer(Penalty::MinimizeStates))
        .unwrap();
    Ocp::new(vec![phase]).unwrap()
}

/// The decision vector `[0, 1, ..., 7]`.
fn ramp() -> Array1<f64> {
    Array1::from_iter((0..8).map(f64::from))
}

fn adapter(backend: FakeNlp) -> Adapter<Sx, FakeNlp> {
    Adapter::new(backend).with_scratch_dir(std::env::temp_dir().join("stride-nlp-tests"))
}

#[test]
fn forwards_bounds_start_point_and_prefixed_options() {
    let mut adapter = adapter(FakeNlp::new());
    adapter
        .configure(Options::new().with("max_iter", 50))
        .unwrap();

    adapter.solve(&ocp()).unwrap();

    let call = &adapter.backend().calls[0];
    assert_eq!(call.variables, 8);
    assert_eq!(call.constraints, 0);
    assert_eq!(call.limits.x0, Array1::<f64>::zeros(8));
    assert!(call.limits.lbx.iter().all(|&bound| bound == -10.0));
    assert!(call.limits.ubx.iter().all(|&bound| bound == 10.0));
    assert_eq!(call.limits.lam_x0, None);
    assert_eq!(call.options.get("ipopt.max_iter"), Some(&OptionValue::Int(50)));
    assert_eq!(call.options.get("ipopt.tol"), Some(&OptionValue::Float(1e-6)));
    assert_relative_eq!(call.initial_objective, 0.0);
}

#[test]
fn unpacks_the_final_iterate() {
    let mut adapter = adapter(FakeNlp::new().with_script(vec![ramp()]));

    let record = adapter.solve(&ocp()).unwrap();

    assert_eq!(record.status, Status::Success);
    assert_eq!(record.iterations, 1);
    assert_eq!(record.parameters.len(), 0);
    assert_eq!(record.phases[0].states, array![[0.0, 2.0, 4.0], [1.0, 3.0, 5.0]]);
    assert_eq!(record.phases[0].controls, array![[6.0, 7.0]]);
    // Controls 6² + 7², final state 4² + 5².
    assert_relative_eq!(record.objective, 85.0 + 41.0);
    assert!(record.iterates.is_none());
    assert!(adapter.result().is_some());
}

#[test]
fn unsuccessful_solves_still_produce_a_record() {
    let mut adapter = adapter(FakeNlp::new().failing());

    let record = adapter.solve(&ocp()).unwrap();

    assert_eq!(record.status, Status::Failure);
    assert_eq!(record.status.code(), 1);
}

#[test]
fn constraints_are_stacked_with_their_bounds() {
    let mut phase = testing::phase(2, 1, 2);
    let x = phase.symbols().state.clone();
    phase
        .add_constraint(Constraint::equality(x.clone(), Node::End).unwrap())
        .unwrap();
    phase
        .add_constraint(Constraint::equality(x.select(&[0]), Node::All).unwrap())
        .unwrap();
    let mut adapter = adapter(FakeNlp::new());

    adapter.solve(&Ocp::new(vec![phase]).unwrap()).unwrap();

    let call = &adapter.backend().calls[0];
    assert_eq!(call.constraints, 2 + 3);
    assert_eq!(call.limits.lbg, Array1::<f64>::zeros(5));
    assert_eq!(call.limits.ubg, Array1::<f64>::zeros(5));
}

#[test]
fn control_dependent_terms_on_all_nodes_bind_every_symbol() {
    let mut phase = testing::phase(1, 1, 3);
    let x = phase.symbols().state.clone();
    let u = phase.symbols().control.clone();
    phase
        .add_objective(Objective::lagrange(Penalty::Custom(x.add(&u))).at(Node::All))
        .unwrap();
    phase
        .add_constraint(Constraint::equality(u, Node::All).unwrap())
        .unwrap();
    let mut adapter = adapter(FakeNlp::new());

    let record = adapter.solve(&Ocp::new(vec![phase]).unwrap()).unwrap();

    assert_eq!(record.phases[0].controls.dim(), (1, 3));
    assert_eq!(adapter.backend().calls[0].constraints, 3);
}

#[test]
fn warm_start_multipliers_are_forwarded() {
    let mut adapter = adapter(FakeNlp::new());

    let first = adapter.solve(&ocp()).unwrap().clone();
    let multipliers = first.multipliers.unwrap();
    assert_eq!(multipliers.lam_x, Array1::<f64>::zeros(8));

    adapter
        .warm_start(Multipliers {
            lam_x: Array1::<f64>::ones(8),
            lam_g: Array1::<f64>::zeros(0),
        })
        .unwrap();
    let second = adapter.solve(&ocp()).unwrap();

    assert_eq!(second.multipliers.as_ref().unwrap().lam_x, Array1::<f64>::ones(8));
    assert_eq!(adapter.backend().calls[1].limits.lam_x0, Some(Array1::<f64>::ones(8)));
}

#[test]
fn iteration_history_is_recorded_on_request() {
    let script = vec![ramp(), ramp() * 0.5];
    let mut adapter = adapter(FakeNlp::new().with_script(script));
    adapter
        .configure(Options::new().with("return_iterations", true))
        .unwrap();

    adapter.solve(&ocp()).unwrap();

    let iterates = adapter.iterations().unwrap();
    assert_eq!(iterates.len(), 3);
    assert_eq!(iterates[0], Array1::<f64>::zeros(8));
    assert_eq!(iterates[2], ramp() * 0.5);
    assert!(
        !adapter.backend().calls[0]
            .options
            .iter()
            .any(|(key, _)| key.contains("return_iterations"))
    );
}

#[test]
fn iterations_are_unavailable_unless_requested() {
    let mut adapter = adapter(FakeNlp::new());
    adapter.solve(&ocp()).unwrap();

    assert!(matches!(adapter.iterations(), Err(Error::IterationsNotRecorded)));
}

#[test]
fn observer_sees_every_iterate_and_can_stop_early() {
    let script = vec![ramp(), ramp() * 2.0, ramp() * 3.0];
    let mut adapter = adapter(FakeNlp::new().with_script(script));
    let mut seen = Vec::new();

    let record = adapter
        .solve_observed(&ocp(), |event: &Event| {
            seen.push((event.iteration, event.objective));
            (event.iteration == 1).then_some(Action::StopEarly)
        })
        .unwrap();

    assert_eq!(record.iterations, 1);
    assert_eq!(record.phases[0].controls, array![[6.0, 7.0]]);
    assert_eq!(seen.len(), 2);
    assert_relative_eq!(seen[1].1, 126.0);
}

#[test]
fn multi_phase_problems_are_flattened() {
    let ocp = Ocp::new(vec![
        testing::named_phase("a", 2, 1, 2),
        testing::named_phase("b", 1, 1, 3),
    ])
    .unwrap();
    let mut adapter = adapter(FakeNlp::new());

    let record = adapter.solve(&ocp).unwrap();

    assert_eq!(record.phases.len(), 2);
    assert_eq!(record.phases[1].states.dim(), (1, 4));
    assert_eq!(record.phases[1].controls.dim(), (1, 3));
    assert_eq!(adapter.backend().calls[0].variables, 8 + 4 + 3);
}

#[test]
fn backend_errors_are_reported() {
    let mut adapter = adapter(FakeNlp::new().refusing());

    let error = adapter.solve(&ocp()).unwrap_err();

    assert!(matches!(error, Error::Backend(_)));
    assert_eq!(error.to_string(), format!("backend error: {}", FakeError::Refused));
    assert!(adapter.result().is_none());
}

#[test]
fn short_solutions_are_backend_errors() {
    let mut adapter = adapter(FakeNlp::new().truncating());

    let error = adapter.solve(&ocp()).unwrap_err();

    assert!(matches!(error, Error::Backend(_)));
    assert_eq!(
        error.to_string(),
        "backend error: solution has 7 values, expected 8"
    );
    assert!(adapter.result().is_none());
}

#[test]
fn return_iterations_must_be_a_boolean() {
    let mut adapter = adapter(FakeNlp::new());

    let error = adapter
        .configure(Options::new().with("return_iterations", 1))
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Configuration(ConfigurationError::InvalidOption { .. })
    ));
}
