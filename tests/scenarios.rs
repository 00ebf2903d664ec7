//! 端到端场景：单步发生、最早时间选择、时间上限、优先级、检查点与错误传播。
use anyhow::bail;

use simnet::report::{Firing, FiringLog, NullReporter, StopReason};
use simnet::sim::*;

type State = (Time, Vec<(String, Vec<(i32, Time)>)>);

fn state(problem: &Problem<i32>) -> State {
    let places = problem
        .places()
        .map(|(_, place)| {
            let tokens = place
                .ordered_tokens()
                .into_iter()
                .map(|token| (token.value, token.time))
                .collect();
            (place.name().to_string(), tokens)
        })
        .collect();
    (problem.clock(), places)
}

fn sink(problem: &mut Problem<i32>, name: &str, input: PlaceId) -> EventId {
    problem
        .add_event(name, &[input], &[], |_: &[&i32]| Ok(vec![]))
        .unwrap()
}

fn forward(problem: &mut Problem<i32>, name: &str, input: PlaceId, output: PlaceId, delay: Time) -> EventId {
    problem
        .add_event(name, &[input], &[output], move |v: &[&i32]| {
            Ok(vec![Some(Produce::after(*v[0], delay))])
        })
        .unwrap()
}

fn values(log: &FiringLog<i32>) -> Vec<i32> {
    log.firings
        .iter()
        .flat_map(|f| f.consumed.iter().map(|(_, token)| token.value))
        .collect()
}

#[test]
fn single_firing_moves_token_with_delay() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    let q = problem.add_var("Q").unwrap();
    forward(&mut problem, "E", p, q, 5.0);
    problem.put_at(p, 1, 0.0).unwrap();

    let firing = problem.step(&mut NullReporter).unwrap().unwrap();
    assert_eq!(firing.event_name, "E");
    assert_eq!(firing.time, 0.0);
    assert_eq!(problem.clock(), 0.0);
    assert!(problem.place(p).unwrap().is_empty());
    let q_tokens: Vec<_> = problem
        .place(q)
        .unwrap()
        .tokens()
        .map(|t| (t.value, t.time))
        .collect();
    assert_eq!(q_tokens, vec![(1, 5.0)]);

    assert!(problem.step(&mut NullReporter).unwrap().is_none());
    assert_eq!(problem.clock(), 0.0);
}

#[test]
fn earliest_combination_fires_first() {
    let mut problem = Problem::new();
    let p1 = problem.add_var("P1").unwrap();
    let p2 = problem.add_var("P2").unwrap();
    let e = problem
        .add_event("join", &[p1, p2], &[], |_: &[&i32]| Ok(vec![]))
        .unwrap();
    problem.set_guard(e, |_| Ok(true)).unwrap();
    problem.put_at(p1, 10, 0.0).unwrap();
    problem.put_at(p2, 20, 3.0).unwrap();
    problem.put_at(p2, 21, 0.0).unwrap();

    let candidates = problem.event_bindings(e).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].time, 0.0);

    let mut log = FiringLog::<i32>::new();
    problem.step(&mut log).unwrap();
    assert_eq!(values(&log), vec![10, 21]);
    let left: Vec<_> = problem.place(p2).unwrap().tokens().map(|t| t.value).collect();
    assert_eq!(left, vec![20]);
}

#[test]
fn simulate_stops_before_horizon() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    sink(&mut problem, "E", p);
    for time in [12.0, 2.0, 7.0] {
        problem.put_at(p, time as i32, time).unwrap();
    }

    let mut log = FiringLog::<i32>::new();
    let summary = problem.simulate(10.0, &mut log).unwrap();
    assert_eq!(log.times(), vec![2.0, 7.0]);
    assert_eq!(summary.steps, 2);
    assert_eq!(summary.stop, StopReason::Horizon);
    assert_eq!(problem.clock(), 7.0);
    assert_eq!(problem.place(p).unwrap().len(), 1);

    let pending = problem.next_binding().unwrap().unwrap();
    assert_eq!(pending.time, 12.0);
}

#[test]
fn lower_priority_value_wins_ties() {
    let mut problem = Problem::new();
    let a = problem.add_var("A").unwrap();
    let b = problem.add_var("B").unwrap();
    let first = sink(&mut problem, "declared-first", a);
    let second = sink(&mut problem, "declared-second", b);
    problem.set_binding_priority(first, 2).unwrap();
    problem.set_binding_priority(second, 1).unwrap();
    problem.put(a, 1).unwrap();
    problem.put(b, 2).unwrap();

    let priorities: Vec<_> = problem.bindings().unwrap().iter().map(|b| b.priority).collect();
    assert_eq!(priorities, vec![2, 1]);

    let mut log = FiringLog::<i32>::new();
    problem.run(&RunLimits::default(), &mut log).unwrap();
    assert_eq!(log.event_names(), vec!["declared-second", "declared-first"]);
}

#[test]
fn default_tie_break_follows_declaration_order() {
    let mut problem = Problem::new();
    let a = problem.add_var("A").unwrap();
    let b = problem.add_var("B").unwrap();
    sink(&mut problem, "a", a);
    sink(&mut problem, "b", b);
    problem.put(b, 2).unwrap();
    problem.put(a, 1).unwrap();

    let mut log = FiringLog::<i32>::new();
    problem.run(&RunLimits::default(), &mut log).unwrap();
    assert_eq!(log.event_names(), vec!["a", "b"]);
}

#[test]
fn seeded_tie_break_is_reproducible() {
    fn run(seed: u64) -> Vec<i32> {
        let mut problem = Problem::with_tie_break(Box::new(SeededRandom::new(seed)));
        let p = problem.add_var("P").unwrap();
        sink(&mut problem, "E", p);
        for value in 0..12 {
            problem.put(p, value).unwrap();
        }
        let mut log = FiringLog::<i32>::new();
        problem.run(&RunLimits::default(), &mut log).unwrap();
        values(&log)
    }

    let first = run(9);
    assert_eq!(first, run(9));
    let mut sorted = first.clone();
    sorted.sort();
    assert_eq!(sorted, (0..12).collect::<Vec<_>>());
}

#[test]
fn queue_place_serves_in_arrival_order() {
    let mut problem = Problem::new();
    let waiting = problem.add_place("waiting", PlaceKind::Queue).unwrap();
    sink(&mut problem, "serve", waiting);
    problem.put_at(waiting, 1, 5.0).unwrap();
    problem.put_at(waiting, 2, 1.0).unwrap();

    let mut log = FiringLog::<i32>::new();
    problem.run(&RunLimits::default(), &mut log).unwrap();
    assert_eq!(values(&log), vec![1, 2]);
    // the second token was available long before, but the queue held it back
    assert_eq!(log.times(), vec![5.0, 5.0]);
}

#[test]
fn time_ordered_place_serves_earliest_timestamp() {
    let mut problem = Problem::new();
    let waiting = problem.add_place("waiting", PlaceKind::TimeOrdered).unwrap();
    sink(&mut problem, "serve", waiting);
    problem.put_at(waiting, 1, 5.0).unwrap();
    problem.put_at(waiting, 2, 1.0).unwrap();

    let mut log = FiringLog::<i32>::new();
    problem.run(&RunLimits::default(), &mut log).unwrap();
    assert_eq!(values(&log), vec![2, 1]);
    assert_eq!(log.times(), vec![1.0, 5.0]);
}

#[test]
fn guard_matches_tokens_across_places() {
    let mut problem = Problem::new();
    let left = problem.add_var("left").unwrap();
    let right = problem.add_var("right").unwrap();
    let joined = problem.add_var("joined").unwrap();
    let join = problem
        .add_event("join", &[left, right], &[joined], |v: &[&i32]| {
            Ok(vec![Some(Produce::now(*v[0]))])
        })
        .unwrap();
    problem.set_guard(join, |v| Ok(v[0] == v[1])).unwrap();
    problem.put_at(left, 1, 0.0).unwrap();
    problem.put_at(left, 2, 0.0).unwrap();
    problem.put_at(right, 2, 4.0).unwrap();
    problem.put_at(right, 1, 6.0).unwrap();

    let mut log = FiringLog::<i32>::new();
    problem.run(&RunLimits::default(), &mut log).unwrap();
    assert_eq!(values(&log), vec![2, 2, 1, 1]);
    assert_eq!(log.times(), vec![4.0, 6.0]);
    assert_eq!(problem.place(joined).unwrap().len(), 2);
}

#[test]
fn skipped_outputs_produce_nothing() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    let even = problem.add_var("even").unwrap();
    let odd = problem.add_var("odd").unwrap();
    problem
        .add_event("split", &[p], &[even, odd], |v: &[&i32]| {
            let value = *v[0];
            Ok(if value % 2 == 0 {
                vec![Some(Produce::now(value)), None]
            } else {
                vec![None, Some(Produce::now(value))]
            })
        })
        .unwrap();
    for value in 0..5 {
        problem.put(p, value).unwrap();
    }
    problem.run(&RunLimits::default(), &mut NullReporter).unwrap();
    assert_eq!(problem.place(even).unwrap().len(), 3);
    assert_eq!(problem.place(odd).unwrap().len(), 2);
}

#[test]
fn checkpoint_restores_exact_state() {
    let mut problem = Problem::new();
    let p = problem.add_place("P", PlaceKind::Queue).unwrap();
    let q = problem.add_var("Q").unwrap();
    forward(&mut problem, "E", p, q, 2.5);
    problem.put_at(p, 1, 1.0).unwrap();
    problem.put_at(p, 2, 3.0).unwrap();

    let before = state(&problem);
    let checkpoint = problem.store_checkpoint();
    problem.step(&mut NullReporter).unwrap();
    problem.step(&mut NullReporter).unwrap();
    assert_ne!(state(&problem), before);

    problem.restore_checkpoint(&checkpoint).unwrap();
    assert_eq!(state(&problem), before);

    // the checkpoint survives being restored
    problem.run(&RunLimits::default(), &mut NullReporter).unwrap();
    problem.restore_checkpoint(&checkpoint).unwrap();
    assert_eq!(state(&problem), before);
    assert_eq!(checkpoint.clock(), 0.0);
}

#[test]
fn independent_checkpoints_coexist() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    sink(&mut problem, "E", p);
    problem.put_at(p, 1, 1.0).unwrap();
    problem.put_at(p, 2, 2.0).unwrap();

    let start = problem.store_checkpoint();
    let start_state = state(&problem);
    problem.step(&mut NullReporter).unwrap();
    let middle = problem.store_checkpoint();
    let middle_state = state(&problem);
    problem.step(&mut NullReporter).unwrap();

    problem.restore_checkpoint(&middle).unwrap();
    assert_eq!(state(&problem), middle_state);
    problem.restore_checkpoint(&start).unwrap();
    assert_eq!(state(&problem), start_state);
}

#[test]
fn checkpoint_from_other_problem_is_rejected() {
    let mut small = Problem::<i32>::new();
    small.add_var("P").unwrap();
    let mut large = Problem::<i32>::new();
    large.add_var("P").unwrap();
    large.add_var("Q").unwrap();

    let err = small.restore_checkpoint(&large.store_checkpoint()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn persisted_checkpoint_keeps_queue_order() {
    fn shape() -> (Problem<i32>, PlaceId) {
        let mut problem = Problem::new();
        let waiting = problem.add_place("waiting", PlaceKind::Queue).unwrap();
        let sorted = problem.add_place("sorted", PlaceKind::TimeOrdered).unwrap();
        sink(&mut problem, "serve", waiting);
        sink(&mut problem, "drain", sorted);
        (problem, waiting)
    }

    let (mut source, waiting) = shape();
    source.put_at(waiting, 1, 9.0).unwrap();
    source.put_at(waiting, 2, 1.0).unwrap();
    let sorted = source.place_by_name("sorted").unwrap();
    source.put_at(sorted, 3, 4.0).unwrap();
    source.put_at(sorted, 4, 2.0).unwrap();

    let checkpoint = source.store_checkpoint();
    let persisted = source.persist_checkpoint(&checkpoint).unwrap();
    assert_eq!(persisted.places[0].tokens, vec![(1, 9.0), (2, 1.0)]);
    assert_eq!(persisted.places[1].tokens, vec![(4, 2.0), (3, 4.0)]);

    let text = io::to_json_string(&persisted).unwrap();
    let loaded: PersistedCheckpoint<i32> = io::from_json_str(&text).unwrap();

    let (mut target, waiting) = shape();
    target.restore_persisted(&loaded).unwrap();
    assert_eq!(state(&target), state(&source));
    assert_eq!(target.place(waiting).unwrap().head().map(|t| t.value), Some(1));
}

#[test]
fn persisted_checkpoint_with_wrong_variant_is_rejected() {
    let mut problem = Problem::<i32>::new();
    problem.add_var("P").unwrap();
    let persisted = PersistedCheckpoint {
        clock: 0.0,
        places: vec![PersistedPlace {
            id: "P".into(),
            kind: PlaceKind::Queue,
            tokens: vec![(1, 0.0)],
        }],
    };
    let err = problem.restore_persisted(&persisted).unwrap_err();
    assert!(matches!(err, SimError::CheckpointMismatch(_)));
    assert!(problem.place(PlaceId::new(0)).unwrap().is_empty());
}

#[test]
fn stale_binding_violates_causality() {
    let mut problem = Problem::new();
    let early = problem.add_var("early").unwrap();
    let late = problem.add_var("late").unwrap();
    let first = sink(&mut problem, "first", early);
    let second = sink(&mut problem, "second", late);
    problem.put_at(early, 1, 0.0).unwrap();
    problem.put_at(late, 2, 5.0).unwrap();

    let stale = problem.event_bindings(first).unwrap().remove(0);
    let later = problem.event_bindings(second).unwrap().remove(0);
    problem.fire(&later).unwrap();
    assert_eq!(problem.clock(), 5.0);

    let err = problem.fire(&stale).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Causality);
    assert_eq!(problem.place(early).unwrap().len(), 1);

    // recomputed bindings never precede the clock
    let fresh = problem.event_bindings(first).unwrap();
    assert!(fresh.iter().all(|b| b.time >= problem.clock()));
}

#[test]
fn firing_a_consumed_token_is_not_found() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    sink(&mut problem, "E", p);
    problem.put(p, 1).unwrap();

    let binding = problem.next_binding().unwrap().unwrap();
    problem.fire(&binding).unwrap();
    let err = problem.fire(&binding).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn failing_outflow_leaves_state_untouched() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    let q = problem.add_var("Q").unwrap();
    problem
        .add_event("broken", &[p], &[q], |_: &[&i32]| bail!("no capacity model"))
        .unwrap();
    problem.put_at(p, 1, 3.0).unwrap();
    let before = state(&problem);

    let err = problem.step(&mut NullReporter).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutflowEvaluation);
    assert_eq!(state(&problem), before);
}

#[test]
fn wrong_outflow_arity_is_a_configuration_error() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    let q = problem.add_var("Q").unwrap();
    let r = problem.add_var("R").unwrap();
    problem
        .add_event("short", &[p], &[q, r], |v: &[&i32]| {
            Ok(vec![Some(Produce::now(*v[0]))])
        })
        .unwrap();
    problem.put(p, 1).unwrap();
    let before = state(&problem);

    let err = problem.step(&mut NullReporter).unwrap_err();
    assert!(matches!(err, SimError::Arity { expected: 2, actual: 1, .. }));
    assert_eq!(state(&problem), before);
}

#[test]
fn guard_errors_propagate() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    let e = sink(&mut problem, "E", p);
    problem.set_guard(e, |_| bail!("guard exploded")).unwrap();
    problem.put(p, 1).unwrap();

    let err = problem.simulate(100.0, &mut NullReporter).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GuardEvaluation);
    assert_eq!(problem.place(p).unwrap().len(), 1);
}

#[test]
fn reporter_sees_applied_state_and_can_halt() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    let q = problem.add_var("Q").unwrap();
    forward(&mut problem, "E", p, q, 1.0);
    problem.put(p, 1).unwrap();
    problem.put(p, 2).unwrap();

    let mut calls = 0;
    let mut reporter = |firing: &Firing<i32>| -> anyhow::Result<()> {
        calls += 1;
        assert_eq!(firing.produced.len(), 1);
        bail!("stop after first firing")
    };
    let err = problem.run(&RunLimits::default(), &mut reporter).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reporter);
    assert_eq!(calls, 1);
    assert_eq!(problem.place(q).unwrap().len(), 1);
    assert_eq!(problem.place(p).unwrap().len(), 1);
}

#[test]
fn step_budget_is_honoured() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    sink(&mut problem, "E", p);
    for value in 0..5 {
        problem.put(p, value).unwrap();
    }
    let summary = problem.run(&RunLimits::steps(3), &mut NullReporter).unwrap();
    assert_eq!(summary.steps, 3);
    assert_eq!(summary.stop, StopReason::StepLimit);
    assert_eq!(problem.place(p).unwrap().len(), 2);

    let rest = problem.run(&RunLimits::default(), &mut NullReporter).unwrap();
    assert_eq!(rest.steps, 2);
    assert_eq!(rest.stop, StopReason::Exhausted);
}

#[test]
fn construction_errors_are_configuration_errors() {
    let mut problem = Problem::<i32>::new();
    let p = problem.add_var("P").unwrap();
    assert!(matches!(problem.add_var("P"), Err(SimError::DuplicatePlace(_))));

    sink(&mut problem, "E", p);
    let dup = problem.add_event("E", &[p], &[], |_: &[&i32]| Ok(vec![]));
    assert!(matches!(dup, Err(SimError::DuplicateEvent(_))));

    let empty = problem.add_event("F", &[], &[p], |_: &[&i32]| Ok(vec![None]));
    assert!(matches!(empty, Err(SimError::EmptyInflow(_))));

    let ghost = PlaceId::new(42);
    let unknown = problem.add_event("G", &[p], &[ghost], |_: &[&i32]| Ok(vec![None]));
    let err = unknown.unwrap_err();
    assert!(matches!(err, SimError::UnknownPlace(id) if id == ghost));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(problem.events_len(), 1);
}

#[test]
fn inflow_and_outflow_can_be_rewired() {
    let mut problem = Problem::new();
    let a = problem.add_var("A").unwrap();
    let b = problem.add_var("B").unwrap();
    let out = problem.add_var("out").unwrap();
    let e = sink(&mut problem, "E", a);
    problem.set_inflow(e, &[b]).unwrap();
    problem
        .set_outflow(e, &[out], |v: &[&i32]| Ok(vec![Some(Produce::now(v[0] * 10))]))
        .unwrap();
    problem.put(a, 1).unwrap();
    problem.put(b, 2).unwrap();

    problem.run(&RunLimits::default(), &mut NullReporter).unwrap();
    assert_eq!(problem.place(a).unwrap().len(), 1);
    let produced: Vec<_> = problem.place(out).unwrap().tokens().map(|t| t.value).collect();
    assert_eq!(produced, vec![20]);
    assert!(matches!(problem.set_inflow(e, &[]), Err(SimError::EmptyInflow(_))));
}

#[test]
fn tokens_combinations_is_exposed_on_the_problem() {
    let mut problem = Problem::new();
    let a = problem.add_var("A").unwrap();
    let q = problem.add_place("Q", PlaceKind::Queue).unwrap();
    problem.put(a, 1).unwrap();
    problem.put(a, 2).unwrap();
    problem.put(q, 7).unwrap();
    problem.put(q, 8).unwrap();

    let combos: Vec<Vec<i32>> = problem
        .tokens_combinations(&[a, q])
        .unwrap()
        .map(|c| c.iter().map(|(_, token)| token.value).collect())
        .collect();
    assert_eq!(combos, vec![vec![1, 7], vec![2, 7]]);
    assert!(problem.tokens_combinations(&[PlaceId::new(9)]).is_err());
}

#[test]
fn diagnostics_and_dot_export_describe_the_net() {
    let mut problem = Problem::<i32>::new();
    let p = problem.add_var("P").unwrap();
    let q = problem.add_var("Q \"sink\"").unwrap();
    problem.add_var("orphan").unwrap();
    forward(&mut problem, "E", p, q, 0.0);

    let report = problem.diagnose_connectivity();
    assert_eq!(report.isolated_places.len(), 1);
    assert_eq!(report.isolated_places[0].1, "orphan");
    assert_eq!(report.warnings.len(), 1);
    assert!(report.has_issues());

    let dot = problem.to_dot();
    assert!(dot.starts_with("digraph Problem {"));
    assert!(dot.contains("place_0 -> event_0;"));
    assert!(dot.contains("event_0 -> place_1;"));
    assert!(dot.contains("Q \\\"sink\\\""));
}

#[test]
fn binding_earlier_than_its_tokens_is_rejected() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    let q = problem.add_var("Q").unwrap();
    let e = forward(&mut problem, "E", p, q, 0.0);
    problem.put_at(p, 1, 5.0).unwrap();

    let mut early = problem.event_bindings(e).unwrap().remove(0);
    assert_eq!(early.time, 5.0);
    early.time = 0.0;
    let before = state(&problem);

    let err = problem.fire(&early).unwrap_err();
    assert!(matches!(err, SimError::Premature { available, .. } if available == 5.0));
    assert_eq!(err.kind(), ErrorKind::Causality);
    assert_eq!(state(&problem), before);
}

#[test]
fn binding_rejected_by_guard_is_not_fired() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    let e = sink(&mut problem, "E", p);
    problem.set_guard(e, |v: &[&i32]| Ok(*v[0] > 10)).unwrap();
    problem.put(p, 1).unwrap();
    assert!(problem.event_bindings(e).unwrap().is_empty());

    let handmade = Binding {
        event: e,
        tokens: problem
            .place(p)
            .unwrap()
            .tokens()
            .map(|token| TokenRef::new(p, token.id))
            .collect(),
        time: 0.0,
        priority: DEFAULT_PRIORITY,
    };
    let err = problem.fire(&handmade).unwrap_err();
    assert!(matches!(err, SimError::GuardRejected { .. }));
    assert_eq!(err.kind(), ErrorKind::GuardEvaluation);
    assert_eq!(problem.place(p).unwrap().len(), 1);
}

#[test]
fn binding_from_abandoned_branch_is_not_found_after_restore() {
    let mut problem = Problem::new();
    let p = problem.add_var("P").unwrap();
    let e = sink(&mut problem, "E", p);
    let checkpoint = problem.store_checkpoint();

    problem.put_at(p, 200, 0.0).unwrap();
    let stale = problem.event_bindings(e).unwrap().remove(0);
    problem.restore_checkpoint(&checkpoint).unwrap();
    problem.put_at(p, 300, 7.0).unwrap();

    let err = problem.fire(&stale).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let left: Vec<_> = problem.place(p).unwrap().tokens().map(|t| t.value).collect();
    assert_eq!(left, vec![300]);
}

#[test]
fn clock_never_moves_backwards() {
    let mut problem = Problem::new();
    let a = problem.add_var("A").unwrap();
    let b = problem.add_place("B", PlaceKind::TimeOrdered).unwrap();
    forward(&mut problem, "slow", a, b, 3.0);
    sink(&mut problem, "drain", b);
    for (value, time) in [(1, 4.0), (2, 0.0), (3, 2.5)] {
        problem.put_at(a, value, time).unwrap();
    }

    let mut times = Vec::new();
    let mut record = |firing: &Firing<i32>| -> anyhow::Result<()> {
        times.push(firing.time);
        Ok(())
    };
    let summary = problem.simulate(100.0, &mut record).unwrap();
    assert_eq!(summary.steps, 6);
    assert_eq!(summary.stop, StopReason::Exhausted);
    assert_eq!(times, vec![0.0, 2.5, 3.0, 4.0, 5.5, 7.0]);
    assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn event_reading_a_queue_twice_takes_two_tokens() {
    let mut problem = Problem::new();
    let q = problem.add_place("Q", PlaceKind::Queue).unwrap();
    let pairs = problem.add_var("pairs").unwrap();
    problem
        .add_event("pair", &[q, q], &[pairs], |v: &[&i32]| {
            Ok(vec![Some(Produce::now(*v[0] * 10 + *v[1]))])
        })
        .unwrap();
    problem.put(q, 1).unwrap();
    problem.put(q, 2).unwrap();

    let firing = problem.step(&mut NullReporter).unwrap().unwrap();
    assert_eq!(firing.event_name, "pair");
    assert!(problem.place(q).unwrap().is_empty());
    assert_eq!(problem.place(pairs).unwrap().head().map(|t| t.value), Some(12));
    assert!(problem.step(&mut NullReporter).unwrap().is_none());
}

#[test]
fn events_without_outputs_are_reported() {
    let mut problem = Problem::<i32>::new();
    let p = problem.add_var("P").unwrap();
    sink(&mut problem, "leave", p);
    problem.put(p, 1).unwrap();

    let report = problem.diagnose_connectivity();
    assert!(report.isolated_places.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("`leave`"));
}
