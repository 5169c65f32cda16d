use poet_core::{Event, Monitor, Observer, Property, RunOutcome, RunSummary, StepRecord, VectorClock, parse};

fn property(formula: &str) -> Property {
    Property::compile(&parse(formula).expect("property"))
}

fn monitor(formula: &str, processes: usize, reduce: bool) -> Monitor {
    Monitor::new(property(formula), processes, reduce)
}

fn event(id: &str, participants: &[usize], props: &[&str], clock: &[u32]) -> Event {
    Event::new(
        id,
        participants.iter().copied(),
        props.iter().map(|p| p.to_string()).collect(),
        VectorClock::new(clock.to_vec()),
    )
}

fn step_verdicts(formula: &str, processes: usize, reduce: bool, trace: &[Event]) -> Vec<bool> {
    let mut m = monitor(formula, processes, reduce);
    trace
        .iter()
        .cloned()
        .map(|e| m.process_event(e).expect("in-order trace").verdict)
        .collect()
}

/// Two concurrent events on distinct processes, then a joint event.
fn diamond_with_join() -> Vec<Event> {
    vec![
        event("e1", &[0], &["a"], &[1, 0]),
        event("e2", &[1], &["b"], &[0, 1]),
        event("e3", &[0, 1], &["c"], &[2, 2]),
    ]
}

fn request_response() -> Vec<Event> {
    vec![
        event("e1", &[0], &["req"], &[1, 0]),
        event("e2", &[1], &["resp"], &[1, 1]),
    ]
}

fn critical_sections() -> Vec<Event> {
    vec![
        event("e1", &[0], &["cs1"], &[1, 0]),
        event("e2", &[1], &["cs2"], &[0, 1]),
    ]
}

#[test]
fn exists_past_reaches_concurrent_cut() {
    // a and b only coexist at the cut joining the two concurrent events.
    let verdicts = step_verdicts("EP(a & b)", 2, false, &diamond_with_join());
    assert_eq!(verdicts, [false, true, true]);
}

#[test]
fn forall_past_requires_every_backward_path() {
    // a & !b holds on the branch through e1 but on no state of the branch
    // through e2, so the universal operator fails at the join while the
    // existential one succeeds.
    let trace = &diamond_with_join()[..2];
    assert_eq!(step_verdicts("AP(a & !b)", 2, false, trace), [true, false]);
    assert_eq!(step_verdicts("EP(a & !b)", 2, false, trace), [true, true]);
}

#[test]
fn response_always_preceded_by_request() {
    let verdicts = step_verdicts("AH(resp -> EP(req))", 2, false, &request_response());
    assert_eq!(verdicts, [true, true]);
}

#[test]
fn concurrent_critical_sections_detected() {
    // The two events are concurrent, so some consistent cut contains both.
    let verdicts = step_verdicts("AH(!(cs1 & cs2))", 2, false, &critical_sections());
    assert_eq!(verdicts, [true, false]);
}

#[test]
fn verdict_independent_of_linearization() {
    for formula in ["EP(a & b)", "AP(a & !b)", "AH(!(a & b))", "EY(b)"] {
        let forward = diamond_with_join();
        let swapped = vec![forward[1].clone(), forward[0].clone(), forward[2].clone()];
        let mut first = monitor(formula, 2, false);
        let mut second = monitor(formula, 2, false);
        for e in forward {
            first.process_event(e).unwrap();
        }
        for e in swapped {
            second.process_event(e).unwrap();
        }
        assert_eq!(first.verdict(), second.verdict(), "property {formula}");
        assert_eq!(first.total_states(), second.total_states());
    }
}

#[test]
fn reduction_preserves_verdicts_and_state_counts() {
    let scenarios: Vec<(&str, usize, Vec<Event>)> = vec![
        ("EP(a & b)", 2, diamond_with_join()),
        ("AP(a & !b)", 2, diamond_with_join()),
        ("AH(resp -> EP(req))", 2, request_response()),
        ("AH(!(cs1 & cs2))", 2, critical_sections()),
        ("EY(a) | AY(b)", 2, diamond_with_join()),
    ];
    for (formula, processes, trace) in scenarios {
        let plain = step_verdicts(formula, processes, false, &trace);
        let reduced = step_verdicts(formula, processes, true, &trace);
        assert_eq!(plain, reduced, "property {formula}");

        let mut plain = monitor(formula, processes, false);
        let mut reduced = monitor(formula, processes, true);
        for e in trace.iter().cloned() {
            plain.process_event(e).unwrap();
        }
        for e in trace {
            reduced.process_event(e).unwrap();
        }
        // Reduction prunes, it never changes what gets built.
        assert_eq!(plain.total_states(), reduced.total_states());
        assert!(reduced.frontiers().count() <= plain.frontiers().count());
    }
}

#[test]
fn reduced_linear_trace_degenerates_to_a_chain() {
    let trace = vec![
        event("e1", &[0], &["p"], &[1]),
        event("e2", &[0], &["q"], &[2]),
        event("e3", &[0], &["p"], &[3]),
    ];
    let mut m = monitor("EP(p)", 1, true);
    for e in trace {
        m.process_event(e).unwrap();
    }
    // One state per event plus the root, and only the newest stays live.
    assert_eq!(m.total_states(), 4);
    assert_eq!(m.frontiers().count(), 1);
    assert!(m.verdict());
}

#[test]
fn yesterday_duality_at_every_non_root_state() {
    let mut m = monitor("EY(a) | AY(!a)", 2, false);
    for e in diamond_with_join() {
        m.process_event(e).unwrap();
    }
    let root = m.property().root();
    for (id, frontier) in m.frontiers() {
        if id == 0 {
            continue;
        }
        assert!(frontier.holds(root), "duality fails at state {id}");
    }
}

#[test]
fn history_operators_satisfy_their_inclusions() {
    // EH(p) -> p and AH(p) -> AP(p) are valid at every state.
    for formula in ["EH(p) -> p", "AH(p) -> AP(p)"] {
        let trace = vec![
            event("e1", &[0], &["p"], &[1, 0]),
            event("e2", &[1], &[], &[0, 1]),
            event("e3", &[0], &["p"], &[2, 1]),
        ];
        let mut m = monitor(formula, 2, false);
        for e in trace {
            m.process_event(e).unwrap();
        }
        let root = m.property().root();
        for (id, frontier) in m.frontiers() {
            assert!(frontier.holds(root), "property {formula} fails at state {id}");
        }
    }
}

#[test]
fn since_holds_once_its_anchor_appears() {
    let trace = vec![
        event("e1", &[0], &["p"], &[1]),
        event("e2", &[0], &["p"], &[2]),
        event("e3", &[0], &["q"], &[3]),
    ];
    assert_eq!(
        step_verdicts("E(p S q)", 1, false, &trace),
        [false, false, true]
    );
    assert_eq!(
        step_verdicts("A(p S q)", 1, false, &trace),
        [false, false, true]
    );
    // Once anchored, the since survives as long as its left side holds.
    let trace = vec![
        event("e1", &[0], &["q"], &[1]),
        event("e2", &[0], &["p"], &[2]),
        event("e3", &[0], &[], &[3]),
    ];
    assert_eq!(
        step_verdicts("E(p S q)", 1, false, &trace),
        [true, true, false]
    );
}

#[test]
fn empty_trace_reports_the_initial_state() {
    let mut m = monitor("TRUE", 2, false);
    match m.run(Vec::new(), &mut ()) {
        RunOutcome::Completed(summary) => {
            assert_eq!(summary.total_events, 0);
            assert_eq!(summary.total_states, 1);
            assert!(summary.final_verdict);
            assert!(summary.max_event_time.is_none());
        }
        RunOutcome::Halted { error, .. } => panic!("unexpected halt: {error}"),
    }
    assert!(!monitor("p", 2, false).verdict());
}

#[test]
fn causality_error_halts_with_partial_summary() {
    let trace = vec![
        event("e1", &[0], &["p"], &[1, 0]),
        event("e3", &[0], &["p"], &[3, 0]),
    ];
    let mut m = monitor("EP(p)", 2, false);
    match m.run(trace, &mut ()) {
        RunOutcome::Halted { summary, .. } => {
            assert_eq!(summary.total_events, 1);
            assert!(summary.final_verdict);
        }
        RunOutcome::Completed(_) => panic!("gap in P1's local order went unnoticed"),
    }
}

#[test]
fn edges_are_monotone_single_event_steps() {
    let mut m = monitor("TRUE", 2, false);
    for e in diamond_with_join() {
        m.process_event(e).unwrap();
    }
    for (_, frontier) in m.frontiers() {
        for &(event_id, child) in frontier.children() {
            let child = m.frontier(child).expect("child state");
            let label = m.event(event_id);
            for process in 0..m.processes() {
                let step = u32::from(label.participates(process));
                assert_eq!(
                    frontier.cut().get(process) + step,
                    child.cut().get(process)
                );
            }
        }
    }
}

#[derive(Default)]
struct Recording {
    steps: Vec<String>,
    summary: Option<RunSummary>,
}

impl Observer for Recording {
    fn observe(&mut self, step: &StepRecord) {
        self.steps.push(step.event_id.clone());
    }

    fn finalize(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}

#[test]
fn observer_sees_every_step_and_the_summary() {
    let mut m = monitor("EP(a & b)", 2, false);
    let mut recording = Recording::default();
    match m.run(diamond_with_join(), &mut recording) {
        RunOutcome::Completed(summary) => assert!(summary.final_verdict),
        RunOutcome::Halted { error, .. } => panic!("unexpected halt: {error}"),
    }
    assert_eq!(recording.steps, ["e1", "e2", "e3"]);
    let summary = recording.summary.expect("finalized");
    assert_eq!(summary.total_events, 3);
    assert_eq!(summary.total_states, 5);
    assert!(summary.max_event_time.is_some());
}
