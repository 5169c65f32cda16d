use criterion::{Criterion, criterion_group, criterion_main};
use poet_core::{Event, Monitor, Property, VectorClock, parse};
use std::hint::black_box;

fn independent_trace(processes: usize, per_process: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for round in 0..per_process {
        for process in 0..processes {
            let mut clock = vec![0; processes];
            clock[process] = round as u32 + 1;
            events.push(Event::new(
                format!("p{process}e{round}"),
                [process],
                vec!["a".to_owned()],
                VectorClock::new(clock),
            ));
        }
    }
    events
}

fn synchronized_trace(processes: usize, rounds: usize) -> Vec<Event> {
    (0..rounds)
        .map(|round| {
            Event::new(
                format!("sync{round}"),
                0..processes,
                vec!["a".to_owned()],
                VectorClock::new(vec![round as u32 + 1; processes]),
            )
        })
        .collect()
}

fn expansion(c: &mut Criterion) {
    let property = Property::compile(&parse("EP(a & b)").expect("property"));

    let trace = independent_trace(3, 5);
    c.bench_function("lattice_independent_3x5", |b| {
        b.iter(|| {
            let mut monitor = Monitor::new(property.clone(), 3, false);
            for event in trace.iter().cloned() {
                monitor.process_event(event).expect("in-order trace");
            }
            black_box(monitor.verdict())
        })
    });

    let trace = synchronized_trace(2, 500);
    c.bench_function("chain_synchronized_500_reduced", |b| {
        b.iter(|| {
            let mut monitor = Monitor::new(property.clone(), 2, true);
            for event in trace.iter().cloned() {
                monitor.process_event(event).expect("in-order trace");
            }
            black_box(monitor.verdict())
        })
    });
}

criterion_group!(benches, expansion);
criterion_main!(benches);
