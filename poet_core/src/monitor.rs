use crate::event::Event;
use crate::frontier::{EventId, Frontier, FrontierId, Slot};
use crate::observe::{MaximalCut, Observer, RunOutcome, RunSummary, StepRecord};
use crate::pctl::Property;
use crate::vector_clock::VectorClock;
use log::{debug, trace};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt;
use std::mem;
use std::time::{Duration, Instant};

/// Errors raised while feeding events to a [`Monitor`].
#[derive(Debug)]
pub enum MonitorError {
    /// The event's shape disagrees with the declared process count.
    Malformed {
        /// Offending event id.
        event: String,
        /// What is wrong with it.
        detail: String,
    },
    /// The event arrived before one of its causal prerequisites.
    Causality {
        /// Offending event id.
        event: String,
        /// Which prerequisite is missing.
        detail: String,
    },
    /// Internal inconsistency in the frontier graph; unrecoverable.
    Invariant(String),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Malformed { event, detail } => {
                write!(f, "malformed event '{event}': {detail}")
            }
            MonitorError::Causality { event, detail } => {
                write!(f, "event '{event}' violates causal order: {detail}")
            }
            MonitorError::Invariant(detail) => write!(f, "monitor invariant violated: {detail}"),
        }
    }
}

impl Error for MonitorError {}

/// The monitor: owns the frontier graph and expands it event by event.
///
/// Given a compiled [`Property`] over a fixed number of processes, the
/// monitor ingests the events of one execution in a linearization
/// consistent with their causal order. After each event it materializes
/// every global state the event makes reachable, evaluates the property
/// there, and reports the verdict at the maximal state. With reduction
/// enabled, states the delivered prefix has moved past are pruned down to
/// a tombstone holding their cached verdicts, so the live state set stays
/// small on streaming workloads and the graph degenerates to a chain of
/// one state per event on linear traces.
pub struct Monitor {
    property: Property,
    processes: usize,
    slots: Vec<Slot>,
    index: HashMap<VectorClock, FrontierId>,
    events: Vec<Event>,
    histories: Vec<Vec<EventId>>,
    delivered: VectorClock,
    reduce: bool,
}

impl Monitor {
    /// Creates a monitor for the given property and process count, with the
    /// initial all-zeros global state already in place.
    pub fn new(property: Property, processes: usize, reduce: bool) -> Self {
        let labels = vec![false; property.atoms().len()].into_boxed_slice();
        let now = property.evaluate(&labels, true, &[]);
        let mut root = Frontier::new(VectorClock::zero(processes), labels);
        root.now = now;
        let mut index = HashMap::new();
        index.insert(root.cut.clone(), 0);
        Self {
            property,
            processes,
            slots: vec![Slot::Active(root)],
            index,
            events: Vec::new(),
            histories: vec![Vec::new(); processes],
            delivered: VectorClock::zero(processes),
            reduce,
        }
    }

    /// The monitored property.
    pub fn property(&self) -> &Property {
        &self.property
    }

    /// Number of processes of the monitored system.
    pub fn processes(&self) -> usize {
        self.processes
    }

    /// The componentwise maximum clock over all delivered events.
    pub fn delivered(&self) -> &VectorClock {
        &self.delivered
    }

    /// A delivered event, by log index.
    pub fn event(&self, id: EventId) -> &Event {
        &self.events[id]
    }

    /// Global states constructed so far, pruned ones included.
    pub fn total_states(&self) -> usize {
        self.slots.len()
    }

    /// The active (non-pruned) global states, in creation order.
    pub fn frontiers(&self) -> impl Iterator<Item = (FrontierId, &Frontier)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_active().map(|frontier| (id, frontier)))
    }

    /// An active global state, by id.
    pub fn frontier(&self, id: FrontierId) -> Option<&Frontier> {
        self.slots.get(id).and_then(Slot::as_active)
    }

    /// The propositions holding at a cut: those of the most recent local
    /// event of every process with at least one event in the cut.
    pub fn propositions_at(&self, cut: &VectorClock) -> Vec<String> {
        let mut holding = BTreeSet::new();
        for process in 0..self.processes {
            let count = cut.get(process) as usize;
            if count == 0 {
                continue;
            }
            let event = &self.events[self.histories[process][count - 1]];
            holding.extend(event.propositions().iter().cloned());
        }
        holding.into_iter().collect()
    }

    /// The verdict after the last processed event: the property's truth
    /// value at the maximal global state.
    pub fn verdict(&self) -> bool {
        let root = self.property.root();
        self.maximal_ids()
            .into_iter()
            .all(|id| self.state(id).holds(root))
    }

    /// Processes one event: materializes the global states it makes
    /// reachable, evaluates the property there, prunes if reduction is
    /// enabled, and reports the step.
    pub fn process_event(&mut self, event: Event) -> Result<StepRecord, MonitorError> {
        self.validate(&event)?;
        debug!(target: "monitor", "processing event '{}' with clock {}", event.id(), event.clock());

        let event_id = self.events.len();
        let participants: SmallVec<[usize; 2]> = event.participants().iter().copied().collect();
        for &process in &participants {
            self.histories[process].push(event_id);
            self.delivered.assign(process, event.clock().get(process));
        }
        self.events.push(event);

        // Every active state the event can extend.
        let extendable: Vec<FrontierId> = self
            .frontiers()
            .filter(|(_, frontier)| self.events[event_id].deliverable_at(&frontier.cut))
            .map(|(id, _)| id)
            .collect();
        if extendable.is_empty() {
            return Err(MonitorError::Invariant(format!(
                "event '{}' passed the order check but extends no active state",
                self.events[event_id].id()
            )));
        }

        // Materialize the new cuts. Scanning in creation order guarantees
        // that every predecessor of a new state exists before the state
        // itself does.
        let mut created = Vec::new();
        for parent in extendable {
            let cut = self.state(parent).cut.advanced(&participants);
            if let Some(&existing) = self.index.get(&cut) {
                // Already materialized: only the edge is new.
                self.link(parent, event_id, existing);
                continue;
            }
            let labels = self.labels_at(&cut);
            let id = self.slots.len();
            trace!(target: "monitor", "new state {id} with cut {cut}");
            self.slots.push(Slot::Active(Frontier::new(cut.clone(), labels)));
            self.index.insert(cut, id);
            created.push(id);
        }

        // Complete each new state's incoming edges, including edges from
        // other states created in this same step, before evaluating
        // anything: the temporal operators quantify over predecessors.
        for &id in &created {
            for (label, parent) in self.incoming_edges(id) {
                self.link(parent, label, id);
            }
        }
        for &id in &created {
            let now = {
                let frontier = self.state(id);
                let predecessors: Vec<&[bool]> = frontier
                    .parents
                    .iter()
                    .map(|&parent| self.slots[parent].verdicts())
                    .collect();
                self.property.evaluate(&frontier.labels, false, &predecessors)
            };
            self.state_mut(id).now = now;
        }

        let maximal: Vec<MaximalCut> = self
            .maximal_ids()
            .into_iter()
            .map(|id| {
                let frontier = self.state(id);
                MaximalCut {
                    cut: frontier.cut.clone(),
                    propositions: self.propositions_at(&frontier.cut),
                    verdict: frontier.holds(self.property.root()),
                }
            })
            .collect();
        let verdict = maximal.iter().all(|cut| cut.verdict);
        let step = StepRecord {
            event_id: self.events[event_id].id().to_owned(),
            delivered: self.delivered.clone(),
            new_frontiers: created.len(),
            maximal,
            verdict,
        };

        if self.reduce {
            self.reduce_step();
        }
        Ok(step)
    }

    /// Feeds a whole trace to the monitor, timing each event and reporting
    /// every step to the observer. On a causality or invariant error the
    /// run halts and the summary covers the processed prefix.
    pub fn run<I, O>(&mut self, events: I, observer: &mut O) -> RunOutcome
    where
        I: IntoIterator<Item = Event>,
        O: Observer,
    {
        observer.init();
        let mut timings: Vec<(String, Duration)> = Vec::new();
        for event in events {
            let started = Instant::now();
            match self.process_event(event) {
                Ok(step) => {
                    timings.push((step.event_id.clone(), started.elapsed()));
                    observer.observe(&step);
                }
                Err(error) => {
                    let summary = self.summary(&timings);
                    observer.finalize(&summary);
                    return RunOutcome::Halted { error, summary };
                }
            }
        }
        let summary = self.summary(&timings);
        observer.finalize(&summary);
        RunOutcome::Completed(summary)
    }

    fn summary(&self, timings: &[(String, Duration)]) -> RunSummary {
        let total: Duration = timings.iter().map(|(_, duration)| *duration).sum();
        RunSummary {
            total_events: timings.len(),
            total_states: self.slots.len(),
            final_verdict: self.verdict(),
            max_event_time: timings
                .iter()
                .max_by_key(|(_, duration)| *duration)
                .cloned(),
            min_event_time: timings
                .iter()
                .min_by_key(|(_, duration)| *duration)
                .cloned(),
            avg_event_time: total
                .checked_div(timings.len() as u32)
                .unwrap_or_default(),
        }
    }

    fn state(&self, id: FrontierId) -> &Frontier {
        self.slots[id].as_active().expect("active state")
    }

    fn state_mut(&mut self, id: FrontierId) -> &mut Frontier {
        self.slots[id].as_active_mut().expect("active state")
    }

    fn maximal_ids(&self) -> Vec<FrontierId> {
        // The state covering the whole delivered prefix always exists; it
        // is the unique maximal one.
        self.index.get(&self.delivered).copied().into_iter().collect()
    }

    fn validate(&self, event: &Event) -> Result<(), MonitorError> {
        if event.clock().width() != self.processes {
            return Err(MonitorError::Malformed {
                event: event.id().to_owned(),
                detail: format!(
                    "clock width {} differs from the {} declared processes",
                    event.clock().width(),
                    self.processes
                ),
            });
        }
        if event.participants().is_empty() {
            return Err(MonitorError::Malformed {
                event: event.id().to_owned(),
                detail: "no participating processes".to_owned(),
            });
        }
        if let Some(&process) = event
            .participants()
            .iter()
            .find(|&&process| process >= self.processes)
        {
            return Err(MonitorError::Malformed {
                event: event.id().to_owned(),
                detail: format!("participant P{} does not exist", process + 1),
            });
        }
        for process in 0..self.processes {
            let claimed = event.clock().get(process);
            let delivered = self.delivered.get(process);
            if event.participates(process) {
                if claimed != delivered + 1 {
                    return Err(MonitorError::Causality {
                        event: event.id().to_owned(),
                        detail: format!(
                            "P{} is at local index {delivered}, but the event claims index {claimed}",
                            process + 1
                        ),
                    });
                }
            } else if claimed > delivered {
                return Err(MonitorError::Causality {
                    event: event.id().to_owned(),
                    detail: format!(
                        "the event depends on event {claimed} of P{}, of which only {delivered} are delivered",
                        process + 1
                    ),
                });
            }
        }
        Ok(())
    }

    /// All incoming edges of a state: for every event that is the frontier
    /// event of all its participants at the state's cut, the cut with that
    /// event removed, provided it is materialized and the event is
    /// deliverable there.
    fn incoming_edges(&self, id: FrontierId) -> Vec<(EventId, FrontierId)> {
        let cut = &self.state(id).cut;
        let mut candidates: SmallVec<[EventId; 4]> = SmallVec::new();
        for process in 0..self.processes {
            let count = cut.get(process) as usize;
            if count == 0 {
                continue;
            }
            let event_id = self.histories[process][count - 1];
            if !candidates.contains(&event_id) {
                candidates.push(event_id);
            }
        }
        let mut edges = Vec::new();
        for event_id in candidates {
            let event = &self.events[event_id];
            if !event
                .participants()
                .iter()
                .all(|&process| event.clock().get(process) == cut.get(process))
            {
                continue;
            }
            let mut components = cut.components().to_vec();
            for &process in event.participants() {
                components[process] -= 1;
            }
            let parent_cut = VectorClock::new(components);
            if let Some(&parent) = self.index.get(&parent_cut) {
                if event.deliverable_at(&parent_cut) {
                    edges.push((event_id, parent));
                }
            }
        }
        edges
    }

    fn link(&mut self, parent: FrontierId, label: EventId, child: FrontierId) {
        let known = self
            .state(parent)
            .children
            .iter()
            .any(|&(_, existing)| existing == child);
        if !known {
            self.state_mut(parent).children.push((label, child));
            self.state_mut(child).parents.push(parent);
        }
    }

    /// Prunes every disabled active state, in post-order (descending id).
    ///
    /// A state is disabled once every process has delivered past its cut:
    /// no future event can extend it (a future event's participants would
    /// need the cut at their delivered index), and no future state can gain
    /// an edge from it. Its verdicts were consolidated at evaluation time,
    /// so the slot degrades to its verdict summary.
    fn reduce_step(&mut self) {
        for id in (0..self.slots.len()).rev() {
            let disabled = match &self.slots[id] {
                Slot::Active(frontier) => (0..self.processes)
                    .all(|process| frontier.cut.get(process) < self.delivered.get(process)),
                Slot::Pruned(_) => false,
            };
            if disabled {
                let slot = mem::replace(&mut self.slots[id], Slot::Pruned(Box::new([])));
                let frontier = match slot {
                    Slot::Active(frontier) => frontier,
                    Slot::Pruned(_) => unreachable!(),
                };
                trace!(target: "monitor", "pruning state {id} with cut {}", frontier.cut);
                self.index.remove(&frontier.cut);
                self.slots[id] = Slot::Pruned(frontier.now);
            }
        }
    }

    fn labels_at(&self, cut: &VectorClock) -> Box<[bool]> {
        let mut holding: HashSet<&str> = HashSet::new();
        for process in 0..self.processes {
            let count = cut.get(process) as usize;
            if count == 0 {
                continue;
            }
            let event = &self.events[self.histories[process][count - 1]];
            holding.extend(event.propositions().iter().map(String::as_str));
        }
        self.property
            .atoms()
            .iter()
            .map(|atom| holding.contains(atom.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn monitor(formula: &str, processes: usize) -> Monitor {
        let property = Property::compile(&parse(formula).expect("property"));
        Monitor::new(property, processes, false)
    }

    fn event(id: &str, participants: &[usize], props: &[&str], clock: &[u32]) -> Event {
        Event::new(
            id,
            participants.iter().copied(),
            props.iter().map(|p| p.to_string()).collect(),
            VectorClock::new(clock.to_vec()),
        )
    }

    #[test]
    fn initial_verdict() {
        assert!(monitor("TRUE", 2).verdict());
        assert!(!monitor("p", 2).verdict());
        assert!(monitor("AH(!p)", 2).verdict());
    }

    #[test]
    fn rejects_out_of_order_event() {
        let mut m = monitor("p", 1);
        let error = m
            .process_event(event("e2", &[0], &[], &[2]))
            .expect_err("skipped local index");
        assert!(matches!(error, MonitorError::Causality { .. }));
    }

    #[test]
    fn rejects_undelivered_dependency() {
        let mut m = monitor("p", 2);
        let error = m
            .process_event(event("e1", &[1], &[], &[1, 1]))
            .expect_err("dependency on undelivered P1 event");
        assert!(matches!(error, MonitorError::Causality { .. }));
    }

    #[test]
    fn rejects_malformed_event() {
        let mut m = monitor("p", 2);
        assert!(matches!(
            m.process_event(event("e", &[0], &[], &[1])),
            Err(MonitorError::Malformed { .. })
        ));
        assert!(matches!(
            m.process_event(event("e", &[], &[], &[0, 0])),
            Err(MonitorError::Malformed { .. })
        ));
        assert!(matches!(
            m.process_event(event("e", &[2], &[], &[0, 1])),
            Err(MonitorError::Malformed { .. })
        ));
    }

    #[test]
    fn concurrent_events_build_the_diamond() {
        let mut m = monitor("p", 2);
        m.process_event(event("e1", &[0], &["a"], &[1, 0])).unwrap();
        let step = m.process_event(event("e2", &[1], &["b"], &[0, 1])).unwrap();
        // Root, [1,0], [0,1] and [1,1]; both slices of the diamond point
        // at the top.
        assert_eq!(step.new_frontiers, 2);
        assert_eq!(m.total_states(), 4);
        let top = m
            .frontiers()
            .find(|(_, f)| f.cut() == &VectorClock::new(vec![1, 1]))
            .map(|(id, _)| id)
            .expect("top of the diamond");
        let parents = m.frontier(top).unwrap().parents();
        assert_eq!(parents.len(), 2);
        assert_eq!(m.propositions_at(&VectorClock::new(vec![1, 1])), ["a", "b"]);
    }

    #[test]
    fn cuts_are_deduplicated() {
        let mut m = monitor("p", 2);
        m.process_event(event("e1", &[0], &[], &[1, 0])).unwrap();
        m.process_event(event("e2", &[1], &[], &[0, 1])).unwrap();
        m.process_event(event("e3", &[0, 1], &[], &[2, 2])).unwrap();
        let mut cuts: Vec<&VectorClock> = m.frontiers().map(|(_, f)| f.cut()).collect();
        let total = cuts.len();
        cuts.sort_by_key(|cut| cut.components().to_vec());
        cuts.dedup();
        assert_eq!(cuts.len(), total);
    }

    #[test]
    fn step_reports_the_maximal_state() {
        let mut m = monitor("EP(a)", 2);
        let step = m.process_event(event("e1", &[0], &["a"], &[1, 0])).unwrap();
        assert_eq!(step.delivered, VectorClock::new(vec![1, 0]));
        assert_eq!(step.maximal.len(), 1);
        assert_eq!(step.maximal[0].propositions, ["a"]);
        assert!(step.verdict);
    }
}
