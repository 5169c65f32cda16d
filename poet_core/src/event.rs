use crate::vector_clock::VectorClock;
use smallvec::SmallVec;
use std::fmt;

/// An observed event of the monitored distributed system.
///
/// An event is an immutable record of one step of the execution: the set of
/// processes that took part in it, the atomic propositions that its
/// occurrence makes true, and its Fidge–Mattern clock.
#[derive(Debug, Clone)]
pub struct Event {
    id: String,
    participants: SmallVec<[usize; 2]>,
    propositions: Vec<String>,
    clock: VectorClock,
}

impl Event {
    /// Creates an event. Participants are 0-based process indices; they are
    /// sorted and deduplicated.
    pub fn new(
        id: impl Into<String>,
        participants: impl IntoIterator<Item = usize>,
        propositions: Vec<String>,
        clock: VectorClock,
    ) -> Self {
        let mut participants: SmallVec<[usize; 2]> = participants.into_iter().collect();
        participants.sort_unstable();
        participants.dedup();
        Self {
            id: id.into(),
            participants,
            propositions,
            clock,
        }
    }

    /// The event's identifier, unique within its trace.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The 0-based indices of the processes participating in the event.
    pub fn participants(&self) -> &[usize] {
        &self.participants
    }

    /// The atomic propositions holding at the event.
    pub fn propositions(&self) -> &[String] {
        &self.propositions
    }

    /// The event's vector clock.
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Whether the given process takes part in the event.
    pub fn participates(&self, process: usize) -> bool {
        self.participants.binary_search(&process).is_ok()
    }

    /// Whether the event may extend a global state with the given cut:
    /// every participant's next local event at the cut must be exactly this
    /// one, and the cut must already include every event of other processes
    /// that this one causally depends on.
    pub fn deliverable_at(&self, cut: &VectorClock) -> bool {
        debug_assert_eq!(cut.width(), self.clock.width());
        (0..cut.width()).all(|process| {
            if self.participates(process) {
                cut.get(process) + 1 == self.clock.get(process)
            } else {
                cut.get(process) >= self.clock.get(process)
            }
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(participants: &[usize], clock: &[u32]) -> Event {
        Event::new(
            "e",
            participants.iter().copied(),
            Vec::new(),
            VectorClock::new(clock.to_vec()),
        )
    }

    #[test]
    fn deliverable_at_matching_cut() {
        let e = event(&[0], &[1, 0]);
        assert!(e.deliverable_at(&VectorClock::zero(2)));
        assert!(!e.deliverable_at(&VectorClock::new(vec![1, 0])));
    }

    #[test]
    fn deliverable_requires_dependencies() {
        // Clock [1, 1] on a P2-only event encodes a dependency on P1's
        // first event: only cuts that already include it qualify.
        let e = event(&[1], &[1, 1]);
        assert!(!e.deliverable_at(&VectorClock::zero(2)));
        assert!(e.deliverable_at(&VectorClock::new(vec![1, 0])));
        assert!(e.deliverable_at(&VectorClock::new(vec![2, 0])));
    }

    #[test]
    fn deliverable_synchronous_event() {
        let e = event(&[0, 1], &[2, 2]);
        assert!(e.deliverable_at(&VectorClock::new(vec![1, 1])));
        assert!(!e.deliverable_at(&VectorClock::new(vec![1, 0])));
        assert!(!e.deliverable_at(&VectorClock::new(vec![2, 1])));
    }

    #[test]
    fn participants_sorted_and_deduplicated() {
        let e = Event::new("e", [1, 0, 1], Vec::new(), VectorClock::zero(2));
        assert_eq!(e.participants(), &[0, 1]);
    }
}
