use std::{cmp::Ordering, collections::BinaryHeap, fmt::Display};

use serde::{Deserialize, Serialize};

/// Master cycle at which the first H-Blank of a freshly powered console begins.
pub const FIRST_HBLANK: u64 = 1092;
/// Master cycles from the start of H-Blank to the end of the line.
pub const HBLANK_LENGTH: u64 = 258;
/// Master cycles from the end of one line to the start of the next line's H-Blank.
pub const HBLANK_TO_END_OF_LINE: u64 = 1106;
/// Master cycles in a scanline.
pub const MASTER_CYCLES_PER_LINE: u64 = HBLANK_LENGTH + HBLANK_TO_END_OF_LINE;

/// The kinds of things the scheduler can be asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Render the line that just finished and set the H-Blank flag.
    HBlank,
    /// Advance the line counter, entering or leaving V-Blank.
    EndOfLine,
    /// Fire an NMI that was requested while NMIs were masked.
    FireNmi,
    /// Always enqueued, never meant to fire.
    Sentinel,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::HBlank => "H-Blank",
            EventKind::EndOfLine => "End of line",
            EventKind::FireNmi => "Fire NMI",
            EventKind::Sentinel => "Sentinel",
        };
        write!(f, "{}", name)
    }
}

/// A single timestamped event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: u64,
    // Insertion order, used to keep events with equal timestamps first-in first-out
    sequence: u64,
}

// BinaryHeap is a max heap, so the comparison is reversed to pop the earliest event first
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}
impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of events ordered by master clock timestamp.
///
/// ```
/// use yase::core::{EventKind, Scheduler};
/// let mut scheduler = Scheduler::new();
/// scheduler.push_event(EventKind::EndOfLine, 500);
/// scheduler.push_event(EventKind::FireNmi, 10);
/// assert_eq!(scheduler.next().kind, EventKind::FireNmi);
/// scheduler.remove_next();
/// assert_eq!(scheduler.next().timestamp, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler {
    events: BinaryHeap<Event>,
    next_sequence: u64,
    /// The current master clock cycle.
    pub timestamp: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler with the first H-Blank and the sentinel already queued.
    pub fn new() -> Scheduler {
        let mut scheduler = Scheduler {
            events: BinaryHeap::with_capacity(16),
            next_sequence: 0,
            timestamp: 0,
        };
        scheduler.push_event(EventKind::HBlank, FIRST_HBLANK);
        scheduler.push_event(EventKind::Sentinel, u64::MAX);
        scheduler
    }
    /// Queue an event to fire at the given absolute master cycle.
    pub fn push_event(&mut self, kind: EventKind, timestamp: u64) {
        self.events.push(Event {
            kind,
            timestamp,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
    }
    /// Peek at the earliest event.
    pub fn next(&self) -> Event {
        // The sentinel is never removed, so the queue is never empty
        *self
            .events
            .peek()
            .unwrap_or(&Event {
                kind: EventKind::Sentinel,
                timestamp: u64::MAX,
                sequence: 0,
            })
    }
    /// Remove the earliest event.
    pub fn remove_next(&mut self) {
        if self.next().kind != EventKind::Sentinel {
            self.events.pop();
        }
    }
    /// Pop the earliest event if its timestamp has been reached.
    pub fn pop_due(&mut self) -> Option<Event> {
        let event = self.next();
        if self.timestamp >= event.timestamp {
            self.events.pop();
            Some(event)
        } else {
            None
        }
    }
    /// Advance the master clock.
    pub fn add_cycles(&mut self, cycles: u64) {
        self.timestamp += cycles;
    }
    /// Number of queued events, including the sentinel.
    pub fn len(&self) -> usize {
        self.events.len()
    }
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
