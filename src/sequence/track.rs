// Track - Append-only heterogeneous event log
// A track is built once by a builder, then treated as a read-only value:
// cloned, hashed, compared, and iterated by every downstream consumer.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::OnceLock;

use crate::sequence::duration::Duration;
use crate::sequence::event::{Category, Event, Role};

/// Derived track summaries, computed lazily on first read after a mutation.
#[derive(Debug, Clone)]
struct TrackSummary {
    total_event_duration: Duration,
    hash: u64,
    group_counts: HashMap<Category, usize>,
}

/// An ordered sequence of delta-timed events plus a nominal duration.
///
/// The nominal duration is always at least the sum of the event deltas; the
/// difference is a trailing gap of silence. Equality is structural: equal
/// durations, equal hashes, pairwise-equal events.
///
/// A finished track is immutable by convention and safe to share read-only
/// across threads; the derived summaries fill their cache at most once.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Track {
    events: Vec<Event>,
    duration: Duration,
    #[serde(skip)]
    summary: OnceLock<TrackSummary>,
}

impl Track {
    /// Creates an empty track. Builders are the only producers of tracks,
    /// so construction stays inside the crate.
    pub(crate) fn new() -> Self {
        Self {
            events: Vec::new(),
            duration: Duration::zero(),
            summary: OnceLock::new(),
        }
    }

    /// Appends an event and invalidates the derived summaries.
    pub(crate) fn append(&mut self, event: Event) {
        self.events.push(event);
        self.summary = OnceLock::new();
    }

    /// Removes the event at `index`, folding its delta into the following
    /// event so every later event keeps its absolute position.
    pub(crate) fn remove(&mut self, index: usize) {
        let removed = self.events.remove(index);
        if let Some(next) = self.events.get_mut(index) {
            *next = Event::new(next.delta + removed.delta, next.kind);
        }
        self.summary = OnceLock::new();
    }

    /// Nominal track length.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Sets the nominal duration. A no-op if `duration` is less than the sum
    /// of the event deltas: the duration can never shrink below the events
    /// it covers.
    pub fn set_duration(&mut self, duration: Duration) {
        if duration >= self.total_event_duration() {
            self.duration = duration;
        }
    }

    /// Sum of all event deltas.
    pub fn total_event_duration(&self) -> Duration {
        self.summary().total_event_duration
    }

    /// Structural hash over the event sequence.
    pub fn hash(&self) -> u64 {
        self.summary().hash
    }

    /// Number of groups (start-of-group events) in the given category.
    pub fn group_count(&self, category: Category) -> usize {
        self.summary()
            .group_counts
            .get(&category)
            .copied()
            .unwrap_or(0)
    }

    /// Forward, restartable iterator over the events.
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn summary(&self) -> &TrackSummary {
        self.summary.get_or_init(|| {
            let mut total = Duration::zero();
            let mut hasher = DefaultHasher::new();
            let mut group_counts = HashMap::new();
            for event in &self.events {
                total += event.delta;
                event.hash(&mut hasher);
                let grouping = event.grouping();
                if grouping.role == Role::StartOfGroup {
                    *group_counts.entry(grouping.category).or_insert(0) += 1;
                }
            }
            TrackSummary {
                total_event_duration: total,
                hash: hasher.finish(),
                group_counts,
            }
        })
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.duration == other.duration && self.hash() == other.hash() && self.events == other.events
    }
}

impl Eq for Track {}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
