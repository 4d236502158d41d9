// Synchronizer - K-way time-synchronized traversal of several tracks
// Interleaves independently-timed tracks into one timeline without ever
// materializing absolute timestamps: each round advances all cursors by the
// largest step that skips no event on any track.

use std::mem;

use crate::sequence::duration::Duration;
use crate::sequence::event::Event;
use crate::sequence::track::Track;

type EventFilter<'a> = Box<dyn Fn(&Event) -> bool + 'a>;

/// Cursor into one track's filtered event subsequence.
struct TrackCursor<'a> {
    track: &'a Track,
    filter: Option<EventFilter<'a>>,
    /// Index of the next event of interest.
    next: usize,
    /// Time from the cursor's current position to that event; `None` once
    /// the track is exhausted.
    time_to_next: Option<Duration>,
}

impl<'a> TrackCursor<'a> {
    fn new(track: &'a Track, filter: Option<EventFilter<'a>>) -> Self {
        let mut cursor = Self {
            track,
            filter,
            next: 0,
            time_to_next: None,
        };
        cursor.time_to_next = cursor.seek(0, Duration::zero());
        cursor
    }

    /// Finds the first event of interest at or after `from`, accumulating
    /// the deltas of everything skipped on top of `carried`. Leaves `next`
    /// on the found event.
    fn seek(&mut self, from: usize, carried: Duration) -> Option<Duration> {
        let mut gap = carried;
        for (offset, event) in self.track.events()[from..].iter().enumerate() {
            gap += event.delta;
            let interesting = self.filter.as_ref().is_none_or(|f| f(event));
            if interesting {
                self.next = from + offset;
                return Some(gap);
            }
        }
        self.next = self.track.len();
        None
    }

    /// Folds this track's duration into the composite duration.
    fn least_upper_bound_duration(&self, acc: &mut Duration) {
        if self.track.duration() > *acc {
            *acc = self.track.duration();
        }
    }

    /// Shrinks `budget` to the time of this track's next pending event.
    /// An exhausted track leaves the budget unchanged.
    fn greatest_lower_bound_next_event(&self, budget: &mut Option<Duration>) {
        if let Some(t) = self.time_to_next {
            match budget {
                Some(b) if *b <= t => {}
                _ => *budget = Some(t),
            }
        }
    }

    /// Emits every pending event within `step` and moves the cursor past
    /// them. The first emission across the whole round takes the `pay`
    /// balance as its delta; every later emission at the same instant gets
    /// zero.
    fn advance(&mut self, step: Duration, pay: &mut Duration, on_event: &mut dyn FnMut(Event)) {
        let Some(t) = self.time_to_next else {
            return;
        };
        if t > step {
            self.time_to_next = Some(t - step);
            return;
        }
        // The event sits exactly at the step boundary; emit it and every
        // zero-delta follower at the same instant.
        loop {
            let kind = self.track.events()[self.next].kind;
            on_event(Event::new(mem::take(pay), kind));
            self.time_to_next = self.seek(self.next + 1, Duration::zero());
            if !matches!(self.time_to_next, Some(gap) if gap.is_zero()) {
                break;
            }
        }
    }
}

/// Merges the event streams of N tracks into one synchronized timeline.
///
/// Tracks are traversed in the order they were added; events landing on the
/// same instant are emitted in that track order, so identical inputs always
/// produce identical output. Tracks are only read; cursor state lives here.
pub struct Synchronizer<'a> {
    cursors: Vec<TrackCursor<'a>>,
}

impl<'a> Synchronizer<'a> {
    pub fn new() -> Self {
        Self {
            cursors: Vec::new(),
        }
    }

    /// Adds a track; every event is of interest.
    pub fn add_track(&mut self, track: &'a Track) {
        self.cursors.push(TrackCursor::new(track, None));
    }

    /// Adds a track exposing only the events the filter accepts; filtered-out
    /// events contribute their deltas but are never emitted.
    pub fn add_track_filtered(
        &mut self,
        track: &'a Track,
        filter: impl Fn(&Event) -> bool + 'a,
    ) {
        self.cursors
            .push(TrackCursor::new(track, Some(Box::new(filter))));
    }

    /// Composite duration: the maximum of the input durations.
    pub fn composite_duration(&self) -> Duration {
        let mut acc = Duration::zero();
        for cursor in &self.cursors {
            cursor.least_upper_bound_duration(&mut acc);
        }
        acc
    }

    /// Drives the merge, handing every event (with its merged delta) to
    /// `on_event`. Returns the composite duration; the time after the last
    /// event up to that duration is a trailing gap.
    pub fn run(mut self, mut on_event: impl FnMut(Event)) -> Duration {
        let total = self.composite_duration();
        loop {
            let mut step: Option<Duration> = None;
            for cursor in &self.cursors {
                cursor.greatest_lower_bound_next_event(&mut step);
            }
            let Some(step) = step else {
                break;
            };
            let mut pay = step;
            for cursor in &mut self.cursors {
                cursor.advance(step, &mut pay, &mut on_event);
            }
        }
        total
    }
}

impl Default for Synchronizer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::builder::TrackBuilder;
    use crate::sequence::event::EventKind;

    fn on(num: i64, den: i64, pitch: u8) -> Event {
        Event::new(
            Duration::new(num, den),
            EventKind::NoteOn {
                pitch,
                velocity: 100,
            },
        )
    }

    fn off(num: i64, den: i64, pitch: u8) -> Event {
        Event::new(Duration::new(num, den), EventKind::NoteOff { pitch })
    }

    fn track(events: Vec<Event>, duration: Duration) -> Track {
        let mut builder = TrackBuilder::new();
        for event in events {
            builder.add_event(event);
        }
        let mut track = builder.finish();
        track.set_duration(duration);
        track
    }

    fn collect(sync: Synchronizer<'_>) -> (Vec<Event>, Duration) {
        let mut events = Vec::new();
        let duration = sync.run(|e| events.push(e));
        (events, duration)
    }

    #[test]
    fn test_merge_duration_is_max_of_inputs() {
        let a = track(vec![on(0, 1, 60), off(1, 4, 60)], Duration::from(1));
        let b = track(vec![on(0, 1, 64), off(1, 2, 64)], Duration::new(3, 2));

        let mut sync = Synchronizer::new();
        sync.add_track(&a);
        sync.add_track(&b);
        assert_eq!(sync.composite_duration(), Duration::new(3, 2));
    }

    #[test]
    fn test_two_track_merge_scenario() {
        // Track 1: duration 1, events at 0 and 1/4.
        // Track 2: duration 3/2, events at 0 and 1/2.
        // Merged: emission points at 0, 1/4, 1/2; duration 3/2.
        let a = track(vec![on(0, 1, 60), off(1, 4, 60)], Duration::from(1));
        let b = track(vec![on(0, 1, 64), off(1, 2, 64)], Duration::new(3, 2));

        let mut sync = Synchronizer::new();
        sync.add_track(&a);
        sync.add_track(&b);
        let (events, duration) = collect(sync);

        assert_eq!(duration, Duration::new(3, 2));
        assert_eq!(events.len(), 4);
        // Instant 0: both tracks, track order, one paid delta
        assert_eq!(events[0].kind, EventKind::NoteOn { pitch: 60, velocity: 100 });
        assert!(events[0].delta.is_zero());
        assert_eq!(events[1].kind, EventKind::NoteOn { pitch: 64, velocity: 100 });
        assert!(events[1].delta.is_zero());
        // 1/4 contributed only by track 1
        assert_eq!(events[2].kind, EventKind::NoteOff { pitch: 60 });
        assert_eq!(events[2].delta, Duration::new(1, 4));
        // 1/2 contributed only by track 2
        assert_eq!(events[3].kind, EventKind::NoteOff { pitch: 64 });
        assert_eq!(events[3].delta, Duration::new(1, 4));
    }

    #[test]
    fn test_deterministic_tie_order() {
        let a = track(vec![on(1, 4, 60), off(1, 4, 60)], Duration::new(1, 2));
        let b = track(vec![on(1, 4, 64), off(1, 4, 64)], Duration::new(1, 2));

        let run = |first: &Track, second: &Track| {
            let mut sync = Synchronizer::new();
            sync.add_track(first);
            sync.add_track(second);
            let (events, _) = collect(sync);
            events
        };

        let ab = run(&a, &b);
        // Same-instant ties resolve by track order
        assert_eq!(ab[0].kind, EventKind::NoteOn { pitch: 60, velocity: 100 });
        assert_eq!(ab[1].kind, EventKind::NoteOn { pitch: 64, velocity: 100 });
        let ba = run(&b, &a);
        assert_eq!(ba[0].kind, EventKind::NoteOn { pitch: 64, velocity: 100 });
        assert_eq!(ba[1].kind, EventKind::NoteOn { pitch: 60, velocity: 100 });
        // Identical inputs in identical order: identical output
        assert_eq!(run(&a, &b), run(&a, &b));
    }

    #[test]
    fn test_filtered_cursor_keeps_time() {
        let mut builder = TrackBuilder::new();
        builder.add_event(on(0, 1, 60));
        builder.add_event(Event::new(
            Duration::new(1, 8),
            EventKind::ControlChange {
                controller: 7,
                value: 100,
            },
        ));
        builder.add_event(off(1, 8, 60));
        let t = builder.finish();

        let mut sync = Synchronizer::new();
        sync.add_track_filtered(&t, |e| {
            !matches!(e.kind, EventKind::ControlChange { .. })
        });
        let (events, _) = collect(sync);

        // The control change is skipped but its delta is not lost
        assert_eq!(events.len(), 2);
        assert!(events[0].delta.is_zero());
        assert_eq!(events[1].delta, Duration::new(1, 4));
    }

    #[test]
    fn test_exhausted_track_never_shrinks_step() {
        let a = track(vec![on(0, 1, 60), off(1, 8, 60)], Duration::new(1, 8));
        let b = track(vec![on(0, 1, 64), off(1, 1, 64)], Duration::from(1));

        let mut sync = Synchronizer::new();
        sync.add_track(&a);
        sync.add_track(&b);
        let (events, duration) = collect(sync);

        assert_eq!(duration, Duration::from(1));
        assert_eq!(events.len(), 4);
        // After track a is spent, track b takes a full 7/8 step
        assert_eq!(events[3].kind, EventKind::NoteOff { pitch: 64 });
        assert_eq!(events[3].delta, Duration::new(7, 8));
    }

    #[test]
    fn test_empty_synchronizer() {
        let sync = Synchronizer::new();
        let (events, duration) = collect(sync);
        assert!(events.is_empty());
        assert!(duration.is_zero());
    }
}
