// ValidTrackBuilder - Strict builder with guaranteed-closed groups
// Same repair algorithm as TrackBuilder, plus a declared track duration.
// At the declared end, unmatched starts are dropped (no time left for them
// to run) and every still-open group gets a synthesized end event.

use crate::sequence::builder::TrackBuilder;
use crate::sequence::duration::Duration;
use crate::sequence::event::{Event, EventKind, Role};
use crate::sequence::track::Track;

/// Builds a track whose output always satisfies the full set of track
/// invariants: single open instance per group, every group closed, no
/// zero-duration group, and time conservation.
#[derive(Debug)]
pub struct ValidTrackBuilder {
    inner: TrackBuilder,
    duration: Duration,
}

impl ValidTrackBuilder {
    /// Creates a builder for a track with the given declared duration.
    ///
    /// Panics if `duration` is negative.
    pub fn new(duration: Duration) -> Self {
        assert!(!duration.is_negative(), "Track duration must be >= 0");
        Self {
            inner: TrackBuilder::new(),
            duration,
        }
    }

    /// Offers the next event of the stream.
    pub fn add_event(&mut self, event: Event) {
        self.inner.add_event(event);
    }

    /// Flushes the final batch, closes any still-open groups, and returns
    /// the track.
    pub fn finish(mut self) -> Track {
        // The final batch sits at the end of the track exactly when the time
        // left to the declared end equals the deferred balance; only then are
        // unmatched starts suppressed.
        let remaining = self.duration - self.inner.track().total_event_duration();
        let at_end_of_track = remaining == self.inner.deferred();
        self.inner.flush_batch(at_end_of_track);
        self.end_active_groups();

        let declared = self.duration;
        let mut track = self.inner.into_track();
        // Never below the events it covers, otherwise the declared value
        let floor = track.total_event_duration();
        track.set_duration(floor);
        track.set_duration(declared);
        track
    }

    /// Synthesizes an end event for every group still open, placed at the
    /// declared end of the track.
    ///
    /// The matching start is found by scanning the emitted output; the first
    /// synthesized end consumes the remaining time to the end of the track,
    /// subsequent ones at that instant get zero. A group whose start sits
    /// exactly at the end of the track has no time to run at all; its start
    /// is removed instead of closed at zero length.
    fn end_active_groups(&mut self) {
        if self.inner.active().is_empty() {
            return;
        }

        // Last start per still-open group, with its index and elapsed
        // offset from the start of the track.
        let mut elapsed = Duration::zero();
        let mut starts: Vec<(usize, usize, EventKind, Duration)> = Vec::new();
        for (index, event) in self.inner.track().iter().enumerate() {
            elapsed += event.delta;
            let grouping = event.grouping();
            if grouping.role != Role::StartOfGroup {
                continue;
            }
            if let Some(slot) = self
                .inner
                .active()
                .iter()
                .position(|&key| key == grouping.key())
            {
                if let Some(entry) = starts.iter_mut().find(|(s, ..)| *s == slot) {
                    *entry = (slot, index, event.kind, elapsed);
                } else {
                    starts.push((slot, index, event.kind, elapsed));
                }
            }
        }

        // Suppress groups opened exactly at the end of the track, the same
        // way the final batch suppresses such starts. Removing the last
        // event can pull the end of the track back, so repeat until no
        // opened-at-the-end group is left.
        loop {
            let total = self.inner.track().total_event_duration();
            let end_of_track = Ord::max(self.duration, total);
            let Some(at) = starts
                .iter()
                .position(|&(_, _, _, opened_at)| opened_at == end_of_track)
            else {
                break;
            };
            let (_, index, kind, _) = starts.remove(at);
            log::debug!("removing start of group with no time to run: {:?}", kind);
            self.inner.track_mut().remove(index);
            for entry in &mut starts {
                if entry.1 > index {
                    entry.1 -= 1;
                }
            }
        }

        // Append in group-open order for determinism
        starts.sort_by_key(|&(slot, ..)| slot);

        let total = self.inner.track().total_event_duration();
        let mut remaining = self.duration - total;
        if remaining.is_negative() {
            remaining = Duration::zero();
        }
        let mut delta = remaining;
        for (_, _, start, opened_at) in starts {
            let group_elapsed = (total - opened_at) + remaining;
            if let Some(end) = start.create_end_event(group_elapsed) {
                log::debug!("synthesizing end for dangling group: {:?}", end);
                self.inner
                    .track_mut()
                    .append(Event::new(std::mem::take(&mut delta), end));
            }
        }
        self.inner.clear_active();
        self.inner.clear_deferred();
    }
}
