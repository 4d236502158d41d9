// GridCollapse - Timestamp re-snapping with structural cleanup
// Events are re-timed to externally computed target timestamps (snapped to a
// grid for quantization, identity for sanitization). Groups whose start and
// end land on the same target instant have collapsed to zero duration under
// the new grid and are removed whole; everything else is resolved with the
// same batch rules the builders use.

use crate::sequence::duration::Duration;
use crate::sequence::event::{Event, EventKind, GroupKey, Role};
use crate::sequence::track::Track;

/// Rebuilds a track from `(payload, absolute target timestamp)` pairs.
///
/// Target timestamps must be non-decreasing; snapping a non-decreasing
/// elapsed time to any grid keeps it that way. Only already-closed
/// zero-duration groups are ever removed, so a track that had every group
/// closed keeps every surviving group closed, and no time is lost.
#[derive(Debug)]
pub struct GridCollapse {
    events: Vec<Event>,
    active: Vec<GroupKey>,
    /// Payloads buffered at the current target instant.
    batch: Vec<EventKind>,
    /// Target instant the batch sits at.
    batch_time: Duration,
    /// Absolute time of the last emitted event.
    emitted_time: Duration,
}

impl GridCollapse {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            active: Vec::new(),
            batch: Vec::new(),
            batch_time: Duration::zero(),
            emitted_time: Duration::zero(),
        }
    }

    /// Offers the next payload with its target timestamp.
    ///
    /// Panics if `target_time` moves backward past the current batch; that is
    /// a caller bug, not malformed sequence data.
    pub fn push(&mut self, kind: EventKind, target_time: Duration) {
        assert!(
            target_time >= self.batch_time,
            "target timestamps must be non-decreasing"
        );
        if target_time > self.batch_time {
            self.resolve_batch();
            self.batch_time = target_time;
        }
        if kind.grouping().role == Role::NotInGroup {
            // One-shots bypass batching entirely
            self.emit(kind);
        } else {
            self.batch.push(kind);
        }
    }

    /// Resolves the final batch and returns the rebuilt track.
    ///
    /// The track duration is the declared duration, or the last emitted
    /// timestamp when snapping pushed an event past it.
    pub fn finish(mut self, duration: Duration) -> Track {
        self.resolve_batch();
        let mut track = Track::new();
        for event in self.events {
            track.append(event);
        }
        track.set_duration(self.emitted_time);
        track.set_duration(duration);
        track
    }

    fn resolve_batch(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.batch);
        let mut removed = vec![false; batch.len()];

        // Pass 1: a start and a later end of the same group at one instant
        // prove the group collapsed to zero duration under the new grid.
        // Scanning backward from the end stops at the first matching start,
        // so back-to-back repeats of the same group pair up correctly.
        for j in 0..batch.len() {
            if removed[j] || batch[j].grouping().role != Role::EndOfGroup {
                continue;
            }
            let key = batch[j].grouping().key();
            let mut between = Vec::new();
            let mut start = None;
            for i in (0..j).rev() {
                if removed[i] || batch[i].grouping().key() != key {
                    continue;
                }
                if batch[i].grouping().role == Role::StartOfGroup {
                    start = Some(i);
                    break;
                }
                between.push(i);
            }
            if let Some(i) = start {
                log::debug!("removing group collapsed to zero duration: {:?}", batch[i]);
                removed[i] = true;
                removed[j] = true;
                for k in between {
                    removed[k] = true;
                }
            }
        }

        // Pass 2: resolve the survivors with the builders' batch rules.
        for (i, kind) in batch.iter().enumerate() {
            if removed[i] {
                continue;
            }
            let grouping = kind.grouping();
            let key = grouping.key();
            match grouping.role {
                Role::StartOfGroup => {
                    if self.active.contains(&key) {
                        log::debug!("dropping duplicate start of open group: {:?}", kind);
                    } else {
                        self.active.push(key);
                        self.emit(*kind);
                    }
                }
                Role::EndOfGroup => {
                    if let Some(index) = self.active.iter().position(|&k| k == key) {
                        self.active.remove(index);
                        self.emit(*kind);
                    } else {
                        log::debug!("dropping end event with no open group: {:?}", kind);
                    }
                }
                Role::EnclosedInGroup => {
                    if self.active.contains(&key) {
                        self.emit(*kind);
                    } else {
                        log::debug!("dropping enclosed event outside a group: {:?}", kind);
                    }
                }
                Role::NotInGroup => self.emit(*kind),
            }
        }
    }

    /// Appends a payload at the current batch instant.
    fn emit(&mut self, kind: EventKind) {
        let delta = self.batch_time - self.emitted_time;
        self.emitted_time = self.batch_time;
        self.events.push(Event::new(delta, kind));
    }
}

impl Default for GridCollapse {
    fn default() -> Self {
        Self::new()
    }
}
