// TrackBuilder - Lenient online repair of malformed event arrival
// Events may arrive with duplicate starts, orphan ends, or zero-duration
// groups; the builder normalizes them into a consistent log without ever
// reporting an error. Time withheld from a dropped event is carried forward
// to the next emitted event, so total elapsed time is always conserved.

use std::mem;

use crate::sequence::duration::Duration;
use crate::sequence::event::{Event, EventKind, GroupKey, Role};
use crate::sequence::track::Track;

/// Builds a track from events arriving one at a time.
///
/// Guarantees on the output: at most one group open per `(category, value)`
/// at any time, and time conservation (emitted deltas plus the trailing gap
/// equal the elapsed time offered). Groups whose closing events were never
/// supplied are left open; use [`ValidTrackBuilder`](crate::ValidTrackBuilder)
/// when every group must be closed.
#[derive(Debug)]
pub struct TrackBuilder {
    track: Track,
    /// Open groups, in the order they were opened.
    active: Vec<GroupKey>,
    /// Events buffered at the current instant, awaiting same-instant siblings.
    /// Their deltas have already been folded into `deferred`.
    pending: Vec<EventKind>,
    /// Elapsed time not yet attached to an emitted event.
    deferred: Duration,
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self {
            track: Track::new(),
            active: Vec::new(),
            pending: Vec::new(),
            deferred: Duration::zero(),
        }
    }

    /// Offers the next event of the stream.
    ///
    /// A positive delta closes the current same-instant batch before the
    /// event itself is classified.
    pub fn add_event(&mut self, event: Event) {
        if event.delta.is_positive() {
            self.flush_batch(false);
            self.deferred += event.delta;
        }

        let grouping = event.kind.grouping();
        match grouping.role {
            Role::NotInGroup => self.emit(event.kind),
            // With an empty buffer an end or enclosed event cannot be part of
            // a same-instant race: it can only refer to a group opened at an
            // earlier instant, so it resolves right away.
            Role::EndOfGroup if self.pending.is_empty() => {
                if self.deactivate(grouping.key()) {
                    self.emit(event.kind);
                } else {
                    log::debug!("dropping end event with no open group: {:?}", event.kind);
                }
            }
            Role::EnclosedInGroup if self.pending.is_empty() => {
                if self.active.contains(&grouping.key()) {
                    self.emit(event.kind);
                } else {
                    log::debug!("dropping enclosed event outside a group: {:?}", event.kind);
                }
            }
            // A start (or any grouped event with siblings pending) must wait
            // for the batch: a later event at this same instant may pair with
            // it or remove it.
            _ => self.pending.push(event.kind),
        }
    }

    /// Flushes the final batch and returns the track.
    ///
    /// The track duration is the total elapsed time offered, including any
    /// trailing deferred balance.
    pub fn finish(mut self) -> Track {
        self.flush_batch(false);
        let total = self.track.total_event_duration() + self.deferred;
        self.track.set_duration(total);
        self.track
    }

    /// Resolves every event buffered at the current instant, in arrival
    /// order.
    ///
    /// With `at_end_of_track` set, unmatched starts are dropped instead of
    /// opened: there is no time left for the group to run.
    pub(crate) fn flush_batch(&mut self, at_end_of_track: bool) {
        if self.pending.is_empty() {
            return;
        }
        let batch = mem::take(&mut self.pending);
        let mut removed = vec![false; batch.len()];

        for i in 0..batch.len() {
            if removed[i] {
                continue;
            }
            let grouping = batch[i].grouping();
            let key = grouping.key();
            match grouping.role {
                Role::StartOfGroup => {
                    // Scan the rest of the batch from the end backward for a
                    // matching end.
                    let matching_end = (i + 1..batch.len())
                        .rev()
                        .filter(|&j| !removed[j])
                        .find(|&j| {
                            let g = batch[j].grouping();
                            g.role == Role::EndOfGroup && g.key() == key
                        });

                    if let Some(j) = matching_end {
                        // Events between the pair with the same key cannot be
                        // attributed to either instance at zero duration.
                        for k in i + 1..j {
                            if !removed[k] && batch[k].grouping().key() == key {
                                removed[k] = true;
                            }
                        }
                        removed[j] = true;
                        if self.active.contains(&key) {
                            // End-before-start race at one instant: close the
                            // previously open instance before reopening.
                            self.emit(batch[j]);
                            self.emit(batch[i]);
                        } else {
                            log::debug!("dropping zero-duration group: {:?}", batch[i]);
                        }
                    } else if self.active.contains(&key) {
                        log::debug!("dropping duplicate start of open group: {:?}", batch[i]);
                    } else if at_end_of_track {
                        log::debug!("dropping start at end of track: {:?}", batch[i]);
                    } else {
                        self.active.push(key);
                        self.emit(batch[i]);
                    }
                }
                Role::EndOfGroup => {
                    if self.deactivate(key) {
                        self.emit(batch[i]);
                    } else {
                        log::debug!("dropping end event with no open group: {:?}", batch[i]);
                    }
                }
                Role::EnclosedInGroup => {
                    if self.active.contains(&key) {
                        self.emit(batch[i]);
                    } else {
                        log::debug!("dropping enclosed event outside a group: {:?}", batch[i]);
                    }
                }
                Role::NotInGroup => self.emit(batch[i]),
            }
        }
    }

    /// Appends a payload, paying out the deferred balance as its delta.
    fn emit(&mut self, kind: EventKind) {
        let delta = mem::take(&mut self.deferred);
        self.track.append(Event::new(delta, kind));
    }

    fn deactivate(&mut self, key: GroupKey) -> bool {
        if let Some(index) = self.active.iter().position(|&k| k == key) {
            self.active.remove(index);
            true
        } else {
            false
        }
    }

    pub(crate) fn track(&self) -> &Track {
        &self.track
    }

    pub(crate) fn track_mut(&mut self) -> &mut Track {
        &mut self.track
    }

    /// Hands over the track as-is, without the final flush `finish` does.
    pub(crate) fn into_track(self) -> Track {
        self.track
    }

    pub(crate) fn active(&self) -> &[GroupKey] {
        &self.active
    }

    pub(crate) fn clear_active(&mut self) {
        self.active.clear();
    }

    pub(crate) fn deferred(&self) -> Duration {
        self.deferred
    }

    pub(crate) fn clear_deferred(&mut self) {
        self.deferred = Duration::zero();
    }
}

impl Default for TrackBuilder {
    fn default() -> Self {
        Self::new()
    }
}
