// Merge processor
// Interleaves several tracks into one. The synchronizer produces the
// combined timeline; the strict builder normalizes collisions where the
// same group is open on more than one input at once.

use crate::sequence::{Synchronizer, Track, ValidTrackBuilder};

/// Merges `tracks` into one synchronized track.
///
/// The output duration is the maximum of the input durations; events landing
/// on the same instant keep the order of `tracks`. Merging no tracks yields
/// the empty track.
pub fn merge(tracks: &[&Track]) -> Track {
    let mut sync = Synchronizer::new();
    for track in tracks {
        sync.add_track(track);
    }
    let mut builder = ValidTrackBuilder::new(sync.composite_duration());
    sync.run(|event| builder.add_event(event));
    builder.finish()
}
