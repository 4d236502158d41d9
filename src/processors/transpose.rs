// Transpose processor
// Shifts every pitched payload by a number of semitones. Percussion and
// control payloads are untouched; their values are instrument and controller
// numbers, not pitches.

use crate::processors::{ProcessError, ProcessResult};
use crate::sequence::{Event, EventKind, Track, TrackBuilder};

/// Returns a copy of `track` with every note and chord shifted by
/// `semitones`. Timing and grouping structure are unchanged.
///
/// Fails with [`ProcessError::PitchOutOfRange`] if any shifted pitch leaves
/// the MIDI range 0-127; the input track is never modified.
pub fn transpose(track: &Track, semitones: i8) -> ProcessResult<Track> {
    let mut builder = TrackBuilder::new();
    for event in track {
        let kind = match event.kind {
            EventKind::NoteOn { pitch, velocity } => EventKind::NoteOn {
                pitch: shift(pitch, semitones)?,
                velocity,
            },
            EventKind::NoteOff { pitch } => EventKind::NoteOff {
                pitch: shift(pitch, semitones)?,
            },
            EventKind::PolyAftertouch { pitch, pressure } => EventKind::PolyAftertouch {
                pitch: shift(pitch, semitones)?,
                pressure,
            },
            EventKind::ChordOn { root, velocity } => EventKind::ChordOn {
                root: shift(root, semitones)?,
                velocity,
            },
            EventKind::ChordOff { root } => EventKind::ChordOff {
                root: shift(root, semitones)?,
            },
            other @ (EventKind::PercussionHit { .. } | EventKind::ControlChange { .. }) => other,
        };
        builder.add_event(Event::new(event.delta, kind));
    }
    let mut out = builder.finish();
    out.set_duration(track.duration());
    Ok(out)
}

fn shift(pitch: u8, semitones: i8) -> ProcessResult<u8> {
    let shifted = i16::from(pitch) + i16::from(semitones);
    u8::try_from(shifted)
        .ok()
        .filter(|p| *p <= 127)
        .ok_or(ProcessError::PitchOutOfRange { pitch, semitones })
}
