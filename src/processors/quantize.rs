// Quantize / sanitize processors
// Both drive the grid-collapse algorithm; they differ only in the target
// timestamp computed per event.

use crate::processors::{ProcessError, ProcessResult};
use crate::sequence::{Duration, GridCollapse, Track};

/// Snaps every event of `track` to the nearest multiple of `grid`.
///
/// Groups that collapse to zero duration under the new grid are removed
/// whole. The output duration is the input duration snapped to the same
/// grid (never less than the last snapped event).
pub fn quantize(track: &Track, grid: Duration) -> ProcessResult<Track> {
    if !grid.is_positive() {
        return Err(ProcessError::InvalidGrid(grid));
    }
    let mut collapse = GridCollapse::new();
    let mut elapsed = Duration::zero();
    for event in track {
        elapsed += event.delta;
        collapse.push(event.kind, elapsed.snap_to(grid));
    }
    Ok(collapse.finish(track.duration().snap_to(grid)))
}

/// Rebuilds `track` on its own timestamps, removing zero-duration groups,
/// orphan ends, and duplicate starts. The duration is unchanged.
pub fn sanitize(track: &Track) -> Track {
    let mut collapse = GridCollapse::new();
    let mut elapsed = Duration::zero();
    for event in track {
        elapsed += event.delta;
        collapse.push(event.kind, elapsed);
    }
    collapse.finish(track.duration())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{Event, EventKind, TrackBuilder};

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

    fn build(events: Vec<Event>) -> Track {
        let mut builder = TrackBuilder::new();
        for event in events {
            builder.add_event(event);
        }
        builder.finish()
    }

    #[test]
    fn test_quantize_snaps_to_grid() {
        // Note slightly off the eighth-note grid on both sides
        let track = build(vec![on(1, 32, 60), off(7, 32, 60)]);
        let quantized = quantize(&track, Duration::new(1, 8)).unwrap();

        assert_eq!(quantized.len(), 2);
        // 1/32 snaps down to 0; the off lands exactly on 1/4
        assert!(quantized.events()[0].delta.is_zero());
        assert_eq!(quantized.events()[1].delta, Duration::new(1, 4));
        assert_eq!(quantized.duration(), Duration::new(1, 4));
    }

    #[test]
    fn test_quantize_removes_collapsed_note() {
        // A 1/32 note under a quarter grid collapses to nothing
        let track = build(vec![
            on(0, 1, 60),
            off(1, 4, 60),
            on(1, 16, 62),
            off(1, 32, 62),
            on(1, 8, 64),
            off(1, 4, 64),
        ]);
        let quantized = quantize(&track, Duration::new(1, 4)).unwrap();

        let pitches: Vec<u8> = quantized
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::NoteOn { pitch, .. } => Some(pitch),
                _ => None,
            })
            .collect();
        assert_eq!(pitches, vec![60, 64]);
        assert_eq!(
            quantized.total_event_duration(),
            quantized.duration()
        );
    }

    #[test]
    fn test_quantize_rejects_bad_grid() {
        let track = build(vec![on(0, 1, 60), off(1, 4, 60)]);
        assert_eq!(
            quantize(&track, Duration::zero()),
            Err(ProcessError::InvalidGrid(Duration::zero()))
        );
        assert!(matches!(
            quantize(&track, Duration::new(-1, 4)),
            Err(ProcessError::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_quantize_on_grid_is_identity() {
        let track = build(vec![on(0, 1, 60), off(1, 4, 60), on(0, 1, 64), off(1, 4, 64)]);
        let quantized = quantize(&track, Duration::new(1, 4)).unwrap();
        assert_eq!(quantized, track);
    }

    #[test]
    fn test_sanitize_keeps_valid_track() {
        let track = build(vec![on(0, 1, 60), off(1, 4, 60)]);
        assert_eq!(sanitize(&track), track);
    }
}
