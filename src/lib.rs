// midistream - In-memory MIDI sequence engine
// Models a sequence as a delta-timed log of typed events and provides the
// repair, merge, and re-snapping algorithms that keep such logs well-formed.

pub mod processors;
pub mod sequence;

// Re-export commonly used types for convenience
pub use processors::{ProcessError, ProcessResult, merge, quantize, sanitize, transpose};
pub use sequence::{
    Category, Duration, Event, EventKind, GridCollapse, GroupKey, GroupingInfo, Role,
    Synchronizer, Track, TrackBuilder, ValidTrackBuilder,
};
