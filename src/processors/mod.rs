// Processors module
// Thin stateless wrappers over the sequence engine: each takes one or more
// tracks plus a small configuration value and returns a new track.

pub mod merge;
pub mod quantize;
pub mod transpose;

pub use merge::merge;
pub use quantize::{quantize, sanitize};
pub use transpose::transpose;

use thiserror::Error;

use crate::sequence::Duration;

/// Processor-boundary errors
///
/// The engine itself never fails; malformed event ordering is repaired, not
/// reported. These cover misconfigured processor parameters only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error("quantize grid must be positive, got {0}")]
    InvalidGrid(Duration),

    #[error("transposing pitch {pitch} by {semitones} semitones leaves the MIDI range")]
    PitchOutOfRange { pitch: u8, semitones: i8 },
}

pub type ProcessResult<T> = Result<T, ProcessError>;
