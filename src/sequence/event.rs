// Sequence events
// A delta-timed event with a tagged-union payload. Grouping information
// (which note/chord instance an event opens, extends, or closes) is derived
// from the payload, never stored.

use crate::sequence::duration::Duration;

/// Event payload kinds.
///
/// Sustained kinds come in open/close pairs (`NoteOn`/`NoteOff`,
/// `ChordOn`/`ChordOff`); `PolyAftertouch` rides inside an open note;
/// percussion hits and control changes are one-shots with no extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EventKind {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    PolyAftertouch { pitch: u8, pressure: u8 },
    ChordOn { root: u8, velocity: u8 },
    ChordOff { root: u8 },
    PercussionHit { instrument: u8, velocity: u8 },
    ControlChange { controller: u8, value: u8 },
}

/// Event kind families for grouping purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Category {
    Note,
    Chord,
    Percussion,
    Control,
}

/// Position of an event within its group's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    NotInGroup,
    StartOfGroup,
    EnclosedInGroup,
    EndOfGroup,
}

/// Identity of a group instance: two events belong to the same group iff
/// their keys are equal. The role never participates in group identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub category: Category,
    pub value: u8,
}

/// Grouping classification of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingInfo {
    pub category: Category,
    pub value: u8,
    pub role: Role,
}

impl GroupingInfo {
    /// The group identity, independent of the role.
    pub fn key(&self) -> GroupKey {
        GroupKey {
            category: self.category,
            value: self.value,
        }
    }

    /// Whether this event participates in grouping invariants at all.
    pub fn is_grouped(&self) -> bool {
        self.role != Role::NotInGroup
    }
}

impl EventKind {
    /// Grouping classification of this payload.
    pub fn grouping(&self) -> GroupingInfo {
        let (category, value, role) = match *self {
            Self::NoteOn { pitch, .. } => (Category::Note, pitch, Role::StartOfGroup),
            Self::NoteOff { pitch } => (Category::Note, pitch, Role::EndOfGroup),
            Self::PolyAftertouch { pitch, .. } => (Category::Note, pitch, Role::EnclosedInGroup),
            Self::ChordOn { root, .. } => (Category::Chord, root, Role::StartOfGroup),
            Self::ChordOff { root } => (Category::Chord, root, Role::EndOfGroup),
            Self::PercussionHit { instrument, .. } => {
                (Category::Percussion, instrument, Role::NotInGroup)
            }
            Self::ControlChange { controller, .. } => {
                (Category::Control, controller, Role::NotInGroup)
            }
        };
        GroupingInfo {
            category,
            value,
            role,
        }
    }

    /// Creates the matching end-of-group payload for a start-of-group kind.
    ///
    /// Returns `None` for kinds that cannot open a group. `elapsed_since_start`
    /// is the time the group has been running when the end is synthesized;
    /// current payloads do not depend on it, but the contract passes it so
    /// kinds with release behavior can.
    pub fn create_end_event(&self, _elapsed_since_start: Duration) -> Option<Self> {
        match *self {
            Self::NoteOn { pitch, .. } => Some(Self::NoteOff { pitch }),
            Self::ChordOn { root, .. } => Some(Self::ChordOff { root }),
            _ => None,
        }
    }
}

/// A single event in a sequence.
///
/// `delta` is the time since the previous event in the same stream, never
/// negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Event {
    pub delta: Duration,
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event.
    ///
    /// Panics if `delta` is negative; a negative delta is a caller bug, not
    /// malformed sequence data.
    pub fn new(delta: Duration, kind: EventKind) -> Self {
        assert!(!delta.is_negative(), "Event delta must be >= 0");
        Self { delta, kind }
    }

    /// Grouping classification, derived from the payload.
    pub fn grouping(&self) -> GroupingInfo {
        self.kind.grouping()
    }
}
