// Sequence module
// Event/track data model, the lenient and strict track builders, the
// multi-track synchronizer, and the grid-collapse algorithm.

pub mod builder;
pub mod collapse;
pub mod duration;
pub mod event;
pub mod synchronizer;
pub mod track;
pub mod valid_builder;

pub use builder::TrackBuilder;
pub use collapse::GridCollapse;
pub use duration::Duration;
pub use event::{Category, Event, EventKind, GroupKey, GroupingInfo, Role};
pub use synchronizer::Synchronizer;
pub use track::Track;
pub use valid_builder::ValidTrackBuilder;
