// Domain Layer - Entities, identifiers and lookup filters

pub mod artist;
pub mod event;
pub mod id;
pub mod lifecycle;
pub mod location;

// Re-exports
pub use artist::{Artist, ArtistFilter, Origin, Socials};
pub use event::{Event, EventFilter, InvitedArtist, NewEvent};
pub use id::{new_id, validate_id, EntityId};
pub use lifecycle::{RecordMeta, Visibility};
pub use location::{Location, LocationFilter};

/// Entity names used for metrics, spans and error context
pub mod entity {
    pub const ARTIST: &str = "artist";
    pub const LOCATION: &str = "location";
    pub const EVENT: &str = "event";
}
