// Repository Ports (Interfaces)
//
// Shared contract of all three:
// - upsert: one transaction per call, per-row failures aggregated into
//   AppError::AggregatedWrite, rows that succeeded stay committed
// - get: only rows that are not soft-deleted, AppError::NotFound on zero rows
// - delete: soft delete, AppError::InvalidIdentifier / AppError::NotFound

use crate::domain::{Artist, ArtistFilter, Event, EventFilter, Location, LocationFilter};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence of artists
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Insert or update artists by ID in a single transaction
    async fn upsert_artists(&self, artists: &[Artist]) -> Result<()>;

    /// Retrieve live artists matching the filter
    async fn get_artists(&self, filter: &ArtistFilter) -> Result<Vec<Artist>>;

    /// Soft delete an artist
    async fn delete_artist_by_id(&self, id: &str) -> Result<()>;
}

/// Persistence of locations
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn upsert_locations(&self, locations: &[Location]) -> Result<()>;

    async fn get_locations(&self, filter: &LocationFilter) -> Result<Vec<Location>>;

    async fn delete_location_by_id(&self, id: &str) -> Result<()>;
}

/// Persistence of events and their invited artists
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert or update events; each event is written together with its
    /// invited artists or not at all
    async fn upsert_events(&self, events: &[Event]) -> Result<()>;

    async fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>>;

    async fn delete_event_by_id(&self, id: &str) -> Result<()>;
}

/// Readiness of the backing store
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ready(&self) -> Result<()>;
}
