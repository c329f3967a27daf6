// Database facade
//
// Owns the connection and composes the three handlers. Implements every
// repository port by delegation so callers can hold one Arc<Database>.

use crate::artist_repository::SqliteArtistRepository;
use crate::config::DatabaseConfig;
use crate::connection::{create_pool, Connection};
use crate::error::map_db_error;
use crate::event_repository::SqliteEventRepository;
use crate::location_repository::SqliteLocationRepository;
use crate::migration::{revert_migrations, run_migrations};
use artistdb_core::application::resolve_event_location;
use artistdb_core::domain::{
    Artist, ArtistFilter, Event, EventFilter, Location, LocationFilter,
};
use artistdb_core::error::Result;
use artistdb_core::port::{
    ArtistRepository, EventRepository, HealthCheck, LocationRepository, Metrics, NoopMetrics,
    SystemTimeProvider, TimeProvider,
};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

/// Metrics sink and clock handed to every handler
#[derive(Clone)]
pub struct Observability {
    pub metrics: Arc<dyn Metrics>,
    pub clock: Arc<dyn TimeProvider>,
}

impl Default for Observability {
    fn default() -> Self {
        Self {
            metrics: Arc::new(NoopMetrics),
            clock: Arc::new(SystemTimeProvider),
        }
    }
}

pub struct Database {
    conn: Arc<Connection>,
    artists: SqliteArtistRepository,
    locations: SqliteLocationRepository,
    events: SqliteEventRepository,
}

impl Database {
    /// Open the pool described by `config`. The schema is not touched.
    pub async fn connect(config: &DatabaseConfig, obs: Observability) -> Result<Self> {
        let pool = create_pool(config).await?;
        info!(url = %config.url, pool_size = config.pool_size(), "Database connected");
        Ok(Self::from_pool(pool, config, obs))
    }

    pub fn from_pool(pool: SqlitePool, config: &DatabaseConfig, obs: Observability) -> Self {
        let conn = Arc::new(Connection::new(pool, obs.metrics, config));

        Self {
            artists: SqliteArtistRepository::new(conn.clone(), obs.clock.clone()),
            locations: SqliteLocationRepository::new(conn.clone(), obs.clock.clone()),
            events: SqliteEventRepository::new(conn.clone(), obs.clock),
            conn,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        self.conn.pool()
    }

    pub fn artists(&self) -> &SqliteArtistRepository {
        &self.artists
    }

    pub fn locations(&self) -> &SqliteLocationRepository {
        &self.locations
    }

    pub fn events(&self) -> &SqliteEventRepository {
        &self.events
    }

    /// Apply pending migrations on the owned pool
    pub async fn create_tables(&self) -> Result<()> {
        run_migrations(self.conn.pool()).await
    }

    /// Revert all migrations on the owned pool
    pub async fn destroy_tables(&self) -> Result<()> {
        revert_migrations(self.conn.pool()).await
    }

    /// The location `event` refers to, if it still resolves
    pub async fn event_location(&self, event: &Event) -> Result<Option<Location>> {
        resolve_event_location(&self.locations, event).await
    }

    /// Close all connections. Safe to call more than once.
    pub async fn close(&self) {
        self.conn.close().await;
        info!("Database closed");
    }
}

#[async_trait]
impl HealthCheck for Database {
    async fn ready(&self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| map_db_error(e, "database.ready"))
    }
}

#[async_trait]
impl ArtistRepository for Database {
    async fn upsert_artists(&self, artists: &[Artist]) -> Result<()> {
        self.artists.upsert_artists(artists).await
    }

    async fn get_artists(&self, filter: &ArtistFilter) -> Result<Vec<Artist>> {
        self.artists.get_artists(filter).await
    }

    async fn delete_artist_by_id(&self, id: &str) -> Result<()> {
        self.artists.delete_artist_by_id(id).await
    }
}

#[async_trait]
impl LocationRepository for Database {
    async fn upsert_locations(&self, locations: &[Location]) -> Result<()> {
        self.locations.upsert_locations(locations).await
    }

    async fn get_locations(&self, filter: &LocationFilter) -> Result<Vec<Location>> {
        self.locations.get_locations(filter).await
    }

    async fn delete_location_by_id(&self, id: &str) -> Result<()> {
        self.locations.delete_location_by_id(id).await
    }
}

#[async_trait]
impl EventRepository for Database {
    async fn upsert_events(&self, events: &[Event]) -> Result<()> {
        self.events.upsert_events(events).await
    }

    async fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        self.events.get_events(filter).await
    }

    async fn delete_event_by_id(&self, id: &str) -> Result<()> {
        self.events.delete_event_by_id(id).await
    }
}
