// SQLite LocationRepository Implementation

use crate::batch::{upsert_all, RowWriter};
use crate::connection::Connection;
use crate::error::{map_db_error, DbError};
use crate::lifecycle::{fetch_meta, found, soft_delete, table, ALIVE, GET};
use crate::transaction::Tx;
use artistdb_core::domain::{entity, validate_id, Location, LocationFilter, RecordMeta};
use artistdb_core::error::Result;
use artistdb_core::port::{LocationRepository, TimeProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::instrument;

const UPSERT_LOCATION: &str = r#"
    INSERT INTO locations (id, name, created_at, updated_at, deleted_at)
    VALUES (?, ?, ?, ?, NULL)
    ON CONFLICT (id) DO UPDATE SET
        name = excluded.name,
        updated_at = excluded.updated_at,
        deleted_at = NULL
"#;

/// Location handler
pub struct SqliteLocationRepository {
    conn: Arc<Connection>,
    clock: Arc<dyn TimeProvider>,
}

impl SqliteLocationRepository {
    pub fn new(conn: Arc<Connection>, clock: Arc<dyn TimeProvider>) -> Self {
        Self { conn, clock }
    }

    pub async fn meta(&self, id: &str) -> Result<RecordMeta> {
        fetch_meta(&self.conn, table::LOCATIONS, entity::LOCATION, id).await
    }
}

#[async_trait]
impl RowWriter<Location> for SqliteLocationRepository {
    const ENTITY: &'static str = entity::LOCATION;

    fn id_of(location: &Location) -> &str {
        &location.id
    }

    fn prepare(location: &Location) -> Result<Location> {
        location.normalized()
    }

    async fn write_row(
        &self,
        tx: &mut Tx<'_>,
        location: &Location,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), DbError> {
        tx.exec(
            sqlx::query(UPSERT_LOCATION)
                .bind(&location.id)
                .bind(&location.name)
                .bind(now)
                .bind(now),
        )
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LocationRepository for SqliteLocationRepository {
    #[instrument(skip_all, fields(otel.name = "location.upsert", count = locations.len()))]
    async fn upsert_locations(&self, locations: &[Location]) -> Result<()> {
        upsert_all(&self.conn, self, self.clock.as_ref(), locations).await
    }

    #[instrument(skip_all, fields(otel.name = "location.get", by = filter.kind()))]
    async fn get_locations(&self, filter: &LocationFilter) -> Result<Vec<Location>> {
        let (column, value) = match filter {
            LocationFilter::Id(id) => ("id", validate_id(id)?),
            LocationFilter::Name(name) => ("name", name.clone()),
        };

        let sql = format!(
            "SELECT id, name FROM locations WHERE {} AND {} = ?",
            ALIVE, column
        );
        let rows: Vec<LocationRow> = self
            .conn
            .query(sqlx::query_as(&sql).bind(value))
            .await
            .map_err(|e| {
                self.conn.metrics().track_object_error(entity::LOCATION, GET);
                map_db_error(e, "location.get")
            })?;

        let rows = found(&self.conn, entity::LOCATION, rows, || {
            format!("{} {:?}", filter.kind(), filter.value())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| Location {
                id: row.id,
                name: row.name,
            })
            .collect())
    }

    #[instrument(skip_all, fields(otel.name = "location.delete", id = %id))]
    async fn delete_location_by_id(&self, id: &str) -> Result<()> {
        soft_delete(
            &self.conn,
            self.clock.as_ref(),
            table::LOCATIONS,
            entity::LOCATION,
            id,
        )
        .await
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: String,
    name: String,
}
