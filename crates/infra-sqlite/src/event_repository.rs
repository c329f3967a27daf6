// SQLite EventRepository Implementation
//
// An event row and its invited artist rows are written in the same savepoint,
// so an event is stored with all of its invitations or not at all.

use crate::batch::{upsert_all, RowWriter};
use crate::connection::Connection;
use crate::error::{map_db_error, DbError};
use crate::lifecycle::{fetch_meta, found, soft_delete, table, ALIVE, GET};
use crate::transaction::Tx;
use artistdb_core::domain::{
    entity, validate_id, Event, EventFilter, InvitedArtist, RecordMeta,
};
use artistdb_core::error::Result;
use artistdb_core::port::{EventRepository, TimeProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::instrument;

const UPSERT_EVENT: &str = r#"
    INSERT INTO events (id, name, start_time, location_id, created_at, updated_at, deleted_at)
    VALUES (?, ?, ?, ?, ?, ?, NULL)
    ON CONFLICT (id) DO UPDATE SET
        name = excluded.name,
        start_time = excluded.start_time,
        location_id = excluded.location_id,
        updated_at = excluded.updated_at,
        deleted_at = NULL
"#;

const UPSERT_INVITATION: &str = r#"
    INSERT INTO invited_artists (artist_id, event_id, confirmed, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT (artist_id, event_id) DO UPDATE SET
        confirmed = excluded.confirmed
"#;

// rowid keeps invitation order stable
const SELECT_INVITATIONS: &str =
    "SELECT artist_id, confirmed FROM invited_artists WHERE event_id = ? ORDER BY rowid";

/// Event handler
pub struct SqliteEventRepository {
    conn: Arc<Connection>,
    clock: Arc<dyn TimeProvider>,
}

impl SqliteEventRepository {
    pub fn new(conn: Arc<Connection>, clock: Arc<dyn TimeProvider>) -> Self {
        Self { conn, clock }
    }

    pub async fn meta(&self, id: &str) -> Result<RecordMeta> {
        fetch_meta(&self.conn, table::EVENTS, entity::EVENT, id).await
    }

    async fn invited_artists(&self, event_id: &str) -> Result<Vec<InvitedArtist>> {
        let rows: Vec<InvitationRow> = self
            .conn
            .query(sqlx::query_as(SELECT_INVITATIONS).bind(event_id))
            .await
            .map_err(|e| map_db_error(e, "event.get invited artists"))?;

        Ok(rows
            .into_iter()
            .map(|row| InvitedArtist::new(row.artist_id, row.confirmed))
            .collect())
    }
}

#[async_trait]
impl RowWriter<Event> for SqliteEventRepository {
    const ENTITY: &'static str = entity::EVENT;

    fn id_of(event: &Event) -> &str {
        &event.id
    }

    fn prepare(event: &Event) -> Result<Event> {
        event.normalized()
    }

    async fn write_row(
        &self,
        tx: &mut Tx<'_>,
        event: &Event,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), DbError> {
        tx.exec(
            sqlx::query(UPSERT_EVENT)
                .bind(&event.id)
                .bind(&event.name)
                .bind(event.start_time)
                .bind(&event.location_id)
                .bind(now)
                .bind(now),
        )
        .await?;

        for invited in &event.invited_artists {
            tx.exec(
                sqlx::query(UPSERT_INVITATION)
                    .bind(&invited.id)
                    .bind(&event.id)
                    .bind(invited.confirmed)
                    .bind(now)
                    .bind(now),
            )
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    #[instrument(skip_all, fields(otel.name = "event.upsert", count = events.len()))]
    async fn upsert_events(&self, events: &[Event]) -> Result<()> {
        upsert_all(&self.conn, self, self.clock.as_ref(), events).await
    }

    #[instrument(skip_all, fields(otel.name = "event.get", by = filter.kind()))]
    async fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let (column, value) = match filter {
            EventFilter::Id(id) => ("id", validate_id(id)?),
            EventFilter::Name(name) => ("name", name.clone()),
        };

        let sql = format!(
            "SELECT id, name, start_time, location_id FROM events WHERE {} AND {} = ?",
            ALIVE, column
        );
        let rows: Vec<EventRow> = self
            .conn
            .query(sqlx::query_as(&sql).bind(value))
            .await
            .map_err(|e| {
                self.conn.metrics().track_object_error(entity::EVENT, GET);
                map_db_error(e, "event.get")
            })?;

        let rows = found(&self.conn, entity::EVENT, rows, || {
            format!("{} {:?}", filter.kind(), filter.value())
        })?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let invited_artists = self.invited_artists(&row.id).await.map_err(|e| {
                self.conn.metrics().track_object_error(entity::EVENT, GET);
                e
            })?;

            events.push(Event {
                id: row.id,
                name: row.name,
                start_time: row.start_time,
                location_id: row.location_id,
                invited_artists,
            });
        }

        Ok(events)
    }

    #[instrument(skip_all, fields(otel.name = "event.delete", id = %id))]
    async fn delete_event_by_id(&self, id: &str) -> Result<()> {
        soft_delete(
            &self.conn,
            self.clock.as_ref(),
            table::EVENTS,
            entity::EVENT,
            id,
        )
        .await
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: String,
    name: String,
    start_time: Option<DateTime<Utc>>,
    location_id: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct InvitationRow {
    artist_id: String,
    confirmed: bool,
}
