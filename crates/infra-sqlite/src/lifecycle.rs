// Soft delete and lifecycle metadata shared by all entity tables

use crate::connection::Connection;
use crate::error::map_db_error;
use artistdb_core::domain::{validate_id, RecordMeta, Visibility};
use artistdb_core::error::{AppError, Result};
use artistdb_core::port::TimeProvider;
use chrono::{DateTime, Utc};

/// Predicate selecting rows that have not been soft-deleted
pub(crate) const ALIVE: &str = "deleted_at IS NULL";

pub(crate) const DELETE: &str = "delete";
pub(crate) const GET: &str = "get";
pub(crate) const META: &str = "meta";

pub(crate) mod table {
    pub const ARTISTS: &str = "artists";
    pub const LOCATIONS: &str = "locations";
    pub const EVENTS: &str = "events";
    pub const INVITED_ARTISTS: &str = "invited_artists";
}

#[derive(Debug, sqlx::FromRow)]
struct MetaRow {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Mark the row `id` of `table` as deleted.
///
/// Deleting an already deleted row succeeds and moves its stamps forward.
pub(crate) async fn soft_delete(
    conn: &Connection,
    clock: &dyn TimeProvider,
    table: &'static str,
    entity: &'static str,
    id: &str,
) -> Result<()> {
    let metrics = conn.metrics();
    let context = format!("{}.{}", entity, DELETE);

    let id = validate_id(id).map_err(|e| {
        metrics.track_object_error(entity, DELETE);
        e
    })?;

    let now = clock.now();
    let sql = format!(
        "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? RETURNING id",
        table
    );

    let deleted: Option<(String,)> = conn
        .query_row(sqlx::query_as(&sql).bind(now).bind(now).bind(&id))
        .await
        .map_err(|e| {
            metrics.track_object_error(entity, DELETE);
            map_db_error(e, &context)
        })?;

    match deleted {
        Some(_) => {
            metrics.track_objects_changed(entity, DELETE, 1);
            tracing::debug!(entity, id = %id, "Soft deleted");
            Ok(())
        }
        None => {
            metrics.track_object_error(entity, DELETE);
            Err(AppError::NotFound(format!("{} {}", entity, id)))
        }
    }
}

/// Lifecycle metadata of `id`, soft-deleted rows included.
pub(crate) async fn fetch_meta(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: &str,
) -> Result<RecordMeta> {
    let id = validate_id(id)?;

    let sql = format!(
        "SELECT created_at, updated_at, deleted_at FROM {} WHERE id = ?",
        table
    );

    let row: Option<MetaRow> = conn
        .query_row(sqlx::query_as(&sql).bind(&id))
        .await
        .map_err(|e| map_db_error(e, &format!("{}.{}", entity, META)))?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("{} {}", entity, id)))?;

    Ok(RecordMeta {
        created_at: row.created_at,
        updated_at: row.updated_at,
        visibility: Visibility::from_deleted_at(row.deleted_at),
    })
}

/// Turn the rows of a filtered read into the read result.
///
/// Zero rows is [`AppError::NotFound`]; `what` describes the filter.
pub(crate) fn found<T>(
    conn: &Connection,
    entity: &'static str,
    rows: Vec<T>,
    what: impl FnOnce() -> String,
) -> Result<Vec<T>> {
    if rows.is_empty() {
        conn.metrics().track_object_error(entity, GET);
        return Err(AppError::NotFound(format!("{} {}", entity, what())));
    }

    conn.metrics().track_objects_retrieved(entity, rows.len());
    Ok(rows)
}
