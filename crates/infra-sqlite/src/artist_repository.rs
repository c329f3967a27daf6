// SQLite ArtistRepository Implementation

use crate::batch::{upsert_all, RowWriter};
use crate::connection::Connection;
use crate::error::{map_db_error, DbError};
use crate::lifecycle::{fetch_meta, found, soft_delete, table, ALIVE, GET};
use crate::transaction::Tx;
use artistdb_core::domain::artist::{unwrap_pronouns, wrap_pronouns};
use artistdb_core::domain::{entity, validate_id, Artist, ArtistFilter, Origin, RecordMeta, Socials};
use artistdb_core::error::Result;
use artistdb_core::port::{ArtistRepository, TimeProvider};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::instrument;

const UPSERT_ARTIST: &str = r#"
    INSERT INTO artists (
        id, first_name, last_name, artist_name, pronouns,
        date_of_birth, place_of_birth, nationality, language,
        facebook, instagram, bandcamp,
        bio_ger, bio_en, email,
        created_at, updated_at, deleted_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
    ON CONFLICT (id) DO UPDATE SET
        first_name = excluded.first_name,
        last_name = excluded.last_name,
        artist_name = excluded.artist_name,
        pronouns = excluded.pronouns,
        date_of_birth = excluded.date_of_birth,
        place_of_birth = excluded.place_of_birth,
        nationality = excluded.nationality,
        language = excluded.language,
        facebook = excluded.facebook,
        instagram = excluded.instagram,
        bandcamp = excluded.bandcamp,
        bio_ger = excluded.bio_ger,
        bio_en = excluded.bio_en,
        email = excluded.email,
        updated_at = excluded.updated_at,
        deleted_at = NULL
"#;

const SELECT_ARTISTS: &str = r#"
    SELECT
        id, first_name, last_name, artist_name, pronouns,
        date_of_birth, place_of_birth, nationality, language,
        facebook, instagram, bandcamp,
        bio_ger, bio_en, email
    FROM artists
"#;

/// Artist handler
pub struct SqliteArtistRepository {
    conn: Arc<Connection>,
    clock: Arc<dyn TimeProvider>,
}

impl SqliteArtistRepository {
    pub fn new(conn: Arc<Connection>, clock: Arc<dyn TimeProvider>) -> Self {
        Self { conn, clock }
    }

    /// Lifecycle metadata, including soft-deleted artists
    pub async fn meta(&self, id: &str) -> Result<RecordMeta> {
        fetch_meta(&self.conn, table::ARTISTS, entity::ARTIST, id).await
    }
}

#[async_trait]
impl RowWriter<Artist> for SqliteArtistRepository {
    const ENTITY: &'static str = entity::ARTIST;

    fn id_of(artist: &Artist) -> &str {
        &artist.id
    }

    fn prepare(artist: &Artist) -> Result<Artist> {
        artist.normalized()
    }

    async fn write_row(
        &self,
        tx: &mut Tx<'_>,
        artist: &Artist,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), DbError> {
        tx.exec(
            sqlx::query(UPSERT_ARTIST)
                .bind(&artist.id)
                .bind(&artist.first_name)
                .bind(&artist.last_name)
                .bind(&artist.artist_name)
                .bind(wrap_pronouns(&artist.pronouns))
                .bind(artist.origin.date_of_birth)
                .bind(&artist.origin.place_of_birth)
                .bind(&artist.origin.nationality)
                .bind(&artist.language)
                .bind(&artist.socials.facebook)
                .bind(&artist.socials.instagram)
                .bind(&artist.socials.bandcamp)
                .bind(&artist.bio_german)
                .bind(&artist.bio_english)
                .bind(&artist.email)
                .bind(now)
                .bind(now),
        )
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ArtistRepository for SqliteArtistRepository {
    #[instrument(skip_all, fields(otel.name = "artist.upsert", count = artists.len()))]
    async fn upsert_artists(&self, artists: &[Artist]) -> Result<()> {
        upsert_all(&self.conn, self, self.clock.as_ref(), artists).await
    }

    #[instrument(skip_all, fields(otel.name = "artist.get", by = filter.kind()))]
    async fn get_artists(&self, filter: &ArtistFilter) -> Result<Vec<Artist>> {
        let (column, value) = match filter {
            ArtistFilter::Id(id) => ("id", validate_id(id)?),
            ArtistFilter::LastName(name) => ("last_name", name.clone()),
            ArtistFilter::ArtistName(name) => ("artist_name", name.clone()),
        };

        let sql = format!("{} WHERE {} AND {} = ?", SELECT_ARTISTS, ALIVE, column);
        let rows: Vec<ArtistRow> = self
            .conn
            .query(sqlx::query_as(&sql).bind(value))
            .await
            .map_err(|e| {
                self.conn.metrics().track_object_error(entity::ARTIST, GET);
                map_db_error(e, "artist.get")
            })?;

        let rows = found(&self.conn, entity::ARTIST, rows, || {
            format!("{} {:?}", filter.kind(), filter.value())
        })?;

        Ok(rows.into_iter().map(ArtistRow::into_artist).collect())
    }

    #[instrument(skip_all, fields(otel.name = "artist.delete", id = %id))]
    async fn delete_artist_by_id(&self, id: &str) -> Result<()> {
        soft_delete(
            &self.conn,
            self.clock.as_ref(),
            table::ARTISTS,
            entity::ARTIST,
            id,
        )
        .await
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ArtistRow {
    id: String,
    first_name: String,
    last_name: String,
    artist_name: String,
    pronouns: String,
    date_of_birth: Option<NaiveDate>,
    place_of_birth: String,
    nationality: String,
    language: String,
    facebook: String,
    instagram: String,
    bandcamp: String,
    bio_ger: String,
    bio_en: String,
    email: String,
}

impl ArtistRow {
    fn into_artist(self) -> Artist {
        Artist {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            artist_name: self.artist_name,
            pronouns: unwrap_pronouns(&self.pronouns),
            origin: Origin {
                date_of_birth: self.date_of_birth,
                place_of_birth: self.place_of_birth,
                nationality: self.nationality,
            },
            language: self.language,
            socials: Socials {
                instagram: self.instagram,
                facebook: self.facebook,
                bandcamp: self.bandcamp,
            },
            bio_german: self.bio_ger,
            bio_english: self.bio_en,
            email: self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::connection::create_pool;
    use crate::migration::run_migrations;
    use artistdb_core::domain::{new_id, Visibility};
    use artistdb_core::port::{InMemoryMetrics, SystemTimeProvider};
    use artistdb_core::ErrorKind;

    async fn setup() -> (SqliteArtistRepository, Arc<InMemoryMetrics>) {
        let config = DatabaseConfig::in_memory();
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let metrics = Arc::new(InMemoryMetrics::new());
        let conn = Arc::new(Connection::new(pool, metrics.clone(), &config));
        (
            SqliteArtistRepository::new(conn, Arc::new(SystemTimeProvider)),
            metrics,
        )
    }

    fn full_artist() -> Artist {
        Artist {
            first_name: "Bob".to_string(),
            last_name: "Ross".to_string(),
            artist_name: "Happy Little Trees".to_string(),
            pronouns: vec!["they".to_string(), "them".to_string()],
            origin: Origin {
                date_of_birth: NaiveDate::from_ymd_opt(1942, 10, 29),
                place_of_birth: "Daytona Beach".to_string(),
                nationality: "US".to_string(),
            },
            language: "en".to_string(),
            socials: Socials {
                instagram: "@bobross".to_string(),
                facebook: "bobross".to_string(),
                bandcamp: String::new(),
            },
            bio_german: "Maler".to_string(),
            bio_english: "Painter".to_string(),
            email: "bob@example.org".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get_by_id() {
        let (repo, metrics) = setup().await;
        let artist = full_artist();

        repo.upsert_artists(&[artist.clone()]).await.unwrap();

        let found = repo
            .get_artists(&ArtistFilter::by_id(artist.id.clone()))
            .await
            .unwrap();
        assert_eq!(found, vec![artist]);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.changed(entity::ARTIST, "upsert"), 1);
        assert_eq!(snapshot.retrieved(entity::ARTIST), 1);
        assert_eq!(snapshot.command("savepoint").count, 1);
        assert_eq!(snapshot.command("commit").count, 2);
    }

    #[tokio::test]
    async fn test_get_by_names() {
        let (repo, _) = setup().await;
        let artist = full_artist();
        repo.upsert_artists(&[artist.clone(), Artist::new("Jane", "Doe")])
            .await
            .unwrap();

        let by_last = repo
            .get_artists(&ArtistFilter::by_last_name("Ross"))
            .await
            .unwrap();
        assert_eq!(by_last, vec![artist.clone()]);

        let by_name = repo
            .get_artists(&ArtistFilter::by_artist_name("Happy Little Trees"))
            .await
            .unwrap();
        assert_eq!(by_name[0].id, artist.id);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let (repo, _) = setup().await;

        let err = repo
            .get_artists(&ArtistFilter::by_last_name("Nobody"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = repo
            .get_artists(&ArtistFilter::by_id("foo"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_identifier());
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let (repo, _) = setup().await;
        let mut artist = full_artist();

        repo.upsert_artists(&[artist.clone()]).await.unwrap();
        let first = repo.meta(&artist.id).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        artist.email = "bob@ross.example".to_string();
        repo.upsert_artists(&[artist.clone()]).await.unwrap();
        let second = repo.meta(&artist.id).await.unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at > first.updated_at);

        let found = repo
            .get_artists(&ArtistFilter::by_id(artist.id.clone()))
            .await
            .unwrap();
        assert_eq!(found[0].email, "bob@ross.example");
    }

    #[tokio::test]
    async fn test_invalid_rows_are_aggregated() {
        let (repo, metrics) = setup().await;
        let good = Artist::new("Jane", "Doe");
        let bad = Artist {
            id: "foo".to_string(),
            ..Default::default()
        };
        let other = Artist::new("John", "Doe");

        let err = repo
            .upsert_artists(&[good.clone(), bad, other.clone()])
            .await
            .unwrap_err();

        let artistdb_core::AppError::AggregatedWrite(rows) = &err else {
            panic!("expected aggregated error, got {err:?}");
        };
        assert_eq!(rows.len(), 1);
        assert!(rows.failed_at(1));
        assert!(rows.contains_kind(ErrorKind::InvalidIdentifier));
        assert!(err.to_string().contains("foo"));

        for id in [good.id, other.id] {
            assert!(repo.get_artists(&ArtistFilter::by_id(id)).await.is_ok());
        }
        assert_eq!(metrics.snapshot().errors(entity::ARTIST, "upsert"), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, _) = setup().await;
        let artist = full_artist();
        repo.upsert_artists(&[artist.clone()]).await.unwrap();

        repo.delete_artist_by_id(&artist.id).await.unwrap();

        let err = repo
            .get_artists(&ArtistFilter::by_id(artist.id.clone()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let meta = repo.meta(&artist.id).await.unwrap();
        assert!(matches!(meta.visibility, Visibility::Deleted { .. }));

        // Deleting again succeeds
        repo.delete_artist_by_id(&artist.id).await.unwrap();

        assert!(repo
            .delete_artist_by_id(&new_id())
            .await
            .unwrap_err()
            .is_not_found());
        assert!(repo
            .delete_artist_by_id("foo")
            .await
            .unwrap_err()
            .is_invalid_identifier());
    }

    #[tokio::test]
    async fn test_upsert_restores_deleted_artist() {
        let (repo, _) = setup().await;
        let artist = full_artist();
        repo.upsert_artists(&[artist.clone()]).await.unwrap();
        repo.delete_artist_by_id(&artist.id).await.unwrap();

        repo.upsert_artists(&[artist.clone()]).await.unwrap();

        let meta = repo.meta(&artist.id).await.unwrap();
        assert!(meta.visibility.is_active());
        assert!(repo
            .get_artists(&ArtistFilter::by_id(artist.id.clone()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_empty_upsert_is_noop() {
        let (repo, metrics) = setup().await;
        repo.upsert_artists(&[]).await.unwrap();
        assert_eq!(metrics.snapshot().command("begin").count, 0);
    }
}
