//! Artist handler against a real SQLite database

mod common;

use std::sync::Arc;
use std::time::Duration;

use artistdb_core::domain::{entity, Artist, ArtistFilter, Origin, Socials};
use artistdb_core::error::{AppError, ErrorKind};
use artistdb_core::port::{ArtistRepository, InMemoryMetrics};
use chrono::NaiveDate;

fn bob_ross() -> Artist {
    Artist {
        pronouns: vec!["they".to_string(), "them".to_string()],
        artist_name: "Happy Little Trees".to_string(),
        origin: Origin {
            date_of_birth: NaiveDate::from_ymd_opt(1942, 10, 29),
            place_of_birth: "Daytona Beach".to_string(),
            nationality: "US".to_string(),
        },
        language: "en".to_string(),
        socials: Socials {
            instagram: "@bobross".to_string(),
            facebook: String::new(),
            bandcamp: String::new(),
        },
        bio_english: "Painter".to_string(),
        email: "bob@example.com".to_string(),
        ..Artist::new("Bob", "Ross")
    }
}

#[tokio::test]
async fn test_upsert_then_get_by_id_round_trips() {
    let db = common::setup().await;
    let artist = bob_ross();

    db.upsert_artists(&[artist.clone()]).await.unwrap();

    let found = db
        .get_artists(&ArtistFilter::by_id(artist.id.clone()))
        .await
        .unwrap();
    assert_eq!(found, vec![artist]);
}

#[tokio::test]
async fn test_bob_ross_found_by_last_name() {
    let db = common::setup().await;
    let artist = bob_ross();
    db.upsert_artists(&[artist.clone(), Artist::new("Ada", "Lovelace")])
        .await
        .unwrap();

    let found = db.get_artists(&ArtistFilter::by_last_name("Ross")).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].pronouns, vec!["they", "them"]);
    assert_eq!(found[0].id, artist.id);
}

#[tokio::test]
async fn test_get_by_artist_name() {
    let db = common::setup().await;
    db.upsert_artists(&[bob_ross()]).await.unwrap();

    let found = db
        .get_artists(&ArtistFilter::by_artist_name("Happy Little Trees"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_second_upsert_bumps_updated_at_only() {
    let db = common::setup().await;
    let mut artist = bob_ross();
    db.upsert_artists(&[artist.clone()]).await.unwrap();
    let before = db.artists().meta(&artist.id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;
    artist.bio_german = "Maler".to_string();
    db.upsert_artists(&[artist.clone()]).await.unwrap();
    let after = db.artists().meta(&artist.id).await.unwrap();

    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);

    let found = db.get_artists(&ArtistFilter::by_id(artist.id.clone())).await.unwrap();
    assert_eq!(found[0].bio_german, "Maler");
}

#[tokio::test]
async fn test_invalid_artist_in_batch_is_reported_others_persist() {
    let metrics = Arc::new(InMemoryMetrics::new());
    let db = common::setup_with_metrics(metrics.clone()).await;

    let mut batch: Vec<Artist> = (0..5)
        .map(|i| Artist::new(format!("First{}", i), format!("Last{}", i)))
        .collect();
    batch[3].id = "not-a-uuid".to_string();

    let err = db.upsert_artists(&batch).await.unwrap_err();
    let AppError::AggregatedWrite(errors) = &err else {
        panic!("expected aggregated error, got {err:?}");
    };
    assert_eq!(errors.len(), 1);
    assert!(errors.failed_at(3));
    assert!(errors.contains_kind(ErrorKind::InvalidIdentifier));
    assert!(err.to_string().contains("not-a-uuid"));

    for (i, artist) in batch.iter().enumerate().filter(|(i, _)| *i != 3) {
        let found = db
            .get_artists(&ArtistFilter::by_id(artist.id.clone()))
            .await
            .unwrap_or_else(|e| panic!("artist {i} missing: {e}"));
        assert_eq!(found.len(), 1);
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.changed(entity::ARTIST, "upsert"), 4);
    assert_eq!(snapshot.errors(entity::ARTIST, "upsert"), 1);
}

#[tokio::test]
async fn test_delete_semantics() {
    let db = common::setup().await;
    let artist = bob_ross();
    db.upsert_artists(&[artist.clone()]).await.unwrap();

    // Unknown id
    let err = db
        .delete_artist_by_id(&uuid::Uuid::new_v4().to_string())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // Malformed id
    let err = db.delete_artist_by_id("42").await.unwrap_err();
    assert!(err.is_invalid_identifier());

    // Existing id
    db.delete_artist_by_id(&artist.id).await.unwrap();
    let err = db
        .get_artists(&ArtistFilter::by_id(artist.id.clone()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // The row is kept, only hidden
    let meta = db.artists().meta(&artist.id).await.unwrap();
    assert!(!meta.visibility.is_active());

    // Deleting again is not an error
    db.delete_artist_by_id(&artist.id).await.unwrap();
}

#[tokio::test]
async fn test_get_with_malformed_id_is_rejected() {
    let db = common::setup().await;
    let err = db
        .get_artists(&ArtistFilter::by_id("nope"))
        .await
        .unwrap_err();
    assert!(err.is_invalid_identifier());
}

#[tokio::test]
async fn test_uuid_spellings_address_one_artist() {
    let db = common::setup().await;
    let canonical = uuid::Uuid::new_v4().to_string();
    let spellings = [
        canonical.to_uppercase(),
        canonical.clone(),
        format!("urn:uuid:{}", canonical),
    ];

    for id in &spellings {
        let artist = Artist {
            id: id.clone(),
            ..bob_ross()
        };
        db.upsert_artists(&[artist]).await.unwrap();
    }

    let by_name = db.get_artists(&ArtistFilter::by_last_name("Ross")).await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, canonical);

    for id in &spellings {
        let found = db.get_artists(&ArtistFilter::by_id(id.clone())).await.unwrap();
        assert_eq!(found[0].id, canonical);
    }

    db.delete_artist_by_id(&canonical.to_uppercase()).await.unwrap();
    assert!(!db.artists().meta(&canonical).await.unwrap().visibility.is_active());
}

#[tokio::test]
async fn test_single_empty_pronoun_is_rejected() {
    let db = common::setup().await;
    let artist = Artist {
        pronouns: vec![String::new()],
        ..bob_ross()
    };

    let err = db.upsert_artists(&[artist.clone()]).await.unwrap_err();
    let AppError::AggregatedWrite(errors) = &err else {
        panic!("expected aggregated error, got {err:?}");
    };
    assert!(errors.contains_kind(ErrorKind::Validation));

    // Lists that can be read back unchanged are accepted
    for pronouns in [vec![], vec![String::new(), String::new()]] {
        let artist = Artist {
            pronouns,
            ..bob_ross()
        };
        db.upsert_artists(&[artist.clone()]).await.unwrap();
        let found = db
            .get_artists(&ArtistFilter::by_id(artist.id.clone()))
            .await
            .unwrap();
        assert_eq!(found, vec![artist]);
    }
}
