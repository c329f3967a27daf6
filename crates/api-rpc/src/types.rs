//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use artistdb_core::domain::{
    new_id, validate_id, Artist, ArtistFilter, Event, EventFilter, InvitedArtist, Location,
    LocationFilter, Origin, Socials,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Canonical form of a given id, a fresh one when absent. Malformed ids are
/// kept as sent so the write reports them.
fn id_or_new(id: Option<String>) -> String {
    match id {
        Some(id) => validate_id(&id).unwrap_or(id),
        None => new_id(),
    }
}

/// Artist as accepted by artists.upsert.v1. A missing id is generated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArtistInput {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub artist_name: String,
    pub pronouns: Vec<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub place_of_birth: String,
    pub nationality: String,
    pub language: String,
    pub instagram: String,
    pub facebook: String,
    pub bandcamp: String,
    pub bio_german: String,
    pub bio_english: String,
    pub email: String,
}

impl From<ArtistInput> for Artist {
    fn from(input: ArtistInput) -> Self {
        Artist {
            id: id_or_new(input.id),
            first_name: input.first_name,
            last_name: input.last_name,
            artist_name: input.artist_name,
            pronouns: input.pronouns,
            origin: Origin {
                date_of_birth: input.date_of_birth,
                place_of_birth: input.place_of_birth,
                nationality: input.nationality,
            },
            language: input.language,
            socials: Socials {
                instagram: input.instagram,
                facebook: input.facebook,
                bandcamp: input.bandcamp,
            },
            bio_german: input.bio_german,
            bio_english: input.bio_english,
            email: input.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

impl From<LocationInput> for Location {
    fn from(input: LocationInput) -> Self {
        Location {
            id: id_or_new(input.id),
            name: input.name,
        }
    }
}

/// Event as accepted by events.upsert.v1. `start_time` may carry any offset.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub invited_artists: Vec<InvitedArtist>,
}

impl From<EventInput> for Event {
    fn from(input: EventInput) -> Self {
        Event {
            id: id_or_new(input.id),
            name: input.name,
            start_time: input.start_time.map(|t| t.with_timezone(&Utc)),
            location_id: input.location_id,
            invited_artists: input.invited_artists,
        }
    }
}

/// artists.upsert.v1
#[derive(Debug, Deserialize)]
pub struct UpsertArtistsRequest {
    pub artists: Vec<ArtistInput>,
}

/// locations.upsert.v1
#[derive(Debug, Deserialize)]
pub struct UpsertLocationsRequest {
    pub locations: Vec<LocationInput>,
}

/// events.upsert.v1
#[derive(Debug, Deserialize)]
pub struct UpsertEventsRequest {
    pub events: Vec<EventInput>,
}

/// Result of every upsert method: the ids in input order
#[derive(Debug, Clone, Serialize)]
pub struct UpsertResponse {
    pub ids: Vec<String>,
}

/// artists.get.v1, e.g. `{"by": {"last_name": "Ross"}}`
#[derive(Debug, Deserialize)]
pub struct GetArtistsRequest {
    pub by: ArtistFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetArtistsResponse {
    pub artists: Vec<Artist>,
}

/// locations.get.v1
#[derive(Debug, Deserialize)]
pub struct GetLocationsRequest {
    pub by: LocationFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetLocationsResponse {
    pub locations: Vec<Location>,
}

/// events.get.v1
#[derive(Debug, Deserialize)]
pub struct GetEventsRequest {
    pub by: EventFilter,
}

/// An event together with its resolved location
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetEventsResponse {
    pub events: Vec<EventView>,
}

/// *.delete.v1
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

/// health.ready.v1
#[derive(Debug, Clone, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_artist_input_without_id_gets_one() {
        let input: ArtistInput = serde_json::from_value(serde_json::json!({
            "first_name": "Bob",
            "last_name": "Ross",
            "pronouns": ["they", "them"],
            "date_of_birth": "1942-10-29"
        }))
        .unwrap();

        let artist = Artist::from(input);
        assert!(artist.validate().is_ok());
        assert_eq!(artist.pronouns, vec!["they", "them"]);
        assert_eq!(artist.origin.date_of_birth, NaiveDate::from_ymd_opt(1942, 10, 29));
    }

    #[test]
    fn test_given_ids_are_canonical() {
        let input: LocationInput = serde_json::from_value(serde_json::json!({
            "id": "6B1AB0C9-2F0B-4C33-9F53-3C1F7F0B9A10",
            "name": "Tille"
        }))
        .unwrap();
        assert_eq!(Location::from(input).id, "6b1ab0c9-2f0b-4c33-9f53-3c1f7f0b9a10");

        let input: LocationInput =
            serde_json::from_value(serde_json::json!({"id": "tille", "name": "Tille"})).unwrap();
        assert_eq!(Location::from(input).id, "tille");
    }

    #[test]
    fn test_event_input_normalizes_start_time() {
        let input: EventInput = serde_json::from_value(serde_json::json!({
            "name": "Ballern",
            "start_time": "2022-06-21T22:00:00+02:00",
            "invited_artists": [{"id": "8d7e1a6c-2f0b-4c33-9f53-3c1f7f0b9a10"}]
        }))
        .unwrap();

        let event = Event::from(input);
        assert_eq!(
            event.start_time,
            Some(Utc.with_ymd_and_hms(2022, 6, 21, 20, 0, 0).unwrap())
        );
        assert!(!event.invited_artists[0].confirmed);
    }

    #[test]
    fn test_filter_params() {
        let req: GetArtistsRequest =
            serde_json::from_value(serde_json::json!({"by": {"last_name": "Ross"}})).unwrap();
        assert_eq!(req.by, ArtistFilter::by_last_name("Ross"));

        let req: GetEventsRequest =
            serde_json::from_value(serde_json::json!({"by": {"name": "Ballern"}})).unwrap();
        assert_eq!(req.by, EventFilter::by_name("Ballern"));
    }
}
