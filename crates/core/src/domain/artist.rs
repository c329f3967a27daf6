// Artist Domain Model

use super::id::{new_id, validate_id, EntityId};
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Separator used to store pronouns in a single column
pub const PRONOUN_SEPARATOR: char = '|';

/// An artist who can be invited to events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub artist_name: String,
    pub pronouns: Vec<String>,
    pub origin: Origin,
    pub language: String,
    pub socials: Socials,
    pub bio_german: String,
    pub bio_english: String,
    pub email: String,
}

/// Social media presences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socials {
    pub instagram: String,
    pub facebook: String,
    pub bandcamp: String,
}

/// Where an artist comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub date_of_birth: Option<NaiveDate>,
    pub place_of_birth: String,
    pub nationality: String,
}

impl Default for Artist {
    /// Blank artist with a freshly generated ID.
    fn default() -> Self {
        Self {
            id: new_id(),
            first_name: String::new(),
            last_name: String::new(),
            artist_name: String::new(),
            pronouns: Vec::new(),
            origin: Origin::default(),
            language: String::new(),
            socials: Socials::default(),
            bio_german: String::new(),
            bio_english: String::new(),
            email: String::new(),
        }
    }
}

impl Artist {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }

    /// Checks run before the artist is written.
    pub fn validate(&self) -> Result<()> {
        validate_id(&self.id)?;

        if let Some(p) = self
            .pronouns
            .iter()
            .find(|p| p.contains(PRONOUN_SEPARATOR))
        {
            return Err(AppError::Validation(format!(
                "pronoun {:?} must not contain '{}'",
                p, PRONOUN_SEPARATOR
            )));
        }

        // Stored as "", which reads back as no pronouns at all
        if self.pronouns.len() == 1 && self.pronouns[0].is_empty() {
            return Err(AppError::Validation(
                "a single pronoun must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Validated copy with the ID in canonical form.
    pub fn normalized(&self) -> Result<Self> {
        self.validate()?;
        Ok(Self {
            id: validate_id(&self.id)?,
            ..self.clone()
        })
    }
}

/// Join pronouns into their column representation.
pub fn wrap_pronouns(pronouns: &[String]) -> String {
    pronouns.join(&PRONOUN_SEPARATOR.to_string())
}

/// Inverse of [`wrap_pronouns`]. An empty column yields no pronouns.
pub fn unwrap_pronouns(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }

    value.split(PRONOUN_SEPARATOR).map(str::to_string).collect()
}

/// Lookup modes for artists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtistFilter {
    Id(String),
    LastName(String),
    ArtistName(String),
}

impl ArtistFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn by_last_name(last_name: impl Into<String>) -> Self {
        Self::LastName(last_name.into())
    }

    pub fn by_artist_name(artist_name: impl Into<String>) -> Self {
        Self::ArtistName(artist_name.into())
    }

    /// Label used for spans and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::LastName(_) => "lastName",
            Self::ArtistName(_) => "artistName",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Id(v) | Self::LastName(v) | Self::ArtistName(v) => v,
        }
    }
}
