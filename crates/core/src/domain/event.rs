// Event Domain Model

use super::id::{new_id, validate_id, EntityId};
use crate::error::{AppError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// An event, optionally held at a location, with invited artists.
///
/// `location_id` and the invited artist IDs are weak references: they are
/// resolved by lookup and the event outlives whatever they point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EntityId,
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub location_id: Option<EntityId>,
    pub invited_artists: Vec<InvitedArtist>,
}

/// An artist invited to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitedArtist {
    pub id: EntityId,
    #[serde(default)]
    pub confirmed: bool,
}

impl InvitedArtist {
    pub fn new(id: impl Into<String>, confirmed: bool) -> Self {
        Self {
            id: id.into(),
            confirmed,
        }
    }
}

/// Parameters for [`Event::new`].
#[derive(Debug, Clone)]
pub struct NewEvent<Tz: TimeZone = Utc> {
    pub name: String,
    /// Any offset is accepted; it is normalized to UTC.
    pub start_time: Option<DateTime<Tz>>,
    pub location_id: Option<String>,
    pub invited_artists: Vec<InvitedArtist>,
}

impl NewEvent<Utc> {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_time: None,
            location_id: None,
            invited_artists: Vec::new(),
        }
    }
}

impl Event {
    /// Build an event with a fresh ID, rejecting invalid references up front.
    pub fn new<Tz: TimeZone>(params: NewEvent<Tz>) -> Result<Self> {
        let event = Self {
            id: new_id(),
            name: params.name,
            start_time: params.start_time.map(|t| t.with_timezone(&Utc)),
            location_id: params.location_id,
            invited_artists: params.invited_artists,
        };

        event.normalized()
    }

    /// Checks run before the event is written.
    pub fn validate(&self) -> Result<()> {
        validate_id(&self.id)?;

        if self.name.trim().is_empty() {
            return Err(AppError::Validation("event name must not be empty".to_string()));
        }

        if let Some(location_id) = &self.location_id {
            validate_id(location_id)?;
        }

        for invited in &self.invited_artists {
            validate_id(&invited.id)?;
        }

        Ok(())
    }

    /// Validated copy with the event, location and invited artist IDs in
    /// canonical form.
    pub fn normalized(&self) -> Result<Self> {
        self.validate()?;

        let invited_artists = self
            .invited_artists
            .iter()
            .map(|invited| {
                Ok(InvitedArtist {
                    id: validate_id(&invited.id)?,
                    confirmed: invited.confirmed,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: validate_id(&self.id)?,
            name: self.name.clone(),
            start_time: self.start_time,
            location_id: self.location_id.as_deref().map(validate_id).transpose()?,
            invited_artists,
        })
    }
}

/// Lookup modes for events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFilter {
    Id(String),
    Name(String),
}

impl EventFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Name(_) => "name",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Id(v) | Self::Name(v) => v,
        }
    }
}
