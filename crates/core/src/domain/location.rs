// Location Domain Model

use super::id::{new_id, validate_id, EntityId};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A venue events can take place at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: EntityId,
    pub name: String,
}

impl Location {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_id(&self.id).map(|_| ())
    }

    /// Validated copy with the ID in canonical form.
    pub fn normalized(&self) -> Result<Self> {
        Ok(Self {
            id: validate_id(&self.id)?,
            name: self.name.clone(),
        })
    }
}

/// Lookup modes for locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationFilter {
    Id(String),
    Name(String),
}

impl LocationFilter {
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
