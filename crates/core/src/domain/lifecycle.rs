// Record Lifecycle (soft delete)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visibility of a stored row. Only `Active` rows are returned by reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl Visibility {
    /// Map the nullable `deleted_at` column.
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            None => Visibility::Active,
            Some(at) => Visibility::Deleted { at },
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Visibility::Active)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Visibility::Active => None,
            Visibility::Deleted { at } => Some(*at),
        }
    }
}

/// Lifecycle metadata kept next to every entity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub visibility: Visibility,
}
