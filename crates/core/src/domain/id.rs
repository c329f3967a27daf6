// Entity Identifiers

use crate::error::{AppError, Result};
use uuid::Uuid;

/// Entity ID (RFC 4122 textual UUID)
pub type EntityId = String;

/// Generate a fresh v4 identifier.
pub fn new_id() -> EntityId {
    Uuid::new_v4().to_string()
}

/// Check that `id` is a valid UUID and return its canonical form.
///
/// Every accepted spelling (uppercase, braced, `urn:uuid:`, simple) of one
/// UUID maps to the same lowercase hyphenated string, which is what gets
/// stored and compared.
pub fn validate_id(id: &str) -> Result<EntityId> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| AppError::InvalidIdentifier(format!("{:?} is not a valid UUID", id)))
}
