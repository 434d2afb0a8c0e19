//! Villa documents and the text derived from them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A villa as sent by the listing backend.
///
/// The identifier is owned by the caller (a MongoDB ObjectId in practice) and
/// is treated as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillaDocument {
    pub mongo_id: String,
    pub name: String,
    pub description: String,
    pub bedrooms: u32,
    pub amenities: Vec<String>,
}

impl VillaDocument {
    /// Text that gets embedded for this villa.
    pub fn canonical_text(&self) -> String {
        canonical_text(&self.name, &self.description, self.bedrooms, &self.amenities)
    }
}

/// Build the sentence-like text embedded for a villa.
///
/// Amenity order is preserved as given.
pub fn canonical_text(
    name: &str,
    description: &str,
    bedrooms: u32,
    amenities: &[String],
) -> String {
    format!(
        "{}. {}. {} bedrooms. Amenities: {}",
        name,
        description,
        bedrooms,
        amenities.join(", ")
    )
}

/// Payload stored next to each vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillaPayload {
    pub mongo_id: String,
}

impl VillaPayload {
    pub fn new(mongo_id: impl Into<String>) -> Self {
        Self {
            mongo_id: mongo_id.into(),
        }
    }
}

/// Reject identifiers the vector store cannot key on.
pub(crate) fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::Validation("mongo_id must not be empty".to_string()));
    }
    Ok(())
}
