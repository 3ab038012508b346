//! Venues.

use super::impl_record;
use crate::Resource;
use crate::error::ValidationError;
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A place events are held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    /// Primary key.
    pub id: Uuid,
    /// Venue name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Maximum occupancy.
    pub capacity: u32,
    /// Facilities ("parking", "wifi", ...).
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Booking contact.
    pub contact_email: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Venue, "venues", "Venue");

/// Create payload for [`Venue`].
#[derive(Debug, Clone, Deserialize)]
pub struct VenueDraft {
    /// Venue name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Maximum occupancy.
    pub capacity: u32,
    /// Facilities.
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Booking contact.
    pub contact_email: Option<String>,
}

/// Update payload for [`Venue`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenuePatch {
    /// New name.
    pub name: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New city.
    pub city: Option<String>,
    /// New occupancy.
    pub capacity: Option<u32>,
    /// Replacement facilities.
    pub amenities: Option<Vec<String>>,
    /// New booking contact.
    pub contact_email: Option<String>,
}

fn contact(value: Option<String>) -> Result<Option<String>, ValidationError> {
    validate::optional(value)
        .map(|email| validate::email("contact_email", email))
        .transpose()
}

impl Resource for Venue {
    type Draft = VenueDraft;
    type Patch = VenuePatch;

    fn from_draft(id: Uuid, draft: VenueDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: validate::required("name", draft.name)?,
            address: validate::required("address", draft.address)?,
            city: validate::required("city", draft.city)?,
            capacity: draft.capacity,
            amenities: validate::tags(draft.amenities),
            contact_email: contact(draft.contact_email)?,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: VenuePatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = patch.name {
            self.name = validate::required("name", name)?;
        }
        if let Some(address) = patch.address {
            self.address = validate::required("address", address)?;
        }
        if let Some(city) = patch.city {
            self.city = validate::required("city", city)?;
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = capacity;
        }
        if let Some(amenities) = patch.amenities {
            self.amenities = validate::tags(amenities);
        }
        if patch.contact_email.is_some() {
            self.contact_email = contact(patch.contact_email)?;
        }
        self.updated_at = now;
        Ok(())
    }
}
