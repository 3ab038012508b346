//! Clients and staff managed from the dashboards.

use super::impl_record;
use crate::Resource;
use crate::error::ValidationError;
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline state of a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    /// Prospect.
    #[default]
    Lead,
    /// Currently booking events.
    Active,
    /// Dormant.
    Inactive,
}

/// An organisation or person booking events through the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Primary key.
    pub id: Uuid,
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Pipeline state.
    pub status: ClientStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Client, "clients", "Client");

/// Create payload for [`Client`].
#[derive(Debug, Clone, Deserialize)]
pub struct ClientDraft {
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Pipeline state.
    #[serde(default)]
    pub status: ClientStatus,
}

/// Update payload for [`Client`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientPatch {
    /// New contact name.
    pub name: Option<String>,
    /// New contact email.
    pub email: Option<String>,
    /// New phone.
    pub phone: Option<String>,
    /// New company.
    pub company: Option<String>,
    /// New pipeline state.
    pub status: Option<ClientStatus>,
}

impl Resource for Client {
    type Draft = ClientDraft;
    type Patch = ClientPatch;

    fn from_draft(id: Uuid, draft: ClientDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: validate::required("name", draft.name)?,
            email: validate::email("email", draft.email)?,
            phone: validate::optional(draft.phone),
            company: validate::optional(draft.company),
            status: draft.status,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: ClientPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = patch.name {
            self.name = validate::required("name", name)?;
        }
        if let Some(email) = patch.email {
            self.email = validate::email("email", email)?;
        }
        if patch.phone.is_some() {
            self.phone = validate::optional(patch.phone);
        }
        if patch.company.is_some() {
            self.company = validate::optional(patch.company);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Employment state of a staff member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    /// Available for assignments.
    #[default]
    Active,
    /// Temporarily unavailable.
    OnLeave,
    /// No longer working events.
    Inactive,
}

/// Event staff (ushers, security, technicians, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    /// Primary key.
    pub id: Uuid,
    /// Full name.
    pub name: String,
    /// Work email.
    pub email: String,
    /// Job title.
    pub position: String,
    /// Phone.
    pub phone: Option<String>,
    /// Employment state.
    pub status: StaffStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Staff, "staff", "Staff member");

/// Create payload for [`Staff`].
#[derive(Debug, Clone, Deserialize)]
pub struct StaffDraft {
    /// Full name.
    pub name: String,
    /// Work email.
    pub email: String,
    /// Job title.
    pub position: String,
    /// Phone.
    pub phone: Option<String>,
    /// Employment state.
    #[serde(default)]
    pub status: StaffStatus,
}

/// Update payload for [`Staff`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffPatch {
    /// New name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New job title.
    pub position: Option<String>,
    /// New phone.
    pub phone: Option<String>,
    /// New state.
    pub status: Option<StaffStatus>,
}

impl Resource for Staff {
    type Draft = StaffDraft;
    type Patch = StaffPatch;

    fn from_draft(id: Uuid, draft: StaffDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: validate::required("name", draft.name)?,
            email: validate::email("email", draft.email)?,
            position: validate::required("position", draft.position)?,
            phone: validate::optional(draft.phone),
            status: draft.status,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: StaffPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = patch.name {
            self.name = validate::required("name", name)?;
        }
        if let Some(email) = patch.email {
            self.email = validate::email("email", email)?;
        }
        if let Some(position) = patch.position {
            self.position = validate::required("position", position)?;
        }
        if patch.phone.is_some() {
            self.phone = validate::optional(patch.phone);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}
