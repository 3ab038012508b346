//! Workflows and third-party integrations configured from the admin dashboard.

use super::impl_record;
use crate::Resource;
use crate::error::ValidationError;
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Step label.
    pub name: String,
    /// Action identifier ("send_email", "create_ticket", ...).
    pub action: String,
}

/// An automation definition. Stored only; the platform does not execute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Primary key.
    pub id: Uuid,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Trigger identifier ("ticket_sold", ...).
    pub trigger: String,
    /// Ordered steps.
    pub steps: Vec<WorkflowStep>,
    /// Enabled flag.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Workflow, "workflows", "Workflow");

/// Create payload for [`Workflow`].
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDraft {
    /// Name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Trigger identifier.
    pub trigger: String,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    /// Enabled flag; defaults to false.
    #[serde(default)]
    pub is_active: bool,
}

/// Update payload for [`Workflow`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New trigger.
    pub trigger: Option<String>,
    /// Replacement steps.
    pub steps: Option<Vec<WorkflowStep>>,
    /// Enable or disable.
    pub is_active: Option<bool>,
}

fn steps(steps: Vec<WorkflowStep>) -> Result<Vec<WorkflowStep>, ValidationError> {
    steps
        .into_iter()
        .map(|step| {
            Ok(WorkflowStep {
                name: validate::required("steps.name", step.name)?,
                action: validate::required("steps.action", step.action)?,
            })
        })
        .collect()
}

impl Resource for Workflow {
    type Draft = WorkflowDraft;
    type Patch = WorkflowPatch;

    fn from_draft(id: Uuid, draft: WorkflowDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: validate::required("name", draft.name)?,
            description: draft.description.trim().to_string(),
            trigger: validate::required("trigger", draft.trigger)?,
            steps: steps(draft.steps)?,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: WorkflowPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(name) = patch.name {
            self.name = validate::required("name", name)?;
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(trigger) = patch.trigger {
            self.trigger = validate::required("trigger", trigger)?;
        }
        if let Some(new_steps) = patch.steps {
            self.steps = steps(new_steps)?;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Connection state of an integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    /// Credentials accepted.
    Connected,
    /// Not set up.
    #[default]
    Disconnected,
    /// Last sync failed.
    Error,
}

/// A configured third-party service (payments, email, calendar, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Provider identifier ("stripe", "mailchimp", ...).
    pub provider: String,
    /// Connection state.
    pub status: IntegrationStatus,
    /// Provider-specific settings.
    pub settings: Value,
    /// Last successful sync.
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Integration, "integrations", "Integration");

/// Create payload for [`Integration`].
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationDraft {
    /// Display name.
    pub name: String,
    /// Provider identifier.
    pub provider: String,
    /// Connection state.
    #[serde(default)]
    pub status: IntegrationStatus,
    /// Settings object; defaults to `{}`.
    pub settings: Option<Value>,
}

/// Update payload for [`Integration`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntegrationPatch {
    /// New name.
    pub name: Option<String>,
    /// New state.
    pub status: Option<IntegrationStatus>,
    /// Replacement settings object.
    pub settings: Option<Value>,
    /// Record a sync.
    pub last_synced_at: Option<DateTime<Utc>>,
}

fn settings(value: Option<Value>) -> Result<Value, ValidationError> {
    match value {
        None => Ok(Value::Object(serde_json::Map::new())),
        Some(value @ Value::Object(_)) => Ok(value),
        Some(_) => Err(ValidationError::Invalid {
            field: "settings",
            reason: "must be a JSON object".to_string(),
        }),
    }
}

impl Resource for Integration {
    type Draft = IntegrationDraft;
    type Patch = IntegrationPatch;

    fn from_draft(
        id: Uuid,
        draft: IntegrationDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: validate::required("name", draft.name)?,
            provider: validate::required("provider", draft.provider)?.to_lowercase(),
            status: draft.status,
            settings: settings(draft.settings)?,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(
        &mut self,
        patch: IntegrationPatch,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if let Some(name) = patch.name {
            self.name = validate::required("name", name)?;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if patch.settings.is_some() {
            self.settings = settings(patch.settings)?;
        }
        if patch.last_synced_at.is_some() {
            self.last_synced_at = patch.last_synced_at;
        }
        self.updated_at = now;
        Ok(())
    }
}
