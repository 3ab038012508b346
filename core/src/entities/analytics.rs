//! Recorded analytics data points.

use super::impl_record;
use crate::Resource;
use crate::error::ValidationError;
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One metric sample, e.g. `page_views = 132` for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    /// Primary key.
    pub id: Uuid,
    /// Metric name.
    pub metric: String,
    /// Sample value.
    pub value: f64,
    /// Optional breakdown ("mobile", an event id, ...).
    pub dimension: Option<String>,
    /// Sample time.
    pub recorded_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Analytics, "analytics", "Analytics entry");

/// Create payload for [`Analytics`].
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsDraft {
    /// Metric name.
    pub metric: String,
    /// Sample value.
    pub value: f64,
    /// Breakdown.
    pub dimension: Option<String>,
    /// Sample time; defaults to now.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Update payload for [`Analytics`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsPatch {
    /// Corrected value.
    pub value: Option<f64>,
    /// Corrected breakdown.
    pub dimension: Option<String>,
}

fn finite(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::Invalid {
            field: "value",
            reason: "must be a finite number".to_string(),
        })
    }
}

impl Resource for Analytics {
    type Draft = AnalyticsDraft;
    type Patch = AnalyticsPatch;

    fn from_draft(
        id: Uuid,
        draft: AnalyticsDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            metric: validate::required("metric", draft.metric)?,
            value: finite(draft.value)?,
            dimension: validate::optional(draft.dimension),
            recorded_at: draft.recorded_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: AnalyticsPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(value) = patch.value {
            self.value = finite(value)?;
        }
        if patch.dimension.is_some() {
            self.dimension = validate::optional(patch.dimension);
        }
        self.updated_at = now;
        Ok(())
    }
}
