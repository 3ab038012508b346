//! Events and RSVPs.

use super::impl_record;
use crate::Resource;
use crate::error::ValidationError;
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Not yet visible in discovery.
    #[default]
    Draft,
    /// Listed and open for RSVPs.
    Published,
    /// Called off.
    Cancelled,
    /// Already happened.
    Completed,
}

impl EventStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

/// An event listed on EventMingle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Primary key.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// Long description.
    pub description: String,
    /// Discovery category ("music", "tech", ...).
    pub category: String,
    /// Free-text location shown to attendees.
    pub location: String,
    /// Venue record, when booked through the platform.
    pub venue_id: Option<Uuid>,
    /// Organizing user (an event manager).
    pub organizer_id: Option<Uuid>,
    /// Start time.
    pub start_time: DateTime<Utc>,
    /// End time; never before `start_time`.
    pub end_time: DateTime<Utc>,
    /// Maximum attendance, if limited.
    pub capacity: Option<u32>,
    /// Entry price in cents; zero for free events.
    #[serde(default)]
    pub price_cents: u64,
    /// Cover image.
    pub image_url: Option<String>,
    /// Publication state.
    pub status: EventStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Event, "events", "Event");

/// Create payload for [`Event`].
#[derive(Debug, Clone, Deserialize)]
pub struct EventDraft {
    /// Headline.
    pub title: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Discovery category; defaults to "general".
    pub category: Option<String>,
    /// Free-text location.
    pub location: String,
    /// Venue record.
    pub venue_id: Option<Uuid>,
    /// Organizing user.
    pub organizer_id: Option<Uuid>,
    /// Start time.
    pub start_time: DateTime<Utc>,
    /// End time.
    pub end_time: DateTime<Utc>,
    /// Maximum attendance.
    pub capacity: Option<u32>,
    /// Entry price in cents.
    #[serde(default)]
    pub price_cents: u64,
    /// Cover image.
    pub image_url: Option<String>,
    /// Initial state; defaults to draft.
    #[serde(default)]
    pub status: EventStatus,
}

/// Update payload for [`Event`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    /// New headline.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New venue.
    pub venue_id: Option<Uuid>,
    /// New start time.
    pub start_time: Option<DateTime<Utc>>,
    /// New end time.
    pub end_time: Option<DateTime<Utc>>,
    /// New capacity.
    pub capacity: Option<u32>,
    /// New price.
    pub price_cents: Option<u64>,
    /// New cover image.
    pub image_url: Option<String>,
    /// New state.
    pub status: Option<EventStatus>,
}

impl Resource for Event {
    type Draft = EventDraft;
    type Patch = EventPatch;

    fn from_draft(id: Uuid, draft: EventDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        validate::time_range(draft.start_time, draft.end_time)?;
        Ok(Self {
            id,
            title: validate::required("title", draft.title)?,
            description: draft.description.trim().to_string(),
            category: validate::optional(draft.category).unwrap_or_else(|| "general".to_string()),
            location: validate::required("location", draft.location)?,
            venue_id: draft.venue_id,
            organizer_id: draft.organizer_id,
            start_time: draft.start_time,
            end_time: draft.end_time,
            capacity: draft.capacity,
            price_cents: draft.price_cents,
            image_url: validate::optional(draft.image_url),
            status: draft.status,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: EventPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(title) = patch.title {
            self.title = validate::required("title", title)?;
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = validate::required("category", category)?;
        }
        if let Some(location) = patch.location {
            self.location = validate::required("location", location)?;
        }
        if patch.venue_id.is_some() {
            self.venue_id = patch.venue_id;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = end_time;
        }
        validate::time_range(self.start_time, self.end_time)?;
        if patch.capacity.is_some() {
            self.capacity = patch.capacity;
        }
        if let Some(price_cents) = patch.price_cents {
            self.price_cents = price_cents;
        }
        if patch.image_url.is_some() {
            self.image_url = validate::optional(patch.image_url);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// A user's answer to an event invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    /// Will attend.
    Going,
    /// Might attend.
    Interested,
    /// Will not attend.
    NotGoing,
}

impl RsvpStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Going => "going",
            Self::Interested => "interested",
            Self::NotGoing => "not_going",
        }
    }
}

/// One user's RSVP to one event. At most one per `(event_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResponse {
    /// Primary key.
    pub id: Uuid,
    /// Event answered.
    pub event_id: Uuid,
    /// Responding user.
    pub user_id: Uuid,
    /// Answer.
    pub status: RsvpStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change of answer.
    pub updated_at: DateTime<Utc>,
}

impl_record!(EventResponse, "event_responses", "Event response");

/// Create payload for [`EventResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct EventResponseDraft {
    /// Event answered.
    pub event_id: Uuid,
    /// Responding user.
    pub user_id: Uuid,
    /// Answer.
    pub status: RsvpStatus,
}

/// Update payload for [`EventResponse`]; only the answer can change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventResponsePatch {
    /// New answer.
    pub status: Option<RsvpStatus>,
}

impl Resource for EventResponse {
    type Draft = EventResponseDraft;
    type Patch = EventResponsePatch;

    fn from_draft(
        id: Uuid,
        draft: EventResponseDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            event_id: draft.event_id,
            user_id: draft.user_id,
            status: draft.status,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(
        &mut self,
        patch: EventResponsePatch,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(start: DateTime<Utc>, end: DateTime<Utc>) -> EventDraft {
        EventDraft {
            title: "Rust Meetup".into(),
            description: " Talks and pizza ".into(),
            category: None,
            location: "Berlin".into(),
            venue_id: None,
            organizer_id: None,
            start_time: start,
            end_time: end,
            capacity: Some(80),
            price_cents: 0,
            image_url: None,
            status: EventStatus::Published,
        }
    }

    #[test]
    fn test_from_draft_defaults_category() {
        let now = Utc::now();
        let event = Event::from_draft(Uuid::new_v4(), draft(now, now + Duration::hours(2)), now)
            .expect("valid draft");
        assert_eq!(event.category, "general");
        assert_eq!(event.description, "Talks and pizza");
        assert_eq!(event.status, EventStatus::Published);
    }

    #[test]
    fn test_from_draft_rejects_inverted_times() {
        let now = Utc::now();
        let err = Event::from_draft(Uuid::new_v4(), draft(now, now - Duration::hours(1)), now);
        assert_eq!(err, Err(ValidationError::EndBeforeStart));
    }

    #[test]
    fn test_patch_checks_range_against_existing_times() {
        let now = Utc::now();
        let mut event =
            Event::from_draft(Uuid::new_v4(), draft(now, now + Duration::hours(2)), now)
                .expect("valid draft");
        let err = event.apply_patch(
            EventPatch {
                end_time: Some(now - Duration::hours(1)),
                ..EventPatch::default()
            },
            now,
        );
        assert_eq!(err, Err(ValidationError::EndBeforeStart));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(RsvpStatus::NotGoing).ok(),
            Some(serde_json::json!("not_going"))
        );
        assert_eq!(RsvpStatus::NotGoing.as_str(), "not_going");
        assert_eq!(
            serde_json::from_str::<EventStatus>("\"cancelled\"").ok(),
            Some(EventStatus::Cancelled)
        );
    }
}
