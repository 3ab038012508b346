//! Ready-made drafts for tests.
//!
//! Each helper returns a valid draft; tweak fields with struct update syntax.

use chrono::{DateTime, Duration, Utc};
use eventmingle_core::entities::{
    ChatDraft, ClientDraft, ClientStatus, EventDraft, EventStatus, PaymentDraft, PaymentStatus,
    Role, TicketDraft, TicketStatus, UserDraft, VenueDraft,
};
use uuid::Uuid;

/// A published two-hour event starting at `start`.
#[must_use]
pub fn event_draft_at(title: &str, start: DateTime<Utc>) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        description: format!("{title} description"),
        category: Some("tech".to_string()),
        location: "Community Hall, Lisbon".to_string(),
        venue_id: None,
        organizer_id: None,
        start_time: start,
        end_time: start + Duration::hours(2),
        capacity: Some(100),
        price_cents: 0,
        image_url: None,
        status: EventStatus::Published,
    }
}

/// A published event on 2025-02-01 18:00 UTC.
#[must_use]
pub fn event_draft(title: &str) -> EventDraft {
    event_draft_at(
        title,
        DateTime::from_timestamp(1_738_432_800, 0).unwrap_or_default(),
    )
}

/// A user with the given role and no password.
#[must_use]
pub fn user_draft(name: &str, email: &str, role: Role) -> UserDraft {
    UserDraft {
        name: name.to_string(),
        email: email.to_string(),
        role,
        avatar_url: None,
        bio: None,
        interests: Vec::new(),
        password: None,
    }
}

/// A venue in Lisbon.
#[must_use]
pub fn venue_draft(name: &str) -> VenueDraft {
    VenueDraft {
        name: name.to_string(),
        address: "Rua Augusta 1".to_string(),
        city: "Lisbon".to_string(),
        capacity: 250,
        amenities: vec!["wifi".to_string()],
        contact_email: Some("bookings@venue.example".to_string()),
    }
}

/// A chat between `participants`.
#[must_use]
pub fn chat_draft(name: &str, participants: &[Uuid]) -> ChatDraft {
    ChatDraft {
        name: name.to_string(),
        is_group: None,
        participant_ids: participants.to_vec(),
        event_id: None,
    }
}

/// A sold ticket for `event_id`.
#[must_use]
pub fn sold_ticket_draft(event_id: Uuid, price_cents: u64) -> TicketDraft {
    TicketDraft {
        event_id,
        holder_id: None,
        ticket_type: Some("general".to_string()),
        price_cents,
        status: TicketStatus::Sold,
    }
}

/// A completed card payment.
#[must_use]
pub fn payment_draft(amount_cents: u64, status: PaymentStatus) -> PaymentDraft {
    PaymentDraft {
        amount_cents,
        currency: Some("USD".to_string()),
        method: "card".to_string(),
        status,
        ticket_id: None,
        client_id: None,
    }
}

/// An active client.
#[must_use]
pub fn client_draft(name: &str, email: &str) -> ClientDraft {
    ClientDraft {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        company: Some("Acme Events".to_string()),
        status: ClientStatus::Active,
    }
}
