//! Domain entities.
//!
//! Every entity is a flat JSON document with an `id`, `created_at` and
//! `updated_at`. Relationships are plain id fields; the schema does not
//! enforce foreign keys.

/// Implement [`Record`](crate::Record) for a struct with an `id: Uuid` field.
macro_rules! impl_record {
    ($ty:ty, $collection:literal, $name:literal) => {
        impl $crate::record::Record for $ty {
            const COLLECTION: &'static str = $collection;
            const NAME: &'static str = $name;

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }
        }
    };
}
pub(crate) use impl_record;

mod analytics;
mod automation;
mod chat;
mod commerce;
mod crm;
mod event;
mod user;
mod venue;

pub use analytics::{Analytics, AnalyticsDraft, AnalyticsPatch};
pub use automation::{
    Integration, IntegrationDraft, IntegrationPatch, IntegrationStatus, Workflow, WorkflowDraft,
    WorkflowPatch, WorkflowStep,
};
pub use chat::{Chat, ChatDraft, ChatPatch, Message, MessageDraft};
pub use commerce::{
    Payment, PaymentDraft, PaymentPatch, PaymentStatus, Ticket, TicketDraft, TicketPatch,
    TicketStatus, Transaction, TransactionDraft, TransactionKind, TransactionPatch,
};
pub use crm::{
    Client, ClientDraft, ClientPatch, ClientStatus, Staff, StaffDraft, StaffPatch, StaffStatus,
};
pub use event::{
    Event, EventDraft, EventPatch, EventResponse, EventResponseDraft, EventResponsePatch,
    EventStatus, RsvpStatus,
};
pub use user::{Credential, Role, User, UserDraft, UserPatch};
pub use venue::{Venue, VenueDraft, VenuePatch};

/// Every collection the schema defines. Stores refuse any other name.
pub const KNOWN_COLLECTIONS: &[&str] = &[
    "users",
    "credentials",
    "events",
    "event_responses",
    "chats",
    "messages",
    "clients",
    "venues",
    "staff",
    "tickets",
    "payments",
    "transactions",
    "workflows",
    "integrations",
    "analytics",
];

/// Unique indexes declared by the schema, as `(collection, fields)`.
///
/// The Postgres migration creates these; the in-memory store emulates them.
pub const UNIQUE_INDEXES: &[(&str, &[&str])] = &[
    ("users", &["email"]),
    ("credentials", &["email"]),
    ("event_responses", &["event_id", "user_id"]),
];

/// Returns `true` if `collection` is part of the schema.
#[must_use]
pub fn is_known_collection(collection: &str) -> bool {
    KNOWN_COLLECTIONS.contains(&collection)
}
