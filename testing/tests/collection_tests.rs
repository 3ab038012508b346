//! Tests for the typed record layer running over the in-memory store.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use chrono::Duration;
use eventmingle_core::entities::{Event, EventPatch, EventStatus, Role, User, UserPatch};
use eventmingle_core::{Collection, Filter, ListQuery, ValidationError, WriteError};
use eventmingle_testing::{InMemoryRecordStore, fixtures, test_clock};
use std::sync::Arc;

fn events() -> (Collection<Event>, Arc<eventmingle_testing::FixedClock>) {
    let clock = Arc::new(test_clock());
    let collection = Collection::new(Arc::new(InMemoryRecordStore::new()), clock.clone());
    (collection, clock)
}

#[tokio::test]
async fn test_create_then_get_reflects_write() {
    let (events, _) = events();
    let created = events.create(fixtures::event_draft("Meetup")).await.unwrap();

    let fetched = events.get(created.id).await.unwrap().expect("stored");
    assert_eq!(fetched, created);
    assert_eq!(fetched.created_at, events.now());
}

#[tokio::test]
async fn test_update_stamps_updated_at_and_keeps_created_at() {
    let (events, clock) = events();
    let created = events.create(fixtures::event_draft("Meetup")).await.unwrap();

    clock.advance(Duration::minutes(5));
    let updated = events
        .update(
            created.id,
            EventPatch {
                status: Some(EventStatus::Cancelled),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap()
        .expect("exists");

    assert_eq!(updated.status, EventStatus::Cancelled);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.updated_at - created.updated_at, Duration::minutes(5));
    assert_eq!(events.get(created.id).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn test_invalid_patch_leaves_stored_record_untouched() {
    let (events, _) = events();
    let created = events.create(fixtures::event_draft("Meetup")).await.unwrap();

    let result = events
        .update(
            created.id,
            EventPatch {
                title: Some("Renamed".into()),
                end_time: Some(created.start_time - Duration::hours(1)),
                ..EventPatch::default()
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(WriteError::Validation(ValidationError::EndBeforeStart))
    ));
    assert_eq!(events.get(created.id).await.unwrap(), Some(created));
}

#[tokio::test]
async fn test_update_and_delete_missing_return_none() {
    let (events, _) = events();
    let id = uuid::Uuid::new_v4();
    assert!(events.update(id, EventPatch::default()).await.unwrap().is_none());
    assert!(events.delete(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_removes_record() {
    let (events, _) = events();
    let created = events.create(fixtures::event_draft("Meetup")).await.unwrap();

    let removed = events.delete(created.id).await.unwrap();
    assert_eq!(removed.map(|e| e.id), Some(created.id));
    assert!(events.get(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_filters_and_counts() {
    let (events, _) = events();
    events.create(fixtures::event_draft("A")).await.unwrap();
    let mut draft = fixtures::event_draft("B");
    draft.status = EventStatus::Draft;
    events.create(draft).await.unwrap();
    events.create(fixtures::event_draft("C")).await.unwrap();

    let published = events
        .list(&ListQuery::all().filter("status", "published"))
        .await
        .unwrap();
    let titles: Vec<_> = published.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["C", "A"]);

    assert_eq!(events.count(&[]).await.unwrap(), 3);
    assert!(events.exists(&[Filter::eq("title", "B")]).await.unwrap());
    assert!(!events.exists(&[Filter::eq("title", "Z")]).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_email_is_a_store_conflict() {
    let clock = Arc::new(test_clock());
    let users: Collection<User> = Collection::new(Arc::new(InMemoryRecordStore::new()), clock);
    let ada = users
        .create(fixtures::user_draft("Ada", "ada@example.com", Role::User))
        .await
        .unwrap();

    let dup = users
        .create(fixtures::user_draft("Other", "ADA@example.com", Role::User))
        .await;
    assert!(matches!(dup, Err(WriteError::Store(_))));

    let promoted = users
        .update(
            ada.id,
            UserPatch {
                role: Some(Role::EventManager),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap()
        .expect("exists");
    assert_eq!(promoted.role, Role::EventManager);
}
