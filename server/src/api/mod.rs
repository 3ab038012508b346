//! REST resources.
//!
//! Every resource is mounted at `/api/<collection>` with the same five
//! routes:
//!
//! | verb   | path   | result                                   |
//! |--------|--------|------------------------------------------|
//! | GET    | `/`    | `{items, total, page, page_size}`         |
//! | POST   | `/`    | 201 created entity                       |
//! | GET    | `/:id` | entity / 404                             |
//! | PUT    | `/:id` | updated entity / 404                     |
//! | DELETE | `/:id` | removed entity / 404                     |
//!
//! Access is declared per resource through [`ApiResource::ACCESS`] and
//! enforced by the [`CanRead`] / [`CanWrite`] extractors before the body is
//! read. Domain-specific routes live in the submodules:
//! - `events`: RSVPs and calendar export
//! - `chats`: participant-only chat access, message history and posting
//! - `event_responses`: RSVPs that only their owner (or staff) may change
//! - `users`: account creation and removal that keep credentials in sync

pub mod chats;
pub mod event_responses;
pub mod events;
pub mod users;

use crate::auth::{AccessPolicy, Gate, MaybeSessionUser, SessionUser};
use crate::metrics;
use crate::server::state::AppState;
use axum::{
    Json, Router, async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    routing::get,
};
use eventmingle_core::entities::{
    Analytics, Chat, Client, Event, EventResponse, Integration, Payment, Staff, Ticket,
    Transaction, User, Venue, Workflow,
};
use eventmingle_core::{Filter, ListQuery, Resource};
use eventmingle_web::{AppError, JsonBody, WebResult};
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;
use uuid::Uuid;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page size a client may ask for.
pub const MAX_PAGE_SIZE: usize = 100;

/// A record exposed as a REST resource.
pub trait ApiResource: Resource {
    /// Who may read and who may write.
    const ACCESS: AccessPolicy;
    /// Fields accepted as equality filters on the list route.
    const FILTERS: &'static [&'static str];
}

macro_rules! api_resource {
    ($ty:ty, $access:expr, [$($filter:literal),* $(,)?]) => {
        impl ApiResource for $ty {
            const ACCESS: AccessPolicy = $access;
            const FILTERS: &'static [&'static str] = &[$($filter),*];
        }
    };
}

api_resource!(Event, AccessPolicy::CATALOGUE, ["status", "category", "organizer_id", "venue_id"]);
api_resource!(Venue, AccessPolicy::CATALOGUE, ["city"]);
api_resource!(Ticket, AccessPolicy::BACK_OFFICE, ["event_id", "status", "holder_id"]);
api_resource!(Staff, AccessPolicy::BACK_OFFICE, ["status"]);
api_resource!(Client, AccessPolicy::BACK_OFFICE, ["status"]);
api_resource!(Payment, AccessPolicy::BACK_OFFICE, ["status"]);
api_resource!(Transaction, AccessPolicy::BACK_OFFICE, ["kind"]);
api_resource!(Workflow, AccessPolicy::BACK_OFFICE, []);
api_resource!(Integration, AccessPolicy::BACK_OFFICE, ["status"]);
api_resource!(Analytics, AccessPolicy::BACK_OFFICE, ["metric"]);
api_resource!(User, AccessPolicy::ADMIN_ONLY, ["role"]);
api_resource!(Chat, AccessPolicy::MEMBERS, ["event_id"]);
api_resource!(EventResponse, AccessPolicy::MEMBERS, ["event_id", "user_id"]);

/// Passed the resource's gate. `WRITE` selects the write gate.
///
/// Gates that need a session reject a bad token with its own reason
/// (invalid, expired); public gates treat it as anonymous.
#[derive(Debug)]
pub struct Authorized<R, const WRITE: bool> {
    /// The caller, if signed in.
    pub session: Option<SessionUser>,
    _resource: PhantomData<fn() -> R>,
}

/// Passed `R`'s read gate.
pub type CanRead<R> = Authorized<R, false>;

/// Passed `R`'s write gate.
pub type CanWrite<R> = Authorized<R, true>;

#[async_trait]
impl<R, const WRITE: bool> FromRequestParts<AppState> for Authorized<R, WRITE>
where
    R: ApiResource,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let gate = if WRITE { R::ACCESS.write } else { R::ACCESS.read };
        let session = if gate == Gate::Public {
            MaybeSessionUser::from_request_parts(parts, state).await?.0
        } else {
            Some(SessionUser::from_request_parts(parts, state).await?)
        };
        gate.check(session.as_ref())?;

        Ok(Self {
            session,
            _resource: PhantomData,
        })
    }
}

/// `:id` path segment. A malformed id is a 400 with the JSON error body.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

/// One page of a list.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Records matching the filters, across all pages.
    pub total: u64,
    /// Page number (0-indexed).
    pub page: usize,
    /// Page size.
    pub page_size: usize,
}

/// Pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// Page number (0-indexed, default 0)
    pub page: usize,
    /// Page size (default 20, capped at 100)
    pub page_size: usize,
}

impl Paging {
    /// Read `page` and `page_size` from query parameters.
    ///
    /// # Errors
    ///
    /// 400 when either is not a number, `page_size` is zero, or the page
    /// starts beyond the largest offset a store can take (`i64::MAX`).
    pub fn from_params(params: &HashMap<String, String>) -> WebResult<Self> {
        let page = number(params, "page")?.unwrap_or(0);
        let page_size = match number(params, "page_size")? {
            Some(0) => return Err(AppError::bad_request("page_size must be at least 1")),
            Some(size) => size.min(MAX_PAGE_SIZE),
            None => DEFAULT_PAGE_SIZE,
        };
        page.checked_mul(page_size)
            .and_then(|offset| i64::try_from(offset).ok())
            .ok_or_else(|| AppError::bad_request("page is out of range"))?;
        Ok(Self { page, page_size })
    }

    /// Records to skip.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.page.saturating_mul(self.page_size)
    }
}

fn number(params: &HashMap<String, String>, key: &str) -> WebResult<Option<usize>> {
    params
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .map_err(|_| AppError::bad_request(format!("{key} must be a non-negative integer")))
        })
        .transpose()
}

/// Equality filters for `R` taken from query parameters. Unknown keys are ignored.
#[must_use]
pub fn filters_for<R: ApiResource>(params: &HashMap<String, String>) -> Vec<Filter> {
    R::FILTERS
        .iter()
        .filter_map(|field| params.get(*field).map(|value| Filter::eq(*field, value)))
        .collect()
}

/// `GET /` - list with paging and filters.
///
/// # Errors
///
/// 400 bad paging, 401/403 per read gate, 500 store failure.
pub async fn list<R: ApiResource>(
    State(state): State<AppState>,
    _access: CanRead<R>,
    Query(params): Query<HashMap<String, String>>,
) -> WebResult<Json<Page<R>>> {
    let paging = Paging::from_params(&params)?;
    let filters = filters_for::<R>(&params);
    let query = ListQuery {
        filters: filters.clone(),
        ..ListQuery::default()
    }
    .page(paging.offset(), paging.page_size);

    let collection = state.collection::<R>();
    let (items, total) = tokio::try_join!(collection.list(&query), collection.count(&filters))
        .map_err(|e| AppError::store("list", R::NAME, e))?;

    Ok(Json(Page {
        items,
        total,
        page: paging.page,
        page_size: paging.page_size,
    }))
}

/// `GET /:id`.
///
/// # Errors
///
/// 404 unknown id, 401/403 per read gate, 500 store failure.
pub async fn fetch<R: ApiResource>(
    State(state): State<AppState>,
    _access: CanRead<R>,
    RecordId(id): RecordId,
) -> WebResult<Json<R>> {
    load::<R>(&state, id).await.map(Json)
}

/// `POST /`.
///
/// # Errors
///
/// 400 invalid payload or unique conflict, 401/403 per write gate, 500 store failure.
pub async fn create<R: ApiResource>(
    State(state): State<AppState>,
    access: CanWrite<R>,
    JsonBody(draft): JsonBody<R::Draft>,
) -> WebResult<(StatusCode, Json<R>)> {
    let record = insert::<R>(&state, access.session.as_ref(), draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `PUT /:id`.
///
/// # Errors
///
/// 404 unknown id, 400 invalid patch, 401/403 per write gate, 500 store failure.
pub async fn update<R: ApiResource>(
    State(state): State<AppState>,
    _access: CanWrite<R>,
    RecordId(id): RecordId,
    JsonBody(patch): JsonBody<R::Patch>,
) -> WebResult<Json<R>> {
    apply_patch::<R>(&state, id, patch).await.map(Json)
}

/// `DELETE /:id` - answers with the removed record.
///
/// # Errors
///
/// 404 unknown id, 401/403 per write gate, 500 store failure.
pub async fn remove<R: ApiResource>(
    State(state): State<AppState>,
    _access: CanWrite<R>,
    RecordId(id): RecordId,
) -> WebResult<Json<R>> {
    delete::<R>(&state, id).await.map(Json)
}

/// Load one record, 404 when missing.
///
/// # Errors
///
/// 404 unknown id, 500 store failure.
pub async fn load<R: ApiResource>(state: &AppState, id: Uuid) -> WebResult<R> {
    state
        .collection::<R>()
        .get(id)
        .await
        .map_err(|e| AppError::store("fetch", R::NAME, e))?
        .ok_or_else(|| AppError::not_found(R::NAME, id))
}

/// Create a record on behalf of `actor`.
///
/// # Errors
///
/// 400 invalid payload or unique conflict, 500 store failure.
pub async fn insert<R: ApiResource>(
    state: &AppState,
    actor: Option<&SessionUser>,
    draft: R::Draft,
) -> WebResult<R> {
    let record = state
        .collection::<R>()
        .create(draft)
        .await
        .map_err(|e| AppError::write("create", R::NAME, e))?;

    tracing::info!(
        resource = R::COLLECTION,
        id = %record.id(),
        actor = ?actor.map(SessionUser::id),
        "Record created"
    );
    metrics::record_created(R::COLLECTION);
    Ok(record)
}

/// Apply `patch` to the record with `id`.
///
/// # Errors
///
/// 404 unknown id, 400 invalid patch, 500 store failure.
pub async fn apply_patch<R: ApiResource>(state: &AppState, id: Uuid, patch: R::Patch) -> WebResult<R> {
    let record = state
        .collection::<R>()
        .update(id, patch)
        .await
        .map_err(|e| AppError::write("update", R::NAME, e))?
        .ok_or_else(|| AppError::not_found(R::NAME, id))?;

    tracing::debug!(resource = R::COLLECTION, %id, "Record updated");
    Ok(record)
}

/// Delete the record with `id` and hand it back.
///
/// # Errors
///
/// 404 unknown id, 500 store failure.
pub async fn delete<R: ApiResource>(state: &AppState, id: Uuid) -> WebResult<R> {
    let record = state
        .collection::<R>()
        .delete(id)
        .await
        .map_err(|e| AppError::store("delete", R::NAME, e))?
        .ok_or_else(|| AppError::not_found(R::NAME, id))?;

    tracing::info!(resource = R::COLLECTION, %id, "Record deleted");
    metrics::record_deleted(R::COLLECTION);
    Ok(record)
}

/// The five standard routes for `R`.
pub fn resource_routes<R: ApiResource>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/:id", get(fetch::<R>).put(update::<R>).delete(remove::<R>))
}

/// Every REST resource, nested under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/events", events::routes())
        .nest("/api/venues", resource_routes::<Venue>())
        .nest("/api/tickets", resource_routes::<Ticket>())
        .nest("/api/staff", resource_routes::<Staff>())
        .nest("/api/clients", resource_routes::<Client>())
        .nest("/api/payments", resource_routes::<Payment>())
        .nest("/api/transactions", resource_routes::<Transaction>())
        .nest("/api/workflows", resource_routes::<Workflow>())
        .nest("/api/integrations", resource_routes::<Integration>())
        .nest("/api/analytics", resource_routes::<Analytics>())
        .nest("/api/users", users::routes())
        .nest("/api/chats", chats::routes())
        .nest("/api/event_responses", event_responses::routes())
}
