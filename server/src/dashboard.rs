//! Admin and event-manager dashboards.
//!
//! Both dashboards are JSON payloads. The API routes (`/api/admin/overview`,
//! `/api/manager/overview`) answer 401/403 like every other resource; the
//! page routes (`/admin`, `/manager`) serve the same payloads behind the
//! page gate, which redirects to the login page instead.

use crate::auth::SessionUser;
use crate::auth::middleware::{ADMIN, Gate, STAFF};
use crate::server::state::AppState;
use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use eventmingle_core::entities::{
    Analytics, Event, EventResponse, EventStatus, Payment, PaymentStatus, RsvpStatus, Ticket,
    TicketStatus, User,
};
use eventmingle_core::{Filter, ListQuery, StoreError};
use eventmingle_web::{AppError, WebResult};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Analytics metric charted on both dashboards.
pub const PAGE_VIEWS_METRIC: &str = "page_views";

/// Days covered by the chart.
pub const CHART_DAYS: i64 = 7;

/// Shown while no page views have been recorded for the window.
const PLACEHOLDER_PAGE_VIEWS: [f64; 7] = [120.0, 180.0, 150.0, 220.0, 260.0, 240.0, 310.0];

/// One day of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// UTC day.
    pub date: NaiveDate,
    /// Sum of the day's values.
    pub value: f64,
}

/// Daily series of one analytics metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Metric name.
    pub metric: String,
    /// `true` when no data was recorded and the points are sample values.
    pub placeholder: bool,
    /// One point per day, oldest first.
    pub points: Vec<ChartPoint>,
}

/// Platform-wide numbers.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    /// Registered users.
    pub users: u64,
    /// All events.
    pub events: u64,
    /// Published events.
    pub published_events: u64,
    /// Tickets with status `sold`.
    pub tickets_sold: u64,
    /// Completed payment totals in minor units, per currency.
    pub revenue_cents: BTreeMap<String, u64>,
    /// Page views over the last week.
    pub page_views: ChartSeries,
}

/// RSVP and sales figures of one organized event.
#[derive(Debug, Clone, Serialize)]
pub struct ManagedEvent {
    /// Event id.
    pub id: Uuid,
    /// Event title.
    pub title: String,
    /// Start time.
    pub start_time: DateTime<Utc>,
    /// Lifecycle status.
    pub status: EventStatus,
    /// `going` answers.
    pub going: u64,
    /// `interested` answers.
    pub interested: u64,
    /// `not_going` answers.
    pub not_going: u64,
    /// Tickets sold.
    pub tickets_sold: u64,
}

/// The caller's organized events.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerOverview {
    /// Events the caller organizes, newest first.
    pub events: Vec<ManagedEvent>,
    /// All RSVPs across those events.
    pub total_rsvps: u64,
    /// Tickets sold across those events.
    pub tickets_sold: u64,
    /// Page views over the last week.
    pub page_views: ChartSeries,
}

/// Dashboard routes: `/api/admin/overview`, `/api/manager/overview`, and
/// the gated pages `/admin` and `/manager`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/overview", get(admin_overview))
        .route("/api/manager/overview", get(manager_overview))
        .route("/admin", get(admin_page))
        .route("/manager", get(manager_page))
}

fn load_failed(err: StoreError) -> AppError {
    AppError::store("load", "Dashboard", err)
}

/// `GET /api/admin/overview` (admin).
///
/// # Errors
///
/// 401/403 for other callers, 500 when the store fails.
pub async fn admin_overview(
    State(state): State<AppState>,
    session: SessionUser,
) -> WebResult<Json<AdminOverview>> {
    Gate::Roles(ADMIN).check(Some(&session))?;
    Ok(Json(build_admin_overview(&state).await?))
}

/// `GET /api/manager/overview` (event manager or admin).
///
/// # Errors
///
/// 401/403 for other callers, 500 when the store fails.
pub async fn manager_overview(
    State(state): State<AppState>,
    session: SessionUser,
) -> WebResult<Json<ManagerOverview>> {
    Gate::Roles(STAFF).check(Some(&session))?;
    Ok(Json(build_manager_overview(&state, session.id()).await?))
}

/// `GET /admin`; access is enforced by the page gate.
///
/// # Errors
///
/// 500 when the store fails.
pub async fn admin_page(
    State(state): State<AppState>,
    _session: SessionUser,
) -> WebResult<Json<AdminOverview>> {
    Ok(Json(build_admin_overview(&state).await?))
}

/// `GET /manager`; access is enforced by the page gate.
///
/// # Errors
///
/// 500 when the store fails.
pub async fn manager_page(
    State(state): State<AppState>,
    session: SessionUser,
) -> WebResult<Json<ManagerOverview>> {
    Ok(Json(build_manager_overview(&state, session.id()).await?))
}

/// Assemble the admin dashboard.
///
/// # Errors
///
/// 500 when the store fails.
pub async fn build_admin_overview(state: &AppState) -> WebResult<AdminOverview> {
    let users = state.collection::<User>();
    let events = state.collection::<Event>();
    let tickets = state.collection::<Ticket>();
    let payments = state.collection::<Payment>();

    let published = [Filter::eq("status", EventStatus::Published.as_str())];
    let sold = [Filter::eq("status", TicketStatus::Sold.as_str())];
    let completed = ListQuery::all().filter("status", PaymentStatus::Completed.as_str());

    let (user_count, event_count, published_events, tickets_sold, completed_payments) = tokio::try_join!(
        users.count(&[]),
        events.count(&[]),
        events.count(&published),
        tickets.count(&sold),
        payments.list(&completed),
    )
    .map_err(load_failed)?;

    Ok(AdminOverview {
        users: user_count,
        events: event_count,
        published_events,
        tickets_sold,
        revenue_cents: revenue_by_currency(completed_payments),
        page_views: page_views(state).await?,
    })
}

/// Sum payment amounts per currency. Totals saturate at `u64::MAX`.
fn revenue_by_currency(payments: impl IntoIterator<Item = Payment>) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for payment in payments {
        let total: &mut u64 = totals.entry(payment.currency).or_default();
        *total = total.saturating_add(payment.amount_cents);
    }
    totals
}

/// Assemble the event-manager dashboard for `organizer_id`.
///
/// # Errors
///
/// 500 when the store fails.
pub async fn build_manager_overview(
    state: &AppState,
    organizer_id: Uuid,
) -> WebResult<ManagerOverview> {
    let organized = state
        .collection::<Event>()
        .list(&ListQuery::all().filter("organizer_id", organizer_id))
        .await
        .map_err(load_failed)?;

    let responses = state.collection::<EventResponse>();
    let tickets = state.collection::<Ticket>();
    let mut events = Vec::with_capacity(organized.len());
    for event in organized {
        let answered = |status: RsvpStatus| {
            [
                Filter::eq("event_id", event.id),
                Filter::eq("status", status.as_str()),
            ]
        };
        let sold = [
            Filter::eq("event_id", event.id),
            Filter::eq("status", TicketStatus::Sold.as_str()),
        ];
        let going = answered(RsvpStatus::Going);
        let interested = answered(RsvpStatus::Interested);
        let not_going = answered(RsvpStatus::NotGoing);

        let (going, interested, not_going, tickets_sold) = tokio::try_join!(
            responses.count(&going),
            responses.count(&interested),
            responses.count(&not_going),
            tickets.count(&sold),
        )
        .map_err(load_failed)?;

        events.push(ManagedEvent {
            id: event.id,
            title: event.title,
            start_time: event.start_time,
            status: event.status,
            going,
            interested,
            not_going,
            tickets_sold,
        });
    }

    Ok(ManagerOverview {
        total_rsvps: events
            .iter()
            .map(|e| e.going + e.interested + e.not_going)
            .sum(),
        tickets_sold: events.iter().map(|e| e.tickets_sold).sum(),
        events,
        page_views: page_views(state).await?,
    })
}

async fn page_views(state: &AppState) -> WebResult<ChartSeries> {
    let rows = state
        .collection::<Analytics>()
        .list(&ListQuery::all().filter("metric", PAGE_VIEWS_METRIC))
        .await
        .map_err(load_failed)?;
    Ok(daily_series(PAGE_VIEWS_METRIC, &rows, state.clock.now()))
}

/// Sum `rows` per UTC day over the [`CHART_DAYS`] days ending at `now`.
///
/// Days without rows are zero. When the window holds no rows at all the
/// series is a fixed placeholder, flagged as such.
#[must_use]
pub fn daily_series(metric: &str, rows: &[Analytics], now: DateTime<Utc>) -> ChartSeries {
    let today = now.date_naive();
    let days: Vec<NaiveDate> = (0..CHART_DAYS)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect();
    let first = days.first().copied().unwrap_or(today);

    let mut totals: BTreeMap<NaiveDate, f64> = days.iter().map(|day| (*day, 0.0)).collect();
    let mut seen = false;
    for row in rows {
        let day = row.recorded_at.date_naive();
        if day < first || day > today {
            continue;
        }
        if let Some(total) = totals.get_mut(&day) {
            *total += row.value;
            seen = true;
        }
    }

    let points = if seen {
        totals
            .into_iter()
            .map(|(date, value)| ChartPoint { date, value })
            .collect()
    } else {
        days.iter()
            .zip(PLACEHOLDER_PAGE_VIEWS)
            .map(|(date, value)| ChartPoint { date: *date, value })
            .collect()
    };

    ChartSeries {
        metric: metric.to_string(),
        placeholder: !seen,
        points,
    }
}
