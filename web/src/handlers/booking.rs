//! Stall booking endpoints.

use super::EventFilter;
use crate::error::AppError;
use crate::extractors::{RequireAdmin, RequireBuilder};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nativenest_core::registry::StallRegistry;
use nativenest_core::types::{EventId, InterestRecord, Stall, StallBooking, StallTypeId};

/// Book one free stall of a type for the calling builder.
///
/// `POST /api/events/:event_id/stall-types/:stall_type_id/book`
///
/// The builder is always the authenticated principal; a sold-out type
/// answers 409 `SOLD_OUT`.
pub async fn book_stall<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    RequireBuilder(builder_id): RequireBuilder,
    Path((event_id, stall_type_id)): Path<(i64, i64)>,
) -> Result<(StatusCode, Json<Stall>), AppError> {
    let stall = state
        .registry
        .book_stall(
            EventId::new(event_id),
            StallTypeId::new(stall_type_id),
            builder_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(stall)))
}

/// All booked stalls of an event.
///
/// `GET /api/events/:event_id/bookings`
pub async fn list_bookings<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    RequireAdmin(_): RequireAdmin,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<StallBooking>>, AppError> {
    let bookings = state.registry.list_bookings(EventId::new(event_id)).await?;
    Ok(Json(bookings))
}

/// The calling builder's stalls.
///
/// `GET /api/builder/bookings?event_id=`
pub async fn list_builder_bookings<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    RequireBuilder(builder_id): RequireBuilder,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<StallBooking>>, AppError> {
    let bookings = state
        .registry
        .list_builder_bookings(builder_id, filter.event_id.map(EventId::new))
        .await?;
    Ok(Json(bookings))
}

/// Buyer interest in the stall types where the calling builder holds a stall.
///
/// `GET /api/builder/interests?event_id=`
pub async fn list_builder_interests<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    RequireBuilder(builder_id): RequireBuilder,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<InterestRecord>>, AppError> {
    let interests = state
        .registry
        .list_builder_interests(builder_id, filter.event_id.map(EventId::new))
        .await?;
    Ok(Json(interests))
}
