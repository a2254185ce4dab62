//! Stall type administration endpoints.

use super::json_body;
use crate::error::AppError;
use crate::extractors::{Principal, RequireAdmin};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use nativenest_core::registry::StallRegistry;
use nativenest_core::types::{
    EventId, NewStallType, StallType, StallTypeAvailability, StallTypeId, StallTypeListing,
};
use serde::Deserialize;

// ============================================================================
// Request Types
// ============================================================================

/// Body for creating or updating a stall type.
///
/// Fields are optional so that a missing field is reported as a validation
/// error naming the field.
#[derive(Debug, Deserialize)]
pub struct StallTypeRequest {
    /// Display name
    pub name: Option<String>,
    /// Declared quantity
    pub no_of_stalls: Option<i64>,
    /// Price per stall in minor units
    pub stall_price: Option<i64>,
}

impl StallTypeRequest {
    fn into_input(self) -> Result<NewStallType, AppError> {
        let name = self
            .name
            .ok_or_else(|| AppError::validation("name is required"))?;
        let quantity = self
            .no_of_stalls
            .ok_or_else(|| AppError::validation("no_of_stalls is required"))?;
        let price = self
            .stall_price
            .ok_or_else(|| AppError::validation("stall_price is required"))?;

        Ok(NewStallType::new(name, quantity, price))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a stall type and seed its stalls.
///
/// `POST /api/events/:event_id/stall-types`
pub async fn create_stall_type<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    RequireAdmin(admin): RequireAdmin,
    Path(event_id): Path<i64>,
    body: Result<Json<StallTypeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StallType>), AppError> {
    let input = json_body(body)?.into_input()?;
    tracing::debug!(admin_id = admin.id, event_id, "Creating stall type");

    let stall_type = state
        .registry
        .create_stall_type(EventId::new(event_id), &input)
        .await?;

    Ok((StatusCode::CREATED, Json(stall_type)))
}

/// List an event's stall types.
///
/// `GET /api/events/:event_id/stall-types`
pub async fn list_stall_types<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    RequireAdmin(_): RequireAdmin,
    Path(event_id): Path<i64>,
) -> Result<Json<StallTypeListing>, AppError> {
    let listing = state
        .registry
        .list_stall_types(EventId::new(event_id))
        .await?;
    Ok(Json(listing))
}

/// Update a stall type.
///
/// `PUT /api/events/:event_id/stall-types/:stall_type_id`
pub async fn update_stall_type<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    RequireAdmin(_): RequireAdmin,
    Path((event_id, stall_type_id)): Path<(i64, i64)>,
    body: Result<Json<StallTypeRequest>, JsonRejection>,
) -> Result<Json<StallType>, AppError> {
    let input = json_body(body)?.into_input()?;

    let stall_type = state
        .registry
        .update_stall_type(
            EventId::new(event_id),
            StallTypeId::new(stall_type_id),
            &input,
        )
        .await?;

    Ok(Json(stall_type))
}

/// Delete a stall type.
///
/// `DELETE /api/events/:event_id/stall-types/:stall_type_id`
pub async fn delete_stall_type<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    RequireAdmin(_): RequireAdmin,
    Path((event_id, stall_type_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    state
        .registry
        .delete_stall_type(EventId::new(event_id), StallTypeId::new(stall_type_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Live availability per stall type; open to any authenticated caller.
///
/// `GET /api/events/:event_id/availability`
pub async fn list_availability<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    _principal: Principal,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<StallTypeAvailability>>, AppError> {
    let availability = state
        .registry
        .list_availability(EventId::new(event_id))
        .await?;
    Ok(Json(availability))
}
