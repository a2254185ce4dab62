//! Buyer interest registration and venue check-in.

use super::json_body;
use crate::error::AppError;
use crate::extractors::RequireBuyer;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use nativenest_core::registry::StallRegistry;
use nativenest_core::types::{BuyerStallInterest, EventId, StallId, StallTypeId};
use serde::{Deserialize, Serialize};

/// Result of an interest registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct InterestResponse {
    /// `false` when the buyer had already registered interest
    pub created: bool,
}

/// Register the calling buyer's interest in a stall type.
///
/// `POST /api/events/:event_id/stall-types/:stall_type_id/interest`
///
/// 201 for a new registration, 200 for a repeat.
pub async fn register_interest<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    RequireBuyer(buyer_id): RequireBuyer,
    Path((event_id, stall_type_id)): Path<(i64, i64)>,
) -> Result<(StatusCode, Json<InterestResponse>), AppError> {
    let created = state
        .registry
        .register_interest(buyer_id, EventId::new(event_id), StallTypeId::new(stall_type_id))
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(InterestResponse { created })))
}

/// Check-in body sent by the venue scanner.
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    /// Buyer's mobile number
    pub mobile_number: Option<String>,
}

/// Record a buyer's visit to a stall.
///
/// `POST /api/events/:event_id/stalls/:stall_id/check-in`
pub async fn check_in<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    Path((event_id, stall_id)): Path<(i64, i64)>,
    body: Result<Json<CheckInRequest>, JsonRejection>,
) -> Result<Json<BuyerStallInterest>, AppError> {
    let mobile_number = json_body(body)?
        .mobile_number
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::validation("mobile_number is required"))?;

    let interest = state
        .registry
        .check_in(EventId::new(event_id), StallId::new(stall_id), &mobile_number)
        .await?;

    Ok(Json(interest))
}
