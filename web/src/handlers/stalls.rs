//! Stall lookup for the venue QR scan.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use nativenest_core::registry::StallRegistry;
use nativenest_core::types::{StallDetail, StallId};

/// Stall detail: number, type name and booking builder.
///
/// `GET /api/stalls/:stall_id`
pub async fn get_stall<R: StallRegistry + 'static>(
    State(state): State<AppState<R>>,
    Path(stall_id): Path<i64>,
) -> Result<Json<StallDetail>, AppError> {
    let detail = state.registry.get_stall(StallId::new(stall_id)).await?;
    Ok(Json(detail))
}
