//! HTTP request handlers.
//!
//! Handlers are generic over [`StallRegistry`](nativenest_core::StallRegistry)
//! and organised by area of the booking flow.

pub mod booking;
pub mod health;
pub mod interest;
pub mod stall_types;
pub mod stalls;

use crate::error::AppError;
use axum::{Json, extract::rejection::JsonRejection};
use serde::Deserialize;

pub use health::{health_check, readiness_check};

/// Unwrap a JSON body, reporting malformed input as a validation error.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

/// Optional `?event_id=` filter.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    /// Limit results to one event
    pub event_id: Option<i64>,
}
