//! Read-only lookups: stall detail and booking/interest reports.

use crate::rows::{InterestRecordRow, StallDetailRow, db_error};
use crate::stall_types::get_event;
use nativenest_core::error::{Result, StallError};
use nativenest_core::types::{
    BuilderId, EventId, InterestRecord, StallBooking, StallDetail, StallId,
};
use sqlx::PgPool;

const STALL_DETAIL_SELECT: &str = "
    SELECT s.stall_id, s.event_id, s.stall_type_id, s.stall_number, s.builder_id, s.booked_at,
           st.name AS stall_type_name,
           b.company_name
    FROM stalls s
    LEFT JOIN stall_types st ON st.stall_type_id = s.stall_type_id
    LEFT JOIN builders b ON b.builder_id = s.builder_id";

/// Stall detail for the venue QR scan.
pub async fn stall(pool: &PgPool, stall_id: StallId) -> Result<StallDetail> {
    sqlx::query_as::<_, StallDetailRow>(&format!("{STALL_DETAIL_SELECT} WHERE s.stall_id = $1"))
        .bind(stall_id.get())
        .fetch_optional(pool)
        .await
        .map_err(db_error("Failed to load stall"))?
        .ok_or_else(|| StallError::not_found("Stall", stall_id))?
        .try_into()
}

/// Booked stalls of an event ordered by stall number.
pub async fn event_bookings(pool: &PgPool, event_id: EventId) -> Result<Vec<StallBooking>> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(db_error("Failed to acquire connection"))?;
    get_event(&mut conn, event_id).await?;

    let rows: Vec<StallDetailRow> = sqlx::query_as(&format!(
        "{STALL_DETAIL_SELECT}
         WHERE s.event_id = $1 AND s.builder_id IS NOT NULL
         ORDER BY s.stall_number"
    ))
    .bind(event_id.get())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error("Failed to list bookings"))?;

    rows.into_iter().map(StallBooking::try_from).collect()
}

/// Stalls held by a builder, newest event first.
pub async fn builder_bookings(
    pool: &PgPool,
    builder_id: BuilderId,
    event_id: Option<EventId>,
) -> Result<Vec<StallBooking>> {
    let rows: Vec<StallDetailRow> = sqlx::query_as(&format!(
        "{STALL_DETAIL_SELECT}
         WHERE s.builder_id = $1 AND ($2::BIGINT IS NULL OR s.event_id = $2)
         ORDER BY s.event_id DESC, s.stall_number"
    ))
    .bind(builder_id.get())
    .bind(event_id.map(EventId::get))
    .fetch_all(pool)
    .await
    .map_err(db_error("Failed to list builder bookings"))?;

    rows.into_iter().map(StallBooking::try_from).collect()
}

/// Buyer interest in stall types where the builder holds at least one stall.
pub async fn builder_interests(
    pool: &PgPool,
    builder_id: BuilderId,
    event_id: Option<EventId>,
) -> Result<Vec<InterestRecord>> {
    let rows: Vec<InterestRecordRow> = sqlx::query_as(
        "SELECT i.buyer_id, bu.name AS buyer_name, bu.mobile_number,
                i.event_id, i.stall_type_id, st.name AS stall_type_name,
                i.stall_id, i.is_attended
         FROM buyer_stall_interest i
         JOIN buyers bu ON bu.buyer_id = i.buyer_id
         JOIN stall_types st ON st.stall_type_id = i.stall_type_id
         WHERE ($2::BIGINT IS NULL OR i.event_id = $2)
           AND EXISTS (
               SELECT 1 FROM stalls s
               WHERE s.builder_id = $1
                 AND s.event_id = i.event_id
                 AND s.stall_type_id = i.stall_type_id
           )
         ORDER BY i.event_id DESC, st.name, bu.name",
    )
    .bind(builder_id.get())
    .bind(event_id.map(EventId::get))
    .fetch_all(pool)
    .await
    .map_err(db_error("Failed to list builder interests"))?;

    Ok(rows.into_iter().map(InterestRecord::from).collect())
}
