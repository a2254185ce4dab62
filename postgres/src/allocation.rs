//! Stall allocation.
//!
//! # Concurrency
//!
//! The free stall is selected with `ORDER BY stall_number LIMIT 1 FOR UPDATE`.
//! A transaction that waits on a row lock re-evaluates the `builder_id IS NULL`
//! predicate once the holder commits; if the row was taken it is skipped and
//! the next free stall is returned instead. Two bookings therefore never bind
//! the same stall, and the sequence only reports sold out when no free stall
//! of the type remains.

use crate::rows::{StallRow, db_error, is_foreign_key_violation};
use crate::stall_types::{require_stall_type, rollback};
use nativenest_core::error::{Result, StallError};
use nativenest_core::types::{BuilderId, EventId, Stall, StallTypeId};
use sqlx::{PgConnection, PgPool};

async fn book_in_tx(
    conn: &mut PgConnection,
    event_id: EventId,
    stall_type_id: StallTypeId,
    builder_id: BuilderId,
) -> Result<Stall> {
    require_stall_type(conn, event_id, stall_type_id).await?;

    let free: Option<(i64,)> = sqlx::query_as(
        "SELECT stall_id FROM stalls
         WHERE event_id = $1 AND stall_type_id = $2 AND builder_id IS NULL
         ORDER BY stall_number
         LIMIT 1
         FOR UPDATE",
    )
    .bind(event_id.get())
    .bind(stall_type_id.get())
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("Failed to lock free stall"))?;

    let Some((stall_id,)) = free else {
        return Err(StallError::NoAvailableStall {
            event_id,
            stall_type_id,
        });
    };

    sqlx::query_as::<_, StallRow>(
        "UPDATE stalls
         SET builder_id = $2, booked_at = NOW()
         WHERE stall_id = $1
         RETURNING stall_id, event_id, stall_type_id, stall_number, builder_id, booked_at",
    )
    .bind(stall_id)
    .bind(builder_id.get())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            StallError::not_found("Builder", builder_id)
        } else {
            db_error("Failed to book stall")(e)
        }
    })?
    .try_into()
}

/// Bind one free stall of a type to a builder.
#[tracing::instrument(
    skip(pool),
    fields(event_id = %event_id, stall_type_id = %stall_type_id, builder_id = %builder_id)
)]
pub async fn book(
    pool: &PgPool,
    event_id: EventId,
    stall_type_id: StallTypeId,
    builder_id: BuilderId,
) -> Result<Stall> {
    let mut tx = pool
        .begin()
        .await
        .map_err(db_error("Failed to start transaction"))?;

    match book_in_tx(&mut tx, event_id, stall_type_id, builder_id).await {
        Ok(stall) => {
            tx.commit()
                .await
                .map_err(db_error("Failed to commit booking"))?;

            tracing::info!(
                stall_id = %stall.stall_id,
                stall_number = stall.stall_number,
                "Stall booked"
            );
            metrics::counter!("nativenest_stall_bookings_total", "outcome" => "booked")
                .increment(1);
            Ok(stall)
        }
        Err(e) => {
            let e = rollback(tx, e).await;
            metrics::counter!("nativenest_stall_bookings_total", "outcome" => e.kind())
                .increment(1);
            Err(e)
        }
    }
}
