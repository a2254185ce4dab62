//! Buyer interest ledger and venue check-in.

use crate::rows::{BuyerRow, InterestRow, db_error, is_foreign_key_violation};
use crate::stall_types::{require_stall_type, rollback};
use nativenest_core::error::{Result, StallError};
use nativenest_core::interest::{CheckInDecision, decide_check_in};
use nativenest_core::types::{
    Buyer, BuyerId, BuyerStallInterest, EventId, StallId, StallTypeId,
};
use sqlx::{PgConnection, PgPool};

const INTEREST_COLUMNS: &str =
    "interest_id, buyer_id, event_id, stall_type_id, stall_id, is_attended";

/// Resolve a buyer by mobile number.
pub async fn find_buyer(conn: &mut PgConnection, mobile_number: &str) -> Result<Buyer> {
    sqlx::query_as::<_, BuyerRow>(
        "SELECT buyer_id, name, mobile_number FROM buyers WHERE mobile_number = $1",
    )
    .bind(mobile_number)
    .fetch_optional(conn)
    .await
    .map_err(db_error("Failed to look up buyer"))?
    .map(Buyer::from)
    .ok_or_else(|| StallError::not_found("Buyer with mobile number", mobile_number))
}

/// Record interest once per (buyer, event, stall type).
#[tracing::instrument(
    skip(pool),
    fields(buyer_id = %buyer_id, event_id = %event_id, stall_type_id = %stall_type_id)
)]
pub async fn register(
    pool: &PgPool,
    buyer_id: BuyerId,
    event_id: EventId,
    stall_type_id: StallTypeId,
) -> Result<bool> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(db_error("Failed to acquire connection"))?;

    let outcome = async {
        require_stall_type(&mut conn, event_id, stall_type_id).await?;

        let result = sqlx::query(
            "INSERT INTO buyer_stall_interest (buyer_id, event_id, stall_type_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (buyer_id, event_id, stall_type_id) DO NOTHING",
        )
        .bind(buyer_id.get())
        .bind(event_id.get())
        .bind(stall_type_id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StallError::not_found("Buyer", buyer_id)
            } else {
                db_error("Failed to record interest")(e)
            }
        })?;

        Ok::<_, StallError>(result.rows_affected() == 1)
    }
    .await;

    let label = match &outcome {
        Ok(true) => "created",
        Ok(false) => "duplicate",
        Err(e) => e.kind(),
    };
    metrics::counter!("nativenest_interest_registrations_total", "outcome" => label).increment(1);

    match &outcome {
        Ok(created) => tracing::info!(created, "Interest registered"),
        Err(e) if e.is_business() => tracing::warn!(error = %e, "Interest rejected"),
        Err(e) => tracing::error!(error = %e, "Interest registration failed"),
    }

    outcome
}

async fn check_in_in_tx(
    conn: &mut PgConnection,
    event_id: EventId,
    stall_id: StallId,
    mobile_number: &str,
) -> Result<(BuyerStallInterest, CheckInDecision)> {
    let buyer = find_buyer(conn, mobile_number).await?;

    let stall: Option<(i64,)> = sqlx::query_as(
        "SELECT stall_type_id FROM stalls WHERE stall_id = $1 AND event_id = $2",
    )
    .bind(stall_id.get())
    .bind(event_id.get())
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("Failed to look up stall"))?;

    let Some((stall_type_id,)) = stall else {
        return Err(StallError::not_found("Stall", stall_id));
    };

    let row: InterestRow = sqlx::query_as(&format!(
        "SELECT {INTEREST_COLUMNS}
         FROM buyer_stall_interest
         WHERE buyer_id = $1 AND event_id = $2 AND stall_type_id = $3
         FOR UPDATE"
    ))
    .bind(buyer.buyer_id.get())
    .bind(event_id.get())
    .bind(stall_type_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("Failed to lock interest registration"))?
    .ok_or_else(|| {
        StallError::not_found(
            "Interest registration",
            format!("for buyer {} and stall type {stall_type_id}", buyer.buyer_id),
        )
    })?;

    let interest_id = row.interest_id;
    let current = BuyerStallInterest::from(row);

    match decide_check_in(&current, stall_id)? {
        CheckInDecision::AlreadyRecorded => Ok((current, CheckInDecision::AlreadyRecorded)),
        CheckInDecision::Record => {
            let updated: InterestRow = sqlx::query_as(&format!(
                "UPDATE buyer_stall_interest
                 SET is_attended = TRUE, stall_id = $2
                 WHERE interest_id = $1
                 RETURNING {INTEREST_COLUMNS}"
            ))
            .bind(interest_id)
            .bind(stall_id.get())
            .fetch_one(&mut *conn)
            .await
            .map_err(db_error("Failed to record check-in"))?;

            Ok((updated.into(), CheckInDecision::Record))
        }
    }
}

/// Correlate a venue check-in with the buyer's interest row.
#[tracing::instrument(skip(pool, mobile_number), fields(event_id = %event_id, stall_id = %stall_id))]
pub async fn check_in(
    pool: &PgPool,
    event_id: EventId,
    stall_id: StallId,
    mobile_number: &str,
) -> Result<BuyerStallInterest> {
    let mut tx = pool
        .begin()
        .await
        .map_err(db_error("Failed to start transaction"))?;

    match check_in_in_tx(&mut tx, event_id, stall_id, mobile_number).await {
        Ok((interest, decision)) => {
            tx.commit()
                .await
                .map_err(db_error("Failed to commit check-in"))?;

            let outcome = match decision {
                CheckInDecision::Record => "recorded",
                CheckInDecision::AlreadyRecorded => "repeat",
            };
            tracing::info!(buyer_id = %interest.buyer_id, outcome, "Check-in processed");
            metrics::counter!("nativenest_check_ins_total", "outcome" => outcome).increment(1);
            Ok(interest)
        }
        Err(e) => {
            let e = rollback(tx, e).await;
            metrics::counter!("nativenest_check_ins_total", "outcome" => e.kind()).increment(1);
            Err(e)
        }
    }
}
