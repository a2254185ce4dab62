//! Stall type registry and stall pool seeding.
//!
//! Create and update lock the event row with `SELECT ... FOR NO KEY UPDATE`
//! first. That serialises them per event, so the capacity sum and the
//! `MAX(stall_number)` read are never computed from stale data by two admins
//! at once. The lock does not conflict with the `FOR KEY SHARE` taken by
//! foreign key checks, so interest registration and booking never wait on it.
//! Delete is a single scoped `DELETE` and takes no event lock.

use crate::rows::{AvailabilityRow, EventRow, StallTypeRow, db_error};
use nativenest_core::capacity::{allocated_from_sum, check_capacity};
use nativenest_core::error::{Result, StallError};
use nativenest_core::pool::{NewStall, SeedPlan};
use nativenest_core::types::{
    Event, EventId, NewStallType, StallType, StallTypeAvailability, StallTypeId, StallTypeListing,
    StallTypeSpec,
};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

/// Rows per bulk insert statement (3 bind parameters each).
const SEED_CHUNK: usize = 1_000;

const STALL_TYPE_COLUMNS: &str =
    "stall_type_id, event_id, name, no_of_stalls, stall_price, created_at";

/// Load an event.
pub async fn get_event(conn: &mut PgConnection, event_id: EventId) -> Result<Event> {
    sqlx::query_as::<_, EventRow>(
        "SELECT event_id, title, stall_count FROM events WHERE event_id = $1",
    )
    .bind(event_id.get())
    .fetch_optional(conn)
    .await
    .map_err(db_error("Failed to load event"))?
    .ok_or_else(|| StallError::not_found("Event", event_id))?
    .try_into()
}

/// Check that a stall type belongs to an event.
///
/// Distinguishes a missing event from a type missing within that event.
pub async fn require_stall_type(
    conn: &mut PgConnection,
    event_id: EventId,
    stall_type_id: StallTypeId,
) -> Result<()> {
    let found: Option<(Option<i64>,)> = sqlx::query_as(
        "SELECT st.stall_type_id
         FROM events e
         LEFT JOIN stall_types st ON st.event_id = e.event_id AND st.stall_type_id = $2
         WHERE e.event_id = $1",
    )
    .bind(event_id.get())
    .bind(stall_type_id.get())
    .fetch_optional(conn)
    .await
    .map_err(db_error("Failed to look up stall type"))?;

    match found {
        None => Err(StallError::not_found("Event", event_id)),
        Some((None,)) => Err(StallError::not_found("Stall type", stall_type_id)),
        Some((Some(_),)) => Ok(()),
    }
}

/// Lock an event row for the rest of the transaction and return its stall count.
async fn lock_event(conn: &mut PgConnection, event_id: EventId) -> Result<u32> {
    let event: Event = sqlx::query_as::<_, EventRow>(
        "SELECT event_id, title, stall_count FROM events WHERE event_id = $1 FOR NO KEY UPDATE",
    )
    .bind(event_id.get())
    .fetch_optional(conn)
    .await
    .map_err(db_error("Failed to lock event"))?
    .ok_or_else(|| StallError::not_found("Event", event_id))?
    .try_into()?;

    Ok(event.stall_count)
}

/// Sum of declared quantities for an event, optionally excluding one type.
async fn allocated(
    conn: &mut PgConnection,
    event_id: EventId,
    excluding: Option<StallTypeId>,
) -> Result<u64> {
    let (sum,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(no_of_stalls), 0)::BIGINT
         FROM stall_types
         WHERE event_id = $1 AND ($2::BIGINT IS NULL OR stall_type_id <> $2)",
    )
    .bind(event_id.get())
    .bind(excluding.map(StallTypeId::get))
    .fetch_one(conn)
    .await
    .map_err(db_error("Failed to sum stall allocations"))?;

    Ok(allocated_from_sum(sum))
}

/// Highest stall number currently used in an event.
async fn max_stall_number(conn: &mut PgConnection, event_id: EventId) -> Result<Option<u32>> {
    let (max,): (Option<i32>,) =
        sqlx::query_as("SELECT MAX(stall_number) FROM stalls WHERE event_id = $1")
            .bind(event_id.get())
            .fetch_one(conn)
            .await
            .map_err(db_error("Failed to read highest stall number"))?;

    max.map(|n| {
        u32::try_from(n)
            .map_err(|_| StallError::Database(format!("Invalid stall_number in database: {n}")))
    })
    .transpose()
}

/// Insert the planned stall rows in bulk.
async fn seed_stalls(conn: &mut PgConnection, plan: &SeedPlan) -> Result<()> {
    let rows = plan
        .rows()
        .into_iter()
        .map(|NewStall { event_id, stall_type_id, stall_number }| {
            i32::try_from(stall_number)
                .map(|n| (event_id.get(), stall_type_id.get(), n))
                .map_err(|_| StallError::Validation(format!("Stall number {stall_number} out of range")))
        })
        .collect::<Result<Vec<_>>>()?;

    for chunk in rows.chunks(SEED_CHUNK) {
        let mut insert: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("INSERT INTO stalls (event_id, stall_type_id, stall_number) ");
        insert.push_values(chunk, |mut row, (event_id, stall_type_id, stall_number)| {
            row.push_bind(*event_id)
                .push_bind(*stall_type_id)
                .push_bind(*stall_number);
        });

        insert
            .build()
            .execute(&mut *conn)
            .await
            .map_err(db_error("Failed to seed stalls"))?;
    }

    Ok(())
}

async fn create_in_tx(
    conn: &mut PgConnection,
    event_id: EventId,
    spec: &StallTypeSpec,
) -> Result<(StallType, SeedPlan)> {
    let stall_count = lock_event(conn, event_id).await?;
    let current = allocated(conn, event_id, None).await?;
    check_capacity(stall_count, current, spec.quantity)?;

    let stall_type: StallType = sqlx::query_as::<_, StallTypeRow>(&format!(
        "INSERT INTO stall_types (event_id, name, no_of_stalls, stall_price)
         VALUES ($1, $2, $3, $4)
         RETURNING {STALL_TYPE_COLUMNS}"
    ))
    .bind(event_id.get())
    .bind(&spec.name)
    .bind(quantity_column(spec.quantity)?)
    .bind(price_column(spec)?)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error("Failed to insert stall type"))?
    .try_into()?;

    let max = max_stall_number(conn, event_id).await?;
    let plan = SeedPlan::new(event_id, stall_type.stall_type_id, max, spec.quantity)?;
    seed_stalls(conn, &plan).await?;

    Ok((stall_type, plan))
}

/// Create a stall type and seed its stalls in one transaction.
#[tracing::instrument(skip(pool, input), fields(event_id = %event_id))]
pub async fn create(pool: &PgPool, event_id: EventId, input: &NewStallType) -> Result<StallType> {
    let spec = input.validate()?;

    let mut tx = pool
        .begin()
        .await
        .map_err(db_error("Failed to start transaction"))?;

    match create_in_tx(&mut tx, event_id, &spec).await {
        Ok((stall_type, plan)) => {
            tx.commit()
                .await
                .map_err(db_error("Failed to commit stall type"))?;

            let numbers = plan.numbers();
            tracing::info!(
                stall_type_id = %stall_type.stall_type_id,
                name = %stall_type.name,
                quantity = stall_type.no_of_stalls,
                first_stall = numbers.start(),
                last_stall = numbers.end(),
                "Stall type created and stalls seeded"
            );
            metrics::counter!("nativenest_stall_types_created_total").increment(1);
            metrics::counter!("nativenest_stalls_seeded_total").increment(u64::from(plan.len()));

            Ok(stall_type)
        }
        Err(e) => Err(rollback(tx, e).await),
    }
}

async fn update_in_tx(
    conn: &mut PgConnection,
    event_id: EventId,
    stall_type_id: StallTypeId,
    spec: &StallTypeSpec,
) -> Result<StallType> {
    let stall_count = lock_event(conn, event_id).await?;

    let exists: Option<(i64,)> = sqlx::query_as(
        "SELECT stall_type_id FROM stall_types
         WHERE stall_type_id = $1 AND event_id = $2
         FOR UPDATE",
    )
    .bind(stall_type_id.get())
    .bind(event_id.get())
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("Failed to lock stall type"))?;

    if exists.is_none() {
        return Err(StallError::not_found("Stall type", stall_type_id));
    }

    let others = allocated(conn, event_id, Some(stall_type_id)).await?;
    check_capacity(stall_count, others, spec.quantity)?;

    sqlx::query_as::<_, StallTypeRow>(&format!(
        "UPDATE stall_types
         SET name = $3, no_of_stalls = $4, stall_price = $5, updated_at = NOW()
         WHERE stall_type_id = $1 AND event_id = $2
         RETURNING {STALL_TYPE_COLUMNS}"
    ))
    .bind(stall_type_id.get())
    .bind(event_id.get())
    .bind(&spec.name)
    .bind(quantity_column(spec.quantity)?)
    .bind(price_column(spec)?)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error("Failed to update stall type"))?
    .try_into()
}

/// Update a stall type's name, declared quantity and price.
///
/// The stall pool is left as seeded.
#[tracing::instrument(skip(pool, input), fields(event_id = %event_id, stall_type_id = %stall_type_id))]
pub async fn update(
    pool: &PgPool,
    event_id: EventId,
    stall_type_id: StallTypeId,
    input: &NewStallType,
) -> Result<StallType> {
    let spec = input.validate()?;

    let mut tx = pool
        .begin()
        .await
        .map_err(db_error("Failed to start transaction"))?;

    match update_in_tx(&mut tx, event_id, stall_type_id, &spec).await {
        Ok(stall_type) => {
            tx.commit()
                .await
                .map_err(db_error("Failed to commit stall type update"))?;

            tracing::info!(
                name = %stall_type.name,
                quantity = stall_type.no_of_stalls,
                "Stall type updated"
            );
            Ok(stall_type)
        }
        Err(e) => Err(rollback(tx, e).await),
    }
}

/// Delete a stall type row; its stalls stay.
#[tracing::instrument(skip(pool), fields(event_id = %event_id, stall_type_id = %stall_type_id))]
pub async fn delete(pool: &PgPool, event_id: EventId, stall_type_id: StallTypeId) -> Result<()> {
    let result = sqlx::query("DELETE FROM stall_types WHERE stall_type_id = $1 AND event_id = $2")
        .bind(stall_type_id.get())
        .bind(event_id.get())
        .execute(pool)
        .await
        .map_err(db_error("Failed to delete stall type"))?;

    if result.rows_affected() == 0 {
        return Err(StallError::not_found("Stall type", stall_type_id));
    }

    tracing::info!("Stall type deleted");
    Ok(())
}

/// Stall types ordered by name plus the event's stall count.
pub async fn list(pool: &PgPool, event_id: EventId) -> Result<StallTypeListing> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(db_error("Failed to acquire connection"))?;
    let event = get_event(&mut conn, event_id).await?;

    let rows: Vec<StallTypeRow> = sqlx::query_as(&format!(
        "SELECT {STALL_TYPE_COLUMNS}
         FROM stall_types
         WHERE event_id = $1
         ORDER BY name, stall_type_id"
    ))
    .bind(event_id.get())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error("Failed to list stall types"))?;

    Ok(StallTypeListing {
        stall_types: rows
            .into_iter()
            .map(StallType::try_from)
            .collect::<Result<_>>()?,
        event_stall_count: event.stall_count,
    })
}

/// Booked and available counts per stall type.
pub async fn availability(pool: &PgPool, event_id: EventId) -> Result<Vec<StallTypeAvailability>> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(db_error("Failed to acquire connection"))?;
    get_event(&mut conn, event_id).await?;

    let rows: Vec<AvailabilityRow> = sqlx::query_as(
        "SELECT st.stall_type_id, st.event_id, st.name, st.no_of_stalls, st.stall_price,
                st.created_at,
                COUNT(s.stall_id) FILTER (WHERE s.builder_id IS NOT NULL) AS booked_count
         FROM stall_types st
         LEFT JOIN stalls s
                ON s.stall_type_id = st.stall_type_id AND s.event_id = st.event_id
         WHERE st.event_id = $1
         GROUP BY st.stall_type_id
         ORDER BY st.name, st.stall_type_id",
    )
    .bind(event_id.get())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error("Failed to query availability"))?;

    rows.into_iter()
        .map(|row| {
            let booked = u32::try_from(row.booked_count).map_err(|_| {
                StallError::Database(format!("Invalid booked count: {}", row.booked_count))
            })?;
            Ok(StallTypeAvailability::new(row.stall_type.try_into()?, booked))
        })
        .collect()
}

fn quantity_column(quantity: u32) -> Result<i32> {
    i32::try_from(quantity)
        .map_err(|_| StallError::Validation(format!("Number of stalls is too large: {quantity}")))
}

fn price_column(spec: &StallTypeSpec) -> Result<i64> {
    i64::try_from(spec.price.minor())
        .map_err(|_| StallError::Validation(format!("Stall price is too large: {}", spec.price)))
}

/// Roll back explicitly, log, and hand the original error back.
pub async fn rollback(tx: sqlx::Transaction<'_, Postgres>, error: StallError) -> StallError {
    if let Err(rollback_error) = tx.rollback().await {
        tracing::error!(error = %rollback_error, "Failed to roll back transaction");
    }

    if error.is_business() {
        tracing::warn!(kind = error.kind(), error = %error, "Stall operation rejected");
    } else {
        tracing::error!(error = %error, "Stall operation failed");
    }

    error
}
