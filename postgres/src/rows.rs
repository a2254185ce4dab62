//! Row types read from PostgreSQL and their conversion into domain types.
//!
//! Counts and numbers are stored as `INTEGER`/`BIGINT`; the domain uses
//! unsigned integers, so conversion can fail on rows written outside this crate.

use chrono::{DateTime, Utc};
use nativenest_core::error::{Result, StallError};
use nativenest_core::types::{
    BuilderId, Buyer, BuyerId, BuyerStallInterest, Event, EventId, InterestRecord, Money, Stall,
    StallBooking, StallDetail, StallId, StallType, StallTypeId,
};

fn unsigned<T, S>(value: S, column: &str) -> Result<T>
where
    T: TryFrom<S>,
    S: Copy + std::fmt::Display,
{
    T::try_from(value)
        .map_err(|_| StallError::Database(format!("Invalid {column} value in database: {value}")))
}

/// Map a sqlx error into [`StallError::Database`] with context.
pub fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> StallError {
    move |e| StallError::Database(format!("{context}: {e}"))
}

/// Whether a sqlx error is a foreign key violation.
pub fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[derive(sqlx::FromRow)]
pub struct EventRow {
    pub event_id: i64,
    pub title: String,
    pub stall_count: i32,
}

impl TryFrom<EventRow> for Event {
    type Error = StallError;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(Self {
            event_id: EventId::new(row.event_id),
            title: row.title,
            stall_count: unsigned(row.stall_count, "stall_count")?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct BuyerRow {
    pub buyer_id: i64,
    pub name: String,
    pub mobile_number: String,
}

impl From<BuyerRow> for Buyer {
    fn from(row: BuyerRow) -> Self {
        Self {
            buyer_id: BuyerId::new(row.buyer_id),
            name: row.name,
            mobile_number: row.mobile_number,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct StallTypeRow {
    pub stall_type_id: i64,
    pub event_id: i64,
    pub name: String,
    pub no_of_stalls: i32,
    pub stall_price: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<StallTypeRow> for StallType {
    type Error = StallError;

    fn try_from(row: StallTypeRow) -> Result<Self> {
        Ok(Self {
            stall_type_id: StallTypeId::new(row.stall_type_id),
            event_id: EventId::new(row.event_id),
            name: row.name,
            no_of_stalls: unsigned(row.no_of_stalls, "no_of_stalls")?,
            stall_price: Money::from_minor(unsigned(row.stall_price, "stall_price")?),
            created_at: row.created_at,
        })
    }
}

/// Stall type joined with its live booked count.
#[derive(sqlx::FromRow)]
pub struct AvailabilityRow {
    #[sqlx(flatten)]
    pub stall_type: StallTypeRow,
    pub booked_count: i64,
}

#[derive(sqlx::FromRow)]
pub struct StallRow {
    pub stall_id: i64,
    pub event_id: i64,
    pub stall_type_id: i64,
    pub stall_number: i32,
    pub builder_id: Option<i64>,
    pub booked_at: Option<DateTime<Utc>>,
}

impl TryFrom<StallRow> for Stall {
    type Error = StallError;

    fn try_from(row: StallRow) -> Result<Self> {
        Ok(Self {
            stall_id: StallId::new(row.stall_id),
            event_id: EventId::new(row.event_id),
            stall_type_id: StallTypeId::new(row.stall_type_id),
            stall_number: unsigned(row.stall_number, "stall_number")?,
            builder_id: row.builder_id.map(BuilderId::new),
            booked_at: row.booked_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct StallDetailRow {
    #[sqlx(flatten)]
    pub stall: StallRow,
    pub stall_type_name: Option<String>,
    pub company_name: Option<String>,
}

impl TryFrom<StallDetailRow> for StallDetail {
    type Error = StallError;

    fn try_from(row: StallDetailRow) -> Result<Self> {
        Ok(Self {
            stall: row.stall.try_into()?,
            stall_type_name: row.stall_type_name,
            company_name: row.company_name,
        })
    }
}

impl TryFrom<StallDetailRow> for StallBooking {
    type Error = StallError;

    fn try_from(row: StallDetailRow) -> Result<Self> {
        let stall = Stall::try_from(row.stall)?;
        let builder_id = stall.builder_id.ok_or_else(|| {
            StallError::Database(format!("Stall {} listed as booked without a builder", stall.stall_id))
        })?;

        Ok(Self {
            stall_id: stall.stall_id,
            event_id: stall.event_id,
            stall_number: stall.stall_number,
            stall_type_id: stall.stall_type_id,
            stall_type_name: row.stall_type_name,
            builder_id,
            company_name: row.company_name,
            booked_at: stall.booked_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct InterestRow {
    pub interest_id: i64,
    pub buyer_id: i64,
    pub event_id: i64,
    pub stall_type_id: i64,
    pub stall_id: Option<i64>,
    pub is_attended: bool,
}

impl From<InterestRow> for BuyerStallInterest {
    fn from(row: InterestRow) -> Self {
        Self {
            buyer_id: BuyerId::new(row.buyer_id),
            event_id: EventId::new(row.event_id),
            stall_type_id: StallTypeId::new(row.stall_type_id),
            stall_id: row.stall_id.map(StallId::new),
            is_attended: row.is_attended,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct InterestRecordRow {
    pub buyer_id: i64,
    pub buyer_name: String,
    pub mobile_number: String,
    pub event_id: i64,
    pub stall_type_id: i64,
    pub stall_type_name: String,
    pub stall_id: Option<i64>,
    pub is_attended: bool,
}

impl From<InterestRecordRow> for InterestRecord {
    fn from(row: InterestRecordRow) -> Self {
        Self {
            buyer_id: BuyerId::new(row.buyer_id),
            buyer_name: row.buyer_name,
            mobile_number: row.mobile_number,
            event_id: EventId::new(row.event_id),
            stall_type_id: StallTypeId::new(row.stall_type_id),
            stall_type_name: row.stall_type_name,
            stall_id: row.stall_id.map(StallId::new),
            is_attended: row.is_attended,
        }
    }
}
