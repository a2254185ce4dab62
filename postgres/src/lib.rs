//! `PostgreSQL` stall registry for NativeNest.
//!
//! [`PostgresStallStore`] implements [`StallRegistry`] on top of a sqlx
//! connection pool. Every multi-statement operation runs in a single
//! transaction:
//!
//! - Stall type create/update lock the event row, re-check capacity and (for
//!   create) seed the stall pool in the same transaction
//! - Booking locks one free stall with `SELECT ... FOR UPDATE`, so concurrent
//!   bookings across processes never bind the same stall
//! - Check-in locks the buyer's interest row before recording attendance
//!
//! # Example
//!
//! ```ignore
//! use nativenest_postgres::PostgresStallStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresStallStore::connect("postgres://localhost/nativenest").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod allocation;
mod interest;
mod reports;
mod rows;
mod stall_types;

use nativenest_core::error::{Result, StallError};
use nativenest_core::registry::{Directory, StallRegistry};
use nativenest_core::types::{
    BuilderId, Buyer, BuyerId, BuyerStallInterest, Event, EventId, InterestRecord,
    NewStallType, Stall, StallBooking, StallDetail, StallId, StallType, StallTypeAvailability,
    StallTypeId, StallTypeListing,
};
use rows::db_error;
use sqlx::PgPool;

/// PostgreSQL-backed stall registry.
#[derive(Clone, Debug)]
pub struct PostgresStallStore {
    pool: PgPool,
}

impl PostgresStallStore {
    /// Connect with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`StallError::Database`] if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(db_error("Failed to connect to database"))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StallError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StallError::Database(format!("Failed to run migrations: {e}")))?;

        tracing::info!("Stall registry migrations applied");
        Ok(())
    }

    async fn connection(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(db_error("Failed to acquire connection"))
    }
}

impl Directory for PostgresStallStore {
    async fn get_event(&self, event_id: EventId) -> Result<Event> {
        let mut conn = self.connection().await?;
        stall_types::get_event(&mut conn, event_id).await
    }

    async fn find_buyer_by_mobile(&self, mobile_number: &str) -> Result<Buyer> {
        let mut conn = self.connection().await?;
        interest::find_buyer(&mut conn, mobile_number).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error("Database ping failed"))?;
        Ok(())
    }
}

impl StallRegistry for PostgresStallStore {
    async fn create_stall_type(&self, event_id: EventId, input: &NewStallType) -> Result<StallType> {
        stall_types::create(&self.pool, event_id, input).await
    }

    async fn update_stall_type(
        &self,
        event_id: EventId,
        stall_type_id: StallTypeId,
        input: &NewStallType,
    ) -> Result<StallType> {
        stall_types::update(&self.pool, event_id, stall_type_id, input).await
    }

    async fn delete_stall_type(&self, event_id: EventId, stall_type_id: StallTypeId) -> Result<()> {
        stall_types::delete(&self.pool, event_id, stall_type_id).await
    }

    async fn list_stall_types(&self, event_id: EventId) -> Result<StallTypeListing> {
        stall_types::list(&self.pool, event_id).await
    }

    async fn list_availability(&self, event_id: EventId) -> Result<Vec<StallTypeAvailability>> {
        stall_types::availability(&self.pool, event_id).await
    }

    async fn book_stall(
        &self,
        event_id: EventId,
        stall_type_id: StallTypeId,
        builder_id: BuilderId,
    ) -> Result<Stall> {
        allocation::book(&self.pool, event_id, stall_type_id, builder_id).await
    }

    async fn register_interest(
        &self,
        buyer_id: BuyerId,
        event_id: EventId,
        stall_type_id: StallTypeId,
    ) -> Result<bool> {
        interest::register(&self.pool, buyer_id, event_id, stall_type_id).await
    }

    async fn check_in(
        &self,
        event_id: EventId,
        stall_id: StallId,
        mobile_number: &str,
    ) -> Result<BuyerStallInterest> {
        interest::check_in(&self.pool, event_id, stall_id, mobile_number).await
    }

    async fn get_stall(&self, stall_id: StallId) -> Result<StallDetail> {
        reports::stall(&self.pool, stall_id).await
    }

    async fn list_bookings(&self, event_id: EventId) -> Result<Vec<StallBooking>> {
        reports::event_bookings(&self.pool, event_id).await
    }

    async fn list_builder_bookings(
        &self,
        builder_id: BuilderId,
        event_id: Option<EventId>,
    ) -> Result<Vec<StallBooking>> {
        reports::builder_bookings(&self.pool, builder_id, event_id).await
    }

    async fn list_builder_interests(
        &self,
        builder_id: BuilderId,
        event_id: Option<EventId>,
    ) -> Result<Vec<InterestRecord>> {
        reports::builder_interests(&self.pool, builder_id, event_id).await
    }
}
