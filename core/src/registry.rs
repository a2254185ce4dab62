//! Stall registry abstraction.
//!
//! [`StallRegistry`] is the seam between the HTTP layer and storage. It covers
//! the stall type registry, the allocation engine and the buyer interest
//! ledger; [`Directory`] covers the read-only collaborators (events, buyers)
//! those operations depend on.
//!
//! # Implementations
//!
//! - `PostgresStallStore` (in `nativenest-postgres`): production implementation;
//!   booking runs `SELECT ... FOR UPDATE` inside a transaction so correctness
//!   holds across server processes.
//! - `InMemoryStallStore` (in `nativenest-testing`): same semantics behind one
//!   `std::sync::Mutex`, for fast deterministic tests.
//!
//! # Example
//!
//! ```no_run
//! use nativenest_core::error::{Result, StallError};
//! use nativenest_core::registry::StallRegistry;
//! use nativenest_core::types::{BuilderId, EventId, NewStallType};
//!
//! async fn example<R: StallRegistry>(registry: &R) -> Result<()> {
//!     let event_id = EventId::new(1);
//!     let gold = registry
//!         .create_stall_type(event_id, &NewStallType::new("Gold", 6, 500_000))
//!         .await?;
//!
//!     match registry.book_stall(event_id, gold.stall_type_id, BuilderId::new(9)).await {
//!         Ok(stall) => println!("booked stall #{}", stall.stall_number),
//!         Err(StallError::NoAvailableStall { .. }) => println!("sold out"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```

use crate::error::Result;
use crate::types::{
    BuilderId, Buyer, BuyerId, BuyerStallInterest, Event, EventId, InterestRecord,
    NewStallType, Stall, StallBooking, StallDetail, StallId, StallType, StallTypeAvailability,
    StallTypeId, StallTypeListing,
};
use std::future::Future;

/// Read access to the external event and buyer directories.
pub trait Directory: Send + Sync {
    /// Look up an event.
    ///
    /// # Errors
    ///
    /// - Event does not exist → `StallError::NotFound`
    /// - Query failure → `StallError::Database`
    fn get_event(&self, event_id: EventId) -> impl Future<Output = Result<Event>> + Send;

    /// Resolve a buyer from a mobile number.
    ///
    /// # Errors
    ///
    /// - No buyer has that number → `StallError::NotFound`
    /// - Query failure → `StallError::Database`
    fn find_buyer_by_mobile(
        &self,
        mobile_number: &str,
    ) -> impl Future<Output = Result<Buyer>> + Send;

    /// Verify the backing storage is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StallError::Database` if storage cannot be reached.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Stall inventory, allocation and buyer interest operations.
///
/// All methods are cancellation-safe with respect to storage: a dropped future
/// leaves any open transaction to be rolled back by the driver.
pub trait StallRegistry: Directory {
    // ═══════════════════════════════════════════════════════════
    // Stall Type Registry
    // ═══════════════════════════════════════════════════════════

    /// Create a stall type and seed its stalls atomically.
    ///
    /// Seeds `quantity` stalls numbered after the event's current highest
    /// stall number.
    ///
    /// # Errors
    ///
    /// - Invalid input → `StallError::Validation`
    /// - Unknown event → `StallError::NotFound`
    /// - Event total would be exceeded → `StallError::CapacityExceeded`
    /// - Storage failure → `StallError::Database` (nothing is written)
    fn create_stall_type(
        &self,
        event_id: EventId,
        input: &NewStallType,
    ) -> impl Future<Output = Result<StallType>> + Send;

    /// Update name, declared quantity and price of a stall type.
    ///
    /// The stall pool is not resized; the declared quantity is a planning figure.
    ///
    /// # Errors
    ///
    /// - Invalid input → `StallError::Validation`
    /// - Unknown event or type not in event → `StallError::NotFound`
    /// - Event total would be exceeded → `StallError::CapacityExceeded`
    /// - Storage failure → `StallError::Database`
    fn update_stall_type(
        &self,
        event_id: EventId,
        stall_type_id: StallTypeId,
        input: &NewStallType,
    ) -> impl Future<Output = Result<StallType>> + Send;

    /// Delete a stall type. Its stall rows are left in place.
    ///
    /// # Errors
    ///
    /// - Type not in event → `StallError::NotFound`
    /// - Storage failure → `StallError::Database`
    fn delete_stall_type(
        &self,
        event_id: EventId,
        stall_type_id: StallTypeId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Stall types of an event ordered by name, plus the event's stall count.
    ///
    /// # Errors
    ///
    /// - Unknown event → `StallError::NotFound`
    /// - Storage failure → `StallError::Database`
    fn list_stall_types(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<StallTypeListing>> + Send;

    /// Booked and available counts per stall type.
    ///
    /// # Errors
    ///
    /// - Unknown event → `StallError::NotFound`
    /// - Storage failure → `StallError::Database`
    fn list_availability(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Vec<StallTypeAvailability>>> + Send;

    // ═══════════════════════════════════════════════════════════
    // Allocation Engine
    // ═══════════════════════════════════════════════════════════

    /// Bind one free stall of the type to `builder_id`.
    ///
    /// At most one call succeeds per stall, however many run concurrently.
    /// Which free stall is chosen is unspecified.
    ///
    /// # Errors
    ///
    /// - Unknown event or type not in event → `StallError::NotFound`
    /// - Every stall of the type booked → `StallError::NoAvailableStall`
    /// - Storage failure → `StallError::Database` (rolled back)
    fn book_stall(
        &self,
        event_id: EventId,
        stall_type_id: StallTypeId,
        builder_id: BuilderId,
    ) -> impl Future<Output = Result<Stall>> + Send;

    // ═══════════════════════════════════════════════════════════
    // Buyer Interest Ledger
    // ═══════════════════════════════════════════════════════════

    /// Record a buyer's interest in a stall type, if not already recorded.
    ///
    /// Returns `true` when a new row was created, `false` for a duplicate.
    ///
    /// # Errors
    ///
    /// - Type not in event → `StallError::NotFound`
    /// - Storage failure → `StallError::Database`
    fn register_interest(
        &self,
        buyer_id: BuyerId,
        event_id: EventId,
        stall_type_id: StallTypeId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Correlate a venue check-in at `stall_id` with the buyer's interest row.
    ///
    /// # Errors
    ///
    /// - Unknown mobile number, stall not in event, or no interest in the
    ///   stall's type → `StallError::NotFound`
    /// - Interest already attended at a different stall →
    ///   `StallError::AlreadyCheckedIn`
    /// - Storage failure → `StallError::Database`
    fn check_in(
        &self,
        event_id: EventId,
        stall_id: StallId,
        mobile_number: &str,
    ) -> impl Future<Output = Result<BuyerStallInterest>> + Send;

    // ═══════════════════════════════════════════════════════════
    // Lookups and Reports
    // ═══════════════════════════════════════════════════════════

    /// Stall detail for the venue QR scan.
    ///
    /// # Errors
    ///
    /// - Unknown stall → `StallError::NotFound`
    /// - Storage failure → `StallError::Database`
    fn get_stall(&self, stall_id: StallId) -> impl Future<Output = Result<StallDetail>> + Send;

    /// Booked stalls of an event ordered by stall number.
    ///
    /// # Errors
    ///
    /// - Unknown event → `StallError::NotFound`
    /// - Storage failure → `StallError::Database`
    fn list_bookings(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Vec<StallBooking>>> + Send;

    /// Stalls held by a builder, optionally limited to one event.
    ///
    /// # Errors
    ///
    /// Returns `StallError::Database` on storage failure.
    fn list_builder_bookings(
        &self,
        builder_id: BuilderId,
        event_id: Option<EventId>,
    ) -> impl Future<Output = Result<Vec<StallBooking>>> + Send;

    /// Buyer interest in stall types where the builder holds a stall.
    ///
    /// # Errors
    ///
    /// Returns `StallError::Database` on storage failure.
    fn list_builder_interests(
        &self,
        builder_id: BuilderId,
        event_id: Option<EventId>,
    ) -> impl Future<Output = Result<Vec<InterestRecord>>> + Send;
}
